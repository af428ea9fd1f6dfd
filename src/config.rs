use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::slots::Symbol;

pub const CONFIG_FILE: &str = "slots_config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSpec {
    /// Copies of the symbol on each reel.
    pub weight: u32,
    /// Payout multiplier per unit bet.
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub max_lines: usize,
    pub min_bet: u64,
    pub max_bet: u64,
    pub rows: usize,
    pub cols: usize,
    pub symbols: BTreeMap<Symbol, SymbolSpec>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        let symbols = [("A", 2, 5), ("B", 4, 4), ("C", 6, 3), ("D", 8, 2)]
            .into_iter()
            .map(|(name, weight, value)| (Symbol::new(name), SymbolSpec { weight, value }))
            .collect();
        MachineConfig {
            max_lines: 3,
            min_bet: 1,
            max_bet: 100,
            rows: 3,
            cols: 3,
            symbols,
        }
    }
}

impl MachineConfig {
    /// Reads the config at `path`, or the default machine if there is none.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?)
        } else {
            Ok(MachineConfig::default())
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("writing {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }
        for (symbol, spec) in &self.symbols {
            if spec.weight == 0 {
                return Err(ConfigError::ZeroWeight(symbol.clone()));
            }
            if spec.value == 0 {
                return Err(ConfigError::ZeroValue(symbol.clone()));
            }
        }
        let population: usize = self.symbols.values().map(|s| s.weight as usize).sum();
        if population < self.rows {
            return Err(ConfigError::PopulationTooSmall {
                population,
                rows: self.rows,
            });
        }
        if self.max_lines == 0 {
            return Err(ConfigError::NoLines);
        }
        if self.max_lines > self.rows {
            return Err(ConfigError::LinesExceedRows {
                lines: self.max_lines,
                rows: self.rows,
            });
        }
        if self.min_bet == 0 || self.min_bet > self.max_bet {
            return Err(ConfigError::BetRange {
                min: self.min_bet,
                max: self.max_bet,
            });
        }
        Ok(())
    }

    pub fn weights(&self) -> BTreeMap<Symbol, u32> {
        self.symbols
            .iter()
            .map(|(symbol, spec)| (symbol.clone(), spec.weight))
            .collect()
    }

    pub fn values(&self) -> BTreeMap<Symbol, u64> {
        self.symbols
            .iter()
            .map(|(symbol, spec)| (symbol.clone(), spec.value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_reference_machine() {
        let config = MachineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!((config.rows, config.cols, config.max_lines), (3, 3, 3));
        assert_eq!(config.weights()[&Symbol::new("D")], 8);
        assert_eq!(config.values()[&Symbol::new("A")], 5);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("slots-config-{}.json", std::process::id()));
        let mut config = MachineConfig::default();
        config.max_bet = 250;
        config.save(&path).unwrap();
        let loaded = MachineConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_gives_default() {
        let path = std::env::temp_dir().join("slots-config-does-not-exist.json");
        assert_eq!(MachineConfig::load(path).unwrap(), MachineConfig::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: MachineConfig =
            serde_json::from_str(r#"{"rows": 1, "max_lines": 1, "symbols": {"C": {"weight": 3, "value": 3}}}"#)
                .unwrap();
        assert_eq!(config.rows, 1);
        assert_eq!(config.cols, 3);
        assert_eq!(config.symbols.len(), 1);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        let mut config = MachineConfig::default();
        config.symbols.get_mut(&Symbol::new("B")).unwrap().weight = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroWeight(Symbol::new("B"))));

        let mut config = MachineConfig::default();
        config.symbols.get_mut(&Symbol::new("C")).unwrap().value = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroValue(Symbol::new("C"))));

        let mut config = MachineConfig::default();
        config.symbols.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoSymbols));

        let mut config = MachineConfig::default();
        config.rows = 21;
        assert_eq!(
            config.validate(),
            Err(ConfigError::PopulationTooSmall {
                population: 20,
                rows: 21
            })
        );
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let mut config = MachineConfig::default();
        config.max_lines = 4;
        assert_eq!(
            config.validate(),
            Err(ConfigError::LinesExceedRows { lines: 4, rows: 3 })
        );

        let mut config = MachineConfig::default();
        config.max_lines = 0;
        assert_eq!(config.validate(), Err(ConfigError::NoLines));

        let mut config = MachineConfig::default();
        config.min_bet = 200;
        assert_eq!(
            config.validate(),
            Err(ConfigError::BetRange { min: 200, max: 100 })
        );

        let mut config = MachineConfig::default();
        config.cols = 0;
        assert!(matches!(config.validate(), Err(ConfigError::EmptyGrid { .. })));
    }
}
