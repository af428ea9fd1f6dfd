use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A reel symbol, identified by its display name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Symbol(name.into())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Symbols laid out column by column. Every column has the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    columns: Vec<Vec<Symbol>>,
}

impl Grid {
    pub fn from_columns(columns: Vec<Vec<Symbol>>) -> Result<Self, ConfigError> {
        let rows = columns.first().map_or(0, Vec::len);
        if rows == 0 {
            return Err(ConfigError::EmptyGrid {
                rows,
                cols: columns.len(),
            });
        }
        if columns.iter().any(|column| column.len() != rows) {
            return Err(ConfigError::RaggedGrid);
        }
        Ok(Grid { columns })
    }

    pub fn rows(&self) -> usize {
        self.columns[0].len()
    }

    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Vec<Symbol>] {
        &self.columns
    }

    /// Symbols at row `index`, left to right.
    pub fn row(&self, index: usize) -> impl Iterator<Item = &Symbol> + '_ {
        self.columns.iter().map(move |column| &column[index])
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows() {
            if row > 0 {
                writeln!(f)?;
            }
            for (i, symbol) in self.row(row).enumerate() {
                if i > 0 {
                    f.write_str(" | ")?;
                }
                write!(f, "{}", symbol)?;
            }
        }
        Ok(())
    }
}

/// Flattens a weight table into the multiset a reel is drawn from.
/// Ordered by symbol, so the result never depends on map insertion order.
pub fn population(weights: &BTreeMap<Symbol, u32>) -> Result<Vec<Symbol>, ConfigError> {
    if weights.is_empty() {
        return Err(ConfigError::NoSymbols);
    }
    let mut all = Vec::with_capacity(weights.values().map(|&w| w as usize).sum());
    for (symbol, &weight) in weights {
        if weight == 0 {
            return Err(ConfigError::ZeroWeight(symbol.clone()));
        }
        all.extend(std::iter::repeat(symbol.clone()).take(weight as usize));
    }
    Ok(all)
}

/// Builds a `rows` x `cols` grid. Each column draws from a fresh copy of the
/// population without replacement.
pub fn sample_grid<R: Rng + ?Sized>(
    rng: &mut R,
    rows: usize,
    cols: usize,
    weights: &BTreeMap<Symbol, u32>,
) -> Result<Grid, ConfigError> {
    if rows == 0 || cols == 0 {
        return Err(ConfigError::EmptyGrid { rows, cols });
    }
    let all = population(weights)?;
    if all.len() < rows {
        return Err(ConfigError::PopulationTooSmall {
            population: all.len(),
            rows,
        });
    }

    let mut columns = Vec::with_capacity(cols);
    for _ in 0..cols {
        let mut remaining = all.clone();
        let mut column = Vec::with_capacity(rows);
        for _ in 0..rows {
            let pick = rng.gen_range(0..remaining.len());
            column.push(remaining.swap_remove(pick));
        }
        columns.push(column);
    }

    let grid = Grid::from_columns(columns)?;
    debug!("sampled {}x{} grid {:?}", grid.rows(), grid.cols(), grid.columns());
    Ok(grid)
}

/// Result of evaluating one spin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub winnings: u64,
    /// 1-based, ascending.
    pub winning_lines: Vec<usize>,
}

impl Outcome {
    pub fn is_win(&self) -> bool {
        !self.winning_lines.is_empty()
    }
}

/// Pays every active row whose symbol matches across all columns.
pub fn evaluate(
    grid: &Grid,
    active_lines: usize,
    bet_per_line: u64,
    values: &BTreeMap<Symbol, u64>,
) -> Result<Outcome, ConfigError> {
    if active_lines > grid.rows() {
        return Err(ConfigError::LinesExceedRows {
            lines: active_lines,
            rows: grid.rows(),
        });
    }

    let mut outcome = Outcome::default();
    for line in 0..active_lines {
        if let Some(missing) = grid.row(line).find(|symbol| !values.contains_key(*symbol)) {
            return Err(ConfigError::MissingValue(missing.clone()));
        }
        let candidate = &grid.columns()[0][line];
        if grid.row(line).all(|symbol| symbol == candidate) {
            outcome.winnings += values[candidate] * bet_per_line;
            outcome.winning_lines.push(line + 1);
        }
    }

    debug!(
        "evaluated {} lines at {} each: {:?}",
        active_lines, bet_per_line, outcome
    );
    Ok(outcome)
}

/// Source of grids for a session.
pub trait Reels {
    fn spin(
        &mut self,
        rows: usize,
        cols: usize,
        weights: &BTreeMap<Symbol, u32>,
    ) -> Result<Grid, ConfigError>;
}

/// Reels backed by an injected random source.
pub struct RandomReels<R> {
    rng: R,
}

impl<R: Rng> RandomReels<R> {
    pub fn new(rng: R) -> Self {
        RandomReels { rng }
    }
}

impl<R: Rng> Reels for RandomReels<R> {
    fn spin(
        &mut self,
        rows: usize,
        cols: usize,
        weights: &BTreeMap<Symbol, u32>,
    ) -> Result<Grid, ConfigError> {
        sample_grid(&mut self.rng, rows, cols, weights)
    }
}
