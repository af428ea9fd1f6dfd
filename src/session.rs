use std::collections::BTreeMap;

use log::{error, info, warn};

use crate::config::MachineConfig;
use crate::error::{ConfigError, SessionError, ValidationError};
use crate::slots::{evaluate, Grid, Outcome, Reels, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    CollectingBet,
    Spinning,
    Reporting,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wager {
    pub lines: usize,
    pub bet_per_line: u64,
}

impl Wager {
    pub fn total(&self) -> u64 {
        (self.lines as u64).saturating_mul(self.bet_per_line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PlaceBet(Wager),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinReport {
    pub grid: Grid,
    pub wager: Wager,
    pub outcome: Outcome,
    pub balance: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub spins: u64,
    pub wins: u64,
    pub total_wagered: u64,
    pub total_won: u64,
    pub final_balance: u64,
}

pub struct Session<R> {
    config: MachineConfig,
    weights: BTreeMap<Symbol, u32>,
    values: BTreeMap<Symbol, u64>,
    top_value: u64,
    reels: R,
    state: SessionState,
    balance: u64,
    summary: SessionSummary,
}

impl<R: Reels> Session<R> {
    /// `config` is expected to have passed [`MachineConfig::validate`].
    pub fn new(config: MachineConfig, deposit: u64, reels: R) -> Result<Self, ValidationError> {
        if deposit == 0 {
            return Err(ValidationError::NotPositive);
        }
        info!("session opened with ${}", deposit);
        Ok(Session {
            weights: config.weights(),
            values: config.values(),
            top_value: config.symbols.values().map(|s| s.value).max().unwrap_or(0),
            config,
            reels,
            state: SessionState::CollectingBet,
            balance: deposit,
            summary: SessionSummary {
                final_balance: deposit,
                ..Default::default()
            },
        })
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    pub fn validate_lines(&self, lines: usize) -> Result<(), ValidationError> {
        if lines == 0 || lines > self.config.max_lines {
            return Err(ValidationError::LinesOutOfRange {
                lines,
                max: self.config.max_lines,
            });
        }
        Ok(())
    }

    pub fn validate_bet(&self, bet: u64) -> Result<(), ValidationError> {
        if bet < self.config.min_bet || bet > self.config.max_bet {
            return Err(ValidationError::BetOutOfRange {
                bet,
                min: self.config.min_bet,
                max: self.config.max_bet,
            });
        }
        Ok(())
    }

    pub fn validate_wager(&self, wager: &Wager) -> Result<(), ValidationError> {
        self.validate_lines(wager.lines)?;
        self.validate_bet(wager.bet_per_line)?;
        let total = wager.total();
        if total > self.balance {
            return Err(ValidationError::InsufficientBalance {
                total,
                balance: self.balance,
            });
        }
        // The best possible spin pays every line at the top symbol value.
        let fits = self
            .top_value
            .checked_mul(total)
            .and_then(|jackpot| (self.balance - total).checked_add(jackpot))
            .is_some();
        if !fits {
            return Err(ValidationError::BalanceOverflow {
                total,
                balance: self.balance,
            });
        }
        Ok(())
    }

    /// Runs one command. `Ok(None)` means the session has ended.
    pub fn handle(&mut self, command: Command) -> Result<Option<SpinReport>, SessionError> {
        if self.state == SessionState::Terminated {
            return Err(ValidationError::SessionOver.into());
        }
        match command {
            Command::Quit => {
                self.state = SessionState::Terminated;
                info!(
                    "session closed after {} spins with ${}",
                    self.summary.spins, self.balance
                );
                Ok(None)
            }
            Command::PlaceBet(wager) => self.spin(wager).map(Some),
        }
    }

    fn spin(&mut self, wager: Wager) -> Result<SpinReport, SessionError> {
        if let Err(why) = self.validate_wager(&wager) {
            warn!("rejected wager {:?}: {}", wager, why);
            return Err(why.into());
        }

        self.state = SessionState::Spinning;
        let (grid, outcome) = match self.draw(&wager) {
            Ok(drawn) => drawn,
            Err(why) => {
                error!("machine is misconfigured, closing session: {}", why);
                self.state = SessionState::Terminated;
                return Err(why.into());
            }
        };

        self.state = SessionState::Reporting;
        let total = wager.total();
        self.balance = self.balance - total + outcome.winnings;
        self.summary.spins += 1;
        if outcome.is_win() {
            self.summary.wins += 1;
        }
        self.summary.total_wagered = self.summary.total_wagered.saturating_add(total);
        self.summary.total_won = self.summary.total_won.saturating_add(outcome.winnings);
        self.summary.final_balance = self.balance;
        info!(
            "bet ${} on {} lines, won ${} on {:?}, balance ${}",
            wager.bet_per_line, wager.lines, outcome.winnings, outcome.winning_lines, self.balance
        );

        self.state = SessionState::CollectingBet;
        Ok(SpinReport {
            grid,
            wager,
            outcome,
            balance: self.balance,
        })
    }

    fn draw(&mut self, wager: &Wager) -> Result<(Grid, Outcome), ConfigError> {
        let grid = self
            .reels
            .spin(self.config.rows, self.config.cols, &self.weights)?;
        let outcome = evaluate(&grid, wager.lines, wager.bet_per_line, &self.values)?;
        Ok((grid, outcome))
    }
}
