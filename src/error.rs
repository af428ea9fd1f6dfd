use thiserror::Error;

use crate::slots::Symbol;

/// Broken machine setup. Never retried; the caller aborts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid must have at least one row and one column (rows={rows}, cols={cols})")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("symbol table is empty")]
    NoSymbols,
    #[error("symbol {0} has a zero weight")]
    ZeroWeight(Symbol),
    #[error("symbol {0} has a zero value")]
    ZeroValue(Symbol),
    #[error("symbol population of {population} cannot fill a column of {rows} rows")]
    PopulationTooSmall { population: usize, rows: usize },
    #[error("{lines} active lines exceed the grid's {rows} rows")]
    LinesExceedRows { lines: usize, rows: usize },
    #[error("no value configured for symbol {0}")]
    MissingValue(Symbol),
    #[error("grid columns have uneven lengths")]
    RaggedGrid,
    #[error("max_lines must be at least 1")]
    NoLines,
    #[error("invalid bet range ${min} - ${max}")]
    BetRange { min: u64, max: u64 },
}

/// Bad input from the player. The console re-prompts on these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a number.")]
    NotANumber,
    #[error("Amount must be greater than 0.")]
    NotPositive,
    #[error("Enter a valid number of lines.")]
    LinesOutOfRange { lines: usize, max: usize },
    #[error("Amount must be between ${min} - ${max}.")]
    BetOutOfRange { bet: u64, min: u64, max: u64 },
    #[error("You do not have enough to bet that amount, your current balance is: ${balance}")]
    InsufficientBalance { total: u64, balance: u64 },
    #[error("That bet could win more than the machine can hold, your current balance is: ${balance}")]
    BalanceOverflow { total: u64, balance: u64 },
    #[error("the session has ended")]
    SessionOver,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}
