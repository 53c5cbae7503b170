//! Error types for fourfall core

use thiserror::Error;

/// Why a move could not be applied
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidMove {
    #[error("column {0} is out of range")]
    ColumnOutOfRange(usize),

    #[error("column {0} is full")]
    ColumnFull(usize),

    #[error("the match is already over")]
    GameOver,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid move: {0}")]
    InvalidMove(#[from] InvalidMove),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
