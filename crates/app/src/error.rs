//! Error types for the fourfall binary

use std::path::PathBuf;

use fourfall_core::InvalidMove;
use fourfall_net::Rejection;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Core error: {0}")]
    Core(#[from] fourfall_core::Error),

    #[error("Network error: {0}")]
    Net(#[from] fourfall_net::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    ConfigValidation(String),

    #[error("Invalid move: {0}")]
    InvalidMove(#[from] InvalidMove),

    #[error("{0}")]
    Rejected(#[from] Rejection),

    #[error("Not your turn")]
    NotYourTurn,

    #[error("No saved game at {0}")]
    NoSavedGame(PathBuf),

    #[error("Saved game is an online match; start a new one with host or join")]
    OnlineSave,

    #[error("Online matches are not saved")]
    OnlineNotSaved,

    #[error("Could not determine data directory")]
    NoDataDir,
}

pub type Result<T> = std::result::Result<T, AppError>;
