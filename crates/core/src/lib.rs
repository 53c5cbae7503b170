//! Fourfall Core Library
//!
//! Match state, win detection, the scripted opponent and save files.

pub mod error;
pub mod eval;
pub mod invariants;
pub mod models;
pub mod search;
pub mod slot;
pub mod storage;
pub mod win;

pub use error::{Error, InvalidMove, Result};
pub use models::*;
pub use search::{search, Adversary, WIN_SCORE};
pub use slot::StateSlot;
pub use storage::SaveFile;
pub use win::{check_winner, WinningLine};
