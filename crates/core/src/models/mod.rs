//! Domain models: board, players and the match state

mod board;
mod player;
mod state;

pub use board::{Board, Cell, COLS, ROWS};
pub use player::Player;
pub use state::{AdversaryLevel, GameState, LastMove, Mode, Winner};
