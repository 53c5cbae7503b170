//! Immutable match state
//!
//! A `GameState` is never modified after construction. Every accepted move
//! produces a new value via [`GameState::apply_move`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Board, Cell, Player, COLS, ROWS};
use crate::error::{Error, InvalidMove, Result};
use crate::invariants;
use crate::win::{self, WinningLine};

/// How the match is being played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Local,
    VsAdversary,
    OnlineHost,
    OnlineClient,
}

impl Mode {
    pub fn is_online(self) -> bool {
        matches!(self, Mode::OnlineHost | Mode::OnlineClient)
    }
}

/// Strength of the scripted opponent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdversaryLevel {
    #[default]
    Easy,
    #[serde(alias = "MED")]
    Medium,
    Hard,
}

impl AdversaryLevel {
    /// Search depth for this level. `None` means random play.
    pub fn search_depth(self) -> Option<u32> {
        match self {
            AdversaryLevel::Easy => None,
            AdversaryLevel::Medium => Some(4),
            AdversaryLevel::Hard => Some(5),
        }
    }
}

impl FromStr for AdversaryLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(AdversaryLevel::Easy),
            "med" | "medium" => Ok(AdversaryLevel::Medium),
            "hard" => Ok(AdversaryLevel::Hard),
            other => Err(format!("unknown adversary level '{}'", other)),
        }
    }
}

/// Result of the match. Encoded as `0` (none), `1`, `2` or `3` (draw).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Winner {
    #[default]
    None,
    Player(Player),
    Draw,
}

impl From<Winner> for u8 {
    fn from(winner: Winner) -> u8 {
        match winner {
            Winner::None => 0,
            Winner::Player(player) => player.into(),
            Winner::Draw => 3,
        }
    }
}

impl TryFrom<u8> for Winner {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Winner::None),
            3 => Ok(Winner::Draw),
            other => Player::try_from(other)
                .map(Winner::Player)
                .map_err(|_| format!("invalid winner {}", other)),
        }
    }
}

/// Most recently placed piece. Encoded as `[column, row, player]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize, Player)", into = "(usize, usize, Player)")]
pub struct LastMove {
    pub column: usize,
    pub row: usize,
    pub player: Player,
}

impl From<(usize, usize, Player)> for LastMove {
    fn from((column, row, player): (usize, usize, Player)) -> Self {
        Self { column, row, player }
    }
}

impl From<LastMove> for (usize, usize, Player) {
    fn from(m: LastMove) -> Self {
        (m.column, m.row, m.player)
    }
}

/// One point in a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawGameState")]
pub struct GameState {
    board: Board,
    current_player: Player,
    game_over: bool,
    winner: Winner,
    move_count: usize,
    mode: Mode,
    adversary_level: AdversaryLevel,
    last_move: Option<LastMove>,
    local_player: Player,
    first_turn_decided: bool,
}

/// Wire/disk shape of a `GameState`, checked before it becomes one.
///
/// Every field is required, `lastMove` included (it may be `null`).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawGameState {
    board: Board,
    current_player: Player,
    game_over: bool,
    winner: Winner,
    move_count: usize,
    mode: Mode,
    adversary_level: AdversaryLevel,
    #[serde(deserialize_with = "Option::deserialize")]
    last_move: Option<LastMove>,
    local_player: Player,
    first_turn_decided: bool,
}

impl TryFrom<RawGameState> for GameState {
    type Error = String;

    fn try_from(raw: RawGameState) -> std::result::Result<Self, Self::Error> {
        let state = GameState {
            board: raw.board,
            current_player: raw.current_player,
            game_over: raw.game_over,
            winner: raw.winner,
            move_count: raw.move_count,
            mode: raw.mode,
            adversary_level: raw.adversary_level,
            last_move: raw.last_move,
            local_player: raw.local_player,
            first_turn_decided: raw.first_turn_decided,
        };
        match state.inconsistency() {
            Some(reason) => Err(reason),
            None => Ok(state),
        }
    }
}

impl GameState {
    /// Empty board for a new match in the given mode
    pub fn new(mode: Mode) -> Self {
        let local_player = match mode {
            Mode::OnlineClient => Player::Two,
            _ => Player::One,
        };
        Self {
            board: Board::new(),
            current_player: Player::One,
            game_over: false,
            winner: Winner::None,
            move_count: 0,
            mode,
            adversary_level: AdversaryLevel::default(),
            last_move: None,
            local_player,
            // Online matches decide the opening player when the peer joins
            first_turn_decided: !mode.is_online(),
        }
    }

    pub fn vs_adversary(level: AdversaryLevel) -> Self {
        Self {
            adversary_level: level,
            ..Self::new(Mode::VsAdversary)
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn winner(&self) -> Winner {
        self.winner
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn adversary_level(&self) -> AdversaryLevel {
        self.adversary_level
    }

    pub fn last_move(&self) -> Option<LastMove> {
        self.last_move
    }

    pub fn local_player(&self) -> Player {
        self.local_player
    }

    pub fn first_turn_decided(&self) -> bool {
        self.first_turn_decided
    }

    /// Non-full columns in ascending order. Empty once the match is over.
    pub fn legal_columns(&self) -> Vec<usize> {
        if self.game_over {
            return Vec::new();
        }
        (0..COLS)
            .filter(|&col| !self.board.is_column_full(col))
            .collect()
    }

    /// Drop a piece for `player` into `column`.
    ///
    /// Returns the new state and the row the piece landed on. `self` is left untouched.
    pub fn apply_move(
        &self,
        column: usize,
        player: Player,
    ) -> std::result::Result<(GameState, usize), InvalidMove> {
        if self.game_over {
            return Err(InvalidMove::GameOver);
        }
        if column >= COLS {
            return Err(InvalidMove::ColumnOutOfRange(column));
        }
        let (board, row) = self
            .board
            .with_piece(column, player)
            .ok_or(InvalidMove::ColumnFull(column))?;

        let move_count = self.move_count + 1;
        let winner = match win::winner(&board) {
            Some(p) => Winner::Player(p),
            None if move_count >= ROWS * COLS => Winner::Draw,
            None => Winner::None,
        };

        let next = GameState {
            board,
            current_player: player.other(),
            game_over: winner != Winner::None,
            winner,
            move_count,
            last_move: Some(LastMove {
                column,
                row,
                player,
            }),
            ..self.clone()
        };

        invariants::assert_transition_invariants(self, &next);
        Ok((next, row))
    }

    /// Copy with the opening player fixed. Used once per online match.
    pub fn with_first_turn(&self, player: Player) -> GameState {
        GameState {
            current_player: player,
            first_turn_decided: true,
            ..self.clone()
        }
    }

    /// Copy with the per-process fields rewritten for this side of a connection
    pub fn localized(&self, mode: Mode, local_player: Player) -> GameState {
        GameState {
            mode,
            local_player,
            ..self.clone()
        }
    }

    /// Four cells that won the match, for highlighting
    pub fn winning_line(&self) -> Option<WinningLine> {
        win::check_winner(&self.board)
    }

    /// Whether the process owning this state may act for `current_player` right now
    pub fn is_local_turn(&self) -> bool {
        !self.game_over && self.current_player == self.local_player
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<GameState> {
        serde_json::from_str(json).map_err(Error::from)
    }

    /// Describes the first broken invariant, if any
    pub(crate) fn inconsistency(&self) -> Option<String> {
        let occupied = self.board.occupied();
        if self.move_count != occupied {
            return Some(format!(
                "moveCount {} does not match {} occupied cells",
                self.move_count, occupied
            ));
        }
        if self.board.has_floating_piece() {
            return Some("board has a piece above an empty cell".into());
        }

        let line = win::winner(&self.board);
        let expected = match line {
            Some(p) => Winner::Player(p),
            None if self.board.is_full() => Winner::Draw,
            None => Winner::None,
        };
        if self.winner != expected {
            return Some(format!(
                "winner {:?} does not match board ({:?})",
                self.winner, expected
            ));
        }
        if self.game_over != (expected != Winner::None) {
            return Some(format!(
                "gameOver {} does not match board outcome {:?}",
                self.game_over, expected
            ));
        }

        if let Some(m) = self.last_move {
            if m.column >= COLS || m.row >= ROWS {
                return Some(format!("lastMove ({}, {}) is off the board", m.column, m.row));
            }
            if self.board.get(m.row, m.column) != Cell::Taken(m.player) {
                return Some(format!(
                    "lastMove ({}, {}) does not hold a piece of {}",
                    m.column, m.row, m.player
                ));
            }
        }
        None
    }
}
