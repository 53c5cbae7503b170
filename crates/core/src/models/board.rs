//! Board grid and cell values
//!
//! Row 0 is the top of the board. Pieces fall towards row `ROWS - 1`.

use serde::{Deserialize, Serialize};

use super::Player;

/// Number of rows on the board
pub const ROWS: usize = 6;

/// Number of columns on the board
pub const COLS: usize = 7;

/// Content of a single board cell.
///
/// Encoded on the wire and on disk as `0`, `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    #[default]
    Empty,
    Taken(Player),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// The player occupying this cell, if any
    pub fn player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::Taken(player) => Some(player),
        }
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> u8 {
        match cell {
            Cell::Empty => 0,
            Cell::Taken(player) => player.into(),
        }
    }
}

impl TryFrom<u8> for Cell {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Cell::Empty),
            other => Player::try_from(other)
                .map(Cell::Taken)
                .map_err(|_| format!("invalid cell value {}", other)),
        }
    }
}

/// 6x7 grid of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell at `row` (0 is the top) and `col`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= ROWS` or `col >= COLS`.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// A column is full once its top cell is taken. Out-of-range columns count as full.
    pub fn is_column_full(&self, col: usize) -> bool {
        col >= COLS || !self.cells[0][col].is_empty()
    }

    pub fn is_full(&self) -> bool {
        (0..COLS).all(|col| self.is_column_full(col))
    }

    /// Lowest empty row in a column
    pub fn landing_row(&self, col: usize) -> Option<usize> {
        if col >= COLS {
            return None;
        }
        (0..ROWS).rev().find(|&row| self.cells[row][col].is_empty())
    }

    /// Number of occupied cells
    pub fn occupied(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    /// Cells of one column, top to bottom. Empty for an out-of-range column.
    pub fn column(&self, col: usize) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().filter_map(move |row| row.get(col).copied())
    }

    /// Returns a copy with `player` dropped into `col`, plus the row it landed on.
    ///
    /// `None` when the column is out of range or full.
    pub(crate) fn with_piece(&self, col: usize, player: Player) -> Option<(Board, usize)> {
        let row = self.landing_row(col)?;
        let mut next = *self;
        next.cells[row][col] = Cell::Taken(player);
        Some((next, row))
    }

    /// True when some piece sits above an empty cell
    pub(crate) fn has_floating_piece(&self) -> bool {
        (0..COLS).any(|col| {
            let mut seen_piece = false;
            for row in 0..ROWS {
                let empty = self.cells[row][col].is_empty();
                if seen_piece && empty {
                    return true;
                }
                seen_piece |= !empty;
            }
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        assert_eq!(board.occupied(), 0);
        assert!(!board.is_full());
        for col in 0..COLS {
            assert_eq!(board.landing_row(col), Some(ROWS - 1));
        }
    }

    #[test]
    fn test_with_piece_stacks_from_the_bottom() {
        let board = Board::new();
        let (board, row) = board.with_piece(3, Player::One).unwrap();
        assert_eq!(row, 5);
        let (board, row) = board.with_piece(3, Player::Two).unwrap();
        assert_eq!(row, 4);
        assert_eq!(board.get(5, 3), Cell::Taken(Player::One));
        assert_eq!(board.get(4, 3), Cell::Taken(Player::Two));
        assert_eq!(board.occupied(), 2);
    }

    #[test]
    fn test_full_column() {
        let mut board = Board::new();
        for _ in 0..ROWS {
            board = board.with_piece(0, Player::One).unwrap().0;
        }
        assert!(board.is_column_full(0));
        assert!(board.with_piece(0, Player::Two).is_none());
        assert!(board.is_column_full(COLS));
    }

    #[test]
    fn test_column_out_of_range_is_empty() {
        let board = Board::new().with_piece(6, Player::One).unwrap().0;
        assert_eq!(board.column(6).filter(|c| !c.is_empty()).count(), 1);
        assert_eq!(board.column(COLS).count(), 0);
        assert_eq!(board.landing_row(COLS), None);
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_range_panics() {
        Board::new().get(ROWS, 0);
    }

    #[test]
    fn test_cell_encoding() {
        assert_eq!(u8::from(Cell::Empty), 0);
        assert_eq!(u8::from(Cell::Taken(Player::Two)), 2);
        assert_eq!(Cell::try_from(1), Ok(Cell::Taken(Player::One)));
        assert!(Cell::try_from(3).is_err());
    }

    #[test]
    fn test_board_serializes_as_nested_arrays() {
        let (board, _) = Board::new().with_piece(6, Player::Two).unwrap();
        let json = serde_json::to_value(board).unwrap();
        assert_eq!(json[5][6], 2);
        assert_eq!(json[0][0], 0);
        assert_eq!(json.as_array().unwrap().len(), ROWS);
    }

    #[test]
    fn test_floating_piece_detection() {
        let mut board = Board::new();
        assert!(!board.has_floating_piece());
        board.cells[2][4] = Cell::Taken(Player::One);
        assert!(board.has_floating_piece());
    }
}
