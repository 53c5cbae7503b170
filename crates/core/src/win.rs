//! Four-in-a-row detection
//!
//! Windows are visited in a fixed order so the reported line is stable:
//! horizontal, vertical, down-right diagonal, up-right diagonal. Within each
//! direction rows run top to bottom and columns left to right (vertical
//! windows go column-major).

use crate::models::{Board, Player, COLS, ROWS};

/// Four `(row, col)` coordinates along one direction
pub type Window = [(usize, usize); 4];

/// A completed line of four
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinningLine {
    pub player: Player,
    pub cells: Window,
}

fn window(row: usize, col: usize, d_row: isize, d_col: isize) -> Window {
    let at = |i: isize| {
        (
            (row as isize + d_row * i) as usize,
            (col as isize + d_col * i) as usize,
        )
    };
    [at(0), at(1), at(2), at(3)]
}

/// Every four-cell window on the board, in scan order
pub fn windows() -> impl Iterator<Item = Window> {
    let horizontal = (0..ROWS).flat_map(|r| (0..COLS - 3).map(move |c| window(r, c, 0, 1)));
    let vertical = (0..COLS).flat_map(|c| (0..ROWS - 3).map(move |r| window(r, c, 1, 0)));
    let down_right = (0..ROWS - 3).flat_map(|r| (0..COLS - 3).map(move |c| window(r, c, 1, 1)));
    let up_right = (3..ROWS).flat_map(|r| (0..COLS - 3).map(move |c| window(r, c, -1, 1)));

    horizontal.chain(vertical).chain(down_right).chain(up_right)
}

/// First line of four identical pieces, if any
pub fn check_winner(board: &Board) -> Option<WinningLine> {
    windows().find_map(|cells| {
        let player = board.get(cells[0].0, cells[0].1).player()?;
        cells[1..]
            .iter()
            .all(|&(r, c)| board.get(r, c).player() == Some(player))
            .then_some(WinningLine { player, cells })
    })
}

pub fn winner(board: &Board) -> Option<Player> {
    check_winner(board).map(|line| line.player)
}
