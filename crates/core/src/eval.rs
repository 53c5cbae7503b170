//! Static position scoring used at the search horizon

use crate::models::{Board, Cell, Player, COLS, ROWS};
use crate::win::{windows, Window};

/// Bonus per own piece in the center column
const CENTER_WEIGHT: i32 = 6;

const FOUR: i32 = 1000;
const OPEN_THREE: i32 = 50;
const OPEN_TWO: i32 = 10;
const OPPONENT_OPEN_THREE: i32 = -80;

/// Upper bound on the absolute value `evaluate` can return
pub const MAX_HEURISTIC: i32 = 69 * FOUR + ROWS as i32 * CENTER_WEIGHT;

/// Score `board` from `player`'s point of view
pub fn evaluate(board: &Board, player: Player) -> i32 {
    let center = board
        .column(COLS / 2)
        .filter(|&cell| cell == Cell::Taken(player))
        .count() as i32
        * CENTER_WEIGHT;

    center
        + windows()
            .map(|window| score_window(board, &window, player))
            .sum::<i32>()
}

fn score_window(board: &Board, window: &Window, player: Player) -> i32 {
    let (mut own, mut opp, mut empty) = (0, 0, 0);
    for &(r, c) in window {
        match board.get(r, c).player() {
            Some(p) if p == player => own += 1,
            Some(_) => opp += 1,
            None => empty += 1,
        }
    }

    let mut score = match (own, empty) {
        (4, _) => FOUR,
        (3, 1) => OPEN_THREE,
        (2, 2) => OPEN_TWO,
        _ => 0,
    };
    if opp == 3 && empty == 1 {
        score += OPPONENT_OPEN_THREE;
    }
    score
}
