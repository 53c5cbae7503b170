//! Minimax with alpha-beta pruning for the scripted opponent
//!
//! Columns are always tried in ascending order and a later column only
//! replaces the current best on a strict improvement, so the leftmost of
//! several equally good columns is the one played. Test fixtures depend on
//! this ordering.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::eval::{evaluate, MAX_HEURISTIC};
use crate::models::{GameState, Player, Winner};

/// Value of a finished match won by the searching side
pub const WIN_SCORE: i32 = 10_000_000;

const _: () = assert!(WIN_SCORE > MAX_HEURISTIC);

/// Search `depth` plies below `state` from `adversary`'s point of view.
///
/// Returns the minimax value and the best column at this node (`None` at the
/// horizon or at a finished match).
pub fn search(
    state: &GameState,
    depth: u32,
    alpha: i32,
    beta: i32,
    maximizing: bool,
    adversary: Player,
) -> (i32, Option<usize>) {
    let mut nodes = 0;
    minimax(state, depth, alpha, beta, maximizing, adversary, &mut nodes)
}

fn minimax(
    state: &GameState,
    depth: u32,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
    adversary: Player,
    nodes: &mut u64,
) -> (i32, Option<usize>) {
    *nodes += 1;

    if state.is_game_over() {
        let value = match state.winner() {
            Winner::Player(p) if p == adversary => WIN_SCORE,
            Winner::Draw => 0,
            _ => -WIN_SCORE,
        };
        return (value, None);
    }
    if depth == 0 {
        return (evaluate(state.board(), adversary), None);
    }

    let legal = state.legal_columns();
    if legal.is_empty() {
        return (evaluate(state.board(), adversary), None);
    }

    let mover = if maximizing { adversary } else { adversary.other() };
    let mut best = if maximizing { i32::MIN } else { i32::MAX };
    let mut best_column = None;

    for column in legal {
        let Ok((child, _)) = state.apply_move(column, mover) else {
            continue;
        };
        let (value, _) = minimax(&child, depth - 1, alpha, beta, !maximizing, adversary, nodes);

        if maximizing {
            if best_column.is_none() || value > best {
                best = value;
                best_column = Some(column);
            }
            alpha = alpha.max(best);
        } else {
            if best_column.is_none() || value < best {
                best = value;
                best_column = Some(column);
            }
            beta = beta.min(best);
        }

        if alpha >= beta {
            break;
        }
    }

    (best, best_column)
}

/// Picks moves for the scripted opponent
pub struct Adversary {
    rng: StdRng,
}

impl Adversary {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic random play, for tests and replays
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose a column for `state.current_player()` according to the state's level.
    ///
    /// `None` only when no column is playable.
    pub fn choose_move(&mut self, state: &GameState) -> Option<usize> {
        let legal = state.legal_columns();
        if legal.is_empty() {
            return None;
        }

        let level = state.adversary_level();
        let Some(depth) = level.search_depth() else {
            let column = legal.choose(&mut self.rng).copied();
            debug!(?level, ?column, "Adversary picked a random column");
            return column;
        };

        let mut nodes = 0;
        let (value, column) = minimax(
            state,
            depth,
            i32::MIN,
            i32::MAX,
            true,
            state.current_player(),
            &mut nodes,
        );
        debug!(?level, depth, ?column, value, nodes, "Adversary search finished");

        column.or_else(|| legal.first().copied())
    }
}

impl Default for Adversary {
    fn default() -> Self {
        Self::new()
    }
}
