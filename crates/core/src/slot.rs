//! Single-slot holder for the canonical match state
//!
//! The only way to change the held state is to swap in a whole new value, so
//! a reader on another task never observes a half-applied move.

use std::sync::{Arc, PoisonError, RwLock};

use crate::models::GameState;

pub struct StateSlot {
    current: RwLock<Arc<GameState>>,
}

impl StateSlot {
    pub fn new(state: GameState) -> Self {
        Self {
            current: RwLock::new(Arc::new(state)),
        }
    }

    /// Snapshot of the current state
    pub fn load(&self) -> Arc<GameState> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in `state`, returning the value it replaced
    pub fn replace(&self, state: GameState) -> Arc<GameState> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mode, Player};

    #[test]
    fn test_snapshot_survives_replace() {
        let slot = StateSlot::new(GameState::new(Mode::Local));
        let before = slot.load();

        let (next, _) = before.apply_move(2, Player::One).unwrap();
        let replaced = slot.replace(next.clone());

        assert!(Arc::ptr_eq(&before, &replaced));
        assert_eq!(before.move_count(), 0);
        assert_eq!(*slot.load(), next);
    }

    #[test]
    fn test_concurrent_readers_see_whole_states() {
        let slot = Arc::new(StateSlot::new(GameState::new(Mode::Local)));

        let writer = {
            let slot = slot.clone();
            std::thread::spawn(move || {
                for col in [0, 1, 2, 3, 4, 5, 6, 0, 1, 2] {
                    let current = slot.load();
                    let player = current.current_player();
                    let (next, _) = current.apply_move(col, player).unwrap();
                    slot.replace(next);
                }
            })
        };

        for _ in 0..1000 {
            let state = slot.load();
            assert_eq!(state.board().occupied(), state.move_count());
        }
        writer.join().unwrap();
        assert_eq!(slot.load().move_count(), 10);
    }
}
