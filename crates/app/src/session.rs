//! A running match: canonical state, opponent search, network link and saving

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fourfall_core::{Adversary, GameState, Mode, SaveFile, StateSlot};
use fourfall_net::{Connection, Listener, Message, NetEvent, SyncHandler, SyncNotice};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{AppError, Result};

struct Link {
    conn: Connection,
    sync: SyncHandler,
}

/// Search running on the blocking pool over a snapshot of the state
struct PendingSearch {
    snapshot: Arc<GameState>,
    handle: JoinHandle<(Adversary, Option<usize>)>,
}

pub struct Session {
    slot: Arc<StateSlot>,
    save_file: SaveFile,
    link: Option<Link>,
    adversary: Option<Adversary>,
    search: Option<PendingSearch>,
    auto_save: Option<Duration>,
    last_save: Instant,
    final_saved: bool,
}

impl Session {
    /// Offline session over `state` (local or vs adversary)
    pub fn new(state: GameState, save_file: SaveFile, auto_save: Option<Duration>) -> Self {
        let final_saved = state.is_game_over();
        let adversary = (state.mode() == Mode::VsAdversary).then(Adversary::new);
        let mut session = Self {
            slot: Arc::new(StateSlot::new(state)),
            save_file,
            link: None,
            adversary,
            search: None,
            auto_save,
            last_save: Instant::now(),
            final_saved,
        };
        session.maybe_start_search();
        session
    }

    /// Continue the match stored in `save_file`
    pub fn resume(save_file: SaveFile, auto_save: Option<Duration>) -> Result<Self> {
        let state = save_file
            .load()?
            .ok_or_else(|| AppError::NoSavedGame(save_file.path().to_path_buf()))?;
        if state.mode().is_online() {
            return Err(AppError::OnlineSave);
        }
        info!(moves = state.move_count(), mode = ?state.mode(), "Resuming saved game");
        Ok(Self::new(state, save_file, auto_save))
    }

    /// Wait for one opponent on `listener` and host the match
    pub async fn host(
        listener: Listener,
        save_file: SaveFile,
        auto_save: Option<Duration>,
    ) -> Result<Self> {
        let conn = listener.accept().await?;
        let mut session = Self::new(GameState::new(Mode::OnlineHost), save_file, auto_save);
        session.link = Some(Link {
            conn,
            sync: SyncHandler::host(session.slot.clone()),
        });
        Ok(session)
    }

    /// Connect to a host and ask to join
    pub async fn join(
        addr: SocketAddr,
        timeout: Option<Duration>,
        save_file: SaveFile,
        auto_save: Option<Duration>,
    ) -> Result<Self> {
        let conn = Connection::connect(addr, timeout).await?;
        conn.send(&Message::JoinRequest {}).await?;

        let mut session = Self::new(GameState::new(Mode::OnlineClient), save_file, auto_save);
        session.link = Some(Link {
            conn,
            sync: SyncHandler::client(session.slot.clone()),
        });
        Ok(session)
    }

    pub fn state(&self) -> Arc<GameState> {
        self.slot.load()
    }

    pub fn save_file(&self) -> &SaveFile {
        &self.save_file
    }

    /// Whether the scripted opponent is searching
    pub fn is_thinking(&self) -> bool {
        self.search.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Play `column` for whoever this process controls
    pub async fn submit_move(&mut self, column: usize) -> Result<()> {
        let state = self.slot.load();

        match state.mode() {
            Mode::Local => {
                let (next, _) = state.apply_move(column, state.current_player())?;
                self.slot.replace(next);
            }
            Mode::VsAdversary => {
                if !state.is_local_turn() {
                    return Err(AppError::NotYourTurn);
                }
                let (next, _) = state.apply_move(column, state.local_player())?;
                self.slot.replace(next);
            }
            Mode::OnlineHost | Mode::OnlineClient => {
                let link = self
                    .link
                    .as_mut()
                    .ok_or(fourfall_net::Error::ConnectionClosed)?;
                // Host: applied and returned as a sync. Client: a proposal only.
                let msg = link.sync.local_move(column)?;
                link.conn.send(&msg).await?;
            }
        }

        self.after_change();
        Ok(())
    }

    fn maybe_start_search(&mut self) {
        if self.search.is_some() {
            return;
        }
        let snapshot = self.slot.load();
        if snapshot.mode() != Mode::VsAdversary
            || snapshot.is_game_over()
            || snapshot.is_local_turn()
        {
            return;
        }
        let Some(mut adversary) = self.adversary.take() else {
            return;
        };

        debug!(level = ?snapshot.adversary_level(), moves = snapshot.move_count(), "Starting search");
        let state = snapshot.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let column = adversary.choose_move(&state);
            (adversary, column)
        });
        self.search = Some(PendingSearch { snapshot, handle });
    }

    /// Apply a finished search, at most once. Returns the column played.
    pub async fn poll_search(&mut self) -> Option<usize> {
        if !self.search.as_ref()?.handle.is_finished() {
            return None;
        }
        let pending = self.search.take()?;

        let column = match pending.handle.await {
            Ok((adversary, column)) => {
                self.adversary = Some(adversary);
                column
            }
            Err(e) => {
                error!(error = %e, "Search task failed");
                self.adversary = Some(Adversary::new());
                None
            }
        };

        let current = self.slot.load();
        if !Arc::ptr_eq(&current, &pending.snapshot) {
            debug!("State changed during search, discarding result");
            self.maybe_start_search();
            return None;
        }

        let column = column?;
        let played = match current.apply_move(column, current.current_player()) {
            Ok((next, row)) => {
                info!(column, row, "Adversary moved");
                self.slot.replace(next);
                Some(column)
            }
            Err(e) => {
                warn!(error = %e, column, "Adversary chose an illegal column");
                None
            }
        };
        self.after_change();
        played
    }

    /// Next event from the peer. Pending forever when offline.
    pub async fn next_net_event(&mut self) -> Option<NetEvent> {
        match self.link.as_mut() {
            Some(link) => link.conn.next_event().await,
            None => std::future::pending().await,
        }
    }

    /// Feed one network event to the sync handler and send its replies
    pub async fn on_net_event(&mut self, event: NetEvent) -> Option<SyncNotice> {
        let link = self.link.as_mut()?;
        let outcome = link.sync.handle(event);

        for reply in &outcome.replies {
            if let Err(e) = link.conn.send(reply).await {
                warn!(error = %e, kind = reply.kind(), "Failed to send reply");
            }
        }

        match outcome.notice {
            Some(SyncNotice::Disconnected) => {
                info!("Opponent left the match");
                self.link = None;
            }
            Some(SyncNotice::StateReplaced) | Some(SyncNotice::PeerJoined) => self.after_change(),
            _ => {}
        }
        outcome.notice
    }

    /// Save if the auto-save interval has elapsed at `now`
    pub fn maybe_autosave(&mut self, now: Instant) -> Result<bool> {
        let Some(interval) = self.auto_save else {
            return Ok(false);
        };
        let state = self.slot.load();
        if state.mode().is_online() || state.is_game_over() || !state.first_turn_decided() {
            return Ok(false);
        }
        if now.saturating_duration_since(self.last_save) < interval {
            return Ok(false);
        }
        debug!("Auto-saving");
        self.save_at(now)?;
        Ok(true)
    }

    /// Write the match to the save file. Online matches are never saved, so
    /// they cannot replace a resumable local game.
    pub fn save(&mut self) -> Result<()> {
        if self.slot.load().mode().is_online() {
            return Err(AppError::OnlineNotSaved);
        }
        self.save_at(Instant::now())
    }

    fn save_at(&mut self, now: Instant) -> Result<()> {
        self.save_file.save(&self.slot.load())?;
        self.last_save = now;
        Ok(())
    }

    /// Save once when the match ends, then kick off the opponent if it is its turn
    fn after_change(&mut self) {
        let state = self.slot.load();
        if state.is_game_over() && !self.final_saved && !state.mode().is_online() {
            self.final_saved = true;
            if let Err(e) = self.save() {
                error!(error = %e, "Failed to save finished game");
            }
        }
        self.maybe_start_search();
    }

    /// Leave the match: save an offline game, or tell the peer we are gone
    #[instrument(skip(self))]
    pub async fn quit(mut self) -> Result<()> {
        match self.link.take() {
            Some(link) => {
                link.conn.close().await;
                Ok(())
            }
            None if self.slot.load().mode().is_online() => Ok(()),
            None => self.save(),
        }
    }
}
