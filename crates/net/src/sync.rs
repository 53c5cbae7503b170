//! Host-authoritative match synchronization
//!
//! The host is the only process that writes canonical state. A client
//! proposes moves and renders whatever state the host last sent. Every
//! accepted move is followed by a full `GameStateSync`, never a diff, so a
//! single lost or reordered frame is repaired by the next one.

use std::sync::Arc;

use fourfall_core::{GameState, InvalidMove, Mode, Player, StateSlot, COLS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::connection::NetEvent;
use crate::protocol::Message;

/// Player identity of the hosting process
pub const HOST_PLAYER: Player = Player::One;

/// Player identity assigned to the joining peer
pub const CLIENT_PLAYER: Player = Player::Two;

/// Which side of the connection this process is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Client,
}

impl Role {
    pub fn player(self) -> Player {
        match self {
            Role::Host => HOST_PLAYER,
            Role::Client => CLIENT_PLAYER,
        }
    }

    pub fn mode(self) -> Mode {
        match self {
            Role::Host => Mode::OnlineHost,
            Role::Client => Mode::OnlineClient,
        }
    }
}

/// Why a move was refused. The display text is sent as `MoveRejected.reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Game is over")]
    GameOver,

    #[error("Match has not started")]
    NotStarted,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Column out of range")]
    ColumnOutOfRange,

    #[error("Column is full")]
    ColumnFull,
}

impl From<InvalidMove> for Rejection {
    fn from(e: InvalidMove) -> Self {
        match e {
            InvalidMove::ColumnOutOfRange(_) => Rejection::ColumnOutOfRange,
            InvalidMove::ColumnFull(_) => Rejection::ColumnFull,
            InvalidMove::GameOver => Rejection::GameOver,
        }
    }
}

/// Something the owner of the handler should know about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
    /// Host: the peer joined and has been sent the state
    PeerJoined,
    /// Client: the host acknowledged the join
    Joined,
    /// The canonical state in the slot was replaced
    StateReplaced,
    /// Our proposed move was refused
    MoveRejected(String),
    /// Informational failure from the peer or the transport
    Error(String),
    /// The connection is gone. No reconnect is attempted.
    Disconnected,
}

/// Result of handling one event
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Messages to send back to the peer, in order
    pub replies: Vec<Message>,
    pub notice: Option<SyncNotice>,
}

impl SyncOutcome {
    fn notice(notice: SyncNotice) -> Self {
        Self {
            replies: Vec::new(),
            notice: Some(notice),
        }
    }

    fn reply(msg: Message) -> Self {
        Self {
            replies: vec![msg],
            notice: None,
        }
    }
}

/// Interprets protocol events and owns writes to the canonical state slot
pub struct SyncHandler {
    role: Role,
    slot: Arc<StateSlot>,
    rng: StdRng,
}

impl SyncHandler {
    pub fn host(slot: Arc<StateSlot>) -> Self {
        Self::new(Role::Host, slot)
    }

    pub fn client(slot: Arc<StateSlot>) -> Self {
        Self::new(Role::Client, slot)
    }

    fn new(role: Role, slot: Arc<StateSlot>) -> Self {
        Self {
            role,
            slot,
            rng: StdRng::from_entropy(),
        }
    }

    /// Fix the coin flip for the opening player (tests)
    pub fn seeded(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn slot(&self) -> &Arc<StateSlot> {
        &self.slot
    }

    /// Dispatch one event from the connection
    pub fn handle(&mut self, event: NetEvent) -> SyncOutcome {
        match event {
            NetEvent::Message(msg) => self.handle_message(msg),
            NetEvent::ProtocolError(e) => {
                warn!(error = %e, "Protocol error from peer");
                SyncOutcome::notice(SyncNotice::Error(e))
            }
            NetEvent::Disconnected => {
                info!(role = ?self.role, "Peer disconnected");
                SyncOutcome::notice(SyncNotice::Disconnected)
            }
        }
    }

    fn handle_message(&mut self, msg: Message) -> SyncOutcome {
        match (self.role, msg) {
            (Role::Host, Message::JoinRequest {}) => self.accept_join(),
            (Role::Host, Message::PlayerMove { column }) => {
                match self.apply(column, CLIENT_PLAYER) {
                    Ok(sync) => SyncOutcome {
                        replies: vec![sync],
                        notice: Some(SyncNotice::StateReplaced),
                    },
                    Err(rejection) => {
                        debug!(column, reason = %rejection, "Rejected peer move");
                        SyncOutcome::reply(Message::MoveRejected {
                            reason: rejection.to_string(),
                        })
                    }
                }
            }
            (Role::Host, Message::GameStateSync { .. }) => {
                warn!("Peer tried to publish match state");
                SyncOutcome::reply(Message::Error {
                    message: "Only the host may publish match state".into(),
                })
            }
            (Role::Client, Message::GameStateSync { state }) => {
                let moves = state.move_count();
                self.slot
                    .replace(state.localized(Mode::OnlineClient, CLIENT_PLAYER));
                debug!(moves, "Replaced state from host");
                SyncOutcome::notice(SyncNotice::StateReplaced)
            }
            (Role::Client, Message::JoinAck {}) => {
                info!("Joined host's match");
                SyncOutcome::notice(SyncNotice::Joined)
            }
            (_, Message::MoveRejected { reason }) => {
                info!(reason = %reason, "Move rejected by host");
                SyncOutcome::notice(SyncNotice::MoveRejected(reason))
            }
            (_, Message::Error { message }) => {
                warn!(message = %message, "Peer reported an error");
                SyncOutcome::notice(SyncNotice::Error(message))
            }
            (_, Message::Disconnect {}) => {
                info!("Peer is leaving");
                SyncOutcome::notice(SyncNotice::Disconnected)
            }
            (role, msg) => {
                debug!(?role, kind = msg.kind(), "Ignoring unexpected message");
                SyncOutcome::default()
            }
        }
    }

    /// Host: decide the opening player once, then send the full state
    fn accept_join(&mut self) -> SyncOutcome {
        let state = self.slot.load();
        if !state.first_turn_decided() {
            let first = if self.rng.gen_bool(0.5) {
                Player::One
            } else {
                Player::Two
            };
            self.slot.replace(state.with_first_turn(first));
            info!(first = %first, "Opening player decided");
        }

        SyncOutcome {
            replies: vec![
                Message::JoinAck {},
                Message::GameStateSync {
                    state: (*self.slot.load()).clone(),
                },
            ],
            notice: Some(SyncNotice::PeerJoined),
        }
    }

    /// A move made by this process.
    ///
    /// On the host the move is validated and applied exactly like a peer move
    /// and the returned message is the broadcast. On a client nothing is
    /// applied; the returned `PlayerMove` is a proposal for the host.
    pub fn local_move(&mut self, column: usize) -> Result<Message, Rejection> {
        match self.role {
            Role::Host => self.apply(column, HOST_PLAYER),
            Role::Client => {
                validate(&self.slot.load(), column, CLIENT_PLAYER)?;
                Ok(Message::PlayerMove { column })
            }
        }
    }

    /// Host path shared by local and peer moves
    fn apply(&self, column: usize, player: Player) -> Result<Message, Rejection> {
        let state = self.slot.load();
        validate(&state, column, player)?;

        let (next, row) = state.apply_move(column, player)?;
        info!(player = %player, column, row, "Move accepted");
        self.slot.replace(next.clone());

        Ok(Message::GameStateSync { state: next })
    }
}

fn validate(state: &GameState, column: usize, player: Player) -> Result<(), Rejection> {
    if state.is_game_over() {
        return Err(Rejection::GameOver);
    }
    if !state.first_turn_decided() {
        return Err(Rejection::NotStarted);
    }
    if state.current_player() != player {
        return Err(Rejection::NotYourTurn);
    }
    if column >= COLS {
        return Err(Rejection::ColumnOutOfRange);
    }
    if state.board().is_column_full(column) {
        return Err(Rejection::ColumnFull);
    }
    Ok(())
}
