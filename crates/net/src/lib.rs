//! Fourfall Network Library
//!
//! Two-player match over a single TCP connection.
//!
//! # Architecture
//!
//! - **Listener / Connection**: the host accepts one peer, the client connects
//! - **Protocol**: length-prefixed JSON messages
//! - **Sync**: the host owns the canonical state and broadcasts it after every move
//!
//! # Usage
//!
//! ```ignore
//! // Host waits for an opponent
//! let listener = Listener::bind(([0, 0, 0, 0], DEFAULT_PORT).into()).await?;
//! let mut conn = listener.accept().await?;
//! let mut sync = SyncHandler::host(slot);
//!
//! while let Some(event) = conn.next_event().await {
//!     for reply in sync.handle(event).replies {
//!         conn.send(&reply).await?;
//!     }
//! }
//! ```

pub mod connection;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod sync;

pub use connection::{Connection, Listener, NetEvent, Sender};
pub use error::{Error, Result};
pub use frame::MAX_FRAME_SIZE;
pub use protocol::Message;
pub use sync::{Rejection, Role, SyncHandler, SyncNotice, SyncOutcome, CLIENT_PLAYER, HOST_PLAYER};

/// Default port for hosted matches
pub const DEFAULT_PORT: u16 = 50007;
