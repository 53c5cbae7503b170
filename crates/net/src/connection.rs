//! One peer-to-peer match connection
//!
//! The host binds a [`Listener`] and accepts exactly one peer; the client
//! calls [`Connection::connect`]. Either way the result is a [`Connection`]
//! with a background receive loop feeding [`NetEvent`]s into a channel and a
//! [`Sender`] whose writes are serialized by a single lock.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::Message;

/// Event delivered from the receive loop to the owning task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    /// A decoded message from the peer
    Message(Message),
    /// A frame arrived but could not be decoded; it was discarded
    ProtocolError(String),
    /// The stream closed or failed. Always the last event.
    Disconnected,
}

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Write side of a connection. Clones share one lock, so frames from
/// concurrent senders never interleave on the wire.
#[derive(Clone)]
pub struct Sender {
    writer: Arc<Mutex<BoxedWriter>>,
}

impl Sender {
    pub async fn send(&self, msg: &Message) -> Result<()> {
        let payload = msg
            .to_bytes()
            .map_err(|e| Error::Protocol(format!("Serialization failed: {}", e)))?;

        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, &payload).await?;
        debug!(kind = msg.kind(), bytes = payload.len(), "Sent frame");
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.writer.lock().await.shutdown().await?;
        Ok(())
    }
}

/// An established connection to the other player
pub struct Connection {
    peer: Option<SocketAddr>,
    sender: Sender,
    events: mpsc::Receiver<NetEvent>,
    receive_task: JoinHandle<()>,
}

impl Connection {
    /// Connect to a host. `timeout` bounds the connect attempt only.
    pub async fn connect(addr: SocketAddr, timeout: Option<Duration>) -> Result<Self> {
        info!(addr = %addr, "Connecting to host");

        let connecting = TcpStream::connect(addr);
        let stream = match timeout {
            Some(limit) => tokio::time::timeout(limit, connecting)
                .await
                .map_err(|_| Error::Timeout(limit))??,
            None => connecting.await?,
        };
        stream.set_nodelay(true)?;

        info!(addr = %addr, "Connected to host");
        Ok(Self::from_stream(stream, Some(addr)))
    }

    /// Wrap an already established stream and start its receive loop
    pub fn from_stream<S>(stream: S, peer: Option<SocketAddr>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let (event_tx, events) = mpsc::channel(64);

        let receive_task = tokio::spawn(receive_loop(reader, event_tx));
        let writer: BoxedWriter = Box::new(writer);

        Self {
            peer,
            sender: Sender {
                writer: Arc::new(Mutex::new(writer)),
            },
            events,
            receive_task,
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Handle for sending from other tasks
    pub fn sender(&self) -> Sender {
        self.sender.clone()
    }

    pub async fn send(&self, msg: &Message) -> Result<()> {
        self.sender.send(msg).await
    }

    /// Wait for the next event. `None` once the receive loop has finished and
    /// every event has been consumed.
    pub async fn next_event(&mut self) -> Option<NetEvent> {
        self.events.recv().await
    }

    /// Next event if one is already queued
    pub fn try_next_event(&mut self) -> Option<NetEvent> {
        self.events.try_recv().ok()
    }

    /// Tell the peer we are leaving and close the write side
    pub async fn close(self) {
        if let Err(e) = self.sender.send(&Message::Disconnect {}).await {
            debug!(error = %e, "Could not send disconnect");
        }
        if let Err(e) = self.sender.shutdown().await {
            debug!(error = %e, "Shutdown failed");
        }
        info!(peer = ?self.peer, "Connection closed");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.receive_task.abort();
    }
}

/// Receive loop: one frame at a time until the stream ends
async fn receive_loop<R>(mut reader: R, events: mpsc::Sender<NetEvent>)
where
    R: AsyncRead + Unpin,
{
    loop {
        let body = match read_frame(&mut reader).await {
            Ok(body) => body,
            Err(Error::ConnectionClosed) => {
                debug!("Peer closed connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Read error");
                break;
            }
        };

        let event = match Message::from_bytes(&body) {
            Ok(msg) => {
                debug!(kind = msg.kind(), bytes = body.len(), "Received frame");
                NetEvent::Message(msg)
            }
            Err(e) => {
                warn!(error = %e, bytes = body.len(), "Discarding undecodable frame");
                NetEvent::ProtocolError(format!("Invalid message: {}", e))
            }
        };

        if events.send(event).await.is_err() {
            debug!("Event receiver dropped");
            return;
        }
    }

    let _ = events.send(NetEvent::Disconnected).await;
}

/// Host side listener. Accepts a single peer for the lifetime of a match.
pub struct Listener {
    inner: TcpListener,
    addr: SocketAddr,
}

impl Listener {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let inner = TcpListener::bind(addr).await?;
        let addr = inner.local_addr()?;
        info!(addr = %addr, "Waiting for opponent");
        Ok(Self { inner, addr })
    }

    /// Bound address (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accept the one peer for this match. The listening socket is closed
    /// afterwards, so later attempts are refused.
    pub async fn accept(self) -> Result<Connection> {
        let (stream, peer) = self.inner.accept().await?;
        stream.set_nodelay(true)?;
        info!(peer = %peer, "Opponent connected");
        Ok(Connection::from_stream(stream, Some(peer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn localhost() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[tokio::test]
    async fn test_host_and_client_exchange_messages() {
        let listener = Listener::bind(localhost()).await.unwrap();
        let addr = listener.local_addr();
        assert!(addr.port() > 0);

        let accept = tokio::spawn(listener.accept());
        let mut client = Connection::connect(addr, Some(Duration::from_secs(5)))
            .await
            .unwrap();
        let mut host = accept.await.unwrap().unwrap();

        client.send(&Message::JoinRequest {}).await.unwrap();
        assert_eq!(
            host.next_event().await,
            Some(NetEvent::Message(Message::JoinRequest {}))
        );

        host.send(&Message::JoinAck {}).await.unwrap();
        assert_eq!(
            client.next_event().await,
            Some(NetEvent::Message(Message::JoinAck {}))
        );

        client.close().await;
        assert_eq!(
            host.next_event().await,
            Some(NetEvent::Message(Message::Disconnect {}))
        );
        assert_eq!(host.next_event().await, Some(NetEvent::Disconnected));
    }

    #[tokio::test]
    async fn test_large_message_delivered_in_pieces() {
        let overhead = Message::Error {
            message: String::new(),
        }
        .to_bytes()
        .unwrap()
        .len();
        let msg = Message::Error {
            message: "x".repeat(10_000 - overhead),
        };
        let body = msg.to_bytes().unwrap();
        assert_eq!(body.len(), 10_000);

        let mut wire = (body.len() as u32).to_be_bytes().to_vec();
        wire.extend_from_slice(&body);

        let (mut remote, local) = tokio::io::duplex(1024);
        let mut conn = Connection::from_stream(local, None);

        let writer = tokio::spawn(async move {
            for chunk in [&wire[..2], &wire[2..6_000], &wire[6_000..]] {
                remote.write_all(chunk).await.unwrap();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            remote
        });

        let event = conn.next_event().await.unwrap();
        assert_eq!(event, NetEvent::Message(msg.clone()));
        if let NetEvent::Message(received) = event {
            assert_eq!(received.to_bytes().unwrap(), body);
        }
        drop(writer.await.unwrap());
        assert_eq!(conn.next_event().await, Some(NetEvent::Disconnected));
    }

    #[tokio::test]
    async fn test_bad_frame_is_skipped() {
        let (mut remote, local) = tokio::io::duplex(1024);
        let mut conn = Connection::from_stream(local, None);

        let garbage = b"not json";
        let mut wire = (garbage.len() as u32).to_be_bytes().to_vec();
        wire.extend_from_slice(garbage);
        let good = Message::PlayerMove { column: 2 }.to_bytes().unwrap();
        wire.extend_from_slice(&(good.len() as u32).to_be_bytes());
        wire.extend_from_slice(&good);
        remote.write_all(&wire).await.unwrap();

        assert!(matches!(
            conn.next_event().await,
            Some(NetEvent::ProtocolError(_))
        ));
        assert_eq!(
            conn.next_event().await,
            Some(NetEvent::Message(Message::PlayerMove { column: 2 }))
        );

        drop(remote);
        assert_eq!(conn.next_event().await, Some(NetEvent::Disconnected));
    }

    #[tokio::test]
    async fn test_concurrent_sends_do_not_interleave() {
        let (remote, local) = tokio::io::duplex(256);
        let conn = Connection::from_stream(local, None);
        let mut peer = Connection::from_stream(remote, None);

        let mut tasks = Vec::new();
        for i in 0..20 {
            let sender = conn.sender();
            tasks.push(tokio::spawn(async move {
                let msg = Message::Error {
                    message: format!("{}-{}", i, "y".repeat(300)),
                };
                sender.send(&msg).await.unwrap();
            }));
        }

        let mut received = 0;
        while received < 20 {
            match peer.next_event().await {
                Some(NetEvent::Message(Message::Error { message })) => {
                    assert!(message.ends_with(&"y".repeat(300)));
                    received += 1;
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
        for task in tasks {
            task.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_connect_refused_is_an_error() {
        // Bind then drop to get a port nobody listens on
        let addr = {
            let listener = Listener::bind(localhost()).await.unwrap();
            listener.local_addr()
        };
        assert!(Connection::connect(addr, Some(Duration::from_secs(5)))
            .await
            .is_err());
    }
}
