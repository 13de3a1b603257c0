//! Stream-transport connector: the long-lived session channel to a bonded
//! peer.
//!
//! Runs the line-oriented session protocol over any bidirectional byte
//! stream supplied by a [`StreamMedium`]: PIN authentication, lock/unlock
//! commands, and telemetry pushed by the peer.  The RFCOMM-equivalent
//! binding is an embedder-supplied medium; [`tcp::TcpMedium`] covers
//! development and IP-reachable peers, and tests use an in-memory duplex
//! pipe.
//!
//! # Concurrency shape
//!
//! `connect` splits the stream: the write half stays behind an async mutex
//! for outbound commands, and the read half moves into a dedicated read-loop
//! task.  The loop exits on end-of-stream, on an I/O error, or when
//! `close()` flips the `connected` flag — whichever comes first — and
//! end-of-stream/error paths call `close()` themselves, so every exit
//! converges on the same torn-down state.
//!
//! All observable fields (`connected`, `connecting`, `auth`, `status`,
//! `telemetry`) are `watch` channels written only by this component.

pub mod tcp;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use bluelock_core::identity::PeerIdentity;
use bluelock_core::protocol::line::{parse_line, SessionCommand, SessionEvent};
use bluelock_core::telemetry::Telemetry;

/// Read-loop buffer size in bytes.
const READ_BUFFER_SIZE: usize = 1024;

/// Anything that can carry the session byte stream.
pub trait SessionStream: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> SessionStream for T {}

/// Platform boundary: opens a byte stream to a bonded peer.
#[async_trait]
pub trait StreamMedium: Send + Sync {
    async fn open(&self, peer: &PeerIdentity) -> std::io::Result<Box<dyn SessionStream>>;
}

/// Errors returned by [`StreamSessionConnector::connect`].
#[derive(Debug, Error)]
pub enum StreamLinkError {
    /// The medium could not open a stream to the peer.  The connector has
    /// already torn down all session state when this is returned.
    #[error("connection failed: {0}")]
    Connect(#[from] std::io::Error),
}

/// Authentication state of the session, set only by inbound protocol
/// messages and reset on disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    None,
    Authenticated,
    Failed,
}

struct SessionInner {
    medium: Arc<dyn StreamMedium>,
    writer: Mutex<Option<WriteHalf<Box<dyn SessionStream>>>>,
    connected_tx: watch::Sender<bool>,
    connecting_tx: watch::Sender<bool>,
    auth_tx: watch::Sender<AuthState>,
    status_tx: watch::Sender<String>,
    telemetry_tx: watch::Sender<Telemetry>,
}

/// The stream-transport session connector.
pub struct StreamSessionConnector {
    inner: Arc<SessionInner>,
}

impl StreamSessionConnector {
    pub fn new(medium: Arc<dyn StreamMedium>) -> Self {
        let (connected_tx, _) = watch::channel(false);
        let (connecting_tx, _) = watch::channel(false);
        let (auth_tx, _) = watch::channel(AuthState::None);
        let (status_tx, _) = watch::channel("Idle".to_string());
        let (telemetry_tx, _) = watch::channel(Telemetry::default());

        Self {
            inner: Arc::new(SessionInner {
                medium,
                writer: Mutex::new(None),
                connected_tx,
                connecting_tx,
                auth_tx,
                status_tx,
                telemetry_tx,
            }),
        }
    }

    /// Observes whether a session stream is live.
    pub fn connected(&self) -> watch::Receiver<bool> {
        self.inner.connected_tx.subscribe()
    }

    /// Observes whether a connect attempt is in flight.
    pub fn connecting(&self) -> watch::Receiver<bool> {
        self.inner.connecting_tx.subscribe()
    }

    /// Observes the session authentication state.
    pub fn auth(&self) -> watch::Receiver<AuthState> {
        self.inner.auth_tx.subscribe()
    }

    /// Observes the human-readable status line.
    pub fn status(&self) -> watch::Receiver<String> {
        self.inner.status_tx.subscribe()
    }

    /// Observes the latest peer telemetry.  Stale values persist until a
    /// newer sample overwrites them.
    pub fn telemetry(&self) -> watch::Receiver<Telemetry> {
        self.inner.telemetry_tx.subscribe()
    }

    /// Opens the session stream and starts the read loop.
    ///
    /// On failure every session flag is reset (full teardown) before the
    /// error is returned, so the caller can immediately retry.
    pub async fn connect(&self, peer: &PeerIdentity) -> Result<(), StreamLinkError> {
        let inner = &self.inner;
        inner.connecting_tx.send_replace(true);
        inner
            .status_tx
            .send_replace(format!("Connecting to {}...", peer.label()));

        match inner.medium.open(peer).await {
            Ok(stream) => {
                let (reader, writer) = tokio::io::split(stream);
                *inner.writer.lock().await = Some(writer);
                inner.connected_tx.send_replace(true);
                inner.connecting_tx.send_replace(false);
                inner.status_tx.send_replace("Connected! Enter PIN.".to_string());
                info!(peer = %peer, "session stream established");

                tokio::spawn(SessionInner::read_loop(Arc::clone(inner), reader));
                Ok(())
            }
            Err(e) => {
                warn!(peer = %peer, error = %e, "session connect failed");
                inner.status_tx.send_replace(format!("Connection Failed: {e}"));
                inner.close().await;
                Err(StreamLinkError::Connect(e))
            }
        }
    }

    /// Submits the session PIN for verification (`AUTH:<pin>`).
    pub async fn send_pin(&self, pin: &str) {
        self.send(SessionCommand::Auth(pin.to_string())).await;
    }

    /// Requests a peer lock (`CMD:LOCK`).
    pub async fn send_lock(&self) {
        self.send(SessionCommand::Lock).await;
    }

    /// Requests a peer unlock with a credential payload
    /// (`CMD:UNLOCK:<pin>`).
    pub async fn send_unlock(&self, pin: &str) {
        self.send(SessionCommand::Unlock(pin.to_string())).await;
    }

    async fn send(&self, command: SessionCommand) {
        let mut guard = self.inner.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            self.inner.status_tx.send_replace("Send Failed".to_string());
            return;
        };
        let line = command.to_line();
        let result: std::io::Result<()> = async {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await
        }
        .await;
        if let Err(e) = result {
            warn!(error = %e, "session send failed");
            self.inner.status_tx.send_replace("Send Failed".to_string());
        }
    }

    /// Tears the session down.  Idempotent: a second call leaves the
    /// already-reset state unchanged and raises no error.
    pub async fn close(&self) {
        self.inner.close().await;
    }
}

impl SessionInner {
    async fn read_loop(self: Arc<Self>, mut reader: ReadHalf<Box<dyn SessionStream>>) {
        let mut connected_rx = self.connected_tx.subscribe();
        let mut buf = [0u8; READ_BUFFER_SIZE];

        while *self.connected_tx.borrow() {
            tokio::select! {
                read = reader.read(&mut buf) => match read {
                    Ok(0) => {
                        debug!("peer closed session stream");
                        self.close().await;
                        break;
                    }
                    Ok(n) => self.handle_chunk(&buf[..n]),
                    Err(e) => {
                        warn!(error = %e, "session read failed");
                        self.close().await;
                        break;
                    }
                },
                _ = connected_rx.changed() => {
                    // close() flipped the flag; fall through to the loop
                    // condition.
                }
            }
        }
        debug!("session read loop exited");
    }

    fn handle_chunk(&self, chunk: &[u8]) {
        let text = String::from_utf8_lossy(chunk);
        for line in text.lines() {
            match parse_line(line) {
                SessionEvent::Metrics(update) => {
                    // A fully malformed metrics line parses to an empty
                    // update; skip the notification rather than waking
                    // observers with an unchanged value.
                    if !update.is_empty() {
                        self.telemetry_tx.send_modify(|t| t.apply(update));
                    }
                }
                SessionEvent::AuthOk => {
                    self.auth_tx.send_replace(AuthState::Authenticated);
                    self.status_tx.send_replace("Authenticated & Ready".to_string());
                }
                SessionEvent::AuthFail => {
                    self.auth_tx.send_replace(AuthState::Failed);
                    self.status_tx.send_replace("Wrong PIN!".to_string());
                }
                SessionEvent::Other(other) => {
                    debug!(line = %other, "ignoring session line");
                }
            }
        }
    }

    async fn close(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                debug!(error = %e, "stream shutdown failed");
            }
        }
        self.connected_tx.send_replace(false);
        self.connecting_tx.send_replace(false);
        self.auth_tx.send_replace(AuthState::None);
        self.status_tx.send_replace("Disconnected".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::io::DuplexStream;

    /// A medium that hands out a pre-created in-memory duplex stream once.
    struct DuplexMedium {
        side: StdMutex<Option<DuplexStream>>,
    }

    impl DuplexMedium {
        /// Returns the medium plus the test's end of the pipe.
        fn new() -> (Arc<Self>, DuplexStream) {
            let (ours, theirs) = tokio::io::duplex(4096);
            (Arc::new(Self { side: StdMutex::new(Some(ours)) }), theirs)
        }

        /// A medium whose `open` always fails.
        fn broken() -> Arc<Self> {
            Arc::new(Self { side: StdMutex::new(None) })
        }
    }

    #[async_trait]
    impl StreamMedium for DuplexMedium {
        async fn open(&self, _peer: &PeerIdentity) -> std::io::Result<Box<dyn SessionStream>> {
            match self.side.lock().unwrap().take() {
                Some(stream) => Ok(Box::new(stream)),
                None => Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "peer unreachable",
                )),
            }
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    async fn connected_session() -> (StreamSessionConnector, DuplexStream) {
        let (medium, peer_side) = DuplexMedium::new();
        let connector = StreamSessionConnector::new(medium);
        connector
            .connect(&PeerIdentity::new("AA:BB"))
            .await
            .expect("duplex connect cannot fail");
        (connector, peer_side)
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_flips_flags_and_greets() {
        let (connector, _peer) = connected_session().await;

        assert!(*connector.connected().borrow());
        assert!(!*connector.connecting().borrow());
        assert_eq!(*connector.status().borrow(), "Connected! Enter PIN.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_tears_down_before_returning() {
        let connector = StreamSessionConnector::new(DuplexMedium::broken());

        let result = connector.connect(&PeerIdentity::new("AA:BB")).await;

        assert!(result.is_err());
        assert!(!*connector.connected().borrow());
        assert!(!*connector.connecting().borrow());
        assert_eq!(*connector.auth().borrow(), AuthState::None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outbound_lines_reach_the_peer() {
        let (connector, mut peer) = connected_session().await;

        connector.send_pin("1234").await;
        connector.send_lock().await;
        connector.send_unlock("1234").await;

        let mut buf = vec![0u8; 128];
        let n = peer.read(&mut buf).await.unwrap();
        let received = String::from_utf8_lossy(&buf[..n]).to_string();
        assert_eq!(received, "AUTH:1234\nCMD:LOCK\nCMD:UNLOCK:1234\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_fail_then_ok_is_last_message_wins() {
        let (connector, mut peer) = connected_session().await;

        peer.write_all(b"AUTH:FAIL\n").await.unwrap();
        settle().await;
        assert_eq!(*connector.auth().borrow(), AuthState::Failed);
        assert_eq!(*connector.status().borrow(), "Wrong PIN!");

        // No lockout: a later success still authenticates.
        peer.write_all(b"AUTH:OK\n").await.unwrap();
        settle().await;
        assert_eq!(*connector.auth().borrow(), AuthState::Authenticated);
        assert_eq!(*connector.status().borrow(), "Authenticated & Ready");
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics_update_telemetry_with_clamping() {
        let (connector, mut peer) = connected_session().await;

        peer.write_all(b"METRICS:CPU=150;RAM=-5\n").await.unwrap();
        settle().await;

        assert_eq!(*connector.telemetry().borrow(), Telemetry { cpu: 100, ram: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_telemetry_persists_across_partial_updates() {
        let (connector, mut peer) = connected_session().await;

        peer.write_all(b"METRICS:CPU=40;RAM=60\n").await.unwrap();
        settle().await;
        peer.write_all(b"METRICS:CPU=55\n").await.unwrap();
        settle().await;

        // RAM keeps its previous sample; only CPU moved.
        assert_eq!(*connector.telemetry().borrow(), Telemetry { cpu: 55, ram: 60 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_metrics_do_not_kill_the_read_loop() {
        let (connector, mut peer) = connected_session().await;

        peer.write_all(b"METRICS:CPU=abc;RAM=oops\n").await.unwrap();
        settle().await;
        assert!(*connector.connected().borrow(), "loop must survive bad input");

        peer.write_all(b"METRICS:CPU=7;RAM=8\n").await.unwrap();
        settle().await;
        assert_eq!(*connector.telemetry().borrow(), Telemetry { cpu: 7, ram: 8 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_peer_hangup_closes_the_session() {
        let (connector, peer) = connected_session().await;

        drop(peer);
        settle().await;

        assert!(!*connector.connected().borrow());
        assert_eq!(*connector.auth().borrow(), AuthState::None);
        assert_eq!(*connector.status().borrow(), "Disconnected");
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_twice_is_safe() {
        let (connector, _peer) = connected_session().await;

        connector.close().await;
        connector.close().await;

        assert!(!*connector.connected().borrow());
        assert_eq!(*connector.auth().borrow(), AuthState::None);
        assert_eq!(*connector.status().borrow(), "Disconnected");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_after_close_reports_send_failed() {
        let (connector, _peer) = connected_session().await;
        connector.close().await;

        connector.send_lock().await;

        assert_eq!(*connector.status().borrow(), "Send Failed");
    }
}
