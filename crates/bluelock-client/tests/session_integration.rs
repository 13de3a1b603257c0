//! Integration tests for the stream session: the long-lived channel a
//! handheld keeps open to a bonded peer.
//!
//! # The session protocol
//!
//! Newline-delimited UTF-8 text over any bidirectional byte stream:
//!
//! ```text
//! Handheld                            Peer
//! ────────                            ────
//! AUTH:<pin>\n
//!                                     AUTH:OK\n  (or AUTH:FAIL\n)
//! CMD:UNLOCK:<pin>\n
//! CMD:LOCK\n
//!                                     METRICS:CPU=<n>;RAM=<n>\n  (pushed)
//! ```
//!
//! The peer side is played by the test over an in-memory duplex pipe, so
//! these tests cover exactly what a scripted peer would see on the wire and
//! what the connector publishes in response.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

use bluelock_client::infrastructure::stream_link::{
    AuthState, SessionStream, StreamMedium, StreamSessionConnector,
};
use bluelock_core::identity::PeerIdentity;
use bluelock_core::telemetry::Telemetry;

/// Hands out a pre-created in-memory stream once; the other end plays the
/// peer.
struct DuplexMedium {
    side: StdMutex<Option<DuplexStream>>,
}

impl DuplexMedium {
    fn new() -> (Arc<Self>, DuplexStream) {
        let (ours, theirs) = tokio::io::duplex(4096);
        (Arc::new(Self { side: StdMutex::new(Some(ours)) }), theirs)
    }
}

#[async_trait]
impl StreamMedium for DuplexMedium {
    async fn open(&self, _peer: &PeerIdentity) -> std::io::Result<Box<dyn SessionStream>> {
        match self.side.lock().unwrap().take() {
            Some(stream) => Ok(Box::new(stream)),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "stream already consumed",
            )),
        }
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

async fn connected_session() -> (StreamSessionConnector, DuplexStream) {
    let (medium, peer) = DuplexMedium::new();
    let connector = StreamSessionConnector::new(medium);
    connector
        .connect(&PeerIdentity::named("F0:0D:CA:FE:00:01", "Desk PC"))
        .await
        .expect("duplex connect cannot fail");
    (connector, peer)
}

// ── Authentication handshake ──────────────────────────────────────────────────

/// The full login conversation: PIN out, `AUTH:OK` back, session usable.
#[tokio::test(start_paused = true)]
async fn test_auth_handshake_happy_path() {
    // Arrange
    let (connector, mut peer) = connected_session().await;

    // Act: handheld submits the PIN; peer accepts.
    connector.send_pin("4711").await;
    let mut buf = vec![0u8; 64];
    let n = peer.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"AUTH:4711\n");
    peer.write_all(b"AUTH:OK\n").await.unwrap();
    settle().await;

    // Assert
    assert_eq!(*connector.auth().borrow(), AuthState::Authenticated);
    assert_eq!(*connector.status().borrow(), "Authenticated & Ready");
}

/// A rejected PIN leaves the stream open: the user may retry on the same
/// session, and a later `AUTH:OK` supersedes the failure.
#[tokio::test(start_paused = true)]
async fn test_auth_retry_on_same_session() {
    let (connector, mut peer) = connected_session().await;

    connector.send_pin("0000").await;
    peer.write_all(b"AUTH:FAIL\n").await.unwrap();
    settle().await;
    assert_eq!(*connector.auth().borrow(), AuthState::Failed);
    assert!(*connector.connected().borrow(), "stream must stay open for a retry");

    connector.send_pin("4711").await;
    peer.write_all(b"AUTH:OK\n").await.unwrap();
    settle().await;
    assert_eq!(*connector.auth().borrow(), AuthState::Authenticated);
}

// ── Commands and telemetry ────────────────────────────────────────────────────

/// Lock and unlock requests reach the peer as distinct protocol lines even
/// when sent back to back.
#[tokio::test(start_paused = true)]
async fn test_commands_arrive_as_protocol_lines() {
    let (connector, mut peer) = connected_session().await;

    connector.send_unlock("4711").await;
    connector.send_lock().await;

    let mut buf = vec![0u8; 64];
    let n = peer.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"CMD:UNLOCK:4711\nCMD:LOCK\n");
}

/// Telemetry interleaved with the auth reply is applied in arrival order,
/// including partial updates that leave the other gauge untouched.
#[tokio::test(start_paused = true)]
async fn test_telemetry_interleaved_with_auth() {
    let (connector, mut peer) = connected_session().await;

    peer.write_all(b"METRICS:CPU=35;RAM=70\nAUTH:OK\nMETRICS:RAM=72\n")
        .await
        .unwrap();
    settle().await;

    assert_eq!(*connector.auth().borrow(), AuthState::Authenticated);
    assert_eq!(*connector.telemetry().borrow(), Telemetry { cpu: 35, ram: 72 });
}

// ── Teardown ──────────────────────────────────────────────────────────────────

/// The peer closing its end tears the whole session down; the next send is
/// refused rather than silently dropped.
#[tokio::test(start_paused = true)]
async fn test_peer_hangup_then_send_is_refused() {
    let (connector, peer) = connected_session().await;

    drop(peer);
    settle().await;

    assert!(!*connector.connected().borrow());
    assert_eq!(*connector.auth().borrow(), AuthState::None);

    connector.send_lock().await;
    assert_eq!(*connector.status().borrow(), "Send Failed");
}

/// A deliberate close resets every observable field; the connector can
/// then connect again through a fresh medium.
#[tokio::test(start_paused = true)]
async fn test_close_resets_and_allows_reconnect() {
    let (connector, _peer) = connected_session().await;

    connector.close().await;

    assert!(!*connector.connected().borrow());
    assert!(!*connector.connecting().borrow());
    assert_eq!(*connector.auth().borrow(), AuthState::None);
    assert_eq!(*connector.status().borrow(), "Disconnected");

    // The one-shot medium is spent, so the retry fails cleanly too.
    let result = connector.connect(&PeerIdentity::new("F0:0D:CA:FE:00:01")).await;
    assert!(result.is_err());
    assert!(!*connector.connected().borrow());
}
