//! TCP implementation of [`StreamMedium`].
//!
//! Interprets the peer address as `host:port`.  This is the development and
//! IP-reachable-peer transport; the RFCOMM-equivalent Bluetooth binding is a
//! platform adapter supplied by the embedder and speaks the same session
//! protocol.

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use bluelock_core::identity::PeerIdentity;

use super::{SessionStream, StreamMedium};

/// Opens plain TCP streams.
#[derive(Debug, Default)]
pub struct TcpMedium;

#[async_trait]
impl StreamMedium for TcpMedium {
    async fn open(&self, peer: &PeerIdentity) -> std::io::Result<Box<dyn SessionStream>> {
        debug!(addr = %peer.address, "opening tcp session stream");
        let stream = TcpStream::connect(&peer.address).await?;
        Ok(Box::new(stream))
    }
}
