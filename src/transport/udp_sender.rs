//! UDP sender
//!
//! One unconnected socket; every message is encoded as an OSC packet and sent
//! to the peer's listen address.
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{error, trace};

use super::codec;
use super::traits::Sender;
use crate::error::{LiveOscError, Result};
use crate::message::Message;

/// Statistics for the sender
#[derive(Debug, Default)]
pub struct SenderStats {
    pub messages_sent: AtomicU64,
    pub send_errors: AtomicU64,
}

#[derive(Clone, Debug)]
pub struct UdpSender {
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    stats: Arc<SenderStats>,
}

impl UdpSender {
    /// Bind an ephemeral local socket for sending to `target`
    pub async fn new(target: SocketAddr) -> Result<Self> {
        let bind_addr: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| LiveOscError::Transport(format!("Socket creation failed: {}", e)))?;

        Ok(Self {
            socket: Arc::new(socket),
            target,
            stats: Arc::new(SenderStats::default()),
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Snapshot of the sender statistics
    pub fn get_stats(&self) -> SenderStats {
        SenderStats {
            messages_sent: AtomicU64::new(self.stats.messages_sent.load(Ordering::Relaxed)),
            send_errors: AtomicU64::new(self.stats.send_errors.load(Ordering::Relaxed)),
        }
    }
}

#[async_trait]
impl Sender for UdpSender {
    async fn send_message(&self, message: &Message) -> Result<()> {
        let data = codec::encode(message)?;
        match self.socket.send_to(&data, self.target).await {
            Ok(_write_size) => {
                self.stats.messages_sent.fetch_add(1, Ordering::Relaxed);
                trace!("[{}] sent {}", self.target, message);
                Ok(())
            }
            Err(e) => {
                self.stats.send_errors.fetch_add(1, Ordering::Relaxed);
                error!("[{}] Failed to send UDP data: {}", self.target, e);
                Err(LiveOscError::Io(e))
            }
        }
    }
}
