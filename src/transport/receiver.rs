//! UDP Receiver
//!
//! Owns the listen socket. One background task reads datagrams, decodes them and
//! hands every message to the dispatcher exactly once.
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::codec;
use crate::dispatcher::Dispatcher;
use crate::error::{LiveOscError, Result};

/// UDP message receiver feeding a `Dispatcher`
#[derive(Debug)]
pub struct UdpReceiver {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    stats: Arc<ReceiverStats>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Statistics for the receiver
#[derive(Debug, Default)]
pub struct ReceiverStats {
    pub messages_received: AtomicU64,
    pub receive_errors: AtomicU64,
    pub decode_errors: AtomicU64,
}

impl UdpReceiver {
    /// Create a new UDP receiver
    pub async fn new(bind_addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| LiveOscError::Transport(format!("Socket creation failed: {}", e)))?;

        let local_addr = socket
            .local_addr()
            .map_err(|e| LiveOscError::Transport(format!("Socket creation failed: {}", e)))?;

        Ok(Self {
            socket: Arc::new(socket),
            local_addr,
            stats: Arc::new(ReceiverStats::default()),
            task: Mutex::new(None),
        })
    }

    /// Get the local socket address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Start the receive loop. Calling this while already running does nothing.
    pub fn start(&self, dispatcher: Arc<Dispatcher>) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let socket = Arc::clone(&self.socket);
        let stats = Arc::clone(&self.stats);
        let local_addr = self.local_addr;

        *task = Some(tokio::spawn(async move {
            let mut buf = vec![0u8; 65536]; // 64KB buffer
            debug!("[{}] receiver started", local_addr);

            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((len, addr)) => match codec::decode(&buf[..len]) {
                        Ok(messages) => {
                            for message in messages {
                                stats.messages_received.fetch_add(1, Ordering::Relaxed);
                                dispatcher.dispatch(message);
                            }
                        }
                        Err(e) => {
                            stats.decode_errors.fetch_add(1, Ordering::Relaxed);
                            warn!("[{}] dropping undecodable packet: {}", addr, e);
                        }
                    },
                    Err(e) => {
                        stats.receive_errors.fetch_add(1, Ordering::Relaxed);
                        error!("UDP receive error: {}", e);
                        // Continue receiving despite errors
                    }
                }
            }
        }));
    }

    /// Stop the receive loop
    pub fn stop(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = task.take() {
            handle.abort();
            debug!("[{}] receiver stopped", self.local_addr);
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Get receiver statistics
    pub fn get_stats(&self) -> ReceiverStats {
        ReceiverStats {
            messages_received: AtomicU64::new(self.stats.messages_received.load(Ordering::Relaxed)),
            receive_errors: AtomicU64::new(self.stats.receive_errors.load(Ordering::Relaxed)),
            decode_errors: AtomicU64::new(self.stats.decode_errors.load(Ordering::Relaxed)),
        }
    }
}

impl Drop for UdpReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}
