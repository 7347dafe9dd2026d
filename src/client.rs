//! Client: rate-limited sends that hand back a waitable `Call`
//!
//! A send acquires a limiter token, registers a reply slot and only then puts
//! the datagram on the wire, so a reply can never arrive ahead of its slot.
//! Registration and the datagram leave together under the send lock, so slot
//! order always equals wire order.
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::correlation::{Reply, ReplySlot, ReplyWaiter};
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::limiters::TokenBucketLimiter;
use crate::live::FromReply;
use crate::message::{Arg, Message};
use crate::settings::Settings;
use crate::transport::{Sender, UdpReceiver, UdpSender};

#[derive(Clone)]
pub struct Client {
    settings: Settings,
    sender: Arc<dyn Sender>,
    limiter: Arc<TokenBucketLimiter>,
    waiter: ReplyWaiter,
    dispatcher: Arc<Dispatcher>,
    receiver: Option<Arc<UdpReceiver>>,
    send_lock: Arc<Mutex<()>>,
}

impl Client {
    /// Bind the UDP send and listen sockets described by `settings`.
    /// Call `run` to start receiving replies.
    pub async fn connect(settings: Settings) -> Result<Self> {
        let sender = UdpSender::new(settings.send_address).await?;
        let receiver = UdpReceiver::new(settings.listen_address).await?;
        info!(
            "sending to {}, listening on {}",
            settings.send_address,
            receiver.local_addr()
        );
        let mut client = Self::with_sender(settings, Arc::new(sender));
        client.receiver = Some(Arc::new(receiver));
        Ok(client)
    }

    /// Client over any `Sender`. Inbound messages must be fed to `dispatcher()`.
    pub fn with_sender(settings: Settings, sender: Arc<dyn Sender>) -> Self {
        let waiter = ReplyWaiter::new(settings.effective_timeout(), settings.enable_logger);
        let dispatcher = Arc::new(Dispatcher::new(waiter.clone()));
        let limiter = Arc::new(TokenBucketLimiter::new(settings.requests_per_second));
        Self {
            settings,
            sender,
            limiter,
            waiter,
            dispatcher,
            receiver: None,
            send_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Start receiving replies
    pub fn run(&self) {
        if let Some(receiver) = &self.receiver {
            receiver.start(Arc::clone(&self.dispatcher));
        }
    }

    /// Stop receiving replies
    pub fn close(&self) {
        if let Some(receiver) = &self.receiver {
            receiver.stop();
        }
        debug!("client closed");
    }

    pub fn is_running(&self) -> bool {
        self.receiver
            .as_ref()
            .is_some_and(|receiver| receiver.is_running())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn waiter(&self) -> &ReplyWaiter {
        &self.waiter
    }

    pub fn limiter(&self) -> &TokenBucketLimiter {
        &self.limiter
    }

    /// Address replies are received on, when this client owns a UDP receiver
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.receiver.as_ref().map(|receiver| receiver.local_addr())
    }

    /// Register a handler for inbound messages on `address` (`"*"` for all)
    pub fn add_handler<F>(&self, address: &str, handler: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.dispatcher.add_handler(address, handler);
    }

    /// Replies still awaited across all addresses
    pub fn pending(&self) -> usize {
        self.waiter.table().pending_count()
    }

    /// Send a request and return a handle for its reply.
    ///
    /// Exactly one datagram is sent; nothing is retried.
    pub async fn send(&self, address: &str, args: Vec<Arg>) -> Result<Call> {
        self.limiter.acquire().await;
        let message = Message::new(address, args);
        let slot = {
            let _ordered = self.send_lock.lock().await;
            let slot = self.waiter.expect(address);
            if let Err(e) = self.sender.send_message(&message).await {
                self.waiter.table().cancel(&slot);
                return Err(e);
            }
            slot
        };
        Ok(Call {
            slot,
            waiter: self.waiter.clone(),
        })
    }

    /// Send without expecting a reply
    pub async fn notify(&self, address: &str, args: Vec<Arg>) -> Result<()> {
        self.limiter.acquire().await;
        let message = Message::new(address, args);
        let _ordered = self.send_lock.lock().await;
        self.sender.send_message(&message).await
    }

    /// Send, then run `callback` with the reply from a background task
    pub async fn callback<F>(
        &self,
        address: &str,
        args: Vec<Arg>,
        callback: F,
    ) -> Result<JoinHandle<()>>
    where
        F: FnOnce(Message) + Send + 'static,
    {
        Ok(self.send(address, args).await?.on_reply(callback))
    }

    /// Send, returning a receiver that yields the reply once
    pub async fn wait_chan(
        &self,
        address: &str,
        args: Vec<Arg>,
    ) -> Result<oneshot::Receiver<Message>> {
        Ok(self.send(address, args).await?.into_receiver())
    }

    /// Send, wait, and extract a typed value after skipping `skip` echoed arguments.
    /// A timed-out or malformed reply yields the type's zero value.
    pub async fn invoke<T: FromReply>(
        &self,
        address: &str,
        args: Vec<Arg>,
        skip: usize,
    ) -> Result<T> {
        let reply = self.send(address, args).await?.wait().await;
        Ok(T::from_reply(&reply, skip))
    }
}

/// Handle to one outstanding request.
///
/// Dropping it without waiting leaves the slot to absorb its reply until the
/// client's timeout has passed; after that the slot is swept.
#[derive(Debug)]
pub struct Call {
    slot: ReplySlot,
    waiter: ReplyWaiter,
}

impl Call {
    pub fn address(&self) -> &str {
        self.slot.address()
    }

    /// Wait for the reply; the empty message on timeout
    pub async fn wait(self) -> Message {
        self.waiter.wait_for(self.slot).await
    }

    /// Wait for the reply, reporting a timeout explicitly
    pub async fn wait_outcome(self) -> Reply {
        self.waiter.wait_outcome(self.slot).await
    }

    pub async fn wait_within(self, timeout: Duration) -> Reply {
        self.waiter.wait_outcome_within(self.slot, timeout).await
    }

    pub fn on_reply<F>(self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Message) + Send + 'static,
    {
        self.waiter.callback_on(self.slot, callback)
    }

    pub fn into_receiver(self) -> oneshot::Receiver<Message> {
        self.waiter.wait_chan_on(self.slot)
    }
}
