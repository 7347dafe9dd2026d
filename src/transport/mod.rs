//! UDP Transport Module
//!
//! Sends OSC packets to the peer over one socket and receives replies on another.
//! Inbound messages are routed through a `Dispatcher`.

pub mod codec;
pub mod receiver;
pub mod traits;
pub mod udp_sender;

pub use receiver::{ReceiverStats, UdpReceiver};
pub use traits::Sender;
pub use udp_sender::{SenderStats, UdpSender};
