//! sprechfunk-protocol – Wire-Protokoll des Relay-Servers
//!
//! Dieses Crate definiert die binaeren Nachrichten, die zwischen Client
//! und Relay-Server ueber den Duplex-Kanal ausgetauscht werden.

pub mod peer_info;
pub mod wire;

pub use peer_info::PeerInfo;
pub use wire::WireMessage;
