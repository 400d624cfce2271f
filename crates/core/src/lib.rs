//! sprechfunk-core – Gemeinsame Typen, Events und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Sprechfunk-Crates gemeinsam genutzt werden.

pub mod error;
pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{Result, SenkenFehler, SprechfunkError};
pub use event::{MediaEvent, UiEvent};
pub use types::{PeerName, RoomId};
