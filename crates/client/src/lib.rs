//! sprechfunk-client – Client-Kern des Sprechfunk-Relays
//!
//! ## Module
//! - [`ptt`] – Push-to-Talk Zustandsmaschine (Idle/Anfrage/Sendet)
//! - [`sitzung`] – Session-Controller mit Reconnect und Dispatch
//! - [`uplink`] – Sende-Adapter ueber Aufnahmegeraet und Encoder
//! - [`roster`] – Teilnehmerliste und Sprecher-Anzeige
//! - [`config`] – TOML-Konfiguration mit Standardwerten
//! - [`zugangsdaten`] – zuletzt benutzter Raum und Name

pub mod config;
pub mod ptt;
pub mod roster;
pub mod sitzung;
pub mod uplink;
pub mod zugangsdaten;

pub use config::ClientConfig;
pub use ptt::{PttAktion, PttMaschine, PttModus, PttZustand};
pub use roster::RosterTracker;
pub use sitzung::{Befehl, Sitzung};
pub use uplink::Uplink;
pub use zugangsdaten::{Zugangsdaten, ZugangsdatenSpeicher};
