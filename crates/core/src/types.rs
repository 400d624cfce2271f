//! Gemeinsame Identifikationstypen fuer Sprechfunk
//!
//! Raum und Teilnehmer werden durch beliebige UTF-8-Strings identifiziert
//! (der Server legt sie beim Handshake fest). Das Newtype-Pattern schliesst
//! Verwechslungen zwischen den beiden zur Compilezeit aus.

use serde::{Deserialize, Serialize};

/// Identifikator eines Raums
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(pub String);

impl RoomId {
    /// Erstellt eine RoomId aus einem beliebigen String
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt den inneren String zurueck
    pub fn inner(&self) -> &str {
        &self.0
    }

    /// Prueft ob die ID leer ist (leere Raeume lehnt der Server ab)
    pub fn ist_leer(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "raum:{}", self.0)
    }
}

/// Anzeigename eines Teilnehmers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerName(pub String);

impl PeerName {
    /// Erstellt einen PeerName aus einem beliebigen String
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Gibt den inneren String zurueck
    pub fn inner(&self) -> &str {
        &self.0
    }

    /// Prueft ob der Name leer ist
    pub fn ist_leer(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for PeerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
