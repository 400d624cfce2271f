//! PEER_INFO Nutzdaten – Roster-Update des Servers
//!
//! Der Server sendet bei jeder Aenderung die vollstaendige Teilnehmerliste
//! als UTF-8 JSON: `{"peers": ["anna", "ben"], "talker": "anna"}`.
//! Einen freien Kanal kodiert der Server als leeren String, aeltere
//! Varianten als `null` – beides wird hier zu `None` normalisiert.

use serde::{Deserialize, Serialize};
use sprechfunk_core::PeerName;

/// Dekodiertes Roster-Update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    /// Namen aller Teilnehmer im Raum (inklusive des lokalen Benutzers)
    #[serde(default)]
    pub peers: Vec<String>,
    /// Name des aktiven Sprechers; leer/`null` = Kanal frei
    #[serde(default)]
    pub talker: Option<String>,
}

impl PeerInfo {
    /// Parst die rohen JSON-Nutzdaten eines PEER_INFO Updates
    ///
    /// # Fehler
    /// Gibt den serde-Fehler weiter; der Aufrufer loggt und behaelt das
    /// vorherige Roster unveraendert.
    pub fn parse(nutzdaten: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(nutzdaten)
    }

    /// Gibt den aktiven Sprecher zurueck, `""` zaehlt als frei
    pub fn talker_name(&self) -> Option<PeerName> {
        match self.talker.as_deref() {
            None | Some("") => None,
            Some(name) => Some(PeerName::new(name)),
        }
    }

    /// Gibt die Teilnehmer als typisierte Namen zurueck
    pub fn peer_namen(&self) -> Vec<PeerName> {
        self.peers
            .iter()
            .map(|name| PeerName::new(name.as_str()))
            .collect()
    }
}
