//! Typisierte Ereignisse zwischen den Sprechfunk-Komponenten
//!
//! Alle Zustandsuebergaenge laufen ueber diese beiden Enums statt ueber
//! verstreute Callbacks: [`MediaEvent`] traegt die Abschluss-Signale der
//! Plattform-Kollaborateure in die Session-Schleife hinein, [`UiEvent`]
//! traegt Anzeige-Zustaende zur einbettenden Oberflaeche hinaus.

use crate::error::SenkenFehler;
use crate::types::{PeerName, RoomId};
use bytes::Bytes;

/// Signale der Medien-Kollaborateure (Decode-Senke, Chunk-Encoder)
///
/// Werden von den Plattform-Adaptern ueber einen Kanal in die
/// Session-Schleife geliefert und dort in strikter Reihenfolge verarbeitet.
#[derive(Debug, Clone)]
pub enum MediaEvent {
    /// Die angeforderte Decode-Senke ist bereit fuer Appends
    SenkeBereit,
    /// Der zuletzt gestartete Append ist abgeschlossen
    AppendFertig,
    /// Die Senke hat einen asynchronen Fehler gemeldet
    SenkeFehler(SenkenFehler),
    /// Der Chunk-Encoder hat einen komprimierten Chunk geliefert
    EncoderChunk(Bytes),
}

/// Anzeige-Ereignisse fuer die einbettende Oberflaeche
///
/// Die Oberflaeche (Terminal, GUI, Web-View) konsumiert diese Ereignisse
/// und entscheidet selbst ueber die Darstellung. Fehler erscheinen hier
/// immer als voruebergehende Statusmeldung, nie als Absturz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Verbindung steht, Raum wurde betreten
    RaumBeigetreten { raum: RoomId, name: PeerName },
    /// Verbindungsaufbau vor dem ersten Beitritt gescheitert (kein Retry)
    BeitrittFehlgeschlagen { grund: String },
    /// Verbindung im Raum verloren – Reconnect laeuft
    VerbindungVerloren,
    /// Server hat die Sprechanfrage abgelehnt (Kanal besetzt)
    KanalBesetzt,
    /// Eigene Sendung beginnt (Cue-Hook fuer Feedback-Klick)
    SendungBeginnt,
    /// Eigene Sendung endet (Cue-Hook fuer Feedback-Klick)
    SendungEndet,
    /// Name des entfernten Sprechers, `None` blendet das Banner aus
    RemoteTalker(Option<PeerName>),
    /// Sichtbarkeit des "Kanal frei"-Indikators
    KeinStreamAnzeigen(bool),
    /// Vollstaendige Teilnehmerliste aus dem letzten Roster-Update
    Roster {
        peers: Vec<PeerName>,
        talker: Option<PeerName>,
    },
    /// Wiedergabe laeuft mit Ton (hebt StummeWiedergabe/GesteErforderlich auf)
    WiedergabeMitTon,
    /// Wiedergabe laeuft nur stumm (Autoplay-Richtlinie)
    StummeWiedergabe,
    /// Wiedergabe braucht eine Benutzer-Geste zum Start
    GesteErforderlich,
    /// Voruebergehende Stoerungsmeldung (Banner-Text)
    Stoerung(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_event_vergleichbar() {
        assert_eq!(UiEvent::KanalBesetzt, UiEvent::KanalBesetzt);
        assert_ne!(
            UiEvent::RemoteTalker(Some(PeerName::new("anna"))),
            UiEvent::RemoteTalker(None)
        );
    }

    #[test]
    fn media_event_chunk_traegt_bytes() {
        let ev = MediaEvent::EncoderChunk(Bytes::from_static(b"\x01\x02"));
        match ev {
            MediaEvent::EncoderChunk(b) => assert_eq!(b.len(), 2),
            _ => panic!("EncoderChunk erwartet"),
        }
    }
}
