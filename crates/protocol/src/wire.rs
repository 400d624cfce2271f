//! Wire-Format fuer den Duplex-Kanal
//!
//! Jede Nachricht besteht aus genau einem Tag-Byte gefolgt von rohen
//! Nutzdaten. Eine weitere Rahmung gibt es nicht – die Nachrichtengrenzen
//! liefert der message-orientierte Kanal (WebSocket) selbst.
//!
//! ## Nachrichtenformat
//!
//! ```text
//! Offset  Len  Beschreibung
//! ------  ---  -----------
//!  0       1   Tag (siehe `tag`-Modul)
//!  1+      N   Nutzdaten (byte-genau, optional)
//! ```
//!
//! Unbekannte Tags und leere Puffer werden geloggt und verworfen,
//! niemals als Fehler propagiert.

use bytes::{BufMut, Bytes, BytesMut};

/// Tag-Bytes aller Nachrichten (erste Byte jeder Kanalnachricht)
pub mod tag {
    // Client → Server
    /// Sprechanfrage
    pub const PTT_ON: u8 = 0x01;
    /// Sprechende bzw. Kompensation einer nicht mehr gewollten Anfrage
    pub const PTT_OFF: u8 = 0x02;
    /// Komprimierter Medien-Chunk des lokalen Senders
    pub const MEDIA_CHUNK: u8 = 0x03;

    // Server → Client
    /// Sprechanfrage gewaehrt
    pub const PTT_GRANTED: u8 = 0x10;
    /// Sprechanfrage abgelehnt (Kanal besetzt)
    pub const PTT_DENIED: u8 = 0x11;
    /// Kanal wurde freigegeben
    pub const PTT_RELEASED: u8 = 0x12;
    /// Weitergeleiteter Medien-Chunk des aktiven Sprechers
    pub const RELAY_CHUNK: u8 = 0x13;
    /// Roster-Update als UTF-8 JSON
    pub const PEER_INFO: u8 = 0x14;
}

/// Eine dekodierte Kanalnachricht
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    /// Sprechanfrage (C→S, keine Nutzdaten)
    PttOn,
    /// Sprechende / Kompensation (C→S, keine Nutzdaten)
    PttOff,
    /// Medien-Chunk des lokalen Senders (C→S)
    MediaChunk(Bytes),
    /// Sprechanfrage gewaehrt (S→C)
    PttGranted,
    /// Sprechanfrage abgelehnt (S→C)
    PttDenied,
    /// Kanal freigegeben (S→C)
    PttReleased,
    /// Weitergeleiteter Medien-Chunk (S→C)
    RelayChunk(Bytes),
    /// Roster-Update, Nutzdaten sind rohes JSON (S→C)
    PeerInfo(Bytes),
}

impl WireMessage {
    /// Gibt das Tag-Byte der Nachricht zurueck
    pub fn tag(&self) -> u8 {
        match self {
            Self::PttOn => tag::PTT_ON,
            Self::PttOff => tag::PTT_OFF,
            Self::MediaChunk(_) => tag::MEDIA_CHUNK,
            Self::PttGranted => tag::PTT_GRANTED,
            Self::PttDenied => tag::PTT_DENIED,
            Self::PttReleased => tag::PTT_RELEASED,
            Self::RelayChunk(_) => tag::RELAY_CHUNK,
            Self::PeerInfo(_) => tag::PEER_INFO,
        }
    }

    /// Gibt die Nutzdaten der Nachricht zurueck (leer wenn keine)
    pub fn nutzdaten(&self) -> &[u8] {
        match self {
            Self::MediaChunk(b) | Self::RelayChunk(b) | Self::PeerInfo(b) => b,
            _ => &[],
        }
    }

    /// Serialisiert die Nachricht: Tag-Byte + Nutzdaten
    pub fn encode(&self) -> Bytes {
        let nutzdaten = self.nutzdaten();
        let mut buf = BytesMut::with_capacity(1 + nutzdaten.len());
        buf.put_u8(self.tag());
        buf.put_slice(nutzdaten);
        buf.freeze()
    }

    /// Dekodiert eine Kanalnachricht aus einem rohen Puffer
    ///
    /// Gibt `None` zurueck (und loggt) bei leerem Puffer oder unbekanntem
    /// Tag – beides wird stillschweigend verworfen, nie als Fehler gewertet.
    pub fn decode(buf: Bytes) -> Option<Self> {
        if buf.is_empty() {
            tracing::trace!("Leere Kanalnachricht verworfen");
            return None;
        }

        let tag_byte = buf[0];
        let nutzdaten = buf.slice(1..);

        match tag_byte {
            tag::PTT_ON => Some(Self::PttOn),
            tag::PTT_OFF => Some(Self::PttOff),
            tag::MEDIA_CHUNK => Some(Self::MediaChunk(nutzdaten)),
            tag::PTT_GRANTED => Some(Self::PttGranted),
            tag::PTT_DENIED => Some(Self::PttDenied),
            tag::PTT_RELEASED => Some(Self::PttReleased),
            tag::RELAY_CHUNK => Some(Self::RelayChunk(nutzdaten)),
            tag::PEER_INFO => Some(Self::PeerInfo(nutzdaten)),
            unbekannt => {
                tracing::warn!(tag = unbekannt, "Unbekanntes Nachrichten-Tag verworfen");
                None
            }
        }
    }
}
