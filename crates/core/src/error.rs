//! Fehlertypen fuer Sprechfunk
//!
//! Zentraler Fehler-Enum der alle moeglichen Fehlerzustaende abdeckt.
//! Untermodule koennen eigene Fehler definieren und via `#[from]` konvertieren.

use thiserror::Error;

/// Globaler Result-Alias fuer Sprechfunk
pub type Result<T> = std::result::Result<T, SprechfunkError>;

/// Alle moeglichen Fehler im Sprechfunk-Client
#[derive(Debug, Error)]
pub enum SprechfunkError {
    // --- Verbindung & Netzwerk ---
    #[error("Verbindung fehlgeschlagen: {0}")]
    Verbindung(String),

    #[error("Verbindung getrennt: {0}")]
    Getrennt(String),

    #[error("Beitritt fehlgeschlagen: {0}")]
    BeitrittFehlgeschlagen(String),

    // --- Protokoll ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    // --- Medien (Aufnahme-Seite) ---
    #[error("Aufnahmegeraet nicht verfuegbar: {0}")]
    Aufnahme(String),

    #[error("Kein kompatibles Chunk-Format verfuegbar")]
    EncodingNichtUnterstuetzt,

    // --- Medien (Wiedergabe-Seite) ---
    #[error("Decode-Senke defekt: {0}")]
    Senke(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl SprechfunkError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler einen Reconnect rechtfertigt
    pub fn ist_wiederholbar(&self) -> bool {
        matches!(self, Self::Verbindung(_) | Self::Getrennt(_))
    }
}

/// Fehler der Decode-Senke beim Anhaengen eines Chunks
///
/// Quota wird lokal durch Trimmen behoben und nie an den Benutzer gemeldet;
/// Fatal reisst die gesamte Pipeline ab.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SenkenFehler {
    /// Der zurueckgehaltene Verlauf der Senke ist zu gross
    #[error("Senken-Quota erschoepft")]
    Quota,
    /// Nicht behebbarer Senkenfehler – Pipeline muss neu aufgebaut werden
    #[error("Fataler Senkenfehler: {0}")]
    Fatal(String),
}
