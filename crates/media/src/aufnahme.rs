//! Aufnahmegeraet und Chunk-Encoder
//!
//! Beides liefert die Host-Plattform. Der Encoder zerlegt den laufenden
//! Aufnahme-Stream in komprimierte Chunks mit festem Intervall und fester
//! Bitrate (beides extern konfiguriert, keine Qualitaetsadaption) und
//! liefert sie als `MediaEvent::EncoderChunk` in die Session-Schleife.

use std::time::Duration;

use crate::error::MedienResult;

/// Konfiguration des Chunk-Encoders
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Chunk-Intervall (ein Chunk pro Intervall)
    pub intervall: Duration,
    /// Feste Ziel-Bitrate in bit/s
    pub bitrate_bps: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            intervall: Duration::from_millis(200),
            bitrate_bps: 400_000,
        }
    }
}

/// Aufnahmegeraet (Kamera/Mikrofon) der Host-Plattform
///
/// `erwerben` ist idempotent: ein bereits erworbener Stream wird
/// wiederverwendet statt neu angefordert.
pub trait Aufnahmegeraet {
    /// Erwirbt den Aufnahme-Stream (oder verwendet den vorhandenen weiter)
    ///
    /// # Fehler
    /// `GeraetNichtVerfuegbar` wenn der Zugriff verweigert wird oder kein
    /// Geraet existiert – der Aufrufer bricht den Sendestart ab.
    fn erwerben(&mut self) -> MedienResult<()>;

    /// Gibt true zurueck wenn der Stream aktuell erworben ist
    fn ist_erworben(&self) -> bool;

    /// Stoppt den Stream und gibt das Geraet frei
    fn freigeben(&mut self);
}

/// Intervall-basierter Chunk-Encoder ueber dem Aufnahme-Stream
pub trait ChunkEncoder {
    /// Startet das Encoding mit der gegebenen Konfiguration
    ///
    /// # Fehler
    /// `FormatNichtUnterstuetzt` wenn die Plattform kein kompatibles
    /// Chunk-Format anbietet – der Aufrufer bricht den Sendestart ab.
    fn starten(&mut self, config: &EncoderConfig) -> MedienResult<()>;

    /// Gibt true zurueck solange der Encoder laeuft
    fn laeuft(&self) -> bool;

    /// Stoppt den Encoder; danach duerfen keine Chunks mehr geliefert werden
    fn stoppen(&mut self);
}
