//! Uplink – Sende-Adapter ueber Aufnahmegeraet und Chunk-Encoder
//!
//! Wird ausschliesslich beim Eintritt in den Sendet-Zustand gestartet.
//! Das Aufnahmegeraet wird idempotent erworben (ein laufender Stream wird
//! wiederverwendet) und bleibt ueber Sendepausen hinweg erhalten; erst das
//! Verlassen des Raums gibt es frei.

use sprechfunk_media::{Aufnahmegeraet, ChunkEncoder, EncoderConfig, MedienResult};

/// Sende-Adapter: kapselt Geraet + Encoder hinter Start/Stopp
pub struct Uplink {
    geraet: Box<dyn Aufnahmegeraet + Send>,
    encoder: Box<dyn ChunkEncoder + Send>,
    config: EncoderConfig,
}

impl Uplink {
    pub fn neu(
        geraet: Box<dyn Aufnahmegeraet + Send>,
        encoder: Box<dyn ChunkEncoder + Send>,
        config: EncoderConfig,
    ) -> Self {
        Self {
            geraet,
            encoder,
            config,
        }
    }

    /// Startet den Uplink: Geraet erwerben, Encoder anwerfen
    ///
    /// # Fehler
    /// `GeraetNichtVerfuegbar` oder `FormatNichtUnterstuetzt` – der Aufrufer
    /// bricht den Sendestart ab (Idle + kompensierendes PTT_OFF). Ein bereits
    /// erworbenes Geraet bleibt dabei erworben.
    pub fn starten(&mut self) -> MedienResult<()> {
        self.geraet.erwerben()?;
        self.encoder.starten(&self.config)?;
        tracing::debug!(
            intervall_ms = self.config.intervall.as_millis() as u64,
            "Uplink gestartet"
        );
        Ok(())
    }

    /// Stoppt den Encoder; das Geraet bleibt fuer die naechste Sendung warm
    pub fn stoppen(&mut self) {
        if self.encoder.laeuft() {
            self.encoder.stoppen();
            tracing::debug!("Uplink gestoppt");
        }
    }

    /// Stoppt alles und gibt das Aufnahmegeraet frei (Raum verlassen)
    pub fn freigeben(&mut self) {
        self.stoppen();
        if self.geraet.ist_erworben() {
            self.geraet.freigeben();
        }
    }

    /// Gibt true zurueck solange der Encoder laeuft
    pub fn laeuft(&self) -> bool {
        self.encoder.laeuft()
    }
}
