//! Datei-gestuetzte Medien-Adapter fuer den Terminal-Client
//!
//! Der Terminal-Client hat keine Kamera und keinen Media-Decoder; er sendet
//! eine aufgezeichnete Mediendatei in Intervall-Chunks und schreibt
//! empfangene Streams auf die Platte. Damit laesst sich ein Relay-Server
//! komplett ohne Browser durchtesten.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use bytes::Bytes;
use sprechfunk_core::{MediaEvent, SenkenFehler};
use sprechfunk_media::{
    Aufnahmegeraet, ChunkEncoder, DecodeSenke, EncoderConfig, MedienFehler, MedienResult,
    SenkenAnbieter, StartFehler, WiedergabeElement,
};
use tokio::sync::mpsc::UnboundedSender;

// ---------------------------------------------------------------------------
// Sende-Seite: Datei als Aufnahmegeraet + Encoder
// ---------------------------------------------------------------------------

/// "Aufnahmegeraet": die zu sendende Mediendatei
pub struct DateiGeraet {
    pfad: PathBuf,
    erworben: bool,
}

impl DateiGeraet {
    pub fn neu(pfad: impl Into<PathBuf>) -> Self {
        Self {
            pfad: pfad.into(),
            erworben: false,
        }
    }
}

impl Aufnahmegeraet for DateiGeraet {
    fn erwerben(&mut self) -> MedienResult<()> {
        if self.erworben {
            return Ok(());
        }
        if !self.pfad.is_file() {
            return Err(MedienFehler::GeraetNichtVerfuegbar(format!(
                "Sendedatei {} fehlt",
                self.pfad.display()
            )));
        }
        self.erworben = true;
        Ok(())
    }

    fn ist_erworben(&self) -> bool {
        self.erworben
    }

    fn freigeben(&mut self) {
        self.erworben = false;
    }
}

/// Teilt die Datei in Chunks passend zu Intervall und Bitrate
fn chunk_groesse(config: &EncoderConfig) -> usize {
    let bytes_pro_sekunde = (config.bitrate_bps / 8) as f64;
    ((bytes_pro_sekunde * config.intervall.as_secs_f64()) as usize).max(1)
}

/// Intervall-Encoder: liefert die Datei zyklisch in festen Chunks
pub struct DateiEncoder {
    pfad: PathBuf,
    events: UnboundedSender<MediaEvent>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl DateiEncoder {
    pub fn neu(pfad: impl Into<PathBuf>, events: UnboundedSender<MediaEvent>) -> Self {
        Self {
            pfad: pfad.into(),
            events,
            task: None,
        }
    }
}

impl ChunkEncoder for DateiEncoder {
    fn starten(&mut self, config: &EncoderConfig) -> MedienResult<()> {
        self.stoppen();

        let daten = std::fs::read(&self.pfad)
            .map_err(|e| MedienFehler::Encoder(format!("{}: {e}", self.pfad.display())))?;
        if daten.is_empty() {
            // Aus einer leeren Datei laesst sich kein Chunk formen
            return Err(MedienFehler::FormatNichtUnterstuetzt);
        }

        let groesse = chunk_groesse(config);
        let intervall = config.intervall;
        let events = self.events.clone();
        let daten = Bytes::from(daten);

        self.task = Some(tokio::spawn(async move {
            let mut takt = tokio::time::interval(intervall);
            let mut offset = 0usize;
            loop {
                takt.tick().await;
                let ende = (offset + groesse).min(daten.len());
                let chunk = daten.slice(offset..ende);
                // Zyklisch von vorn, damit lange Sendungen moeglich sind
                offset = if ende == daten.len() { 0 } else { ende };
                if events.send(MediaEvent::EncoderChunk(chunk)).is_err() {
                    break;
                }
            }
        }));
        Ok(())
    }

    fn laeuft(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn stoppen(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for DateiEncoder {
    fn drop(&mut self) {
        self.stoppen();
    }
}

// ---------------------------------------------------------------------------
// Empfangs-Seite: Datei-Senke + Wanduhr-Wiedergabe
// ---------------------------------------------------------------------------

/// Liefert pro Stream eine frische Datei-Senke unter `verzeichnis`
pub struct DateiSenkenAnbieter {
    verzeichnis: PathBuf,
    events: UnboundedSender<MediaEvent>,
    /// Medien-Dauer die ein Chunk dem Puffer hinzufuegt (Encoder-Intervall)
    chunk_dauer_s: f64,
    zaehler: u32,
}

impl DateiSenkenAnbieter {
    pub fn neu(
        verzeichnis: impl Into<PathBuf>,
        events: UnboundedSender<MediaEvent>,
        chunk_dauer_s: f64,
    ) -> Self {
        Self {
            verzeichnis: verzeichnis.into(),
            events,
            chunk_dauer_s,
            zaehler: 0,
        }
    }
}

impl SenkenAnbieter for DateiSenkenAnbieter {
    fn senke_anfordern(&mut self) -> Box<dyn DecodeSenke + Send> {
        self.zaehler += 1;
        let pfad = self.verzeichnis.join(format!("stream-{:03}.bin", self.zaehler));

        // Anlegen kann scheitern; der Fehler wird gemerkt und vom ersten
        // Append als fatal gemeldet (der Anbieter selbst ist unfehlbar)
        let (ausgang, fehler) = match std::fs::create_dir_all(&self.verzeichnis)
            .and_then(|_| File::create(&pfad))
        {
            Ok(datei) => (Some(datei), None),
            Err(e) => {
                tracing::error!(pfad = %pfad.display(), fehler = %e, "Empfangsdatei nicht anlegbar");
                (None, Some(e.to_string()))
            }
        };

        // Die Datei-Senke ist sofort bereit
        let _ = self.events.send(MediaEvent::SenkeBereit);

        Box::new(DateiSenke {
            fehler,
            ausgang,
            events: self.events.clone(),
            chunk_dauer_s: self.chunk_dauer_s,
            start: 0.0,
            ende: 0.0,
        })
    }
}

/// Schreibt empfangene Chunks in eine Datei; Appends schliessen synchron ab
pub struct DateiSenke {
    /// Gemerkter Anlege-Fehler; macht jeden Append fatal
    fehler: Option<String>,
    ausgang: Option<File>,
    events: UnboundedSender<MediaEvent>,
    chunk_dauer_s: f64,
    start: f64,
    ende: f64,
}

impl DecodeSenke for DateiSenke {
    fn append_starten(&mut self, chunk: &Bytes) -> Result<(), SenkenFehler> {
        if let Some(fehler) = &self.fehler {
            return Err(SenkenFehler::Fatal(fehler.clone()));
        }
        let Some(ausgang) = self.ausgang.as_mut() else {
            return Err(SenkenFehler::Fatal("Senke bereits freigegeben".into()));
        };
        ausgang
            .write_all(chunk)
            .map_err(|e| SenkenFehler::Fatal(e.to_string()))?;
        self.ende += self.chunk_dauer_s;
        // Der Schreibvorgang ist synchron fertig, das Abschluss-Signal
        // laeuft trotzdem ueber den Event-Kanal in die Session-Schleife
        let _ = self.events.send(MediaEvent::AppendFertig);
        Ok(())
    }

    fn ist_beschaeftigt(&self) -> bool {
        false
    }

    fn gepufferter_bereich(&self) -> Option<(f64, f64)> {
        (self.ende > self.start).then_some((self.start, self.ende))
    }

    fn entfernen(&mut self, _start: f64, ende: f64) {
        // Nur Buchhaltung: die Datei behaelt den vollen Stream
        self.start = self.start.max(ende.min(self.ende));
    }

    fn freigeben(&mut self) {
        if let Some(mut ausgang) = self.ausgang.take() {
            let _ = ausgang.flush();
        }
    }
}

/// Wiedergabe-Element mit Wanduhr-Position
///
/// Es gibt nichts zu dekodieren; die Position laeuft mit der Echtzeit
/// weiter, damit Trimmen und Live-Kanten-Logik realistisch arbeiten.
pub struct TerminalElement {
    basis: f64,
    laeuft_seit: Option<Instant>,
    stumm: bool,
}

impl TerminalElement {
    pub fn neu() -> Self {
        Self {
            basis: 0.0,
            laeuft_seit: None,
            stumm: false,
        }
    }
}

impl Default for TerminalElement {
    fn default() -> Self {
        Self::neu()
    }
}

impl WiedergabeElement for TerminalElement {
    fn abspielen(&mut self) -> Result<(), StartFehler> {
        if self.laeuft_seit.is_none() {
            self.laeuft_seit = Some(Instant::now());
        }
        Ok(())
    }

    fn pausieren(&mut self) {
        self.basis = self.position();
        self.laeuft_seit = None;
    }

    fn ist_pausiert(&self) -> bool {
        self.laeuft_seit.is_none()
    }

    fn position(&self) -> f64 {
        self.basis
            + self
                .laeuft_seit
                .map_or(0.0, |seit| seit.elapsed().as_secs_f64())
    }

    fn springen(&mut self, position: f64) {
        self.basis = position;
        if self.laeuft_seit.is_some() {
            self.laeuft_seit = Some(Instant::now());
        }
    }

    fn stumm_setzen(&mut self, stumm: bool) {
        self.stumm = stumm;
    }

    fn ist_stumm(&self) -> bool {
        self.stumm
    }

    fn ist_ausgehungert(&self) -> bool {
        false
    }
}
