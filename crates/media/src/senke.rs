//! Decode-Senke und Wiedergabe-Element
//!
//! Die Senke ist ein append-only Puffer mit genau einem Operations-Slot:
//! ein erfolgreich gestarteter Append laeuft asynchron und meldet seinen
//! Abschluss als `MediaEvent::AppendFertig`. Solange er laeuft, darf kein
//! weiterer Append gestartet werden – dieser Busy-Zustand ist das einzige
//! Backpressure-Signal der Engine.

use bytes::Bytes;
use sprechfunk_core::SenkenFehler;

/// Append-only Decode-Senke der Host-Plattform
///
/// Medienzeit wird in Sekunden als f64 gefuehrt. `entfernen` wirkt sofort;
/// nur Appends laufen asynchron.
pub trait DecodeSenke {
    /// Startet einen asynchronen Append des Chunks
    ///
    /// Bei `Ok(())` folgt spaeter genau ein `MediaEvent::AppendFertig`.
    /// `Err(SenkenFehler::Quota)` lehnt synchron ab (Verlauf zu gross),
    /// es folgt kein Abschluss-Event. `Err(SenkenFehler::Fatal)` bedeutet:
    /// Senke unbrauchbar, Pipeline muss neu aufgebaut werden.
    fn append_starten(&mut self, chunk: &Bytes) -> Result<(), SenkenFehler>;

    /// Gibt true zurueck solange ein Append in Arbeit ist
    fn ist_beschaeftigt(&self) -> bool;

    /// Gepufferter Medienzeit-Bereich `[start, ende)` in Sekunden
    ///
    /// `None` solange noch nichts dekodiert wurde.
    fn gepufferter_bereich(&self) -> Option<(f64, f64)>;

    /// Entfernt den Bereich `[start, ende)` aus dem Verlauf
    fn entfernen(&mut self, start: f64, ende: f64);

    /// Gibt die zugrunde liegende Ressource der Senke frei
    fn freigeben(&mut self);
}

/// Liefert pro Stream eine frische Decode-Senke
///
/// Die Senke ist nach dem Anfordern noch nicht benutzbar: der Anbieter
/// meldet ihre Bereitschaft asynchron als `MediaEvent::SenkeBereit`.
/// Erst danach beginnt die Engine zu flushen.
pub trait SenkenAnbieter {
    fn senke_anfordern(&mut self) -> Box<dyn DecodeSenke + Send>;
}

/// Fehler beim Starten der Wiedergabe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartFehler {
    /// Die Plattform-Autoplay-Richtlinie blockiert den Start
    AutoplayBlockiert,
}

/// Wiedergabe-Element der Host-Plattform
///
/// Positionsangaben in Medienzeit-Sekunden, passend zu den Bereichen
/// der [`DecodeSenke`].
pub trait WiedergabeElement {
    /// Startet die Wiedergabe; kann an der Autoplay-Richtlinie scheitern
    fn abspielen(&mut self) -> Result<(), StartFehler>;

    /// Haelt die Wiedergabe an
    fn pausieren(&mut self);

    /// Gibt true zurueck wenn die Wiedergabe aktuell pausiert ist
    fn ist_pausiert(&self) -> bool;

    /// Aktuelle Wiedergabeposition in Sekunden
    fn position(&self) -> f64;

    /// Springt zur gegebenen Position (Live-Edge-Korrektur)
    fn springen(&mut self, position: f64);

    /// Setzt die Stummschaltung
    fn stumm_setzen(&mut self, stumm: bool);

    /// Gibt true zurueck wenn das Element stummgeschaltet ist
    fn ist_stumm(&self) -> bool;

    /// Gibt true zurueck wenn das Element auf Daten wartet
    /// (Readiness unterhalb von "kann weiterspielen")
    fn ist_ausgehungert(&self) -> bool;
}
