//! Zugangsdaten-Speicher – zuletzt benutzter Raum und Name
//!
//! Dient nur dem Vorausfuellen beim Start (und dem automatischen Beitritt
//! wenn beides vorhanden ist). Lesefehler werden geloggt und ignoriert,
//! der Speicher ist nie korrektheitsrelevant.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sprechfunk_core::{PeerName, RoomId};

/// Gespeicherte Zugangsdaten
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Zugangsdaten {
    /// Zuletzt benutzter Raum
    pub raum: Option<String>,
    /// Zuletzt benutzter Name
    pub name: Option<String>,
}

impl Zugangsdaten {
    /// Gibt Raum und Name typisiert zurueck, wenn beide vorhanden sind
    pub fn vollstaendig(&self) -> Option<(RoomId, PeerName)> {
        match (&self.raum, &self.name) {
            (Some(raum), Some(name)) if !raum.trim().is_empty() && !name.trim().is_empty() => {
                Some((RoomId::new(raum), PeerName::new(name)))
            }
            _ => None,
        }
    }
}

/// Datei-gestuetzter Zugangsdaten-Speicher
pub struct ZugangsdatenSpeicher {
    pfad: PathBuf,
}

impl ZugangsdatenSpeicher {
    /// Speicher am Standard-Konfigurationspfad der Plattform
    ///
    /// `None` wenn die Plattform kein Konfigurationsverzeichnis kennt.
    pub fn standard() -> Option<Self> {
        let dirs = ProjectDirs::from("", "", "sprechfunk")?;
        Some(Self {
            pfad: dirs.config_dir().join("zugangsdaten.toml"),
        })
    }

    /// Speicher an einem expliziten Pfad (fuer Tests)
    pub fn mit_pfad(pfad: impl Into<PathBuf>) -> Self {
        Self { pfad: pfad.into() }
    }

    /// Gibt den Dateipfad zurueck
    pub fn pfad(&self) -> &Path {
        &self.pfad
    }

    /// Laedt die Zugangsdaten; fehlende oder kaputte Datei ergibt Standard
    pub fn laden(&self) -> Zugangsdaten {
        match std::fs::read_to_string(&self.pfad) {
            Ok(inhalt) => match toml::from_str(&inhalt) {
                Ok(daten) => daten,
                Err(fehler) => {
                    tracing::warn!(%fehler, pfad = %self.pfad.display(), "Zugangsdaten unlesbar, ignoriert");
                    Zugangsdaten::default()
                }
            },
            Err(_) => Zugangsdaten::default(),
        }
    }

    /// Speichert Raum und Name fuer den naechsten Start
    pub fn speichern(&self, raum: &RoomId, name: &PeerName) -> anyhow::Result<()> {
        let daten = Zugangsdaten {
            raum: Some(raum.inner().to_string()),
            name: Some(name.inner().to_string()),
        };
        if let Some(eltern) = self.pfad.parent() {
            std::fs::create_dir_all(eltern)?;
        }
        std::fs::write(&self.pfad, toml::to_string_pretty(&daten)?)?;
        Ok(())
    }
}
