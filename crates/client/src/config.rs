//! Client-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Client ohne Konfigurationsdatei
//! lauffaehig ist.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use sprechfunk_core::{PeerName, RoomId};
use sprechfunk_media::{EncoderConfig, EngineConfig};

/// Vollstaendige Client-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Verbindungs-Einstellungen
    pub verbindung: VerbindungEinstellungen,
    /// Sende-Einstellungen (Encoder)
    pub senden: SendenEinstellungen,
    /// Wiedergabe-Einstellungen (Playback-Puffer)
    pub wiedergabe: WiedergabeEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Verbindungs-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungEinstellungen {
    /// Host (und optional Port) des Relay-Servers
    pub host: String,
    /// Verschluesselter Transport (wss statt ws)
    pub tls: bool,
    /// Feste Wartezeit vor einem Reconnect in Millisekunden
    pub reconnect_ms: u64,
}

impl Default for VerbindungEinstellungen {
    fn default() -> Self {
        Self {
            host: "localhost:8080".into(),
            tls: false,
            reconnect_ms: 2000,
        }
    }
}

/// Sende-Einstellungen (fest konfiguriert, keine Qualitaetsadaption)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SendenEinstellungen {
    /// Chunk-Intervall des Encoders in Millisekunden
    pub chunk_intervall_ms: u64,
    /// Feste Encoder-Bitrate in bit/s
    pub bitrate_bps: u32,
}

impl Default for SendenEinstellungen {
    fn default() -> Self {
        Self {
            chunk_intervall_ms: 200,
            bitrate_bps: 400_000,
        }
    }
}

/// Wiedergabe-Einstellungen (alle Zeiten in Sekunden)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WiedergabeEinstellungen {
    /// Maximal zurueckgehaltener Verlauf
    pub puffer_fenster_s: f64,
    /// Zielfenster nach einer Quota-Ablehnung
    pub quota_fenster_s: f64,
    /// Sicherheitsabstand hinter der Wiedergabeposition beim Trimmen
    pub trim_abstand_s: f64,
    /// Rueckstand zur Live-Kante ab dem vorgespult wird
    pub live_schwelle_s: f64,
    /// Abstand zur Live-Kante nach einer Korrektur
    pub live_versatz_s: f64,
    /// Abstand zur Live-Kante beim ersten Wiedergabestart
    pub start_versatz_s: f64,
}

impl Default for WiedergabeEinstellungen {
    fn default() -> Self {
        let standard = EngineConfig::default();
        Self {
            puffer_fenster_s: standard.puffer_fenster_s,
            quota_fenster_s: standard.quota_fenster_s,
            trim_abstand_s: standard.trim_abstand_s,
            live_schwelle_s: standard.live_schwelle_s,
            live_versatz_s: standard.live_versatz_s,
            start_versatz_s: standard.start_versatz_s,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ClientConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Baut die Kanal-Adresse fuer Raum und Name
    ///
    /// Schema folgt der TLS-Einstellung (wss/ws), Raum und Name werden
    /// percent-kodiert in die Query uebernommen.
    pub fn kanal_adresse(&self, raum: &RoomId, name: &PeerName) -> String {
        let schema = if self.verbindung.tls { "wss" } else { "ws" };
        format!(
            "{}://{}/ws?room={}&name={}",
            schema,
            self.verbindung.host,
            utf8_percent_encode(raum.inner(), NON_ALPHANUMERIC),
            utf8_percent_encode(name.inner(), NON_ALPHANUMERIC),
        )
    }

    /// Gibt die feste Reconnect-Wartezeit zurueck
    pub fn reconnect_verzoegerung(&self) -> Duration {
        Duration::from_millis(self.verbindung.reconnect_ms)
    }

    /// Leitet die Encoder-Konfiguration ab
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            intervall: Duration::from_millis(self.senden.chunk_intervall_ms),
            bitrate_bps: self.senden.bitrate_bps,
        }
    }

    /// Leitet die Engine-Konfiguration ab
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            puffer_fenster_s: self.wiedergabe.puffer_fenster_s,
            quota_fenster_s: self.wiedergabe.quota_fenster_s,
            trim_abstand_s: self.wiedergabe.trim_abstand_s,
            live_schwelle_s: self.wiedergabe.live_schwelle_s,
            live_versatz_s: self.wiedergabe.live_versatz_s,
            start_versatz_s: self.wiedergabe.start_versatz_s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.verbindung.host, "localhost:8080");
        assert_eq!(cfg.verbindung.reconnect_ms, 2000);
        assert_eq!(cfg.senden.chunk_intervall_ms, 200);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [verbindung]
            host = "funk.example.org"
            tls = true

            [senden]
            chunk_intervall_ms = 100
        "#;
        let cfg: ClientConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.verbindung.host, "funk.example.org");
        assert!(cfg.verbindung.tls);
        assert_eq!(cfg.senden.chunk_intervall_ms, 100);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.verbindung.reconnect_ms, 2000);
        assert_eq!(cfg.wiedergabe.puffer_fenster_s, 2.0);
    }

    #[test]
    fn kanal_adresse_ohne_tls() {
        let cfg = ClientConfig::default();
        let adresse = cfg.kanal_adresse(&RoomId::new("garage"), &PeerName::new("anna"));
        assert_eq!(adresse, "ws://localhost:8080/ws?room=garage&name=anna");
    }

    #[test]
    fn kanal_adresse_mit_tls_und_sonderzeichen() {
        let mut cfg = ClientConfig::default();
        cfg.verbindung.tls = true;
        cfg.verbindung.host = "funk.example.org".into();
        let adresse = cfg.kanal_adresse(&RoomId::new("werkstatt 1"), &PeerName::new("böse&gut"));
        assert!(adresse.starts_with("wss://funk.example.org/ws?room=werkstatt%201&name="));
        assert!(!adresse.contains('&') || adresse.matches('&').count() == 1, "Nur der Query-Trenner darf uebrig bleiben");
        assert!(!adresse.contains(' '));
    }

    #[test]
    fn abgeleitete_configs() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.reconnect_verzoegerung(), Duration::from_millis(2000));
        assert_eq!(cfg.encoder_config().intervall, Duration::from_millis(200));
        assert_eq!(cfg.engine_config().live_schwelle_s, 0.2);
    }
}
