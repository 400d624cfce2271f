//! Sprechfunk Terminal-Client – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und faehrt eine
//! Session gegen das PTT-Relay. Die Sprechtaste wird ueber stdin bedient:
//!
//! ```text
//! an              Sprechtaste druecken
//! aus             Sprechtaste loslassen
//! modus toggle    Umschalt-Modus (erneutes "an" gibt frei)
//! modus hold      Halte-Modus
//! ende            Raum verlassen
//! ```

mod medien;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use sprechfunk_client::{
    Befehl, ClientConfig, PttModus, Sitzung, Uplink, ZugangsdatenSpeicher,
};
use sprechfunk_core::{PeerName, RoomId, UiEvent};
use sprechfunk_media::PlaybackEngine;

use crate::medien::{DateiEncoder, DateiGeraet, DateiSenkenAnbieter, TerminalElement};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad =
        std::env::var("SPRECHFUNK_CONFIG").unwrap_or_else(|_| "sprechfunk.toml".into());
    let config = ClientConfig::laden(&config_pfad)?;

    logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Sprechfunk Client wird initialisiert"
    );

    // Raum und Name: Argumente vor gespeicherten Zugangsdaten
    let mut args = std::env::args().skip(1);
    let speicher = ZugangsdatenSpeicher::standard();
    let (raum, name) = match (args.next(), args.next()) {
        (Some(raum), Some(name)) => (RoomId::new(raum), PeerName::new(name)),
        _ => {
            let gespeichert = speicher.as_ref().map(|s| s.laden()).unwrap_or_default();
            match gespeichert.vollstaendig() {
                Some(paar) => {
                    tracing::info!("Automatischer Beitritt mit gespeicherten Zugangsdaten");
                    paar
                }
                None => anyhow::bail!("Aufruf: sprechfunk <raum> <name>"),
            }
        }
    };
    if let Some(speicher) = &speicher {
        if let Err(fehler) = speicher.speichern(&raum, &name) {
            tracing::warn!(%fehler, "Zugangsdaten nicht speicherbar");
        }
    }

    let sende_datei =
        std::env::var("SPRECHFUNK_SENDEDATEI").unwrap_or_else(|_| "sendung.bin".into());
    let empfangs_dir =
        std::env::var("SPRECHFUNK_EMPFANGSDIR").unwrap_or_else(|_| "empfangen".into());

    let (befehle_tx, befehle_rx) = mpsc::unbounded_channel();
    let (media_tx, media_rx) = mpsc::unbounded_channel();
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();

    let uplink = Uplink::neu(
        Box::new(DateiGeraet::neu(&sende_datei)),
        Box::new(DateiEncoder::neu(&sende_datei, media_tx.clone())),
        config.encoder_config(),
    );
    let chunk_dauer_s = config.encoder_config().intervall.as_secs_f64();
    let engine = PlaybackEngine::neu(
        config.engine_config(),
        Box::new(DateiSenkenAnbieter::neu(
            &empfangs_dir,
            media_tx.clone(),
            chunk_dauer_s,
        )),
        Box::new(TerminalElement::neu()),
    );

    let sitzung = Sitzung::neu(
        config,
        raum,
        name,
        PttModus::Hold,
        uplink,
        engine,
        ui_tx,
    );

    // Anzeige-Ereignisse auf die Konsole
    tokio::spawn(async move {
        while let Some(event) = ui_rx.recv().await {
            anzeigen(event);
        }
    });

    // Sprechtaste ueber stdin
    tokio::spawn(eingabe_lesen(befehle_tx));

    sitzung.ausfuehren(befehle_rx, media_rx).await?;
    Ok(())
}

/// Gibt ein Anzeige-Ereignis als Statuszeile aus
fn anzeigen(event: UiEvent) {
    match event {
        UiEvent::RaumBeigetreten { raum, name } => {
            println!("* Beigetreten: {} als {}", raum, name)
        }
        UiEvent::BeitrittFehlgeschlagen { grund } => {
            println!("* Beitritt fehlgeschlagen: {grund}")
        }
        UiEvent::VerbindungVerloren => println!("* Verbindung verloren, Reconnect laeuft ..."),
        UiEvent::KanalBesetzt => println!("* Kanal besetzt"),
        UiEvent::SendungBeginnt => println!("* Sendung angefragt"),
        UiEvent::SendungEndet => println!("* Sendung beendet"),
        UiEvent::RemoteTalker(Some(name)) => println!("* {} spricht", name),
        UiEvent::RemoteTalker(None) => {}
        UiEvent::KeinStreamAnzeigen(true) => println!("* Kanal frei"),
        UiEvent::KeinStreamAnzeigen(false) => {}
        UiEvent::Roster { peers, talker } => {
            let namen: Vec<&str> = peers.iter().map(|p| p.inner()).collect();
            match talker {
                Some(talker) => println!("* Im Raum: {} (spricht: {})", namen.join(", "), talker),
                None => println!("* Im Raum: {}", namen.join(", ")),
            }
        }
        UiEvent::WiedergabeMitTon => {}
        UiEvent::StummeWiedergabe => println!("* Wiedergabe laeuft stumm"),
        UiEvent::GesteErforderlich => println!("* Wiedergabe braucht eine Benutzer-Geste"),
        UiEvent::Stoerung(text) => println!("* Stoerung: {text}"),
    }
}

/// Liest Befehle zeilenweise von stdin
async fn eingabe_lesen(befehle: mpsc::UnboundedSender<Befehl>) {
    let mut zeilen = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(zeile)) = zeilen.next_line().await {
        let befehl = match zeile.trim() {
            "" => continue,
            "an" => Befehl::Taste(true),
            "aus" => Befehl::Taste(false),
            "modus hold" => Befehl::ModusSetzen(PttModus::Hold),
            "modus toggle" => Befehl::ModusSetzen(PttModus::Toggle),
            "ende" | "q" => {
                let _ = befehle.send(Befehl::Verlassen);
                return;
            }
            unbekannt => {
                println!("* Unbekannter Befehl: {unbekannt} (an/aus/modus/ende)");
                continue;
            }
        };
        if befehle.send(befehl).is_err() {
            return;
        }
    }
}

/// Initialisiert tracing-subscriber mit dem konfigurierten Level und Format
fn logging_initialisieren(level: &str, format: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}
