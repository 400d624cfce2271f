//! Session-Controller – Lebenszyklus des Duplex-Kanals
//!
//! Besitzt den WebSocket zum Relay-Server und faehrt die eine kooperative
//! Ereignisschleife des Clients: Kanalnachrichten, Benutzerbefehle und
//! Medien-Signale werden in strikter Ankunftsreihenfolge verarbeitet und
//! ueber den Codec an PTT-Maschine, Playback-Engine und Roster verteilt.
//!
//! ## Lebenszyklus
//! - Unerwarteter Verlust im Raum: genau ein Reconnect-Timer mit fester
//!   Wartezeit, danach neuer Verbindungsversuch mit Raum und Name.
//! - Verlust vor dem ersten Beitritt: Beitrittsfehler, kein Retry.
//! - Verlassen ist die Abbruchgrenze: Timer weg, Uplink gestoppt,
//!   Pipeline abgebaut – auf jedem Austrittspfad.

use bytes::Bytes;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use sprechfunk_core::{MediaEvent, PeerName, RoomId, SprechfunkError, UiEvent};
use sprechfunk_media::PlaybackEngine;
use sprechfunk_protocol::WireMessage;

use crate::config::ClientConfig;
use crate::ptt::{PttAktion, PttMaschine, PttModus};
use crate::roster::RosterTracker;
use crate::uplink::Uplink;

/// Benutzerbefehle an die laufende Session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Befehl {
    /// Physische Sprechtaste gedrueckt (true) bzw. losgelassen (false)
    Taste(bool),
    /// PTT-Modus umschalten (gibt ausserhalb von Idle zuerst frei)
    ModusSetzen(PttModus),
    /// Raum verlassen und die Session beenden
    Verlassen,
}

/// Ausgang einer Verbindungsrunde
enum SitzungsEnde {
    /// Explizit verlassen – Session ist fertig
    Verlassen,
    /// Kanal unerwartet weg – Reconnect folgt
    VerbindungVerloren,
}

/// Ergebnis eines Sendeversuchs innerhalb der Runde
enum Fluss {
    Weiter,
    Verloren,
}

type KanalSender = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Die eine lebende Session eines Raums
///
/// Wird vom Top-Level-Runner erstellt und besitzt PTT-Maschine, Uplink,
/// Playback-Engine und Roster exklusiv – kein anderer Kontrollfluss
/// fasst diese Ressourcen an.
pub struct Sitzung {
    config: ClientConfig,
    raum: RoomId,
    name: PeerName,
    ptt: PttMaschine,
    roster: RosterTracker,
    uplink: Uplink,
    engine: PlaybackEngine,
    ui: mpsc::UnboundedSender<UiEvent>,
    jemals_beigetreten: bool,
}

impl Sitzung {
    pub fn neu(
        config: ClientConfig,
        raum: RoomId,
        name: PeerName,
        modus: PttModus,
        uplink: Uplink,
        engine: PlaybackEngine,
        ui: mpsc::UnboundedSender<UiEvent>,
    ) -> Self {
        let roster = RosterTracker::neu(name.clone());
        Self {
            config,
            raum,
            name,
            ptt: PttMaschine::neu(modus),
            roster,
            uplink,
            engine,
            ui,
            jemals_beigetreten: false,
        }
    }

    /// Faehrt die Session bis zum Verlassen (oder Beitrittsfehler)
    ///
    /// Verbindet, bedient die Ereignisschleife und reconnectet nach
    /// unerwartetem Verlust mit fester Wartezeit – mit denselben
    /// Zugangsdaten, ohne Benutzerinteraktion.
    pub async fn ausfuehren(
        mut self,
        mut befehle: mpsc::UnboundedReceiver<Befehl>,
        mut media: mpsc::UnboundedReceiver<MediaEvent>,
    ) -> sprechfunk_core::Result<()> {
        loop {
            match self.runde(&mut befehle, &mut media).await? {
                SitzungsEnde::Verlassen => {
                    self.aufraeumen(true);
                    tracing::info!("Raum verlassen");
                    return Ok(());
                }
                SitzungsEnde::VerbindungVerloren => {
                    self.aufraeumen(false);
                    self.ui_senden(UiEvent::VerbindungVerloren);
                    tracing::info!(
                        wartezeit_ms = self.config.verbindung.reconnect_ms,
                        "Verbindung verloren, Reconnect geplant"
                    );

                    // Genau ein ausstehender Reconnect-Timer; Verlassen
                    // waehrend der Wartezeit bricht ihn ab.
                    let frist = tokio::time::Instant::now() + self.config.reconnect_verzoegerung();
                    loop {
                        tokio::select! {
                            _ = tokio::time::sleep_until(frist) => break,
                            befehl = befehle.recv() => match befehl {
                                Some(Befehl::Verlassen) | None => {
                                    self.aufraeumen(true);
                                    return Ok(());
                                }
                                Some(_) => {
                                    // Sprechversuche ohne Kanal verfallen
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Eine Verbindungsrunde: verbinden, bedienen, Ausgang melden
    async fn runde(
        &mut self,
        befehle: &mut mpsc::UnboundedReceiver<Befehl>,
        media: &mut mpsc::UnboundedReceiver<MediaEvent>,
    ) -> sprechfunk_core::Result<SitzungsEnde> {
        let adresse = self.config.kanal_adresse(&self.raum, &self.name);
        tracing::info!(adresse = %adresse, "Verbinde mit Relay");

        let stream = match connect_async(adresse.as_str()).await {
            Ok((stream, _antwort)) => stream,
            Err(fehler) => {
                if self.jemals_beigetreten {
                    tracing::warn!(%fehler, "Reconnect fehlgeschlagen, naechster Versuch folgt");
                    return Ok(SitzungsEnde::VerbindungVerloren);
                }
                // Vor dem ersten Beitritt gibt es keinen automatischen Retry
                let grund = fehler.to_string();
                self.ui_senden(UiEvent::BeitrittFehlgeschlagen {
                    grund: grund.clone(),
                });
                return Err(SprechfunkError::BeitrittFehlgeschlagen(grund));
            }
        };

        self.jemals_beigetreten = true;
        self.ui_senden(UiEvent::RaumBeigetreten {
            raum: self.raum.clone(),
            name: self.name.clone(),
        });
        tracing::info!(raum = %self.raum, "Raum beigetreten");

        let (mut sender, mut empfaenger) = stream.split();

        loop {
            tokio::select! {
                nachricht = empfaenger.next() => match nachricht {
                    Some(Ok(Message::Binary(daten))) => {
                        if let Fluss::Verloren = self
                            .eingehend(Bytes::from(daten), &mut sender)
                            .await
                        {
                            return Ok(SitzungsEnde::VerbindungVerloren);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("Kanal geschlossen");
                        return Ok(SitzungsEnde::VerbindungVerloren);
                    }
                    // Ping/Pong beantwortet die Transportschicht beim Pollen
                    Some(Ok(_)) => {}
                    Some(Err(fehler)) => {
                        tracing::warn!(%fehler, "Kanalfehler");
                        return Ok(SitzungsEnde::VerbindungVerloren);
                    }
                },

                befehl = befehle.recv() => match befehl {
                    Some(Befehl::Taste(gedrueckt)) => {
                        let aktionen = self.ptt.taste(gedrueckt);
                        if let Fluss::Verloren = self.aktionen(aktionen, &mut sender).await {
                            return Ok(SitzungsEnde::VerbindungVerloren);
                        }
                    }
                    Some(Befehl::ModusSetzen(modus)) => {
                        let aktionen = self.ptt.modus_setzen(modus);
                        if let Fluss::Verloren = self.aktionen(aktionen, &mut sender).await {
                            return Ok(SitzungsEnde::VerbindungVerloren);
                        }
                    }
                    Some(Befehl::Verlassen) | None => {
                        // Laufende Sendung regulaer beenden, dann Abschied
                        let aktionen = self.ptt.deaktivieren();
                        let _ = self.aktionen(aktionen, &mut sender).await;
                        let _ = sender.send(Message::Close(None)).await;
                        return Ok(SitzungsEnde::Verlassen);
                    }
                },

                ereignis = media.recv() => match ereignis {
                    Some(MediaEvent::EncoderChunk(chunk)) => {
                        // Nur nicht-leere Chunks, und nur solange die Maschine
                        // noch im Sendet-Zustand ist – spaete Chunks verfallen.
                        if !chunk.is_empty() && self.ptt.ist_sendend() {
                            if let Fluss::Verloren =
                                senden(&mut sender, WireMessage::MediaChunk(chunk)).await
                            {
                                return Ok(SitzungsEnde::VerbindungVerloren);
                            }
                        } else {
                            tracing::trace!(
                                chunk_bytes = chunk.len(),
                                "Chunk ausserhalb der Sendung verworfen"
                            );
                        }
                    }
                    Some(MediaEvent::SenkeBereit) => {
                        let events = self.engine.senke_bereit();
                        self.ui_alle(events);
                    }
                    Some(MediaEvent::AppendFertig) => {
                        let events = self.engine.append_fertig();
                        self.ui_alle(events);
                    }
                    Some(MediaEvent::SenkeFehler(fehler)) => {
                        let events = self.engine.senken_fehler(fehler);
                        self.ui_alle(events);
                    }
                    None => {
                        // Medien-Adapter beendet – Session laeuft ohne weiter
                    }
                },
            }
        }
    }

    /// Verarbeitet eine eingehende Kanalnachricht in Ankunftsreihenfolge
    async fn eingehend(&mut self, daten: Bytes, sender: &mut KanalSender) -> Fluss {
        let Some(nachricht) = WireMessage::decode(daten) else {
            // Unbekanntes Tag oder leer: bereits geloggt, kein Zustandswechsel
            return Fluss::Weiter;
        };

        match nachricht {
            WireMessage::PttGranted => {
                let aktionen = self.ptt.gewaehrt();
                self.aktionen(aktionen, sender).await
            }
            WireMessage::PttDenied => {
                let aktionen = self.ptt.abgelehnt();
                self.aktionen(aktionen, sender).await
            }
            WireMessage::PttReleased => {
                // Anzeige raeumen und die Pipeline sofort abbauen;
                // der lokale PTT-Zustand bleibt unberuehrt.
                let events = self.roster.kanal_freigegeben();
                self.ui_alle(events);
                self.engine.freigeben();
                Fluss::Weiter
            }
            WireMessage::RelayChunk(chunk) => {
                let events = self.engine.chunk_empfangen(chunk);
                self.ui_alle(events);
                Fluss::Weiter
            }
            WireMessage::PeerInfo(nutzdaten) => {
                let sendet = self.ptt.ist_sendend();
                let events = self.roster.update(&nutzdaten, sendet);
                self.ui_alle(events);
                Fluss::Weiter
            }
            // Client->Server-Tags vom Server sind Protokollrauschen
            WireMessage::PttOn | WireMessage::PttOff | WireMessage::MediaChunk(_) => {
                tracing::warn!(tag = nachricht.tag(), "Unerwartete Client-Nachricht vom Server");
                Fluss::Weiter
            }
        }
    }

    /// Fuehrt die Aktionsliste der PTT-Maschine aus
    async fn aktionen(&mut self, aktionen: Vec<PttAktion>, sender: &mut KanalSender) -> Fluss {
        for aktion in aktionen {
            match aktion {
                PttAktion::SendePttOn => {
                    if let Fluss::Verloren = senden(sender, WireMessage::PttOn).await {
                        return Fluss::Verloren;
                    }
                }
                PttAktion::SendePttOff => {
                    if let Fluss::Verloren = senden(sender, WireMessage::PttOff).await {
                        return Fluss::Verloren;
                    }
                }
                PttAktion::UplinkStarten => {
                    if let Err(fehler) = self.uplink.starten() {
                        tracing::warn!(%fehler, "Uplink-Start fehlgeschlagen");
                        self.ui_senden(UiEvent::Stoerung(fehler.to_string()));
                        // Abbruch des Uebergangs: Idle + kompensierendes OFF
                        for folge in self.ptt.uplink_fehlgeschlagen() {
                            match folge {
                                PttAktion::SendePttOff => {
                                    if let Fluss::Verloren =
                                        senden(sender, WireMessage::PttOff).await
                                    {
                                        return Fluss::Verloren;
                                    }
                                }
                                PttAktion::Ui(event) => self.ui_senden(event),
                                _ => {}
                            }
                        }
                    }
                }
                PttAktion::UplinkStoppen => self.uplink.stoppen(),
                PttAktion::Ui(event) => self.ui_senden(event),
            }
        }
        Fluss::Weiter
    }

    /// Abbruchgrenze: auf jedem Austrittspfad Uplink und Pipeline abraeumen
    ///
    /// Beim Verlassen wird zusaetzlich das Aufnahmegeraet freigegeben;
    /// ueber einen Reconnect hinweg bleibt es warm.
    fn aufraeumen(&mut self, verlassen: bool) {
        self.ptt.zuruecksetzen();
        if verlassen {
            self.uplink.freigeben();
        } else {
            self.uplink.stoppen();
        }
        self.engine.freigeben();
    }

    fn ui_senden(&self, event: UiEvent) {
        let _ = self.ui.send(event);
    }

    fn ui_alle(&self, events: Vec<UiEvent>) {
        for event in events {
            self.ui_senden(event);
        }
    }
}

/// Sendet eine Wire-Nachricht; ein Fehler gilt als Verbindungsverlust
async fn senden(sender: &mut KanalSender, nachricht: WireMessage) -> Fluss {
    match sender
        .send(Message::Binary(nachricht.encode().to_vec()))
        .await
    {
        Ok(()) => Fluss::Weiter,
        Err(fehler) => {
            tracing::warn!(%fehler, "Senden fehlgeschlagen");
            Fluss::Verloren
        }
    }
}
