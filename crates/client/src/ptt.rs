//! Push-to-Talk Zustandsmaschine
//!
//! Drei Zustaende: Idle, Anfrage (PTT_ON gesendet, Antwort steht aus),
//! Sendet (Server hat gewaehrt). Die Maschine ist rein: Eingaben sind
//! Benutzer- und Server-Ereignisse, Ausgaben eine geordnete Aktionsliste,
//! die die Session-Schleife ausfuehrt. Sie haelt die Kerninvariante des
//! Protokolls: der Server sieht zu jedem gewaehrten ON genau ein OFF.

use sprechfunk_core::UiEvent;

/// Betriebsmodus der Sprechtaste
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PttModus {
    /// Taste halten um zu senden – loslassen stoppt die Uebertragung
    #[default]
    Hold,
    /// Einmal druecken zum Aktivieren, nochmals zum Deaktivieren
    Toggle,
}

/// Zustand der PTT-Maschine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PttZustand {
    /// Kein Sendewunsch
    #[default]
    Idle,
    /// PTT_ON gesendet, Grant/Deny steht aus
    Anfrage,
    /// Server hat gewaehrt, Uplink laeuft
    Sendet,
}

/// Von der Maschine angeordnete Seiteneffekte
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PttAktion {
    /// PTT_ON an den Server senden
    SendePttOn,
    /// PTT_OFF an den Server senden (regulaer oder kompensierend)
    SendePttOff,
    /// Aufnahme + Encoder starten
    UplinkStarten,
    /// Aufnahme-Encoder stoppen
    UplinkStoppen,
    /// Anzeige-Ereignis an die Oberflaeche weiterreichen
    Ui(UiEvent),
}

/// Push-to-Talk Zustandsmaschine
#[derive(Debug, Default)]
pub struct PttMaschine {
    zustand: PttZustand,
    modus: PttModus,
}

impl PttMaschine {
    pub fn neu(modus: PttModus) -> Self {
        Self {
            zustand: PttZustand::Idle,
            modus,
        }
    }

    /// Gibt den aktuellen Zustand zurueck
    pub fn zustand(&self) -> PttZustand {
        self.zustand
    }

    /// Gibt den aktuellen Modus zurueck
    pub fn modus(&self) -> PttModus {
        self.modus
    }

    /// Gibt true zurueck wenn aktuell gesendet wird
    pub fn ist_sendend(&self) -> bool {
        self.zustand == PttZustand::Sendet
    }

    // -----------------------------------------------------------------------
    // Physische Eingabe
    // -----------------------------------------------------------------------

    /// Physischer Tastendruck bzw. -loslassen, gemappt ueber den Modus
    pub fn taste(&mut self, gedrueckt: bool) -> Vec<PttAktion> {
        match self.modus {
            PttModus::Hold => {
                if gedrueckt {
                    self.aktivieren()
                } else {
                    self.deaktivieren()
                }
            }
            PttModus::Toggle => {
                if !gedrueckt {
                    // Loslassen hat im Toggle-Modus keine Bedeutung
                    return Vec::new();
                }
                if self.zustand == PttZustand::Idle {
                    self.aktivieren()
                } else {
                    self.deaktivieren()
                }
            }
        }
    }

    /// Wechselt den Modus; ausserhalb von Idle wird vorher freigegeben
    pub fn modus_setzen(&mut self, modus: PttModus) -> Vec<PttAktion> {
        let mut aktionen = Vec::new();
        if self.zustand != PttZustand::Idle {
            aktionen = self.deaktivieren();
        }
        self.modus = modus;
        aktionen
    }

    // -----------------------------------------------------------------------
    // Logische Uebergaenge
    // -----------------------------------------------------------------------

    /// Benutzer will senden: Idle -> Anfrage, PTT_ON geht raus
    pub fn aktivieren(&mut self) -> Vec<PttAktion> {
        if self.zustand != PttZustand::Idle {
            return Vec::new();
        }
        self.zustand = PttZustand::Anfrage;
        tracing::debug!("Sprechanfrage gestellt");
        vec![
            PttAktion::Ui(UiEvent::SendungBeginnt),
            PttAktion::SendePttOn,
        ]
    }

    /// Benutzer gibt frei: Anfrage/Sendet -> Idle, PTT_OFF geht raus
    ///
    /// Aus Anfrage heraus ist das OFF kompensierend – die Antwort des
    /// Servers ist noch unterwegs, er muss die Anfrage trotzdem als
    /// beendet sehen.
    pub fn deaktivieren(&mut self) -> Vec<PttAktion> {
        match self.zustand {
            PttZustand::Idle => Vec::new(),
            PttZustand::Anfrage => {
                self.zustand = PttZustand::Idle;
                tracing::debug!("Sprechanfrage vor der Antwort zurueckgezogen");
                vec![
                    PttAktion::Ui(UiEvent::SendungEndet),
                    PttAktion::SendePttOff,
                ]
            }
            PttZustand::Sendet => {
                self.zustand = PttZustand::Idle;
                tracing::debug!("Sendung beendet");
                vec![
                    PttAktion::Ui(UiEvent::SendungEndet),
                    PttAktion::SendePttOff,
                    PttAktion::UplinkStoppen,
                ]
            }
        }
    }

    // -----------------------------------------------------------------------
    // Server-Antworten
    // -----------------------------------------------------------------------

    /// Server hat gewaehrt
    ///
    /// Kritisches Rennen: trifft der Grant ein nachdem lokal schon
    /// freigegeben wurde, geht genau ein kompensierendes PTT_OFF raus und
    /// der Grant wird ignoriert – Sendet wird in dem Fall nie betreten.
    pub fn gewaehrt(&mut self) -> Vec<PttAktion> {
        if self.zustand != PttZustand::Anfrage {
            tracing::debug!(zustand = ?self.zustand, "Grant nach lokalem Release, kompensiere");
            return vec![PttAktion::SendePttOff];
        }
        self.zustand = PttZustand::Sendet;
        tracing::debug!("Sprechanfrage gewaehrt, Uplink startet");
        vec![PttAktion::UplinkStarten]
    }

    /// Server hat abgelehnt (Kanal besetzt)
    pub fn abgelehnt(&mut self) -> Vec<PttAktion> {
        if self.zustand != PttZustand::Anfrage {
            return Vec::new();
        }
        self.zustand = PttZustand::Idle;
        tracing::debug!("Sprechanfrage abgelehnt, Kanal besetzt");
        vec![PttAktion::Ui(UiEvent::KanalBesetzt)]
    }

    // -----------------------------------------------------------------------
    // Lokale Fehler- und Lebenszyklus-Pfade
    // -----------------------------------------------------------------------

    /// Uplink-Start fehlgeschlagen (Geraet verweigert / Format fehlt)
    ///
    /// Bricht den Uebergang ab: zurueck nach Idle plus kompensierendes OFF.
    pub fn uplink_fehlgeschlagen(&mut self) -> Vec<PttAktion> {
        if self.zustand != PttZustand::Sendet {
            return Vec::new();
        }
        self.zustand = PttZustand::Idle;
        vec![
            PttAktion::Ui(UiEvent::SendungEndet),
            PttAktion::SendePttOff,
        ]
    }

    /// Setzt die Maschine ohne Seiteneffekte auf Idle zurueck
    /// (Verbindungsverlust oder Verlassen des Raums – der Kanal ist weg,
    /// ein OFF wuerde ins Leere gehen)
    pub fn zuruecksetzen(&mut self) {
        self.zustand = PttZustand::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zaehle(aktionen: &[PttAktion], gesucht: &PttAktion) -> usize {
        aktionen.iter().filter(|a| *a == gesucht).count()
    }

    #[test]
    fn aktivieren_sendet_on_und_geht_in_anfrage() {
        let mut ptt = PttMaschine::neu(PttModus::Hold);
        let aktionen = ptt.taste(true);
        assert_eq!(ptt.zustand(), PttZustand::Anfrage);
        assert_eq!(zaehle(&aktionen, &PttAktion::SendePttOn), 1);
        assert!(!ptt.ist_sendend());
    }

    #[test]
    fn doppeltes_druecken_sendet_nur_ein_on() {
        let mut ptt = PttMaschine::neu(PttModus::Hold);
        ptt.taste(true);
        let aktionen = ptt.taste(true); // Key-Repeat
        assert!(aktionen.is_empty());
    }

    #[test]
    fn grant_in_anfrage_startet_uplink() {
        let mut ptt = PttMaschine::neu(PttModus::Hold);
        ptt.taste(true);
        let aktionen = ptt.gewaehrt();
        assert_eq!(ptt.zustand(), PttZustand::Sendet);
        assert_eq!(aktionen, vec![PttAktion::UplinkStarten]);
    }

    #[test]
    fn release_in_sendet_stoppt_uplink_und_sendet_off() {
        let mut ptt = PttMaschine::neu(PttModus::Hold);
        ptt.taste(true);
        ptt.gewaehrt();
        let aktionen = ptt.taste(false);
        assert_eq!(ptt.zustand(), PttZustand::Idle);
        assert_eq!(zaehle(&aktionen, &PttAktion::SendePttOff), 1);
        assert_eq!(zaehle(&aktionen, &PttAktion::UplinkStoppen), 1);
    }

    #[test]
    fn grant_nach_lokalem_release_kompensiert_genau_einmal() {
        let mut ptt = PttMaschine::neu(PttModus::Hold);
        let mut offs = 0;
        offs += zaehle(&ptt.taste(true), &PttAktion::SendePttOff);
        offs += zaehle(&ptt.taste(false), &PttAktion::SendePttOff); // Release vor der Antwort
        assert_eq!(offs, 1);

        // Der verspaetete Grant trifft im Idle ein
        let aktionen = ptt.gewaehrt();
        assert_eq!(aktionen, vec![PttAktion::SendePttOff]);
        assert_eq!(ptt.zustand(), PttZustand::Idle, "Sendet darf nie betreten werden");
        assert!(!aktionen.contains(&PttAktion::UplinkStarten));
    }

    #[test]
    fn ablehnung_meldet_kanal_besetzt() {
        let mut ptt = PttMaschine::neu(PttModus::Hold);
        ptt.taste(true);
        let aktionen = ptt.abgelehnt();
        assert_eq!(ptt.zustand(), PttZustand::Idle);
        assert_eq!(aktionen, vec![PttAktion::Ui(UiEvent::KanalBesetzt)]);
        // Kein OFF fuer eine abgelehnte Anfrage
        assert_eq!(zaehle(&aktionen, &PttAktion::SendePttOff), 0);
    }

    #[test]
    fn verspaetete_ablehnung_im_idle_ist_harmlos() {
        let mut ptt = PttMaschine::neu(PttModus::Hold);
        assert!(ptt.abgelehnt().is_empty());
        assert_eq!(ptt.zustand(), PttZustand::Idle);
    }

    #[test]
    fn toggle_modus_schaltet_mit_jedem_druck() {
        let mut ptt = PttMaschine::neu(PttModus::Toggle);
        let aktionen = ptt.taste(true);
        assert_eq!(ptt.zustand(), PttZustand::Anfrage);
        assert_eq!(zaehle(&aktionen, &PttAktion::SendePttOn), 1);

        // Loslassen aendert nichts
        assert!(ptt.taste(false).is_empty());
        assert_eq!(ptt.zustand(), PttZustand::Anfrage);

        // Zweiter Druck gibt frei
        let aktionen = ptt.taste(true);
        assert_eq!(ptt.zustand(), PttZustand::Idle);
        assert_eq!(zaehle(&aktionen, &PttAktion::SendePttOff), 1);
    }

    #[test]
    fn modus_wechsel_waehrend_sendung_gibt_zuerst_frei() {
        let mut ptt = PttMaschine::neu(PttModus::Hold);
        ptt.taste(true);
        ptt.gewaehrt();

        let aktionen = ptt.modus_setzen(PttModus::Toggle);
        assert_eq!(ptt.zustand(), PttZustand::Idle);
        assert_eq!(ptt.modus(), PttModus::Toggle);
        assert_eq!(zaehle(&aktionen, &PttAktion::SendePttOff), 1);
        assert_eq!(zaehle(&aktionen, &PttAktion::UplinkStoppen), 1);
    }

    #[test]
    fn modus_wechsel_im_idle_ohne_seiteneffekte() {
        let mut ptt = PttMaschine::neu(PttModus::Hold);
        assert!(ptt.modus_setzen(PttModus::Toggle).is_empty());
        assert_eq!(ptt.modus(), PttModus::Toggle);
    }

    #[test]
    fn on_off_bilanz_ohne_serverantworten_ausgeglichen() {
        // Beliebige Druck/Loslass-Folge ohne Grant/Deny: am Ende Idle und
        // gleich viele ON wie OFF
        let mut ptt = PttMaschine::neu(PttModus::Hold);
        let folge = [true, false, true, true, false, false, true, false];
        let mut on = 0;
        let mut off = 0;
        for gedrueckt in folge {
            let aktionen = ptt.taste(gedrueckt);
            on += zaehle(&aktionen, &PttAktion::SendePttOn);
            off += zaehle(&aktionen, &PttAktion::SendePttOff);
        }
        assert_eq!(ptt.zustand(), PttZustand::Idle);
        assert_eq!(on, off, "ON/OFF-Bilanz verletzt: {} vs {}", on, off);
    }

    #[test]
    fn uplink_fehlschlag_faellt_auf_idle_zurueck() {
        let mut ptt = PttMaschine::neu(PttModus::Hold);
        ptt.taste(true);
        ptt.gewaehrt();

        let aktionen = ptt.uplink_fehlgeschlagen();
        assert_eq!(ptt.zustand(), PttZustand::Idle);
        assert_eq!(zaehle(&aktionen, &PttAktion::SendePttOff), 1);
    }

    #[test]
    fn zuruecksetzen_ist_seiteneffektfrei() {
        let mut ptt = PttMaschine::neu(PttModus::Hold);
        ptt.taste(true);
        ptt.gewaehrt();
        ptt.zuruecksetzen();
        assert_eq!(ptt.zustand(), PttZustand::Idle);
    }
}
