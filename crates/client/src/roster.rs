//! Peer-Roster-Tracker
//!
//! Haelt die Teilnehmerliste des Raums und den aktiven Sprecher. Jedes
//! PEER_INFO-Update ersetzt das Roster vollstaendig (kein Diffing); ein
//! kaputtes Update wird geloggt und das vorherige Roster bleibt stehen.

use sprechfunk_core::{PeerName, UiEvent};
use sprechfunk_protocol::PeerInfo;

/// Roster-Zustand eines Raums
#[derive(Debug)]
pub struct RosterTracker {
    eigener_name: PeerName,
    peers: Vec<PeerName>,
    talker: Option<PeerName>,
}

impl RosterTracker {
    pub fn neu(eigener_name: PeerName) -> Self {
        Self {
            eigener_name,
            peers: Vec::new(),
            talker: None,
        }
    }

    /// Gibt die aktuelle Teilnehmerliste zurueck
    pub fn peers(&self) -> &[PeerName] {
        &self.peers
    }

    /// Gibt den aktiven Sprecher zurueck
    pub fn talker(&self) -> Option<&PeerName> {
        self.talker.as_ref()
    }

    /// Verarbeitet die Nutzdaten eines PEER_INFO-Updates
    ///
    /// `lokal_sendet` steuert ob bei freiem Kanal der "Kanal frei"-Indikator
    /// gezeigt wird (waehrend der eigenen Sendung nicht).
    pub fn update(&mut self, nutzdaten: &[u8], lokal_sendet: bool) -> Vec<UiEvent> {
        let info = match PeerInfo::parse(nutzdaten) {
            Ok(info) => info,
            Err(fehler) => {
                tracing::warn!(%fehler, "Kaputtes PEER_INFO verworfen, Roster bleibt stehen");
                return Vec::new();
            }
        };

        self.peers = info.peer_namen();
        self.talker = info.talker_name();

        let mut events = vec![UiEvent::Roster {
            peers: self.peers.clone(),
            talker: self.talker.clone(),
        }];

        match &self.talker {
            Some(talker) if *talker == self.eigener_name => {
                // Die eigene Sendung hat ihren eigenen Indikator –
                // das Remote-Banner bleibt unberuehrt.
            }
            Some(talker) => {
                events.push(UiEvent::RemoteTalker(Some(talker.clone())));
                events.push(UiEvent::KeinStreamAnzeigen(false));
            }
            None => {
                events.push(UiEvent::RemoteTalker(None));
                if !lokal_sendet {
                    events.push(UiEvent::KeinStreamAnzeigen(true));
                }
            }
        }

        events
    }

    /// Der Kanal wurde freigegeben (PTT_RELEASED)
    ///
    /// Raeumt die Sprecher-Anzeige bedingungslos; der lokale PTT-Zustand
    /// bleibt davon unberuehrt.
    pub fn kanal_freigegeben(&mut self) -> Vec<UiEvent> {
        self.talker = None;
        vec![
            UiEvent::RemoteTalker(None),
            UiEvent::KeinStreamAnzeigen(true),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> RosterTracker {
        RosterTracker::neu(PeerName::new("anna"))
    }

    #[test]
    fn update_ersetzt_roster_vollstaendig() {
        let mut t = tracker();
        t.update(br#"{"peers":["anna","ben"],"talker":""}"#, false);
        t.update(br#"{"peers":["anna","clara"],"talker":""}"#, false);

        let namen: Vec<&str> = t.peers().iter().map(|p| p.inner()).collect();
        assert_eq!(namen, vec!["anna", "clara"]);
    }

    #[test]
    fn fremder_talker_setzt_banner() {
        let mut t = tracker();
        let events = t.update(br#"{"peers":["anna","ben"],"talker":"ben"}"#, false);

        assert!(events.contains(&UiEvent::RemoteTalker(Some(PeerName::new("ben")))));
        assert!(events.contains(&UiEvent::KeinStreamAnzeigen(false)));
        assert_eq!(t.talker(), Some(&PeerName::new("ben")));
    }

    #[test]
    fn eigener_name_setzt_nie_das_remote_banner() {
        let mut t = tracker();
        let events = t.update(br#"{"peers":["anna","ben"],"talker":"anna"}"#, true);

        assert!(
            !events
                .iter()
                .any(|e| matches!(e, UiEvent::RemoteTalker(Some(_)))),
            "Eigene Sendung darf kein Remote-Banner setzen"
        );
    }

    #[test]
    fn freier_kanal_zeigt_indikator_nur_wenn_nicht_gesendet_wird() {
        let mut t = tracker();
        let events = t.update(br#"{"peers":["anna"],"talker":""}"#, false);
        assert!(events.contains(&UiEvent::KeinStreamAnzeigen(true)));

        let events = t.update(br#"{"peers":["anna"],"talker":""}"#, true);
        assert!(!events.contains(&UiEvent::KeinStreamAnzeigen(true)));
    }

    #[test]
    fn kaputtes_update_behaelt_altes_roster() {
        let mut t = tracker();
        t.update(br#"{"peers":["anna","ben"],"talker":"ben"}"#, false);

        let events = t.update(b"{kaputt", false);
        assert!(events.is_empty());
        assert_eq!(t.peers().len(), 2);
        assert_eq!(t.talker(), Some(&PeerName::new("ben")));
    }

    #[test]
    fn kanal_freigegeben_raeumt_die_anzeige() {
        let mut t = tracker();
        t.update(br#"{"peers":["anna","ben"],"talker":"ben"}"#, false);

        let events = t.kanal_freigegeben();
        assert_eq!(t.talker(), None);
        assert!(events.contains(&UiEvent::RemoteTalker(None)));
        assert!(events.contains(&UiEvent::KeinStreamAnzeigen(true)));
    }

    #[test]
    fn roster_event_traegt_die_volle_liste() {
        let mut t = tracker();
        let events = t.update(br#"{"peers":["anna","ben","clara"],"talker":"ben"}"#, false);
        match &events[0] {
            UiEvent::Roster { peers, talker } => {
                assert_eq!(peers.len(), 3);
                assert_eq!(talker, &Some(PeerName::new("ben")));
            }
            andere => panic!("Roster-Event erwartet, erhalten: {:?}", andere),
        }
    }
}
