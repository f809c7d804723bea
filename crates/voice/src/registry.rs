//! Geteiltes Client-Verzeichnis
//!
//! Router und Client-Update-Pfade lesen und schreiben gleichzeitig:
//! der Router pflegt VoIP-Endpunkt und Sende-Anzeige, der besitzende
//! Client seinen Geraetesatz. Updates sind feldweise last-writer-wins,
//! zusammengesetzte Lesezugriffe koennen ein zerrissenes Bild ueber
//! mehrere Felder sehen – das ist fuer alle Nutzer hier akzeptabel.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use funklink_core::types::{ClientGuid, Coalition};
use funklink_radio::RadioSet;

/// Eintrag eines verbundenen Clients
#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub guid: ClientGuid,
    pub name: String,
    pub coalition: Coalition,
    /// Vom Server stummgeschaltet
    pub stumm: bool,
    /// Gateway-Clients (z.B. Telefonie-Bruecken) empfangen immer
    pub gateway: bool,
    /// Zuletzt gesehener Voice-Endpunkt, vom Router gelernt
    pub voip_endpunkt: Option<SocketAddr>,
    /// Geraetesatz, vom besitzenden Client synchronisiert
    pub radios: RadioSet,
    /// Anzeige "sendet gerade auf", nur fuer Oberflaechen
    pub sendet_auf: Option<String>,
    /// Zeitpunkt der letzten Uebertragung
    pub letzte_uebertragung: Option<DateTime<Utc>>,
}

impl ClientRecord {
    pub fn neu(guid: ClientGuid, name: impl Into<String>, coalition: Coalition) -> Self {
        Self {
            guid,
            name: name.into(),
            coalition,
            stumm: false,
            gateway: false,
            voip_endpunkt: None,
            radios: RadioSet::leer(),
            sendet_auf: None,
            letzte_uebertragung: None,
        }
    }
}

/// Nebenlaeufiges Verzeichnis aller verbundenen Clients
///
/// Clone ist billig (geteilte Map), das Verzeichnis wird vom
/// Kompositions-Root besessen und an Router/Handler gereicht.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<DashMap<ClientGuid, ClientRecord>>,
}

impl ClientRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    pub fn einfuegen(&self, record: ClientRecord) {
        self.clients.insert(record.guid.clone(), record);
    }

    pub fn entfernen(&self, guid: &ClientGuid) -> Option<ClientRecord> {
        self.clients.remove(guid).map(|(_, record)| record)
    }

    pub fn anzahl(&self) -> usize {
        self.clients.len()
    }

    /// Liest einen Eintrag ueber eine Closure (Lock nur fuer die Dauer
    /// des Aufrufs)
    pub fn lesen<T>(&self, guid: &ClientGuid, f: impl FnOnce(&ClientRecord) -> T) -> Option<T> {
        self.clients.get(guid).map(|eintrag| f(&eintrag))
    }

    /// Aktualisiert einen Eintrag feldweise (last-writer-wins)
    pub fn aktualisieren(&self, guid: &ClientGuid, f: impl FnOnce(&mut ClientRecord)) -> bool {
        match self.clients.get_mut(guid) {
            Some(mut eintrag) => {
                f(&mut eintrag);
                true
            }
            None => false,
        }
    }

    /// Lernt den Voice-Endpunkt eines Clients
    pub fn endpunkt_setzen(&self, guid: &ClientGuid, endpunkt: SocketAddr) -> bool {
        self.aktualisieren(guid, |eintrag| eintrag.voip_endpunkt = Some(endpunkt))
    }

    /// Ruft die Closure fuer jeden Eintrag auf (Reihenfolge unbestimmt)
    pub fn fuer_alle(&self, mut f: impl FnMut(&ClientRecord)) {
        for eintrag in self.clients.iter() {
            f(&eintrag);
        }
    }
}
