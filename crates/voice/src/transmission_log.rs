//! Warteschlange fuer Uebertragungs-Protokollierung
//!
//! Der Router darf im Hot-Path nicht auf Log-I/O warten: Eintraege
//! gehen in eine begrenzte Warteschlange, ein Hintergrund-Task
//! schreibt sie als strukturierte Log-Zeilen. Laeuft die Schlange
//! voll, werden Eintraege verworfen statt zu blockieren.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use funklink_core::types::ClientGuid;

/// Standard-Kapazitaet der Warteschlange
const STANDARD_KAPAZITAET: usize = 256;

/// Ein protokollierter Uebertragungs-Beginn
#[derive(Debug, Clone)]
pub struct TransmissionLogEintrag {
    pub guid: ClientGuid,
    pub name: String,
    /// Anzeige wie "251.000 AM" oder "INTERCOM"
    pub anzeige: String,
    pub zeitpunkt: DateTime<Utc>,
}

/// Sende-Seite der Protokoll-Warteschlange
#[derive(Clone)]
pub struct TransmissionLog {
    tx: mpsc::Sender<TransmissionLogEintrag>,
}

impl TransmissionLog {
    /// Startet den Schreib-Task und liefert das Queue-Handle.
    /// Der Task endet wenn alle Handles gedroppt sind.
    pub fn starten() -> (Self, JoinHandle<()>) {
        Self::mit_kapazitaet(STANDARD_KAPAZITAET)
    }

    pub fn mit_kapazitaet(kapazitaet: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<TransmissionLogEintrag>(kapazitaet);

        let task = tokio::spawn(async move {
            while let Some(eintrag) = rx.recv().await {
                info!(
                    target: "funklink::uebertragungen",
                    client = %eintrag.guid,
                    name = %eintrag.name,
                    auf = %eintrag.anzeige,
                    zeitpunkt = %eintrag.zeitpunkt.to_rfc3339(),
                    "Uebertragung begonnen"
                );
            }
            debug!("Uebertragungs-Protokoll beendet");
        });

        (Self { tx }, task)
    }

    /// Reiht einen Eintrag ein; bei voller Schlange wird verworfen
    pub fn protokollieren(&self, eintrag: TransmissionLogEintrag) {
        if let Err(e) = self.tx.try_send(eintrag) {
            debug!(fehler = %e, "Uebertragungs-Protokoll voll, Eintrag verworfen");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eintrag() -> TransmissionLogEintrag {
        TransmissionLogEintrag {
            guid: ClientGuid::neu(),
            name: "Viper 1-1".into(),
            anzeige: "251.000 AM".into(),
            zeitpunkt: Utc::now(),
        }
    }

    #[tokio::test]
    async fn eintraege_werden_verarbeitet() {
        let (log, task) = TransmissionLog::starten();
        log.protokollieren(eintrag());
        log.protokollieren(eintrag());
        drop(log);
        // Task endet sauber sobald alle Handles weg sind
        task.await.unwrap();
    }

    #[tokio::test]
    async fn volle_schlange_blockiert_nicht() {
        let (log, task) = TransmissionLog::mit_kapazitaet(1);
        for _ in 0..50 {
            log.protokollieren(eintrag());
        }
        drop(log);
        task.await.unwrap();
    }
}
