//! Client-seitiger UDP Voice-Transport
//!
//! Haelt die Voice-Session zum Server: periodische Keepalive-Pings,
//! Empfang eingehender Pakete, Versand ausgehender Pakete und ein
//! Inaktivitaets-Zeitlimit mit komplettem Socket-Neuaufbau.
//!
//! ## Zustandsmaschine
//!
//! ```text
//! [Socket binden] --Fehler--> Pause, erneut versuchen
//!       |
//!       v
//! [Nicht bereit] --Keepalive-Echo--> [Bereit]
//!       |                               |
//!       |<------ 42s ohne Datagramm ----+--> Socket neu aufbauen
//! ```
//!
//! Bereitschaft gilt erst nach dem ersten Keepalive-Echo vom Server und
//! faellt bei jedem Neuaufbau sofort zurueck. Ausgehende Pakete werden
//! nur im bereiten Zustand versendet und bleiben sonst in der
//! Warteschlange. Die Ereignis-Prioritaet in der Session-Loop ist fest:
//! Abbruch vor Ping vor Empfang vor Versand vor Zeitlimit.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use funklink_core::event::{EventBus, FunklinkEvent};
use funklink_core::types::{ClientGuid, GUID_LAENGE};

/// Maximale erwartete Datagramm-Groesse
const EMPFANGS_PUFFER: usize = 1600;

/// Zeitparameter der Session-Loop
#[derive(Debug, Clone, Copy)]
pub struct TransportZeiten {
    /// Abstand zwischen Keepalive-Pings
    pub ping_intervall: Duration,
    /// Inaktivitaets-Limit, danach wird der Socket neu aufgebaut
    pub zeitlimit: Duration,
    /// Pause vor einem erneuten Bind-Versuch
    pub neuaufbau_pause: Duration,
}

impl Default for TransportZeiten {
    fn default() -> Self {
        Self {
            ping_intervall: Duration::from_secs(15),
            zeitlimit: Duration::from_secs(42),
            neuaufbau_pause: Duration::from_secs(5),
        }
    }
}

/// Sende-Handle des Transports
///
/// Clone-bar und billig; kann an Capture-/Encoder-Pfade gereicht werden.
#[derive(Clone)]
pub struct VoiceTransportHandle {
    ausgehend_tx: mpsc::UnboundedSender<Vec<u8>>,
    bereit: Arc<AtomicBool>,
}

impl VoiceTransportHandle {
    /// Reiht ein kodiertes Voice-Paket zum Versand ein.
    ///
    /// Pakete die vor der Bereitschaft eingereiht werden, bleiben in der
    /// Warteschlange und gehen nach dem ersten Keepalive-Echo raus.
    pub fn senden(&self, daten: Vec<u8>) -> bool {
        self.ausgehend_tx.send(daten).is_ok()
    }

    /// Prueft ob die Session das Keepalive-Echo des Servers gesehen hat
    pub fn ist_bereit(&self) -> bool {
        self.bereit.load(Ordering::Acquire)
    }
}

/// Client-seitige UDP Voice-Session
pub struct VoiceTransport {
    guid: ClientGuid,
    server_adresse: SocketAddr,
    events: Arc<dyn EventBus>,
    zeiten: TransportZeiten,
    bereit: Arc<AtomicBool>,
    ausgehend_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    eingehend_tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl VoiceTransport {
    /// Erstellt den Transport mit Standard-Zeitparametern.
    ///
    /// Liefert neben dem Transport das Sende-Handle und den Empfaenger
    /// fuer eingehende Voice-Datagramme.
    pub fn neu(
        guid: ClientGuid,
        server_adresse: SocketAddr,
        events: Arc<dyn EventBus>,
    ) -> (Self, VoiceTransportHandle, mpsc::UnboundedReceiver<Vec<u8>>) {
        Self::mit_zeiten(guid, server_adresse, events, TransportZeiten::default())
    }

    pub fn mit_zeiten(
        guid: ClientGuid,
        server_adresse: SocketAddr,
        events: Arc<dyn EventBus>,
        zeiten: TransportZeiten,
    ) -> (Self, VoiceTransportHandle, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (ausgehend_tx, ausgehend_rx) = mpsc::unbounded_channel();
        let (eingehend_tx, eingehend_rx) = mpsc::unbounded_channel();
        let bereit = Arc::new(AtomicBool::new(false));

        let handle = VoiceTransportHandle {
            ausgehend_tx,
            bereit: Arc::clone(&bereit),
        };
        let transport = Self {
            guid,
            server_adresse,
            events,
            zeiten,
            bereit,
            ausgehend_rx,
            eingehend_tx,
        };

        (transport, handle, eingehend_rx)
    }

    /// Betreibt die Session bis zum Abbruch-Signal.
    ///
    /// Bind-Fehler und Zeitlimit-Ueberschreitungen fuehren zu einem
    /// kompletten Socket-Neuaufbau, nie zum Ende der Loop.
    pub async fn lauf(self, abbruch: CancellationToken) {
        let Self {
            guid,
            server_adresse,
            events,
            zeiten,
            bereit,
            mut ausgehend_rx,
            eingehend_tx,
        } = self;

        let bereit_setzen = |neu: bool| {
            if bereit.swap(neu, Ordering::AcqRel) != neu {
                if neu {
                    info!("Voice-Transport bereit (Keepalive-Echo empfangen)");
                } else {
                    warn!("Voice-Transport nicht mehr bereit");
                }
                events.senden(FunklinkEvent::VoipBereitschaft { bereit: neu });
            }
        };

        'verbindung: loop {
            if abbruch.is_cancelled() {
                break;
            }
            bereit_setzen(false);

            let socket = match Self::socket_aufbauen(server_adresse).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(fehler = %e, server = %server_adresse, "Voice-Socket-Aufbau fehlgeschlagen");
                    tokio::select! {
                        _ = abbruch.cancelled() => break 'verbindung,
                        _ = tokio::time::sleep(zeiten.neuaufbau_pause) => continue 'verbindung,
                    }
                }
            };
            debug!(server = %server_adresse, "Voice-Socket verbunden");

            let mut puffer = [0u8; EMPFANGS_PUFFER];
            // Erster Ping sofort, Zeitlimit laeuft ab jetzt
            let mut ping_faellig = Instant::now();
            let mut zeitfrist = Instant::now() + zeiten.zeitlimit;

            loop {
                tokio::select! {
                    // Feste Prioritaet: Abbruch, Ping, Empfang, Versand, Zeitlimit
                    biased;

                    _ = abbruch.cancelled() => {
                        info!("Voice-Transport: Abbruch-Signal empfangen");
                        break 'verbindung;
                    }

                    _ = tokio::time::sleep_until(ping_faellig) => {
                        if let Err(e) = socket.send(guid.as_bytes()).await {
                            warn!(fehler = %e, "Keepalive-Versand fehlgeschlagen");
                        }
                        // Naechster Ping relativ zum Abschluss, nicht zur Faelligkeit
                        ping_faellig = Instant::now() + zeiten.ping_intervall;
                    }

                    ergebnis = socket.recv(&mut puffer) => {
                        match ergebnis {
                            Ok(laenge) => {
                                // Jedes Server-Datagramm haelt die Session am Leben
                                zeitfrist = Instant::now() + zeiten.zeitlimit;
                                if laenge == GUID_LAENGE {
                                    bereit_setzen(true);
                                } else if bereit.load(Ordering::Acquire) {
                                    if eingehend_tx.send(puffer[..laenge].to_vec()).is_err() {
                                        info!("Empfaenger geschlossen, Voice-Transport endet");
                                        break 'verbindung;
                                    }
                                } else {
                                    debug!(laenge, "Voice-Datagramm vor Bereitschaft verworfen");
                                }
                            }
                            Err(e) => {
                                warn!(fehler = %e, "UDP-Empfangsfehler im Voice-Transport");
                            }
                        }
                    }

                    nachricht = ausgehend_rx.recv(), if bereit.load(Ordering::Acquire) => {
                        let Some(daten) = nachricht else {
                            info!("Sende-Handles geschlossen, Voice-Transport endet");
                            break 'verbindung;
                        };
                        if let Err(e) = socket.send(&daten).await {
                            warn!(fehler = %e, "Voice-Versand fehlgeschlagen");
                        }
                        // Warteschlange komplett leeren bevor wieder empfangen wird
                        while let Ok(weitere) = ausgehend_rx.try_recv() {
                            if let Err(e) = socket.send(&weitere).await {
                                warn!(fehler = %e, "Voice-Versand fehlgeschlagen");
                            }
                        }
                    }

                    _ = tokio::time::sleep_until(zeitfrist) => {
                        error!(
                            zeitlimit = ?zeiten.zeitlimit,
                            "Kein Server-Datagramm innerhalb des Zeitlimits, Socket wird neu aufgebaut"
                        );
                        continue 'verbindung;
                    }
                }
            }
        }

        bereit_setzen(false);
        info!("Voice-Transport beendet");
    }

    async fn socket_aufbauen(server_adresse: SocketAddr) -> std::io::Result<UdpSocket> {
        let bind_adresse: SocketAddr = if server_adresse.is_ipv4() {
            "0.0.0.0:0".parse().expect("Gueltige Bind-Adresse")
        } else {
            "[::]:0".parse().expect("Gueltige Bind-Adresse")
        };
        let socket = UdpSocket::bind(bind_adresse).await?;
        socket.connect(server_adresse).await?;
        Ok(socket)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use funklink_core::event::NullEventBus;

    fn test_zeiten() -> TransportZeiten {
        TransportZeiten {
            ping_intervall: Duration::from_millis(50),
            zeitlimit: Duration::from_millis(300),
            neuaufbau_pause: Duration::from_millis(20),
        }
    }

    async fn test_server() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let adresse = socket.local_addr().unwrap();
        (socket, adresse)
    }

    async fn warte_auf_bereitschaft(handle: &VoiceTransportHandle, erwartet: bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while handle.ist_bereit() != erwartet {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("Bereitschafts-Wechsel erwartet");
    }

    /// Empfaengt das naechste Keepalive und schickt das Echo zurueck
    async fn keepalive_echoen(server: &UdpSocket, guid: &ClientGuid) -> SocketAddr {
        let mut buf = [0u8; EMPFANGS_PUFFER];
        let (laenge, absender) = tokio::time::timeout(
            Duration::from_secs(2),
            server.recv_from(&mut buf),
        )
        .await
        .expect("Keepalive erwartet")
        .unwrap();
        assert_eq!(&buf[..laenge], guid.as_bytes());
        server.send_to(&buf[..laenge], absender).await.unwrap();
        absender
    }

    #[tokio::test]
    async fn bereit_erst_nach_keepalive_echo() {
        let (server, adresse) = test_server().await;
        let guid = ClientGuid::neu();
        let (transport, handle, _eingehend) = VoiceTransport::mit_zeiten(
            guid.clone(),
            adresse,
            Arc::new(NullEventBus),
            test_zeiten(),
        );

        let abbruch = CancellationToken::new();
        let task = tokio::spawn(transport.lauf(abbruch.clone()));

        assert!(!handle.ist_bereit());
        keepalive_echoen(&server, &guid).await;
        warte_auf_bereitschaft(&handle, true).await;

        abbruch.cancel();
        task.await.unwrap();
        assert!(!handle.ist_bereit());
    }

    #[tokio::test]
    async fn ausgehende_pakete_warten_auf_bereitschaft() {
        let (server, adresse) = test_server().await;
        let guid = ClientGuid::neu();
        let (transport, handle, _eingehend) = VoiceTransport::mit_zeiten(
            guid.clone(),
            adresse,
            Arc::new(NullEventBus),
            test_zeiten(),
        );

        let abbruch = CancellationToken::new();
        let task = tokio::spawn(transport.lauf(abbruch.clone()));

        // Vor der Bereitschaft eingereiht, darf erst nach dem Echo rausgehen
        assert!(handle.senden(vec![0xAA; 100]));
        keepalive_echoen(&server, &guid).await;

        // Zwischendrin koennen weitere Keepalives eintreffen
        let mut buf = [0u8; EMPFANGS_PUFFER];
        let daten = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let (laenge, _) = server.recv_from(&mut buf).await.unwrap();
                if laenge != GUID_LAENGE {
                    break buf[..laenge].to_vec();
                }
            }
        })
        .await
        .expect("Ausgehendes Paket erwartet");
        assert_eq!(daten, vec![0xAA; 100]);

        abbruch.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn eingehende_pakete_werden_weitergereicht() {
        let (server, adresse) = test_server().await;
        let guid = ClientGuid::neu();
        let (transport, _handle, mut eingehend) = VoiceTransport::mit_zeiten(
            guid.clone(),
            adresse,
            Arc::new(NullEventBus),
            test_zeiten(),
        );

        let abbruch = CancellationToken::new();
        let task = tokio::spawn(transport.lauf(abbruch.clone()));

        let client_adresse = keepalive_echoen(&server, &guid).await;
        server.send_to(&[0x42; 90], client_adresse).await.unwrap();

        let paket = tokio::time::timeout(Duration::from_secs(2), eingehend.recv())
            .await
            .expect("Eingehendes Paket erwartet")
            .unwrap();
        assert_eq!(paket, vec![0x42; 90]);

        abbruch.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn zeitlimit_baut_socket_neu_auf() {
        let (server, adresse) = test_server().await;
        let guid = ClientGuid::neu();
        let (transport, handle, _eingehend) = VoiceTransport::mit_zeiten(
            guid.clone(),
            adresse,
            Arc::new(NullEventBus),
            test_zeiten(),
        );

        let abbruch = CancellationToken::new();
        let task = tokio::spawn(transport.lauf(abbruch.clone()));

        keepalive_echoen(&server, &guid).await;
        warte_auf_bereitschaft(&handle, true).await;

        // Server schweigt: Zeitlimit faellt, Bereitschaft geht verloren
        warte_auf_bereitschaft(&handle, false).await;

        // Waehrend der Stille hat der alte Socket weiter gepingt; so lange
        // echoen bis das Echo den neu aufgebauten Socket erreicht
        tokio::time::timeout(Duration::from_secs(2), async {
            while !handle.ist_bereit() {
                keepalive_echoen(&server, &guid).await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Session muss nach dem Neuaufbau zurueckkommen");

        abbruch.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn abbruch_beendet_die_session() {
        let (_server, adresse) = test_server().await;
        let (transport, _handle, _eingehend) = VoiceTransport::mit_zeiten(
            ClientGuid::neu(),
            adresse,
            Arc::new(NullEventBus),
            test_zeiten(),
        );

        let abbruch = CancellationToken::new();
        let task = tokio::spawn(transport.lauf(abbruch.clone()));

        abbruch.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("Session muss auf Abbruch reagieren")
            .unwrap();
    }
}
