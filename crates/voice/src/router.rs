//! UDP Voice-Router – Klassifikation, Autorisierung und Fan-out
//!
//! Bindet den Voice-Socket des Servers, empfaengt Datagramme und
//! leitet Sprachpakete an alle erreichbaren Clients weiter.
//!
//! ## Architektur
//!
//! ```text
//! UDP Socket (recv_from)
//!     |
//!     v
//! Klassifikation             <- 22 Bytes = Keepalive, mehr = Voice
//!     |                         Keepalive: Endpunkt lernen + Echo
//!     v
//! VoicePacket::decode()      <- Validierung, kaputte Pakete -> warn + drop
//!     |
//!     v
//! empfaenger_ermitteln()     <- Erreichbarkeit pro Frequenz-Eintrag,
//!     |                         Global-/Gateway-Bypass, Test-Loopback
//!     v
//! Hop-Zaehler +1, dann nebenlaeufiges send_to pro Empfaenger
//! ```
//!
//! Ein fehlgeschlagener Versand an einen Empfaenger blockiert die
//! uebrigen nicht: jeder Versand laeuft als eigener Task.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use funklink_core::error::{FunklinkError, Result};
use funklink_core::event::{EventBus, FunklinkEvent};
use funklink_core::settings::{SettingsKey, SettingsStore};
use funklink_core::types::{ClientGuid, Coalition, Modulation, GUID_LAENGE};
use funklink_protocol::voice::VoicePacket;
use funklink_radio::{bestes_empfangsgeraet, frequenz_nah_genug, Uebertragung};

use crate::registry::ClientRegistry;
use crate::transmission_log::{TransmissionLog, TransmissionLogEintrag};

/// Maximale UDP-Paketgroesse (Header 60 + 16 Eintraege + Max-Payload 1280)
const UDP_PUFFER_GROESSE: usize = 1600;

/// Server-seitiger Voice-Router
pub struct VoiceRouter {
    socket: Arc<UdpSocket>,
    registry: ClientRegistry,
    settings: Arc<dyn SettingsStore>,
    events: Arc<dyn EventBus>,
    protokoll: TransmissionLog,
}

impl VoiceRouter {
    /// Bindet den Voice-Socket und erstellt den Router
    pub async fn binden(
        bind_addr: SocketAddr,
        registry: ClientRegistry,
        settings: Arc<dyn SettingsStore>,
        events: Arc<dyn EventBus>,
        protokoll: TransmissionLog,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| FunklinkError::Bind {
                adresse: bind_addr.to_string(),
                grund: e.to_string(),
            })?;
        info!(adresse = %bind_addr, "UDP Voice-Router gebunden");

        Ok(Self {
            socket: Arc::new(socket),
            registry,
            settings,
            events,
            protokoll,
        })
    }

    /// Gibt die lokale Bind-Adresse zurueck
    pub fn lokale_adresse(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Startet die Empfangs-Loop (laeuft bis zum Abbruch-Signal)
    ///
    /// Socket-Fehler werden geloggt, die Loop laeuft weiter.
    pub async fn empfangs_loop(&self, abbruch: CancellationToken) {
        let mut buf = [0u8; UDP_PUFFER_GROESSE];

        info!("Voice-Router Empfangs-Loop gestartet");

        loop {
            tokio::select! {
                _ = abbruch.cancelled() => {
                    info!("Voice-Router: Abbruch-Signal empfangen");
                    break;
                }

                ergebnis = self.socket.recv_from(&mut buf) => {
                    match ergebnis {
                        Ok((laenge, absender)) => {
                            self.datagramm_verarbeiten(&buf[..laenge], absender).await;
                        }
                        Err(e) => {
                            error!(fehler = %e, "UDP-Empfangsfehler");
                            // Kurze Pause gegen Busy-Loop bei dauerhaftem Fehler
                            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                        }
                    }
                }
            }
        }

        info!("Voice-Router Empfangs-Loop beendet");
    }

    // -----------------------------------------------------------------------
    // Internes Datagramm-Processing
    // -----------------------------------------------------------------------

    async fn datagramm_verarbeiten(&self, daten: &[u8], absender: SocketAddr) {
        if VoicePacket::ist_keepalive(daten) {
            self.keepalive_beantworten(daten, absender).await;
        } else if daten.len() > GUID_LAENGE {
            self.sprachpaket_verarbeiten(daten, absender).await;
        } else {
            debug!(laenge = daten.len(), absender = %absender, "Zu kurzes Datagramm verworfen");
        }
    }

    /// Keepalive: Endpunkt lernen und dasselbe Datagramm zurueckschicken.
    /// Zaehlt nicht als Uebertragung.
    async fn keepalive_beantworten(&self, daten: &[u8], absender: SocketAddr) {
        let Some(guid) = ClientGuid::from_bytes(daten) else {
            debug!(absender = %absender, "Keepalive mit ungueltiger GUID");
            return;
        };

        if self.registry.endpunkt_setzen(&guid, absender) {
            if let Err(e) = self.socket.send_to(daten, absender).await {
                debug!(fehler = %e, absender = %absender, "Keepalive-Echo fehlgeschlagen");
            }
        } else {
            warn!(client = %guid, "Keepalive von unbekanntem Client");
        }
    }

    async fn sprachpaket_verarbeiten(&self, daten: &[u8], absender: SocketAddr) {
        let mut paket = match VoicePacket::decode(daten) {
            Ok(p) => p,
            Err(e) => {
                warn!(fehler = %e, absender = %absender, "Ungueltiges Voice-Paket verworfen");
                return;
            }
        };

        let Some((koalition, stumm, name)) = self
            .registry
            .lesen(&paket.sender, |eintrag| {
                (eintrag.coalition, eintrag.stumm, eintrag.name.clone())
            })
        else {
            debug!(client = %paket.sender, "Voice-Paket von unbekanntem Client");
            return;
        };

        // Auch Sprachpakete aktualisieren den bekannten Endpunkt
        self.registry.endpunkt_setzen(&paket.sender, absender);

        let zuschauer_stumm = self
            .settings
            .bool_wert(SettingsKey::SpectatorsAudioDisabled);
        if (koalition == Coalition::Spectator && zuschauer_stumm) || stumm {
            debug!(client = %paket.sender, "Audio ignoriert (stumm oder Zuschauer)");
            return;
        }

        let hop_limit = self
            .settings
            .int_wert(SettingsKey::RetransmissionNodeLimit)
            .max(0);
        if i64::from(paket.hops) > hop_limit {
            debug!(
                client = %paket.sender,
                hops = paket.hops,
                limit = hop_limit,
                "Hop-Limit ueberschritten, Paket verworfen"
            );
            return;
        }

        let empfaenger = self.empfaenger_ermitteln(&paket, koalition);
        if empfaenger.is_empty() {
            return;
        }

        let erst_sendung = paket.hops == 0;

        // Weiterleitung traegt genau einen Hop mehr als der Empfang
        paket.hop_erhoehen();
        let bytes = Arc::new(paket.encode());
        let anzahl = empfaenger.len();
        for ziel in empfaenger {
            let socket = Arc::clone(&self.socket);
            let daten = Arc::clone(&bytes);
            tokio::spawn(async move {
                if let Err(e) = socket.send_to(&daten, ziel).await {
                    debug!(fehler = %e, ziel = %ziel, "Voice-Weiterleitung fehlgeschlagen");
                }
            });
        }

        tracing::trace!(
            client = %paket.sender,
            paket_nummer = paket.paket_nummer,
            empfaenger = anzahl,
            "Voice-Paket weitergeleitet"
        );

        self.sende_anzeige_aktualisieren(&paket, erst_sendung, name);
    }

    /// Pflegt die "sendet gerade auf"-Anzeige des Senders und reiht bei
    /// Erst-Sendungen einen Protokoll-Eintrag ein
    fn sende_anzeige_aktualisieren(&self, paket: &VoicePacket, erst_sendung: bool, name: String) {
        let Some(haupt) = paket.hauptfrequenz() else {
            return;
        };
        if haupt.frequenz <= 0.0 {
            return;
        }

        let anzeige = if haupt.modulation == Modulation::Intercom {
            "INTERCOM".to_owned()
        } else {
            format!("{:.3} {}", haupt.frequenz / 1e6, haupt.modulation)
        };

        self.registry.aktualisieren(&paket.sender, |eintrag| {
            eintrag.sendet_auf = Some(anzeige.clone());
            eintrag.letzte_uebertragung = Some(Utc::now());
        });
        self.events.senden(FunklinkEvent::SendetAuf {
            client: paket.sender.clone(),
            anzeige: anzeige.clone(),
        });

        if erst_sendung {
            self.protokoll.protokollieren(TransmissionLogEintrag {
                guid: paket.sender.clone(),
                name,
                anzeige,
                zeitpunkt: Utc::now(),
            });
        }
    }

    /// Baut die deduplizierte Empfaenger-Menge fuer ein Paket.
    ///
    /// Pro Client gilt die erste zutreffende Regel:
    /// - Sender selbst: nur Test-Frequenz-Loopback
    /// - Globale Lobby-Frequenz oder Gateway-Client: immer zustellen
    /// - Sonst Koalitions-Schutz, dann Erreichbarkeit pro Frequenz-Eintrag
    fn empfaenger_ermitteln(
        &self,
        paket: &VoicePacket,
        sender_koalition: Coalition,
    ) -> Vec<SocketAddr> {
        let koalitions_schutz = self
            .settings
            .bool_wert(SettingsKey::CoalitionAudioSecurity);
        let strikt = self.settings.bool_wert(SettingsKey::StrictRadioEncryption);
        let globale = self
            .settings
            .frequenzliste(SettingsKey::GlobalLobbyFrequencies);
        let test = self.settings.frequenzliste(SettingsKey::TestFrequencies);

        let mut ziele: HashSet<SocketAddr> = HashSet::new();

        self.registry.fuer_alle(|client| {
            let Some(endpunkt) = client.voip_endpunkt else {
                return;
            };

            if client.guid == paket.sender {
                // Test-Frequenzen gehen nur an den Sender selbst zurueck
                let test_frequenz = paket.frequenzen.iter().any(|eintrag| {
                    test.iter()
                        .any(|t| frequenz_nah_genug(*t, eintrag.frequenz))
                });
                if test_frequenz {
                    ziele.insert(endpunkt);
                }
                return;
            }

            let global = paket.frequenzen.iter().any(|eintrag| {
                globale
                    .iter()
                    .any(|g| frequenz_nah_genug(*g, eintrag.frequenz))
            });
            if global || client.gateway {
                ziele.insert(endpunkt);
                return;
            }

            if koalitions_schutz && client.coalition != sender_koalition {
                return;
            }

            for eintrag in &paket.frequenzen {
                let uebertragung = Uebertragung {
                    frequenz: eintrag.frequenz,
                    modulation: eintrag.modulation,
                    schluessel: eintrag.verschluesselung,
                    sender_unit: paket.unit_id,
                };
                if bestes_empfangsgeraet(&client.radios, &uebertragung, &[], strikt).is_some() {
                    ziele.insert(endpunkt);
                    break;
                }
            }
        });

        ziele.into_iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
