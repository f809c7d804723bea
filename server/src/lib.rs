//! funklink-server – Bibliotheks-Root
//!
//! Kompositions-Root des Servers: verdrahtet Konfiguration, Settings,
//! Event-Bus, Client-Verzeichnis und Voice-Router und laeuft bis zum
//! Shutdown-Signal. Oeffentlich fuer Integrationstests.

pub mod config;
pub mod events;
pub mod settings;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use funklink_core::event::EventBus;
use funklink_core::settings::SettingsStore;
use funklink_voice::{ClientRegistry, TransmissionLog, VoiceRouter};

use config::ServerConfig;
use events::BroadcastEventBus;
use settings::ConfigSettings;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    config: ServerConfig,
    registry: ClientRegistry,
    events: Arc<BroadcastEventBus>,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self {
            config,
            registry: ClientRegistry::neu(),
            events: Arc::new(BroadcastEventBus::neu()),
        }
    }

    /// Client-Verzeichnis (fuer die Anbindung der Control-Schicht)
    pub fn registry(&self) -> ClientRegistry {
        self.registry.clone()
    }

    /// Event-Bus (fuer Oberflaechen und Integrationstests)
    pub fn events(&self) -> Arc<BroadcastEventBus> {
        Arc::clone(&self.events)
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Uebertragungs-Protokoll starten
    /// 2. UDP Voice-Router binden und Empfangs-Loop starten
    /// 3. Auf Ctrl-C warten, dann geordnet herunterfahren
    pub async fn starten(self) -> Result<()> {
        info!(
            server_name = %self.config.server.name,
            udp = %self.config.udp_bind_adresse(),
            max_clients = self.config.server.max_clients,
            "Server startet"
        );

        let settings: Arc<dyn SettingsStore> =
            Arc::new(ConfigSettings::neu(self.config.funk.clone()));
        let events: Arc<dyn EventBus> = self.events.clone();

        let (protokoll, protokoll_task) = TransmissionLog::starten();

        let adresse: SocketAddr = self
            .config
            .udp_bind_adresse()
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse: {}", self.config.udp_bind_adresse()))?;
        let router = Arc::new(
            VoiceRouter::binden(adresse, self.registry.clone(), settings, events, protokoll)
                .await
                .context("Voice-Router konnte nicht binden")?,
        );

        let abbruch = CancellationToken::new();
        let router_abbruch = abbruch.clone();
        let router_task = tokio::spawn(async move {
            router.empfangs_loop(router_abbruch).await;
        });

        info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c()
            .await
            .context("Warten auf Ctrl-C fehlgeschlagen")?;
        info!("Shutdown-Signal empfangen, Server wird beendet");

        abbruch.cancel();
        router_task.await.context("Router-Task abgestuerzt")?;
        protokoll_task
            .await
            .context("Protokoll-Task abgestuerzt")?;

        Ok(())
    }
}
