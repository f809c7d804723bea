//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Funk-Regeln (Weiterleitung und Effekte)
    pub funk: FunkEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Clients
    pub max_clients: u32,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Funklink Server".into(),
            max_clients: 512,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer den Voice-Socket
    pub bind_adresse: String,
    /// Port fuer UDP (Voice-Daten und Keepalives)
    pub udp_port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            udp_port: 5002,
        }
    }
}

/// Funk-Regeln fuer Weiterleitung und Effekt-Synchronisation
///
/// Die Standardwerte entsprechen den Kern-Standardwerten in
/// `funklink_core::settings::SettingsKey`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FunkEinstellungen {
    /// Maximale Anzahl Relay-Hops bevor ein Paket verworfen wird
    pub hop_limit: u8,
    /// Nur Clients derselben Koalition hoeren einander
    pub koalitions_schutz: bool,
    /// Verschluesselte Uebertragungen sind ohne passenden Schluessel stumm
    pub strikte_verschluesselung: bool,
    /// Zuschauer (Koalition 0) duerfen nicht senden
    pub zuschauer_stumm: bool,
    /// Test-Frequenzen in MHz (Komma-getrennt, Loopback zum Sender)
    pub test_frequenzen: String,
    /// Globale Lobby-Frequenzen in MHz (Komma-getrennt, jeder hoert)
    pub globale_frequenzen: String,
    /// Wet/Dry-Verhaeltnis der Funkeffekte (0.0 = roh, 1.0 = voll)
    pub effekt_verhaeltnis: f64,
    /// Hartes Clipping nach dem Effekt-Mix
    pub effekt_clipping: bool,
    /// Effektmodell pro Funkgeraete-Typ statt Standardmodell
    pub pro_modell_effekte: bool,
    /// FM-Interferenz-Simulation (Capture-Effekt)
    pub rx_interferenz: bool,
}

impl Default for FunkEinstellungen {
    fn default() -> Self {
        Self {
            hop_limit: 0,
            koalitions_schutz: false,
            strikte_verschluesselung: false,
            zuschauer_stumm: false,
            test_frequenzen: "247.2,120.3".into(),
            globale_frequenzen: "248.22".into(),
            effekt_verhaeltnis: 1.0,
            effekt_clipping: false,
            pro_modell_effekte: true,
            rx_interferenz: false,
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

impl ServerConfig {
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

    /// Gibt die vollstaendige Bind-Adresse fuer UDP zurueck
    pub fn udp_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.udp_port)
    }
}
