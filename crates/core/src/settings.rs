//! Settings-Schnittstelle
//!
//! Der Voice-Kern konsumiert Einstellungen ausschliesslich ueber dieses
//! Trait – die konkrete Quelle (TOML-Datei auf dem Server, synchronisierte
//! Servereinstellungen auf dem Client) wird vom Kompositions-Root
//! bereitgestellt. Dadurch bleibt der Kern frei von globalem Zustand.

use std::collections::HashMap;
use std::sync::RwLock;

/// Alle Einstellungs-Schluessel die der Kern kennt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsKey {
    /// Maximale Anzahl Relay-Hops bevor ein Paket verworfen wird
    RetransmissionNodeLimit,
    /// Nur Clients derselben Koalition hoeren einander
    CoalitionAudioSecurity,
    /// Verschluesselte Uebertragungen sind ohne passenden Schluessel stumm
    StrictRadioEncryption,
    /// Zuschauer (Koalition 0) duerfen nicht senden
    SpectatorsAudioDisabled,
    /// Test-Frequenzen (Komma-getrennte MHz-Liste, Loopback zum Sender)
    TestFrequencies,
    /// Globale Lobby-Frequenzen (Komma-getrennte MHz-Liste, jeder hoert)
    GlobalLobbyFrequencies,
    /// Wet/Dry-Verhaeltnis der Funkeffekte (0.0 = roh, 1.0 = voll)
    RadioEffectsRatio,
    /// Hartes Clipping nach dem Effekt-Mix
    RadioEffectsClipping,
    /// Effektmodell pro Funkgeraete-Typ statt Standardmodell
    PerRadioModelEffects,
    /// FM-Interferenz-Simulation (Capture-Effekt)
    RadioRxInterference,
}

impl SettingsKey {
    /// Standardwert als String (Quelle der Wahrheit fuer alle Defaults)
    pub fn standardwert(&self) -> &'static str {
        match self {
            Self::RetransmissionNodeLimit => "0",
            Self::CoalitionAudioSecurity => "false",
            Self::StrictRadioEncryption => "false",
            Self::SpectatorsAudioDisabled => "false",
            Self::TestFrequencies => "247.2,120.3",
            Self::GlobalLobbyFrequencies => "248.22",
            Self::RadioEffectsRatio => "1.0",
            Self::RadioEffectsClipping => "false",
            Self::PerRadioModelEffects => "true",
            Self::RadioRxInterference => "false",
        }
    }
}

/// Typisierte, lesende Sicht auf die Einstellungen
///
/// Implementierungen muessen thread-safe sein; die Getter werden aus dem
/// Router-Hot-Path und dem Render-Thread heraus aufgerufen.
pub trait SettingsStore: Send + Sync + 'static {
    /// Roher String-Wert fuer einen Schluessel (Standardwert falls ungesetzt)
    fn string_wert(&self, key: SettingsKey) -> String;

    /// Boolescher Wert ("true"/"false", Standardwert bei Parse-Fehler)
    fn bool_wert(&self, key: SettingsKey) -> bool {
        self.string_wert(key)
            .trim()
            .parse()
            .unwrap_or_else(|_| key.standardwert().parse().unwrap_or(false))
    }

    /// Ganzzahliger Wert (Standardwert bei Parse-Fehler)
    fn int_wert(&self, key: SettingsKey) -> i64 {
        self.string_wert(key)
            .trim()
            .parse()
            .unwrap_or_else(|_| key.standardwert().parse().unwrap_or(0))
    }

    /// Gleitkomma-Wert (Standardwert bei Parse-Fehler)
    fn float_wert(&self, key: SettingsKey) -> f64 {
        self.string_wert(key)
            .trim()
            .parse()
            .unwrap_or_else(|_| key.standardwert().parse().unwrap_or(0.0))
    }

    /// Frequenzliste: Komma-getrennte MHz-Werte, geparst nach Hz
    fn frequenzliste(&self, key: SettingsKey) -> Vec<f64> {
        frequenzliste_parsen(&self.string_wert(key))
    }
}

/// Parst eine Komma-getrennte MHz-Liste nach Hz
///
/// Unparsebare Eintraege werden still uebersprungen – die Liste kommt aus
/// Benutzereingaben und darf nie zum Fehler fuehren.
pub fn frequenzliste_parsen(liste: &str) -> Vec<f64> {
    liste
        .split(',')
        .filter_map(|teil| teil.trim().parse::<f64>().ok())
        .map(|mhz| mhz * 1e6)
        .collect()
}

// ---------------------------------------------------------------------------
// InMemorySettings
// ---------------------------------------------------------------------------

/// Einfacher In-Memory-Store fuer Tests und synchronisierte Client-Settings
#[derive(Debug, Default)]
pub struct InMemorySettings {
    werte: RwLock<HashMap<SettingsKey, String>>,
}

impl InMemorySettings {
    /// Erstellt einen leeren Store (alle Schluessel auf Standardwert)
    pub fn neu() -> Self {
        Self::default()
    }

    /// Setzt einen Wert (last-writer-wins)
    pub fn setzen(&self, key: SettingsKey, wert: impl Into<String>) {
        self.werte
            .write()
            .expect("Settings-Lock vergiftet")
            .insert(key, wert.into());
    }
}

impl SettingsStore for InMemorySettings {
    fn string_wert(&self, key: SettingsKey) -> String {
        self.werte
            .read()
            .expect("Settings-Lock vergiftet")
            .get(&key)
            .cloned()
            .unwrap_or_else(|| key.standardwert().to_owned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
