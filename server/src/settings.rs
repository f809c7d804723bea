//! Bruecke von der TOML-Konfiguration zum Settings-Trait des Kerns
//!
//! Der Router liest Einstellungen ueber `SettingsStore`; hier werden die
//! typisierten Felder aus `[funk]` auf die Kern-Schluessel abgebildet.

use funklink_core::settings::{SettingsKey, SettingsStore};

use crate::config::FunkEinstellungen;

/// `SettingsStore` ueber den `[funk]`-Abschnitt der Server-Konfiguration
pub struct ConfigSettings {
    funk: FunkEinstellungen,
}

impl ConfigSettings {
    pub fn neu(funk: FunkEinstellungen) -> Self {
        Self { funk }
    }
}

impl SettingsStore for ConfigSettings {
    fn string_wert(&self, key: SettingsKey) -> String {
        match key {
            SettingsKey::RetransmissionNodeLimit => self.funk.hop_limit.to_string(),
            SettingsKey::CoalitionAudioSecurity => self.funk.koalitions_schutz.to_string(),
            SettingsKey::StrictRadioEncryption => {
                self.funk.strikte_verschluesselung.to_string()
            }
            SettingsKey::SpectatorsAudioDisabled => self.funk.zuschauer_stumm.to_string(),
            SettingsKey::TestFrequencies => self.funk.test_frequenzen.clone(),
            SettingsKey::GlobalLobbyFrequencies => self.funk.globale_frequenzen.clone(),
            SettingsKey::RadioEffectsRatio => self.funk.effekt_verhaeltnis.to_string(),
            SettingsKey::RadioEffectsClipping => self.funk.effekt_clipping.to_string(),
            SettingsKey::PerRadioModelEffects => self.funk.pro_modell_effekte.to_string(),
            SettingsKey::RadioRxInterference => self.funk.rx_interferenz.to_string(),
        }
    }
}
