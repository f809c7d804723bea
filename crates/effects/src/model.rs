//! Deklarative Funkgeraete-Modelle: Effekt-Baeume, Presets, Kompilierung
//!
//! Ein `RadioModelSpec` beschreibt Sende- und Empfangskette eines
//! Geraets als serialisierbaren Baum aus Effekt-Knoten. Die Knoten
//! tragen einen `type`-Diskriminator und kompilieren deterministisch
//! in lauffaehige [`SampleTransform`]-Ketten.
//!
//! Presets werden aus zwei Verzeichnissen geladen (Basis, dann
//! Benutzer-Overrides; Override gewinnt bei Namenskollision) und unter
//! dem kleingeschriebenen Dateinamen-Stamm indiziert. Fehlt ein
//! benanntes Modell, greifen eingebaute Vorgaben (ARC-210 bzw.
//! Intercom).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dsp::biquad::BiQuadFilter;
use crate::dsp::compressor::{Compressor, CompressorConfig};
use crate::dsp::cvsd::Cvsd;
use crate::dsp::first_order::FirstOrderFilter;
use crate::dsp::saturation::Saturation;
use crate::dsp::sidechain::SidechainCompressor;
use crate::dsp::{Gain, SampleTransform, ABTASTRATE};

// ---------------------------------------------------------------------------
// Spezifikations-Baeume
// ---------------------------------------------------------------------------

/// Einzelner Filter-Knoten eines `filters`-Effekts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterSpec {
    FirstOrderLowPass { frequency: f32 },
    FirstOrderHighPass { frequency: f32 },
    BiQuadLowPass { frequency: f32, q: f32 },
    BiQuadHighPass { frequency: f32, q: f32 },
    BiQuadPeakingEq { frequency: f32, q: f32, gain: f32 },
}

impl FilterSpec {
    fn kompilieren(&self) -> Box<dyn SampleTransform> {
        match *self {
            FilterSpec::FirstOrderLowPass { frequency } => {
                Box::new(FirstOrderFilter::tiefpass(ABTASTRATE, frequency))
            }
            FilterSpec::FirstOrderHighPass { frequency } => {
                Box::new(FirstOrderFilter::hochpass(ABTASTRATE, frequency))
            }
            FilterSpec::BiQuadLowPass { frequency, q } => {
                Box::new(BiQuadFilter::tiefpass(ABTASTRATE, frequency, q))
            }
            FilterSpec::BiQuadHighPass { frequency, q } => {
                Box::new(BiQuadFilter::hochpass(ABTASTRATE, frequency, q))
            }
            FilterSpec::BiQuadPeakingEq { frequency, q, gain } => {
                Box::new(BiQuadFilter::peaking_eq(ABTASTRATE, frequency, q, gain))
            }
        }
    }
}

/// Effekt-Knoten: Blaetter sind einzelne Transformationen,
/// `chain` komponiert Unterknoten in deklarierter Reihenfolge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EffectSpec {
    Chain {
        effects: Vec<EffectSpec>,
    },
    Filters {
        filters: Vec<FilterSpec>,
    },
    Saturation {
        gain: f32,
        threshold: f32,
    },
    #[serde(rename_all = "camelCase")]
    Compressor {
        attack: f32,
        make_up: f32,
        release: f32,
        threshold: f32,
        ratio: f32,
    },
    #[serde(rename_all = "camelCase")]
    SidechainCompressor {
        attack: f32,
        make_up: f32,
        release: f32,
        threshold: f32,
        ratio: f32,
        sidechain_effect: Box<EffectSpec>,
    },
    Gain {
        gain: f32,
    },
    Cvsd,
}

impl EffectSpec {
    /// Kompiliert den Baum in eine flache, geordnete Transformations-Kette
    pub fn kompilieren(&self) -> Vec<Box<dyn SampleTransform>> {
        let mut kette: Vec<Box<dyn SampleTransform>> = Vec::new();
        self.anhaengen(&mut kette);
        kette
    }

    fn anhaengen(&self, kette: &mut Vec<Box<dyn SampleTransform>>) {
        match self {
            EffectSpec::Chain { effects } => {
                for effekt in effects {
                    effekt.anhaengen(kette);
                }
            }
            EffectSpec::Filters { filters } => {
                for filter in filters {
                    kette.push(filter.kompilieren());
                }
            }
            EffectSpec::Saturation { gain, threshold } => {
                kette.push(Box::new(Saturation::neu(*gain, *threshold)));
            }
            EffectSpec::Compressor {
                attack,
                make_up,
                release,
                threshold,
                ratio,
            } => {
                kette.push(Box::new(Compressor::neu(
                    CompressorConfig {
                        attack_secs: *attack,
                        release_secs: *release,
                        schwelle_db: *threshold,
                        ratio: *ratio,
                        makeup_db: *make_up,
                    },
                    ABTASTRATE,
                )));
            }
            EffectSpec::SidechainCompressor {
                attack,
                make_up,
                release,
                threshold,
                ratio,
                sidechain_effect,
            } => {
                // Sidechain-Zweig gegen eine stille Quelle kompilieren
                kette.push(Box::new(SidechainCompressor::neu(
                    CompressorConfig {
                        attack_secs: *attack,
                        release_secs: *release,
                        schwelle_db: *threshold,
                        ratio: *ratio,
                        makeup_db: *make_up,
                    },
                    ABTASTRATE,
                    sidechain_effect.kompilieren(),
                )));
            }
            EffectSpec::Gain { gain } => {
                kette.push(Box::new(Gain::neu(*gain)));
            }
            EffectSpec::Cvsd => {
                kette.push(Box::new(Cvsd::neu()));
            }
        }
    }
}

/// Komplettes Funkgeraete-Modell wie in einer Preset-Datei
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioModelSpec {
    pub version: u32,
    /// Grundrauschen-Pegel in dB
    pub noise_gain: f32,
    pub tx_effect: EffectSpec,
    pub rx_effect: EffectSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_effect: Option<EffectSpec>,
}

// ---------------------------------------------------------------------------
// Kompilierte Modelle
// ---------------------------------------------------------------------------

/// Kompilierte Empfangskette eines Modells
pub struct RxRadioModel {
    kette: Vec<Box<dyn SampleTransform>>,
    noise_gain: f32,
}

impl RxRadioModel {
    pub fn aus_spec(spec: &RadioModelSpec) -> Self {
        Self {
            kette: spec.rx_effect.kompilieren(),
            noise_gain: spec.noise_gain,
        }
    }

    /// Grundrauschen-Pegel in dB
    pub fn noise_gain(&self) -> f32 {
        self.noise_gain
    }

    pub fn process(&mut self, samples: &mut [f32]) {
        for effekt in self.kette.iter_mut() {
            effekt.process(samples);
        }
    }

    pub fn reset(&mut self) {
        for effekt in self.kette.iter_mut() {
            effekt.reset();
        }
    }
}

/// Kompilierte Sendekette eines Modells, optional mit
/// Verschluesselungs-Emulation dahinter
pub struct TxRadioModel {
    kette: Vec<Box<dyn SampleTransform>>,
    verschluesselung: Option<Vec<Box<dyn SampleTransform>>>,
    noise_gain: f32,
}

impl TxRadioModel {
    pub fn aus_spec(spec: &RadioModelSpec) -> Self {
        Self {
            kette: spec.tx_effect.kompilieren(),
            verschluesselung: spec
                .encryption_effect
                .as_ref()
                .map(EffectSpec::kompilieren),
            noise_gain: spec.noise_gain,
        }
    }

    pub fn noise_gain(&self) -> f32 {
        self.noise_gain
    }

    pub fn process(&mut self, samples: &mut [f32], verschluesselt: bool) {
        for effekt in self.kette.iter_mut() {
            effekt.process(samples);
        }
        if verschluesselt {
            if let Some(verschluesselung) = self.verschluesselung.as_mut() {
                for effekt in verschluesselung.iter_mut() {
                    effekt.process(samples);
                }
            }
        }
    }

    pub fn reset(&mut self) {
        for effekt in self.kette.iter_mut() {
            effekt.reset();
        }
        if let Some(verschluesselung) = self.verschluesselung.as_mut() {
            for effekt in verschluesselung.iter_mut() {
                effekt.reset();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Preset-Fabrik
// ---------------------------------------------------------------------------

/// Laedt und indiziert Modell-Presets, liefert kompilierte Ketten
pub struct RadioModelFactory {
    vorlagen: HashMap<String, RadioModelSpec>,
}

impl RadioModelFactory {
    /// Fabrik ohne geladene Presets, nur eingebaute Vorgaben
    pub fn leer() -> Self {
        Self {
            vorlagen: HashMap::new(),
        }
    }

    /// Laedt Presets aus Basis- und Benutzer-Verzeichnis.
    /// Benutzer-Presets ueberschreiben gleichnamige Basis-Presets.
    /// Unlesbare Dateien werden geloggt und uebersprungen.
    pub fn neu(basis: &Path, benutzer: &Path) -> Self {
        let mut vorlagen = HashMap::new();
        for verzeichnis in [basis, benutzer] {
            Self::verzeichnis_laden(&mut vorlagen, verzeichnis);
        }
        Self { vorlagen }
    }

    fn verzeichnis_laden(vorlagen: &mut HashMap<String, RadioModelSpec>, verzeichnis: &Path) {
        let eintraege = match std::fs::read_dir(verzeichnis) {
            Ok(eintraege) => eintraege,
            Err(e) => {
                warn!(verzeichnis = %verzeichnis.display(), fehler = %e,
                      "Preset-Verzeichnis nicht lesbar, wird uebersprungen");
                return;
            }
        };

        for eintrag in eintraege.flatten() {
            let pfad = eintrag.path();
            if pfad.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stamm) = pfad.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let name = stamm.to_lowercase();

            let inhalt = match std::fs::read_to_string(&pfad) {
                Ok(inhalt) => inhalt,
                Err(e) => {
                    warn!(datei = %pfad.display(), fehler = %e, "Preset-Datei nicht lesbar");
                    continue;
                }
            };
            match serde_json::from_str::<RadioModelSpec>(&inhalt) {
                Ok(spec) => {
                    vorlagen.insert(name, spec);
                }
                Err(e) => {
                    warn!(datei = %pfad.display(), fehler = %e,
                          "Preset-Datei nicht parsebar, wird uebersprungen");
                }
            }
        }
    }

    /// Anzahl geladener Vorlagen (ohne eingebaute Vorgaben)
    pub fn anzahl_vorlagen(&self) -> usize {
        self.vorlagen.len()
    }

    pub fn lade_rx(&self, name: &str) -> Option<RxRadioModel> {
        self.vorlagen.get(name).map(RxRadioModel::aus_spec)
    }

    /// Empfangskette fuer `name`, sonst die Intercom-Vorgabe
    pub fn lade_rx_oder_intercom(&self, name: &str) -> RxRadioModel {
        self.lade_rx(name)
            .unwrap_or_else(|| RxRadioModel::aus_spec(&RadioModelSpec::standard_intercom()))
    }

    pub fn lade_tx(&self, name: &str) -> Option<TxRadioModel> {
        self.vorlagen.get(name).map(TxRadioModel::aus_spec)
    }

    /// Sendekette fuer `name`, sonst die ARC-210-Vorgabe
    pub fn lade_tx_oder_funkgeraet(&self, name: &str) -> TxRadioModel {
        self.lade_tx(name)
            .unwrap_or_else(|| TxRadioModel::aus_spec(&RadioModelSpec::standard_arc210()))
    }

    /// Sendekette fuer `name`, sonst die Intercom-Vorgabe
    pub fn lade_tx_oder_intercom(&self, name: &str) -> TxRadioModel {
        self.lade_tx(name)
            .unwrap_or_else(|| TxRadioModel::aus_spec(&RadioModelSpec::standard_intercom()))
    }
}

// ---------------------------------------------------------------------------
// Eingebaute Vorgaben
// ---------------------------------------------------------------------------

impl RadioModelSpec {
    /// ARC-210 als Vorgabe fuer Funkgeraete ohne eigenes Preset
    pub fn standard_arc210() -> Self {
        Self {
            version: 1,
            noise_gain: -33.0,
            tx_effect: EffectSpec::Chain {
                effects: vec![
                    EffectSpec::Filters {
                        filters: vec![
                            FilterSpec::BiQuadHighPass {
                                frequency: 1700.0,
                                q: 0.53,
                            },
                            FilterSpec::BiQuadPeakingEq {
                                frequency: 2801.0,
                                q: 0.5,
                                gain: 5.0,
                            },
                            FilterSpec::FirstOrderLowPass { frequency: 5538.0 },
                        ],
                    },
                    EffectSpec::Saturation {
                        gain: 9.0,
                        threshold: -23.0,
                    },
                    EffectSpec::SidechainCompressor {
                        attack: 0.01,
                        make_up: 6.0,
                        release: 0.2,
                        threshold: -33.0,
                        ratio: 1.18,
                        sidechain_effect: Box::new(EffectSpec::Filters {
                            filters: vec![FilterSpec::FirstOrderHighPass { frequency: 709.0 }],
                        }),
                    },
                    EffectSpec::Filters {
                        filters: vec![
                            FilterSpec::BiQuadHighPass {
                                frequency: 456.0,
                                q: 0.36,
                            },
                            FilterSpec::BiQuadLowPass {
                                frequency: 5435.0,
                                q: 0.39,
                            },
                        ],
                    },
                    EffectSpec::Gain { gain: 12.0 },
                ],
            },
            rx_effect: EffectSpec::Filters {
                filters: vec![
                    FilterSpec::FirstOrderHighPass { frequency: 270.0 },
                    FilterSpec::FirstOrderLowPass { frequency: 4500.0 },
                ],
            },
            encryption_effect: Some(EffectSpec::Cvsd),
        }
    }

    /// Bord-Intercom als Vorgabe, deutlich zahmer abgestimmt
    pub fn standard_intercom() -> Self {
        Self {
            version: 1,
            noise_gain: -60.0,
            tx_effect: EffectSpec::Chain {
                effects: vec![
                    EffectSpec::Filters {
                        filters: vec![
                            FilterSpec::BiQuadHighPass {
                                frequency: 207.0,
                                q: 0.5,
                            },
                            FilterSpec::BiQuadPeakingEq {
                                frequency: 3112.0,
                                q: 0.4,
                                gain: 16.0,
                            },
                            FilterSpec::BiQuadLowPass {
                                frequency: 6036.0,
                                q: 0.4,
                            },
                            FilterSpec::FirstOrderLowPass { frequency: 5538.0 },
                        ],
                    },
                    EffectSpec::Saturation {
                        gain: 2.0,
                        threshold: -33.0,
                    },
                    EffectSpec::SidechainCompressor {
                        attack: 0.01,
                        make_up: -1.0,
                        release: 0.2,
                        threshold: -17.0,
                        ratio: 1.18,
                        sidechain_effect: Box::new(EffectSpec::Filters {
                            filters: vec![FilterSpec::FirstOrderHighPass { frequency: 709.0 }],
                        }),
                    },
                    EffectSpec::Filters {
                        filters: vec![
                            FilterSpec::BiQuadHighPass {
                                frequency: 393.0,
                                q: 0.43,
                            },
                            FilterSpec::BiQuadLowPass {
                                frequency: 4875.0,
                                q: 0.3,
                            },
                        ],
                    },
                    EffectSpec::Gain { gain: 8.0 },
                ],
            },
            rx_effect: EffectSpec::Filters {
                filters: vec![
                    FilterSpec::FirstOrderHighPass { frequency: 270.0 },
                    FilterSpec::FirstOrderLowPass { frequency: 4500.0 },
                ],
            },
            encryption_effect: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sinus(frequenz: f32, laenge: usize) -> Vec<f32> {
        (0..laenge)
            .map(|i| 0.3 * (2.0 * PI * frequenz * i as f32 / ABTASTRATE).sin())
            .collect()
    }

    #[test]
    fn effekt_spec_json_roundtrip() {
        let spec = RadioModelSpec::standard_arc210();
        let json = serde_json::to_string_pretty(&spec).unwrap();
        let wieder: RadioModelSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, wieder);
    }

    #[test]
    fn diskriminator_feld_wird_geschrieben() {
        let json = serde_json::to_string(&EffectSpec::Cvsd).unwrap();
        assert_eq!(json, r#"{"type":"cvsd"}"#);
        let json = serde_json::to_string(&EffectSpec::Gain { gain: 3.0 }).unwrap();
        assert!(json.contains(r#""type":"gain""#));
    }

    #[test]
    fn preset_aus_json_parsebar() {
        let json = r#"{
            "version": 1,
            "noiseGain": -40.0,
            "txEffect": { "type": "gain", "gain": 6.0 },
            "rxEffect": {
                "type": "filters",
                "filters": [
                    { "type": "firstOrderHighPass", "frequency": 270.0 },
                    { "type": "biQuadLowPass", "frequency": 4500.0, "q": 0.7 }
                ]
            }
        }"#;
        let spec: RadioModelSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.noise_gain, -40.0);
        assert!(spec.encryption_effect.is_none());
    }

    #[test]
    fn kompilierung_deterministisch() {
        let spec = RadioModelSpec::standard_arc210();
        let eingabe = sinus(1000.0, 4800);

        let mut a = RxRadioModel::aus_spec(&spec);
        let mut b = RxRadioModel::aus_spec(&spec);
        let mut samples_a = eingabe.clone();
        let mut samples_b = eingabe;
        a.process(&mut samples_a);
        b.process(&mut samples_b);
        assert_eq!(samples_a, samples_b);
    }

    #[test]
    fn tx_kette_veraendert_signal() {
        let mut modell = TxRadioModel::aus_spec(&RadioModelSpec::standard_arc210());
        let original = sinus(1000.0, 4800);
        let mut samples = original.clone();
        modell.process(&mut samples, false);
        assert!(samples.iter().all(|s| s.is_finite()));
        assert_ne!(original, samples);
    }

    #[test]
    fn verschluesselung_nur_wenn_aktiv() {
        let spec = RadioModelSpec::standard_arc210();
        let eingabe = sinus(1000.0, 4800);

        let mut klar = TxRadioModel::aus_spec(&spec);
        let mut verschluesselt = TxRadioModel::aus_spec(&spec);
        let mut samples_klar = eingabe.clone();
        let mut samples_crypto = eingabe;
        klar.process(&mut samples_klar, false);
        verschluesselt.process(&mut samples_crypto, true);
        assert_ne!(samples_klar, samples_crypto);
    }

    #[test]
    fn fabrik_laedt_und_ueberschreibt_presets() {
        let basis = tempfile::tempdir().unwrap();
        let benutzer = tempfile::tempdir().unwrap();

        let mut spec = RadioModelSpec::standard_intercom();
        spec.noise_gain = -50.0;
        std::fs::write(
            basis.path().join("Uhf-Test.json"),
            serde_json::to_string(&spec).unwrap(),
        )
        .unwrap();

        spec.noise_gain = -10.0;
        std::fs::write(
            benutzer.path().join("uhf-test.json"),
            serde_json::to_string(&spec).unwrap(),
        )
        .unwrap();

        let fabrik = RadioModelFactory::neu(basis.path(), benutzer.path());
        assert_eq!(fabrik.anzahl_vorlagen(), 1);
        // Benutzer-Override gewinnt, Schluessel ist kleingeschrieben
        let modell = fabrik.lade_rx("uhf-test").unwrap();
        assert_eq!(modell.noise_gain(), -10.0);
    }

    #[test]
    fn fabrik_ueberspringt_kaputte_dateien() {
        let basis = tempfile::tempdir().unwrap();
        let benutzer = tempfile::tempdir().unwrap();
        std::fs::write(basis.path().join("kaputt.json"), "{ nicht json").unwrap();
        std::fs::write(
            basis.path().join("gut.json"),
            serde_json::to_string(&RadioModelSpec::standard_intercom()).unwrap(),
        )
        .unwrap();

        let fabrik = RadioModelFactory::neu(basis.path(), benutzer.path());
        assert_eq!(fabrik.anzahl_vorlagen(), 1);
        assert!(fabrik.lade_rx("gut").is_some());
        assert!(fabrik.lade_rx("kaputt").is_none());
    }

    #[test]
    fn fehlendes_verzeichnis_nicht_fatal() {
        let fabrik = RadioModelFactory::neu(
            Path::new("/nicht/vorhanden/basis"),
            Path::new("/nicht/vorhanden/benutzer"),
        );
        assert_eq!(fabrik.anzahl_vorlagen(), 0);
    }

    #[test]
    fn unbekannter_name_liefert_vorgabe() {
        let fabrik = RadioModelFactory::leer();
        let modell = fabrik.lade_rx_oder_intercom("gibts-nicht");
        assert_eq!(modell.noise_gain(), -60.0);
        let tx = fabrik.lade_tx_oder_funkgeraet("gibts-nicht");
        assert_eq!(tx.noise_gain(), -33.0);
    }
}
