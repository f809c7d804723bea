//! Einfacher Abwaerts-Kompressor
//!
//! Huellkurvenfolger mit Attack/Release, Pegelreduktion oberhalb des
//! Schwellenwerts nach Ratio, plus festem MakeUp-Gain.

use super::{db_to_linear, linear_to_db, SampleTransform};

/// Kompressor-Parameter wie im Preset angegeben
#[derive(Debug, Clone, Copy)]
pub struct CompressorConfig {
    /// Attack-Zeit in Sekunden
    pub attack_secs: f32,
    /// Release-Zeit in Sekunden
    pub release_secs: f32,
    /// Schwellenwert in dB
    pub schwelle_db: f32,
    /// Kompressions-Verhaeltnis (>= 1.0)
    pub ratio: f32,
    /// Ausgleichs-Gain in dB
    pub makeup_db: f32,
}

/// Kompressor mit eigenem Huellkurven-Zustand
pub struct Compressor {
    config: CompressorConfig,
    attack_coeff: f32,
    release_coeff: f32,
    makeup: f32,
    huellkurve: f32,
}

impl Compressor {
    pub fn neu(config: CompressorConfig, abtastrate: f32) -> Self {
        Self {
            attack_coeff: zeit_zu_koeffizient(config.attack_secs, abtastrate),
            release_coeff: zeit_zu_koeffizient(config.release_secs, abtastrate),
            makeup: db_to_linear(config.makeup_db),
            huellkurve: 0.0,
            config,
        }
    }

    /// Fuehrt die Huellkurve einen Schritt weiter und liefert den
    /// Gain-Faktor fuer den aktuellen Detektor-Pegel
    pub fn gain_fuer(&mut self, detektor_pegel: f32) -> f32 {
        let coeff = if detektor_pegel > self.huellkurve {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.huellkurve = coeff * self.huellkurve + (1.0 - coeff) * detektor_pegel;

        let pegel_db = linear_to_db(self.huellkurve);
        let reduktion = if pegel_db > self.config.schwelle_db {
            let ueberhang = pegel_db - self.config.schwelle_db;
            db_to_linear(ueberhang / self.config.ratio - ueberhang)
        } else {
            1.0
        };
        reduktion * self.makeup
    }
}

impl SampleTransform for Compressor {
    fn process(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            let gain = self.gain_fuer(sample.abs());
            *sample *= gain;
        }
    }

    fn reset(&mut self) {
        self.huellkurve = 0.0;
    }
}

fn zeit_zu_koeffizient(zeit_secs: f32, abtastrate: f32) -> f32 {
    if zeit_secs <= 0.0 {
        return 0.0;
    }
    (-1.0 / (zeit_secs * abtastrate)).exp()
}
