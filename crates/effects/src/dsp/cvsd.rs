//! CVSD-Emulation (Continuously Variable Slope Delta)
//!
//! Bildet den Klang verschluesselter Sprachfunk-Hardware nach: das
//! Signal wird durch einen 1-Bit-Deltamodulator mit silbischer
//! Steilheitsanpassung kodiert und sofort wieder dekodiert. Uebrig
//! bleibt die charakteristische koernige Faerbung des Originals.

use super::SampleTransform;

const SCHRITT_MIN: f32 = 0.002;
const SCHRITT_MAX: f32 = 0.1;
const SCHRITT_ZUWACHS: f32 = 0.004;
const SCHRITT_ZERFALL: f32 = 0.98;
const INTEGRATOR_LECK: f32 = 0.985;

/// Kodier-/Dekodier-Durchlauf eines CVSD-Modulators
pub struct Cvsd {
    /// Laufender Schaetzwert des Integrators
    schaetzwert: f32,
    /// Aktuelle Schrittweite
    schritt: f32,
    /// Letzte drei Bits als Schieberegister
    bit_historie: u8,
}

impl Cvsd {
    pub fn neu() -> Self {
        Self {
            schaetzwert: 0.0,
            schritt: SCHRITT_MIN,
            bit_historie: 0,
        }
    }
}

impl Default for Cvsd {
    fn default() -> Self {
        Self::neu()
    }
}

impl SampleTransform for Cvsd {
    fn process(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            let bit = *sample >= self.schaetzwert;

            self.bit_historie = ((self.bit_historie << 1) | u8::from(bit)) & 0b111;
            // Drei gleiche Bits in Folge: Steigung zu flach, Schritt vergroessern
            if self.bit_historie == 0b111 || self.bit_historie == 0b000 {
                self.schritt = (self.schritt + SCHRITT_ZUWACHS).min(SCHRITT_MAX);
            } else {
                self.schritt = (self.schritt * SCHRITT_ZERFALL).max(SCHRITT_MIN);
            }

            if bit {
                self.schaetzwert += self.schritt;
            } else {
                self.schaetzwert -= self.schritt;
            }
            self.schaetzwert = (self.schaetzwert * INTEGRATOR_LECK).clamp(-1.0, 1.0);

            *sample = self.schaetzwert;
        }
    }

    fn reset(&mut self) {
        self.schaetzwert = 0.0;
        self.schritt = SCHRITT_MIN;
        self.bit_historie = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::ABTASTRATE;
    use std::f32::consts::PI;

    fn sinus(frequenz: f32, amplitude: f32, laenge: usize) -> Vec<f32> {
        (0..laenge)
            .map(|i| amplitude * (2.0 * PI * frequenz * i as f32 / ABTASTRATE).sin())
            .collect()
    }

    #[test]
    fn signal_bleibt_begrenzt() {
        let mut cvsd = Cvsd::neu();
        let mut samples = sinus(800.0, 0.9, 9600);
        cvsd.process(&mut samples);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn signal_wird_veraendert() {
        let mut cvsd = Cvsd::neu();
        let original = sinus(800.0, 0.5, 4800);
        let mut samples = original.clone();
        cvsd.process(&mut samples);
        let abweichung: f32 = original
            .iter()
            .zip(samples.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        assert!(abweichung > 1.0, "CVSD sollte das Signal hoerbar faerben");
    }

    #[test]
    fn sprachband_bleibt_erkennbar() {
        let mut cvsd = Cvsd::neu();
        let mut samples = sinus(400.0, 0.5, 48_000);
        cvsd.process(&mut samples);
        // Der Traeger muss durchkommen, nur eben verzerrt
        let energie: f32 = samples.iter().map(|s| s * s).sum();
        assert!(energie > 100.0);
    }

    #[test]
    fn reset_startet_neu() {
        let mut cvsd = Cvsd::neu();
        let mut samples = sinus(800.0, 0.9, 480);
        cvsd.process(&mut samples);
        cvsd.reset();
        assert_eq!(cvsd.schaetzwert, 0.0);
        assert_eq!(cvsd.schritt, SCHRITT_MIN);
    }
}
