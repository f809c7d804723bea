//! Saturation: Vorverstaerkung mit weicher Begrenzung
//!
//! Treibt das Signal mit einem Gain in die Begrenzung und rundet alles
//! oberhalb des Schwellenwerts mit einer tanh-Kennlinie ab. Erzeugt die
//! typische Kompression und Obertonfaerbung eines uebersteuerten
//! Sendezweigs.

use super::{db_to_linear, SampleTransform};

/// Weiche Uebersteuerung mit Gain und Schwellenwert in dB
pub struct Saturation {
    gain: f32,
    schwelle: f32,
}

impl Saturation {
    pub fn neu(gain_db: f32, schwelle_db: f32) -> Self {
        Self {
            gain: db_to_linear(gain_db),
            schwelle: db_to_linear(schwelle_db),
        }
    }

    fn begrenzen(&self, wert: f32) -> f32 {
        let betrag = wert.abs();
        if betrag <= self.schwelle {
            return wert;
        }
        // Oberhalb der Schwelle weich gegen 1.0 druecken
        let kopfraum = 1.0 - self.schwelle;
        let ueberhang = (betrag - self.schwelle) / kopfraum;
        let begrenzt = self.schwelle + kopfraum * ueberhang.tanh();
        begrenzt.copysign(wert)
    }
}

impl SampleTransform for Saturation {
    fn process(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.begrenzen(*sample * self.gain);
        }
    }

    fn reset(&mut self) {}
}
