//! Filter erster Ordnung (ein Pol)
//!
//! Einfache Tief- und Hochpaesse fuer die sanften Flanken der
//! Funkgeraete-Bandbegrenzung. Fuer steilere Flanken siehe [`super::biquad`].

use std::f32::consts::PI;

use super::SampleTransform;

/// Durchlass-Richtung des Filters
#[derive(Debug, Clone, Copy, PartialEq)]
enum Richtung {
    Tiefpass,
    Hochpass,
}

/// Filter erster Ordnung mit fester Eckfrequenz
pub struct FirstOrderFilter {
    richtung: Richtung,
    alpha: f32,
    letzter_eingang: f32,
    letzter_ausgang: f32,
}

impl FirstOrderFilter {
    /// Tiefpass mit Eckfrequenz in Hz
    pub fn tiefpass(abtastrate: f32, eckfrequenz: f32) -> Self {
        let rc = 1.0 / (2.0 * PI * eckfrequenz);
        let dt = 1.0 / abtastrate;
        Self {
            richtung: Richtung::Tiefpass,
            alpha: dt / (rc + dt),
            letzter_eingang: 0.0,
            letzter_ausgang: 0.0,
        }
    }

    /// Hochpass mit Eckfrequenz in Hz
    pub fn hochpass(abtastrate: f32, eckfrequenz: f32) -> Self {
        let rc = 1.0 / (2.0 * PI * eckfrequenz);
        let dt = 1.0 / abtastrate;
        Self {
            richtung: Richtung::Hochpass,
            alpha: rc / (rc + dt),
            letzter_eingang: 0.0,
            letzter_ausgang: 0.0,
        }
    }
}

impl SampleTransform for FirstOrderFilter {
    fn process(&mut self, samples: &mut [f32]) {
        match self.richtung {
            Richtung::Tiefpass => {
                for sample in samples.iter_mut() {
                    self.letzter_ausgang += self.alpha * (*sample - self.letzter_ausgang);
                    *sample = self.letzter_ausgang;
                }
            }
            Richtung::Hochpass => {
                for sample in samples.iter_mut() {
                    let eingang = *sample;
                    self.letzter_ausgang =
                        self.alpha * (self.letzter_ausgang + eingang - self.letzter_eingang);
                    self.letzter_eingang = eingang;
                    *sample = self.letzter_ausgang;
                }
            }
        }
    }

    fn reset(&mut self) {
        self.letzter_eingang = 0.0;
        self.letzter_ausgang = 0.0;
    }
}
