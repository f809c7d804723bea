//! DSP-Bausteine fuer die Funkeffekt-Kette
//!
//! Alle Module implementieren das `SampleTransform` Trait fuer
//! eine einheitliche Ketten-Integration.

pub mod biquad;
pub mod compressor;
pub mod cvsd;
pub mod first_order;
pub mod saturation;
pub mod sidechain;

/// Abtastrate der gesamten Effekt-Verarbeitung in Hz
pub const ABTASTRATE: f32 = 48_000.0;

/// Gemeinsames Trait fuer alle Sample-Transformationen
///
/// Alle DSP-Bausteine verarbeiten Samples in-place und sind
/// Send fuer die Nutzung im Render-Thread.
pub trait SampleTransform: Send {
    /// Verarbeitet einen Puffer von Samples in-place
    fn process(&mut self, samples: &mut [f32]);

    /// Setzt den internen Zustand zurueck (z.B. Filter-Historie)
    fn reset(&mut self);
}

/// Konstanter Pegel in dB, als Multiplikation angewendet
pub struct Gain {
    faktor: f32,
}

impl Gain {
    pub fn neu(gain_db: f32) -> Self {
        Self {
            faktor: db_to_linear(gain_db),
        }
    }
}

impl SampleTransform for Gain {
    fn process(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample *= self.faktor;
        }
    }

    fn reset(&mut self) {}
}

/// Rechnet Dezibel in einen linearen Faktor um
pub fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Rechnet einen linearen Faktor in Dezibel um
pub fn linear_to_db(linear: f32) -> f32 {
    20.0 * linear.max(1e-10).log10()
}
