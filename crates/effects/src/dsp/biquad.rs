//! Biquad-Filter zweiter Ordnung nach dem Audio-EQ-Cookbook (RBJ)
//!
//! Tiefpass, Hochpass und Peaking-EQ mit einstellbarer Guete. Die
//! Koeffizienten werden einmalig beim Erzeugen berechnet, die
//! Verarbeitung nutzt Direktform 1 mit zwei Sample-Historien.

use std::f32::consts::PI;

use super::SampleTransform;

/// Biquad-Filter mit festen Koeffizienten
pub struct BiQuadFilter {
    // Koeffizienten, bereits durch a0 geteilt
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiQuadFilter {
    fn aus_koeffizienten(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Tiefpass mit Eckfrequenz und Guete Q
    pub fn tiefpass(abtastrate: f32, eckfrequenz: f32, q: f32) -> Self {
        let w0 = 2.0 * PI * eckfrequenz / abtastrate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);

        let b1 = 1.0 - cos_w0;
        let b0 = b1 / 2.0;
        Self::aus_koeffizienten(b0, b1, b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
    }

    /// Hochpass mit Eckfrequenz und Guete Q
    pub fn hochpass(abtastrate: f32, eckfrequenz: f32, q: f32) -> Self {
        let w0 = 2.0 * PI * eckfrequenz / abtastrate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);

        let b0 = (1.0 + cos_w0) / 2.0;
        Self::aus_koeffizienten(
            b0,
            -(1.0 + cos_w0),
            b0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        )
    }

    /// Peaking-EQ mit Mittenfrequenz, Guete Q und Anhebung/Absenkung in dB
    pub fn peaking_eq(abtastrate: f32, mittenfrequenz: f32, q: f32, gain_db: f32) -> Self {
        let w0 = 2.0 * PI * mittenfrequenz / abtastrate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);
        let a = 10.0f32.powf(gain_db / 40.0);

        Self::aus_koeffizienten(
            1.0 + alpha * a,
            -2.0 * cos_w0,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cos_w0,
            1.0 - alpha / a,
        )
    }
}

impl SampleTransform for BiQuadFilter {
    fn process(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            let x0 = *sample;
            let y0 = self.b0 * x0 + self.b1 * self.x1 + self.b2 * self.x2
                - self.a1 * self.y1
                - self.a2 * self.y2;

            self.x2 = self.x1;
            self.x1 = x0;
            self.y2 = self.y1;
            self.y1 = y0;
            *sample = y0;
        }
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}
