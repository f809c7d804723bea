//! Sidechain-Kompressor
//!
//! Die Pegelreduktion wird nicht aus dem Nutzsignal, sondern aus einem
//! separaten Sidechain-Zweig abgeleitet. Der Zweig ist eine eigene
//! Effekt-Kette, die beim Kompilieren gegen eine stille Quelle gebunden
//! wird: pro Puffer wird ein Null-Puffer gleicher Laenge durch die
//! Sidechain-Kette geschickt und das Ergebnis als Detektor verwendet.

use super::compressor::{Compressor, CompressorConfig};
use super::SampleTransform;

/// Kompressor mit eigenem Sidechain-Effektzweig
pub struct SidechainCompressor {
    compressor: Compressor,
    sidechain_kette: Vec<Box<dyn SampleTransform>>,
    sidechain_puffer: Vec<f32>,
}

impl SidechainCompressor {
    pub fn neu(
        config: CompressorConfig,
        abtastrate: f32,
        sidechain_kette: Vec<Box<dyn SampleTransform>>,
    ) -> Self {
        Self {
            compressor: Compressor::neu(config, abtastrate),
            sidechain_kette,
            sidechain_puffer: Vec::new(),
        }
    }
}

impl SampleTransform for SidechainCompressor {
    fn process(&mut self, samples: &mut [f32]) {
        // Stille Quelle durch den Sidechain-Zweig schicken
        self.sidechain_puffer.clear();
        self.sidechain_puffer.resize(samples.len(), 0.0);
        for effekt in self.sidechain_kette.iter_mut() {
            effekt.process(&mut self.sidechain_puffer);
        }

        for (sample, detektor) in samples.iter_mut().zip(self.sidechain_puffer.iter()) {
            let gain = self.compressor.gain_fuer(detektor.abs());
            *sample *= gain;
        }
    }

    fn reset(&mut self) {
        self.compressor.reset();
        for effekt in self.sidechain_kette.iter_mut() {
            effekt.reset();
        }
    }
}
