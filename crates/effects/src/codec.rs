//! Schnittstelle zum externen Audio-Codec
//!
//! Der Kern behandelt den Sprach-Codec als opake Byte-Transformation
//! mit einer Obergrenze fuer die Ausgabelaenge. Fuer Tests und als
//! Referenz liegt ein unkomprimierter PCM16-Codec bei.

use funklink_core::error::{FunklinkError, Result};

/// Byte-zu-Samples-Transformation des Sprach-Codecs
pub trait AudioCodec: Send {
    /// Dekodiert einen Payload in f32-Samples, liefert die Anzahl
    /// geschriebener Samples
    fn decode(&mut self, daten: &[u8], ziel: &mut [f32]) -> Result<usize>;

    /// Kodiert f32-Samples in einen Payload, liefert die Anzahl
    /// geschriebener Bytes
    fn encode(&mut self, samples: &[f32], ziel: &mut [u8]) -> Result<usize>;

    /// Maximale Anzahl Samples die ein einzelner Payload ergeben kann
    fn max_samples(&self) -> usize;
}

/// Unkomprimiertes PCM16 little-endian, 2 Bytes pro Sample
pub struct Pcm16Codec {
    max_samples: usize,
}

impl Pcm16Codec {
    pub fn neu(max_samples: usize) -> Self {
        Self { max_samples }
    }
}

impl AudioCodec for Pcm16Codec {
    fn decode(&mut self, daten: &[u8], ziel: &mut [f32]) -> Result<usize> {
        if daten.len() % 2 != 0 {
            return Err(FunklinkError::Codec(
                "PCM16-Payload mit ungerader Laenge".into(),
            ));
        }
        let anzahl = daten.len() / 2;
        if anzahl > self.max_samples || anzahl > ziel.len() {
            return Err(FunklinkError::Codec(format!(
                "PCM16-Payload zu gross: {anzahl} Samples"
            )));
        }
        for (ziel_sample, paar) in ziel.iter_mut().zip(daten.chunks_exact(2)) {
            let wert = i16::from_le_bytes([paar[0], paar[1]]);
            *ziel_sample = f32::from(wert) / f32::from(i16::MAX);
        }
        Ok(anzahl)
    }

    fn encode(&mut self, samples: &[f32], ziel: &mut [u8]) -> Result<usize> {
        let benoetigt = samples.len() * 2;
        if benoetigt > ziel.len() {
            return Err(FunklinkError::Codec(format!(
                "Ausgabepuffer zu klein: {benoetigt} Bytes benoetigt"
            )));
        }
        for (sample, paar) in samples.iter().zip(ziel.chunks_exact_mut(2)) {
            let wert = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            paar.copy_from_slice(&wert.to_le_bytes());
        }
        Ok(benoetigt)
    }

    fn max_samples(&self) -> usize {
        self.max_samples
    }
}
