//! Uebertragungs-Segmente als Eingabe der Misch-Pipeline

use funklink_core::types::Modulation;

use crate::buffer::PooledBuffer;

/// Dekodiertes Audio-Fragment mit Empfangs-Metadaten, wie es aus dem
/// Netzwerk-Pfad beim Jitter-Rekonstruktor ankommt
#[derive(Debug, Clone)]
pub struct DeJitteredTransmission {
    /// Index des empfangenden Geraets im Geraetesatz
    pub radio_index: usize,
    /// Dekodierte PCM-Samples
    pub pcm: Vec<f32>,
    pub modulation: Modulation,
    /// Uebertragung war verschluesselt
    pub verschluesselt: bool,
    /// Schluessel passte (sonst wird Stoer-Audio gerendert)
    pub entschluesselbar: bool,
    /// Effektive Empfangsstaerke aus der Erreichbarkeits-Pruefung
    pub empfangsstaerke: f64,
    /// Sichtlinien-Verlust des empfangenden Geraets
    pub los_verlust: f32,
    /// Empfang ueber die Zweitfrequenz
    pub sekundaer: bool,
    /// Effekt-Kette ueberspringen (z.B. Server-Durchsagen)
    pub effekte_umgehen: bool,
}

/// Fertig segmentierte Uebertragung fuer einen Render-Tick.
///
/// Der Audio-Puffer stammt aus dem Pool und wird nach dem Mischen
/// eines Frames freigegeben, nie ueber Frames hinweg gehalten.
#[derive(Debug)]
pub struct TransmissionSegment {
    pub audio: PooledBuffer,
    pub modulation: Modulation,
    pub verschluesselt: bool,
    pub entschluesselbar: bool,
    pub empfangsstaerke: f64,
    pub los_verlust: f32,
    pub sekundaer: bool,
    pub effekte_umgehen: bool,
}

impl TransmissionSegment {
    /// Nimmt dieses Segment am FM-Capture-Wettbewerb teil?
    pub fn ist_capture_kandidat(&self) -> bool {
        self.modulation == Modulation::Fm && !self.effekte_umgehen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferPool;

    fn segment(modulation: Modulation, effekte_umgehen: bool) -> TransmissionSegment {
        let pool = BufferPool::neu();
        TransmissionSegment {
            audio: pool.entnehmen(16),
            modulation,
            verschluesselt: false,
            entschluesselbar: true,
            empfangsstaerke: 1.0,
            los_verlust: 0.0,
            sekundaer: false,
            effekte_umgehen,
        }
    }

    #[test]
    fn nur_fm_mit_effekten_ist_capture_kandidat() {
        assert!(segment(Modulation::Fm, false).ist_capture_kandidat());
        assert!(!segment(Modulation::Fm, true).ist_capture_kandidat());
        assert!(!segment(Modulation::Am, false).ist_capture_kandidat());
        assert!(!segment(Modulation::Intercom, false).ist_capture_kandidat());
    }
}
