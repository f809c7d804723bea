//! Segmentierung eintreffender Audio-Fragmente
//!
//! UDP liefert Sprach-Fragmente stossweise und ohne Ende-Markierung.
//! Der Rekonstruktor fuehrt pro Geraet (und getrennt fuer Haupt- und
//! Zweitfrequenz) eine Ankunftsuhr: liegt zwischen zwei Fragmenten mehr
//! als die Schwelle, beginnt eine neue Uebertragung. Pro Render-Tick
//! wird der aktuelle Stand als Segment-Menge abgezogen.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use funklink_core::types::Modulation;

use crate::buffer::BufferPool;
use crate::segment::{DeJitteredTransmission, TransmissionSegment};

/// Luecke, ab der ein Fragment als neue Uebertragung gilt
pub const NEUE_UEBERTRAGUNG_SCHWELLE: Duration = Duration::from_millis(400);

/// Metadaten der laufenden Uebertragung eines Stroms
#[derive(Debug, Clone, Copy)]
struct StromMeta {
    modulation: Modulation,
    verschluesselt: bool,
    entschluesselbar: bool,
    empfangsstaerke: f64,
    los_verlust: f32,
    sekundaer: bool,
    effekte_umgehen: bool,
}

/// Laufender Empfangsstrom eines Geraets
#[derive(Debug, Default)]
struct RadioStrom {
    letzte_ankunft: Option<Instant>,
    samples: Vec<f32>,
    meta: Option<StromMeta>,
}

/// Setzt Fragmente pro Geraet zu Uebertragungs-Segmenten zusammen.
///
/// Nicht fuer unkoordinierte parallele Nutzung gedacht: der Zustand
/// gehoert dem Render-Thread.
pub struct JitterReconstructor {
    stroeme: HashMap<(usize, bool), RadioStrom>,
    fertig: Vec<TransmissionSegment>,
    pool: BufferPool,
}

impl JitterReconstructor {
    pub fn neu(pool: BufferPool) -> Self {
        Self {
            stroeme: HashMap::new(),
            fertig: Vec::new(),
            pool,
        }
    }

    /// Prueft ob ein Fragment zum Zeitpunkt `jetzt` eine neue
    /// Uebertragung auf diesem Strom beginnen wuerde
    pub fn ist_neue_uebertragung(&self, radio_index: usize, sekundaer: bool, jetzt: Instant) -> bool {
        match self
            .stroeme
            .get(&(radio_index, sekundaer))
            .and_then(|strom| strom.letzte_ankunft)
        {
            Some(letzte) => jetzt.duration_since(letzte) > NEUE_UEBERTRAGUNG_SCHWELLE,
            None => true,
        }
    }

    /// Ordnet ein dekodiertes Fragment seinem Strom zu
    pub fn fragment_hinzufuegen(&mut self, fragment: DeJitteredTransmission, jetzt: Instant) {
        let schluessel = (fragment.radio_index, fragment.sekundaer);
        let neue_uebertragung = self.ist_neue_uebertragung(fragment.radio_index, fragment.sekundaer, jetzt);

        let strom = self.stroeme.entry(schluessel).or_default();
        if neue_uebertragung && !strom.samples.is_empty() {
            // Alte Uebertragung abschliessen, bevor die neue beginnt
            if let Some(meta) = strom.meta {
                let mut audio = self.pool.entnehmen(strom.samples.len());
                audio.copy_from_slice(&strom.samples);
                self.fertig.push(segment_bauen(audio, meta));
            }
            strom.samples.clear();
        }

        strom.samples.extend_from_slice(&fragment.pcm);
        strom.meta = Some(StromMeta {
            modulation: fragment.modulation,
            verschluesselt: fragment.verschluesselt,
            entschluesselbar: fragment.entschluesselbar,
            empfangsstaerke: fragment.empfangsstaerke,
            los_verlust: fragment.los_verlust,
            sekundaer: fragment.sekundaer,
            effekte_umgehen: fragment.effekte_umgehen,
        });
        strom.letzte_ankunft = Some(jetzt);
    }

    /// Zieht alle aktiven Segmente fuer einen Render-Tick ab.
    /// Die Stroeme bleiben bestehen, ihre Puffer sind danach leer.
    pub fn tick(&mut self) -> Vec<TransmissionSegment> {
        let mut segmente = std::mem::take(&mut self.fertig);

        for strom in self.stroeme.values_mut() {
            if strom.samples.is_empty() {
                continue;
            }
            let Some(meta) = strom.meta else {
                continue;
            };
            let mut audio = self.pool.entnehmen(strom.samples.len());
            audio.copy_from_slice(&strom.samples);
            segmente.push(segment_bauen(audio, meta));
            strom.samples.clear();
        }

        segmente
    }
}

fn segment_bauen(audio: crate::buffer::PooledBuffer, meta: StromMeta) -> TransmissionSegment {
    TransmissionSegment {
        audio,
        modulation: meta.modulation,
        verschluesselt: meta.verschluesselt,
        entschluesselbar: meta.entschluesselbar,
        empfangsstaerke: meta.empfangsstaerke,
        los_verlust: meta.los_verlust,
        sekundaer: meta.sekundaer,
        effekte_umgehen: meta.effekte_umgehen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(radio_index: usize, pcm: Vec<f32>) -> DeJitteredTransmission {
        DeJitteredTransmission {
            radio_index,
            pcm,
            modulation: Modulation::Am,
            verschluesselt: false,
            entschluesselbar: true,
            empfangsstaerke: 1.0,
            los_verlust: 0.0,
            sekundaer: false,
            effekte_umgehen: false,
        }
    }

    #[test]
    fn fragmente_unter_schwelle_ein_segment() {
        let mut rekonstruktor = JitterReconstructor::neu(BufferPool::neu());
        let start = Instant::now();
        rekonstruktor.fragment_hinzufuegen(fragment(0, vec![0.1; 480]), start);
        rekonstruktor.fragment_hinzufuegen(
            fragment(0, vec![0.2; 480]),
            start + Duration::from_millis(40),
        );

        let segmente = rekonstruktor.tick();
        assert_eq!(segmente.len(), 1);
        assert_eq!(segmente[0].audio.len(), 960);
    }

    #[test]
    fn fragmente_ueber_schwelle_zwei_segmente() {
        let mut rekonstruktor = JitterReconstructor::neu(BufferPool::neu());
        let start = Instant::now();
        rekonstruktor.fragment_hinzufuegen(fragment(0, vec![0.1; 480]), start);
        rekonstruktor.fragment_hinzufuegen(
            fragment(0, vec![0.2; 480]),
            start + Duration::from_millis(401),
        );

        let segmente = rekonstruktor.tick();
        assert_eq!(segmente.len(), 2);
    }

    #[test]
    fn erstes_fragment_ist_neue_uebertragung() {
        let rekonstruktor = JitterReconstructor::neu(BufferPool::neu());
        assert!(rekonstruktor.ist_neue_uebertragung(3, false, Instant::now()));
    }

    #[test]
    fn verschiedene_geraete_getrennte_segmente() {
        let mut rekonstruktor = JitterReconstructor::neu(BufferPool::neu());
        let jetzt = Instant::now();
        rekonstruktor.fragment_hinzufuegen(fragment(0, vec![0.1; 480]), jetzt);
        rekonstruktor.fragment_hinzufuegen(fragment(1, vec![0.2; 480]), jetzt);

        let segmente = rekonstruktor.tick();
        assert_eq!(segmente.len(), 2);
    }

    #[test]
    fn zweitfrequenz_eigener_strom() {
        let mut rekonstruktor = JitterReconstructor::neu(BufferPool::neu());
        let jetzt = Instant::now();
        let mut sekundaer = fragment(0, vec![0.2; 480]);
        sekundaer.sekundaer = true;
        rekonstruktor.fragment_hinzufuegen(fragment(0, vec![0.1; 480]), jetzt);
        rekonstruktor.fragment_hinzufuegen(sekundaer, jetzt);

        let segmente = rekonstruktor.tick();
        assert_eq!(segmente.len(), 2);
        assert_eq!(segmente.iter().filter(|s| s.sekundaer).count(), 1);
    }

    #[test]
    fn tick_leert_stroeme() {
        let mut rekonstruktor = JitterReconstructor::neu(BufferPool::neu());
        rekonstruktor.fragment_hinzufuegen(fragment(0, vec![0.1; 480]), Instant::now());
        assert_eq!(rekonstruktor.tick().len(), 1);
        assert!(rekonstruktor.tick().is_empty());
    }

    #[test]
    fn uebertragung_laeuft_ueber_mehrere_ticks() {
        let mut rekonstruktor = JitterReconstructor::neu(BufferPool::neu());
        let start = Instant::now();
        rekonstruktor.fragment_hinzufuegen(fragment(0, vec![0.1; 480]), start);
        assert_eq!(rekonstruktor.tick().len(), 1);

        // Naechstes Fragment kurz danach gehoert zur selben Uebertragung,
        // landet aber im naechsten Tick
        rekonstruktor.fragment_hinzufuegen(
            fragment(0, vec![0.2; 480]),
            start + Duration::from_millis(40),
        );
        let segmente = rekonstruktor.tick();
        assert_eq!(segmente.len(), 1);
        assert_eq!(segmente[0].audio.len(), 480);
    }
}
