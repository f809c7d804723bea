//! Misch-Pipeline: von Segmenten zum fertigen Audio-Frame
//!
//! Pro Render-Tick werden die aktiven Segmente eines Geraets gemischt
//! und durch die Empfangskette des Funkgeraete-Modells gefaerbt:
//!
//! 1. FM-Segmente konkurrieren bei aktiver Interferenz-Simulation um den
//!    Capture-Effekt, nur das staerkste wird gemischt; alles andere wird
//!    direkt aufsummiert (blockweise mit skalarem Rest)
//! 2. Grundrauschen des Modells kommt in die Trockensumme
//! 3. Dry- und Wet-Pfad laufen ueber getrennte Pool-Puffer, der Wet-Pfad
//!    durch die gecachte kompilierte Empfangskette
//! 4. Dry/Wet-Verhaeltnis mischt beide, optional mit hartem Clipping
//!
//! Einstellungen werden hoechstens alle drei Sekunden neu gelesen. Ein
//! Fehler beim Rendern leert den Modell-Cache und liefert 0 Samples –
//! der Aufrufer spielt Stille und versucht es im naechsten Frame erneut.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use funklink_core::error::{FunklinkError, Result};
use funklink_core::settings::{SettingsKey, SettingsStore};

use crate::buffer::BufferPool;
use crate::dsp::db_to_linear;
use crate::model::{RadioModelFactory, RxRadioModel};
use crate::segment::TransmissionSegment;

/// Intervall zwischen zwei Settings-Abfragen
const EINSTELLUNGS_INTERVALL: Duration = Duration::from_secs(3);

/// Blockbreite der Misch-Schleife
const MISCH_BREITE: usize = 8;

/// Render-Pipeline eines Empfaengers.
///
/// Haelt Modell-Cache und Rausch-Zustand; gehoert dem Render-Thread
/// und ist nicht fuer parallele Nutzung gedacht.
pub struct EffectsPipeline {
    settings: Arc<dyn SettingsStore>,
    fabrik: Arc<RadioModelFactory>,
    pool: BufferPool,
    rx_cache: HashMap<String, RxRadioModel>,
    letzter_refresh: Instant,
    effekt_verhaeltnis: f32,
    pro_modell_effekte: bool,
    clipping: bool,
    interferenz: bool,
    rausch_zustand: u32,
}

impl EffectsPipeline {
    pub fn neu(
        settings: Arc<dyn SettingsStore>,
        fabrik: Arc<RadioModelFactory>,
        pool: BufferPool,
    ) -> Self {
        let mut pipeline = Self {
            settings,
            fabrik,
            pool,
            rx_cache: HashMap::new(),
            letzter_refresh: Instant::now(),
            effekt_verhaeltnis: 1.0,
            pro_modell_effekte: true,
            clipping: false,
            interferenz: false,
            rausch_zustand: 0x2545_F491,
        };
        pipeline.einstellungen_lesen();
        pipeline
    }

    /// Liest die Einstellungen neu, hoechstens alle drei Sekunden
    fn einstellungen_auffrischen(&mut self) {
        if self.letzter_refresh.elapsed() > EINSTELLUNGS_INTERVALL {
            self.letzter_refresh = Instant::now();
            self.einstellungen_lesen();
        }
    }

    fn einstellungen_lesen(&mut self) {
        self.effekt_verhaeltnis = (self.settings.float_wert(SettingsKey::RadioEffectsRatio)
            as f32)
            .clamp(0.0, 1.0);
        self.pro_modell_effekte = self.settings.bool_wert(SettingsKey::PerRadioModelEffects);
        self.clipping = self.settings.bool_wert(SettingsKey::RadioEffectsClipping);
        self.interferenz = self.settings.bool_wert(SettingsKey::RadioRxInterference);
    }

    /// Rendert die Segmente eines Geraets in den Ausgabe-Puffer.
    /// Liefert die Anzahl geschriebener Samples; 0 bei einem Fehler.
    pub fn render(
        &mut self,
        ausgabe: &mut [f32],
        segmente: &[TransmissionSegment],
        modell_name: Option<&str>,
    ) -> usize {
        self.einstellungen_auffrischen();

        match self.render_innen(ausgabe, segmente, modell_name) {
            Ok(geschrieben) => geschrieben,
            Err(e) => {
                warn!(fehler = %e, "Rendern fehlgeschlagen, Modell-Cache wird geleert");
                self.rx_cache.clear();
                ausgabe.fill(0.0);
                0
            }
        }
    }

    fn render_innen(
        &mut self,
        ausgabe: &mut [f32],
        segmente: &[TransmissionSegment],
        modell_name: Option<&str>,
    ) -> Result<usize> {
        if ausgabe.is_empty() {
            return Ok(0);
        }

        let mut trocken = self.pool.entnehmen(ausgabe.len());

        // Capture-Entscheidung: bei aktiver Interferenz konkurrieren
        // FM-Segmente, nur das staerkste kommt durch
        let mut eingefangen: Option<&TransmissionSegment> = None;
        for segment in segmente {
            if self.interferenz && segment.ist_capture_kandidat() {
                match eingefangen {
                    Some(bisher) if bisher.empfangsstaerke >= segment.empfangsstaerke => {}
                    _ => eingefangen = Some(segment),
                }
            } else {
                mischen(&mut trocken, &segment.audio);
            }
        }
        if let Some(segment) = eingefangen {
            mischen(&mut trocken, &segment.audio);
        }

        // Modell aus dem Cache, bei Bedarf kompilieren
        let name = if self.pro_modell_effekte {
            modell_name.map(str::to_lowercase).unwrap_or_default()
        } else {
            String::new()
        };
        if !self.rx_cache.contains_key(&name) {
            let modell = self.fabrik.lade_rx_oder_intercom(&name);
            self.rx_cache.insert(name.clone(), modell);
        }
        let rauschpegel = self
            .rx_cache
            .get(&name)
            .map(RxRadioModel::noise_gain)
            .unwrap_or(-60.0);

        // Grundrauschen in die Trockensumme
        let amplitude = db_to_linear(rauschpegel);
        for sample in trocken.iter_mut() {
            *sample += amplitude * self.rausch_naechstes();
        }

        // Wet-Pfad auf eigenem Puffer, sonst liest die Kette ihre
        // eigene Ausgabe
        let mut nass = self.pool.entnehmen(ausgabe.len());
        nass.copy_from_slice(&trocken);
        if let Some(modell) = self.rx_cache.get_mut(&name) {
            modell.process(&mut nass);
        }

        let verhaeltnis = self.effekt_verhaeltnis;
        for ((ziel, t), n) in ausgabe.iter_mut().zip(trocken.iter()).zip(nass.iter()) {
            *ziel = t * (1.0 - verhaeltnis) + n * verhaeltnis;
        }

        if self.clipping && verhaeltnis > 0.0 {
            for sample in ausgabe.iter_mut() {
                *sample = sample.clamp(-1.0, 1.0);
            }
        }

        if ausgabe.iter().any(|s| !s.is_finite()) {
            return Err(FunklinkError::Pipeline(format!(
                "Modell '{name}' liefert nicht-endliche Samples"
            )));
        }

        Ok(ausgabe.len())
    }

    /// Linearer Kongruenzgenerator, Werte in [-1.0, 1.0)
    fn rausch_naechstes(&mut self) -> f32 {
        self.rausch_zustand = self
            .rausch_zustand
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        ((self.rausch_zustand >> 8) as f32 / 8_388_608.0) - 1.0
    }
}

/// Summiert `quelle` blockweise auf `ziel`, skalarer Rest am Ende
fn mischen(ziel: &mut [f32], quelle: &[f32]) {
    let laenge = ziel.len().min(quelle.len());
    let (ziel, quelle) = (&mut ziel[..laenge], &quelle[..laenge]);

    let mut ziel_bloecke = ziel.chunks_exact_mut(MISCH_BREITE);
    let mut quell_bloecke = quelle.chunks_exact(MISCH_BREITE);
    for (ziel_block, quell_block) in ziel_bloecke.by_ref().zip(quell_bloecke.by_ref()) {
        for i in 0..MISCH_BREITE {
            ziel_block[i] += quell_block[i];
        }
    }
    for (ziel_sample, quell_sample) in ziel_bloecke
        .into_remainder()
        .iter_mut()
        .zip(quell_bloecke.remainder())
    {
        *ziel_sample += *quell_sample;
    }
}
