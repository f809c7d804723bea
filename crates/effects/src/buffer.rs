//! Pool fuer Audio-Arbeitspuffer
//!
//! Die Render-Pfade brauchen pro Frame mehrere kurzlebige f32-Puffer.
//! Statt pro Frame zu allozieren werden Puffer aus einem Pool entnommen
//! und beim Drop automatisch zurueckgegeben. Der Pool blockiert nie:
//! ist er leer, wird frisch alloziert.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;

/// Maximale Anzahl im Pool gehaltener Puffer
const POOL_KAPAZITAET: usize = 32;

/// Pool fuer wiederverwendbare f32-Puffer
#[derive(Clone)]
pub struct BufferPool {
    frei: Arc<Mutex<Vec<Vec<f32>>>>,
}

impl BufferPool {
    pub fn neu() -> Self {
        Self {
            frei: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Entnimmt einen genullten Puffer der gewuenschten Laenge
    pub fn entnehmen(&self, laenge: usize) -> PooledBuffer {
        let mut daten = self.frei.lock().pop().unwrap_or_default();
        daten.clear();
        daten.resize(laenge, 0.0);
        PooledBuffer {
            daten,
            pool: Arc::clone(&self.frei),
        }
    }

    /// Anzahl aktuell freier Puffer im Pool
    pub fn freie_puffer(&self) -> usize {
        self.frei.lock().len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::neu()
    }
}

/// Ausgeliehener Puffer, kehrt beim Drop in den Pool zurueck
pub struct PooledBuffer {
    daten: Vec<f32>,
    pool: Arc<Mutex<Vec<Vec<f32>>>>,
}

impl Deref for PooledBuffer {
    type Target = [f32];

    fn deref(&self) -> &Self::Target {
        &self.daten
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.daten
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let mut frei = self.pool.lock();
        if frei.len() < POOL_KAPAZITAET {
            frei.push(std::mem::take(&mut self.daten));
        }
    }
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("laenge", &self.daten.len())
            .finish()
    }
}
