//! Event-Bus-Implementierung des Servers
//!
//! Der Kern kennt nur das `EventBus`-Trait; hier wird es auf einen
//! tokio-Broadcast-Kanal abgebildet. Abonnenten ohne Kapazitaet
//! verlieren Ereignisse (best-effort, hoechstens einmal).

use tokio::sync::broadcast;

use funklink_core::event::{EventBus, FunklinkEvent};

/// Kapazitaet pro Abonnent bevor alte Ereignisse verworfen werden
const KANAL_KAPAZITAET: usize = 256;

/// Broadcast-basierter Event-Bus
pub struct BroadcastEventBus {
    tx: broadcast::Sender<FunklinkEvent>,
}

impl BroadcastEventBus {
    pub fn neu() -> Self {
        let (tx, _) = broadcast::channel(KANAL_KAPAZITAET);
        Self { tx }
    }

    /// Erstellt einen neuen Abonnenten (sieht nur zukuenftige Ereignisse)
    pub fn abonnieren(&self) -> broadcast::Receiver<FunklinkEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::neu()
    }
}

impl EventBus for BroadcastEventBus {
    fn senden(&self, event: FunklinkEvent) {
        // Kein Abonnent ist kein Fehler
        let _ = self.tx.send(event);
    }
}
