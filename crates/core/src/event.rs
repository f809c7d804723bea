//! Event-Bus Trait-Definitionen
//!
//! Definiert die nach aussen gerichtete Ereignis-Schnittstelle des Kerns.
//! Die Implementierung erfolgt im jeweiligen Kompositions-Root (Server oder
//! Client-Shell) via tokio-Kanaelen; der Kern kennt nur das Trait.
//!
//! ## Zustellungs-Semantik
//! Best-effort und hoechstens einmal: Ereignisse werden auf dem Thread des
//! Senders publiziert, eine Bestaetigung gibt es nicht. Abonnenten duerfen
//! nicht blockieren; verpasste Ereignisse werden nicht nachgeliefert.

use crate::types::ClientGuid;
use serde::{Deserialize, Serialize};

/// Alle Ereignisse die der Voice-Kern nach aussen meldet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FunklinkEvent {
    /// Verbindungs-Bereitschaft des Voice-Transports hat sich geaendert
    ///
    /// `true` erst nach dem ersten Keepalive-Echo vom Server, `false`
    /// sofort bei jedem Socket-Neuaufbau.
    VoipBereitschaft { bereit: bool },

    /// Ein Client sendet gerade – Anzeige-Update fuer die Oberflaeche
    ///
    /// `anzeige` ist z.B. "251.000 AM" oder "INTERCOM".
    SendetAuf {
        client: ClientGuid,
        anzeige: String,
    },

    /// Server- oder Profileinstellungen haben sich geaendert
    EinstellungenGeaendert,
}

/// Trait fuer den Event-Bus
///
/// Die konkrete Implementierung (tokio broadcast o.ae.) wird vom
/// Kompositions-Root bereitgestellt und als `Arc<dyn EventBus>` an die
/// Kern-Komponenten gereicht.
pub trait EventBus: Send + Sync + 'static {
    /// Publiziert ein Ereignis an alle Abonnenten (best-effort)
    fn senden(&self, event: FunklinkEvent);
}

/// Event-Bus der alle Ereignisse verwirft
///
/// Standard fuer Tests und fuer Betrieb ohne angeschlossene Oberflaeche.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn senden(&self, _event: FunklinkEvent) {}
}
