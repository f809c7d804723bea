//! funklink-voice – Server-Router und Client-Transport
//!
//! ## Module
//! - [`registry`] – geteiltes Client-Verzeichnis (nebenlaeufig, feldweise Updates)
//! - [`router`] – Server-seitiger UDP Voice-Router mit Erreichbarkeits-Fan-out
//! - [`transport`] – Client-seitige UDP-Session mit Ping/Timeout-Zustandsmaschine
//! - [`transmission_log`] – Warteschlange fuer Uebertragungs-Protokollierung

pub mod registry;
pub mod router;
pub mod transmission_log;
pub mod transport;

pub use registry::{ClientRecord, ClientRegistry};
pub use router::VoiceRouter;
pub use transmission_log::TransmissionLog;
pub use transport::{TransportZeiten, VoiceTransport, VoiceTransportHandle};
