//! funklink-protocol – Netzwerkprotokoll-Definitionen
//!
//! Dieses Crate definiert das binaere UDP-Wire-Format fuer Voice-Pakete
//! und die Keepalive-Konvention (22-Byte-GUID-Datagramm).

pub mod voice;

pub use voice::{RadioFrequenz, VoicePacket};
