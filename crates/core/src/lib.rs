//! funklink-core – Gemeinsame Typen, Traits und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Funklink-Crates gemeinsam genutzt werden: Identifikatoren,
//! die Modulations-Enum, den zentralen Fehlertyp, die Event-Bus-Schnittstelle
//! und die Settings-Schnittstelle.

pub mod error;
pub mod event;
pub mod settings;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{FunklinkError, Result};
pub use settings::{SettingsKey, SettingsStore};
pub use types::{ClientGuid, Coalition, Modulation, UnitId};
