//! funklink-radio – Funkgeraete-Modell und Erreichbarkeit
//!
//! ## Module
//! - [`radio`] – Zustand eines simulierten Funkgeraets und Geraetesatz
//! - [`reachability`] – reine Entscheidungsfunktion "wer hoert wen"
//!
//! Die Erreichbarkeits-Logik ist bewusst frei von I/O und globalem
//! Zustand: identische Eingaben liefern immer dieselbe Entscheidung.

pub mod radio;
pub mod reachability;

pub use radio::{Radio, RadioSet};
pub use reachability::{bestes_empfangsgeraet, frequenz_nah_genug, Empfang, Uebertragung};
