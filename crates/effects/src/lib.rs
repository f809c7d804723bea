//! funklink-effects – Funkeffekt-DSP und Misch-Pipeline
//!
//! ## Module
//! - [`dsp`] – Sample-Transformationen (Filter, Saturation, Kompressoren, CVSD)
//! - [`model`] – deklarative Effekt-Baeume, Presets und Kompilierung
//! - [`buffer`] – Pool fuer Audio-Arbeitspuffer mit RAII-Rueckgabe
//! - [`segment`] – Uebertragungs-Segmente als Pipeline-Eingabe
//! - [`jitter`] – Segmentierung eintreffender Audio-Fragmente
//! - [`pipeline`] – Capture/Mix-Entscheidung und Dry/Wet-Rendering
//! - [`codec`] – Schnittstelle zum externen Audio-Codec

pub mod buffer;
pub mod codec;
pub mod dsp;
pub mod jitter;
pub mod model;
pub mod pipeline;
pub mod segment;

pub use buffer::{BufferPool, PooledBuffer};
pub use codec::AudioCodec;
pub use jitter::JitterReconstructor;
pub use model::{RadioModelFactory, RadioModelSpec};
pub use pipeline::EffectsPipeline;
pub use segment::{DeJitteredTransmission, TransmissionSegment};
