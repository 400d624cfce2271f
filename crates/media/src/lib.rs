//! sprechfunk-media – Medien-Schnittstellen und Playback-Puffer-Engine
//!
//! Aufnahme, Encoding und Decoding liefert die Host-Plattform; dieses Crate
//! modelliert sie ausschliesslich ueber die schmalen Schnittstellen, die der
//! Client-Kern konsumiert:
//! - [`aufnahme`] – Aufnahmegeraet und intervall-basierter Chunk-Encoder
//! - [`senke`] – append-only Decode-Senke und Wiedergabe-Element
//! - [`engine`] – die Playback-Puffer-Engine auf dem Empfangspfad

pub mod aufnahme;
pub mod engine;
pub mod error;
pub mod senke;

pub use aufnahme::{Aufnahmegeraet, ChunkEncoder, EncoderConfig};
pub use engine::{EngineConfig, PipelineZustand, PlaybackEngine};
pub use error::{MedienFehler, MedienResult};
pub use senke::{DecodeSenke, SenkenAnbieter, StartFehler, WiedergabeElement};
