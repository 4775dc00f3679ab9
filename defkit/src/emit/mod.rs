//! Emitter module.
//!
//! Defines the emitter trait and the CUE backend.

pub mod cue;
mod traits;

pub use traits::{EmitConfig, EmittedDocument, Emitter, IndentStyle, LineEnding};
