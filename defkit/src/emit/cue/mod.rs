//! CUE X-Definition emitter.
//!
//! # Components
//!
//! - [`CueEmitter`] - The emitter implementing [`Emitter`](crate::emit::Emitter)
//! - [`CueTypeMapper`] - Maps parameter specs to CUE type expressions
//!
//! The output tree and expression renderer are internal; the only way in
//! is through a validated [`IrDocument`](crate::ir::IrDocument).

mod emitter;
mod expr;
mod syntax;
mod tree;
mod type_mapper;

pub use emitter::{CueEmitter, BANNER};
pub use tree::{RAW_BEGIN, RAW_END};
pub use type_mapper::CueTypeMapper;
