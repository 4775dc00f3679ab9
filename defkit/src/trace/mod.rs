//! Expression and reference tracer.
//!
//! Definitions are written as ordinary Rust closures over a
//! [`DefinitionBuilder`]. The builder records what the closure asks for
//! (field writes, conditional scopes, context reads) as an ordered operation
//! log instead of performing it.

mod builder;
pub mod context;
mod definition;
mod expr;
mod path;

pub use builder::{DefinitionBuilder, Resource};
pub use context::{Context, ContextRef};
pub use definition::Definition;
pub use expr::{CompareOp, Expr, LogicalOp, OwnerId, ParamRef};
pub use path::{FieldPath, Segment};
