//! Intermediate Representation (IR) module.
//!
//! The IR is the serializable, target-independent snapshot of one
//! definition. It is produced by [`build_ir`] from a traced builder and
//! consumed by the validator and the emitters.

mod build;
mod diff;
mod document;
mod metadata;
mod ops;
mod proptest;

pub use build::build_ir;
pub use diff::{diff_ir, ChangeSet};
pub use document::IrDocument;
pub use metadata::{Attributes, DefinitionKind, DefinitionMetadata, WorkloadRef};
pub use ops::{scope_tree, OpNode, ScopeNode};
