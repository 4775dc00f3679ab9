//! Parameter and type model.
//!
//! Parameters are declared with the [`Param`] builder and captured as
//! [`ParamSpec`] schema nodes. A spec is plain data: it serializes into the
//! IR and can check itself for contradictions with [`ParamSpec::problems`].

mod builder;
mod kind;
mod spec;

pub use builder::{Param, Variant};
pub use kind::{OneOfSchema, ParamKind, StructSchema, VariantSchema};
pub use spec::{is_identifier, Constraints, ParamSpec, Presence, RequiredWhen};
