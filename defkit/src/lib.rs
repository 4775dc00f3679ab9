//! # defkit
//!
//! Write KubeVela X-Definitions as Rust closures and compile them to CUE.
//!
//! A definition's template closure is traced, never run: every fluent call on
//! the [`DefinitionBuilder`] is recorded into an operation log. The log and the
//! declared parameters are captured into a serializable IR, validated, and
//! emitted as a CUE document.
//!
//! ## Quick Start
//!
//! ```rust
//! use defkit::{Compiler, Definition, Param};
//!
//! let worker = Definition::component("worker")
//!     .description("Long-running worker")
//!     .workload("apps/v1", "Deployment")
//!     .template(|b| {
//!         let image = b.param(Param::string("image").required().description("Container image"));
//!         let replicas = b.param(Param::int("replicas").default(3).min(1).max(100).description("Replicas"));
//!         let cpu = b.param(Param::string("cpu").description("CPU limit"));
//!
//!         let mut out = b.output();
//!         out.api_version("apps/v1").kind("Deployment");
//!         out.set("spec.replicas", &replicas);
//!         out.set("spec.template.spec.containers[0].image", &image);
//!         out.set_if(cpu.is_set(), "spec.resources.limits.cpu", &cpu);
//!     });
//!
//! let compiled = Compiler::new().compile(&worker).unwrap();
//! assert!(compiled.cue.contains("replicas: *3 | int & >=1 & <=100"));
//! assert!(compiled.cue.contains("if parameter.cpu != _|_ {"));
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Entry point | Failure |
//! |-------|-------------|---------|
//! | Trace | [`Definition::trace`] | recorded in the builder |
//! | Capture | [`build_ir`] | [`SchemaError`] |
//! | Validate | [`Validator::validate`] | error [`Diagnostic`]s |
//! | Emit | [`Emitter::emit`](emit::Emitter::emit) | [`EmissionError`] |
//!
//! [`Compiler`] runs all four and wraps failures in [`CompileError`].
//! [`Compiler::compile_batch`] and [`DefinitionRegistry::compile_all`] compile
//! many definitions in parallel.
//!
//! ## CUE Translation
//!
//! | Declaration | CUE |
//! |-------------|-----|
//! | `Param::int("replicas").default(3)` | `replicas: *3 \| int` |
//! | `Param::string("image").required()` | `image: string` |
//! | `Param::string("cpu")` | `cpu?: string` |
//! | `Param::enumeration("t", ["a", "b"])` | `t?: "a" \| "b"` |
//! | `Param::one_of("s", variants)` | `s?: close({..}) \| close({..})` |
//! | `cpu.is_set()` | `parameter.cpu != _\|_` |
//! | `set_if(cond, path, v)` | `if cond { path: v }` |
//! | `Context::output().status()` | `context.output.status` |
//!
//! ## Logging
//!
//! The crate logs through [`tracing`] and installs no subscriber.

pub mod compile;
pub mod config;
pub mod emit;
pub mod error;
pub mod ir;
pub mod param;
pub mod registry;
pub mod trace;
pub mod validate;

pub use compile::{Compiled, Compiler};
pub use config::{ConfigManager, DefkitConfig};
pub use error::{CompileError, CompileResult, ConfigError, EmissionError, RegistryError, SchemaError};
pub use ir::{build_ir, diff_ir, ChangeSet, DefinitionKind, DefinitionMetadata, IrDocument};
pub use param::{Param, Variant};
pub use registry::{DefinitionRegistry, Origin};
pub use trace::{Context, Definition, DefinitionBuilder, Expr, ParamRef};
pub use validate::{Diagnostic, Severity, Validator};
