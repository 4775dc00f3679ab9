//! Compilation orchestrator.
//!
//! Sequences trace, IR capture, validation and emission for one definition,
//! and fans batches out over rayon's thread pool.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use rayon::prelude::*;

use crate::config::DefkitConfig;
use crate::emit::cue::CueEmitter;
use crate::emit::{EmitConfig, Emitter};
use crate::error::{CompileError, CompileResult};
use crate::ir::{build_ir, IrDocument};
use crate::trace::Definition;
use crate::validate::{Diagnostic, Validator};

/// Result of compiling one definition.
#[derive(Debug, Clone)]
pub struct Compiled {
    /// Emitted CUE text
    pub cue: String,

    /// Suggested output file name, `<name>.<emitter extension>`
    pub file_name: String,

    /// The IR the text was emitted from
    pub ir: IrDocument,

    /// Non-blocking diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

impl Compiled {
    pub fn name(&self) -> &str {
        self.ir.name()
    }

    pub fn content_hash(&self) -> &str {
        self.ir.content_hash()
    }
}

/// Compiles definitions to CUE.
///
/// # Example
///
/// ```rust
/// use defkit::{Compiler, Definition, Param};
///
/// let def = Definition::component("web").template(|b| {
///     let image = b.param(Param::string("image").required().description("Image"));
///     b.output().set("spec.image", &image);
/// });
/// let compiled = Compiler::new().compile(&def).unwrap();
/// assert!(compiled.cue.contains("image: string"));
/// assert!(compiled.diagnostics.is_empty());
/// ```
#[derive(Clone)]
pub struct Compiler {
    emitter: Arc<dyn Emitter>,
    config: EmitConfig,
    validator: Validator,
    warnings_as_errors: bool,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("emitter", &self.emitter.id())
            .field("config", &self.config)
            .field("validator", &self.validator)
            .field("warnings_as_errors", &self.warnings_as_errors)
            .finish()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Create a compiler with the CUE emitter and default settings.
    pub fn new() -> Self {
        Self {
            emitter: Arc::new(CueEmitter::new()),
            config: EmitConfig::default(),
            validator: Validator::new(),
            warnings_as_errors: false,
        }
    }

    /// Create a compiler from loaded configuration.
    pub fn from_config(config: &DefkitConfig) -> Self {
        Self::new()
            .with_emit_config(config.to_emit_config())
            .with_validator(Validator::new().with_allow(config.validate.allow.iter().cloned()))
            .with_warnings_as_errors(config.validate.warnings_as_errors)
    }

    /// Replace the output backend.
    pub fn with_emitter(mut self, emitter: impl Emitter + 'static) -> Self {
        self.emitter = Arc::new(emitter);
        self
    }

    pub fn with_emit_config(mut self, config: EmitConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Treat any warning as blocking.
    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.warnings_as_errors = enabled;
        self
    }

    /// Trace, capture, validate and emit one definition.
    #[tracing::instrument(skip(self, definition), fields(definition = %definition.name()))]
    pub fn compile(&self, definition: &Definition) -> CompileResult<Compiled> {
        let name = definition.name().to_string();

        let ir = build_ir(definition.trace()).map_err(|source| CompileError::Schema {
            definition: name.clone(),
            source,
        })?;
        tracing::debug!(hash = %ir.content_hash(), "captured");

        let diagnostics = self.validator.validate(&ir);
        let blocked = diagnostics
            .iter()
            .any(|d| d.is_error() || self.warnings_as_errors);
        if blocked {
            tracing::warn!(count = diagnostics.len(), "blocked by validation");
            return Err(CompileError::Validation {
                definition: name,
                diagnostics,
            });
        }

        let emitted = self
            .emitter
            .emit(&ir, &self.config)
            .map_err(|source| CompileError::Emission {
                definition: name,
                source,
            })?;

        let file_name = format!("{}.{}", emitted.name, self.emitter.file_extension());
        Ok(Compiled {
            cue: emitted.text,
            file_name,
            ir,
            diagnostics,
        })
    }

    /// Compile independent definitions in parallel.
    ///
    /// Results are keyed by definition name. A failing definition never
    /// aborts its siblings. When two definitions share a name, the one
    /// earlier in the slice wins.
    pub fn compile_batch(
        &self,
        definitions: &[Definition],
    ) -> BTreeMap<String, CompileResult<Compiled>> {
        let keyed: Vec<(String, &Definition)> = definitions
            .iter()
            .map(|d| (d.name().to_string(), d))
            .collect();
        self.compile_keyed(&keyed)
    }

    /// Compile under caller-chosen keys into a mutex-guarded sink.
    pub(crate) fn compile_keyed(
        &self,
        items: &[(String, &Definition)],
    ) -> BTreeMap<String, CompileResult<Compiled>> {
        let sink: Mutex<BTreeMap<String, (usize, CompileResult<Compiled>)>> =
            Mutex::new(BTreeMap::new());

        items.par_iter().enumerate().for_each(|(index, (key, definition))| {
            let result = self.compile(definition);
            let mut results = match sink.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            match results.get(key) {
                Some((existing, _)) if *existing < index => {
                    tracing::warn!(definition = %key, "duplicate name in batch, keeping the first");
                }
                _ => {
                    results.insert(key.clone(), (index, result));
                }
            }
        });

        let results = match sink.into_inner() {
            Ok(results) => results,
            Err(poisoned) => poisoned.into_inner(),
        };
        let failed = results.values().filter(|(_, r)| r.is_err()).count();
        tracing::debug!(total = results.len(), failed, "batch compiled");
        results
            .into_iter()
            .map(|(key, (_, result))| (key, result))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::EmittedDocument;
    use crate::error::EmissionError;
    use crate::param::Param;

    fn web() -> Definition {
        Definition::component("web").template(|b| {
            let image = b.param(Param::string("image").required().description("Image"));
            b.output().set("spec.image", &image);
        })
    }

    struct HashOnly;

    impl Emitter for HashOnly {
        fn id(&self) -> &'static str {
            "hash"
        }

        fn file_extension(&self) -> &'static str {
            "txt"
        }

        fn emit(&self, ir: &IrDocument, _config: &EmitConfig) -> Result<EmittedDocument, EmissionError> {
            Ok(EmittedDocument::new(ir.content_hash(), ir.content_hash(), ir.name()))
        }
    }

    #[test]
    fn test_compile_clean() {
        let compiled = Compiler::new().compile(&web()).unwrap();
        assert_eq!(compiled.name(), "web");
        assert_eq!(compiled.file_name, "web.cue");
        assert!(compiled.cue.contains("image: string"));
        assert!(compiled.cue.contains(compiled.content_hash()));
    }

    #[test]
    fn test_warnings_pass_unless_configured() {
        let def = Definition::component("web").template(|b| {
            let image = b.param(Param::string("image").required());
            b.output().set("spec.image", &image);
        });
        let compiled = Compiler::new().compile(&def).unwrap();
        assert_eq!(compiled.diagnostics.len(), 1);
        assert_eq!(compiled.diagnostics[0].code, "DEFKIT-W002");

        let err = Compiler::new()
            .with_warnings_as_errors(true)
            .compile(&def)
            .unwrap_err();
        assert_eq!(err.codes(), vec!["DEFKIT-W002"]);
    }

    #[test]
    fn test_custom_emitter() {
        let compiled = Compiler::new().with_emitter(HashOnly).compile(&web()).unwrap();
        assert_eq!(compiled.cue, compiled.content_hash());
        assert_eq!(compiled.file_name, "web.txt");
    }

    #[test]
    fn test_batch_keeps_first_duplicate() {
        let other = Definition::component("web").template(|b| {
            b.output().set("spec.replicas", 1).set("spec.replicas", 2);
        });
        let results = Compiler::new().compile_batch(&[web(), other]);
        assert_eq!(results.len(), 1);
        assert!(results["web"].is_ok());
    }
}
