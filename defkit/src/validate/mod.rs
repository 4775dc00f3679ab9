//! Structural validation of IR documents.
//!
//! The validator runs independently of emission and reports every finding
//! as a [`Diagnostic`]. Error-severity diagnostics block compilation;
//! warnings are passed back to the caller.
//!
//! | Code | Severity | Check |
//! |------|----------|-------|
//! | `DEFKIT-E001`..`E018` | error | parameter schema contradictions |
//! | `DEFKIT-E009` | error | conditional requirement cycle |
//! | `DEFKIT-E010` | error | conditional requirement on an unknown parameter |
//! | `DEFKIT-E019` | error | applies-to and conflicts-with overlap |
//! | `DEFKIT-E020` | error | definition conflicts with itself |
//! | `IR-E001` | error | unbalanced conditional scope |
//! | `IR-E002`, `IR-E004` | error | unknown parameter or parameter field |
//! | `IR-E008` | error | unrecognized context path |
//! | `DEFKIT-W001` | warning | unused parameter |
//! | `DEFKIT-W002` | warning | missing description |
//! | `DEFKIT-W003` | warning | name is not camelCase |
//! | `DEFKIT-W004` | warning | redundant conditional requirement |
//! | `IR-W001` | warning | raw passthrough present |

mod diagnostic;
mod rules;

use std::collections::HashSet;

use crate::ir::IrDocument;

pub use diagnostic::{Diagnostic, Severity};

/// Runs every check over a document.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    /// Warning codes to drop from the report
    allow: HashSet<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress warnings with these codes. Errors cannot be suppressed.
    pub fn with_allow<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Validate a document, errors first, each group in check order.
    #[tracing::instrument(skip(self, ir), fields(definition = %ir.name()))]
    pub fn validate(&self, ir: &IrDocument) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        rules::check_schema(ir, &mut out);
        rules::check_scopes(ir, &mut out);
        rules::check_references(ir, &mut out);
        rules::check_relations(ir, &mut out);
        rules::check_requirements(ir, &mut out);
        rules::check_usage(ir, &mut out);
        rules::check_style(ir, &mut out);
        rules::check_raw(ir, &mut out);

        out.retain(|d| d.is_error() || !self.allow.contains(d.code));
        out.sort_by_key(|d| d.severity);

        let errors = out.iter().filter(|d| d.is_error()).count();
        tracing::debug!(errors, warnings = out.len() - errors, "validated");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{build_ir, DefinitionKind, DefinitionMetadata, OpNode};
    use crate::param::{Param, ParamKind, ParamSpec};
    use crate::trace::{Definition, Expr, FieldPath, OwnerId, ParamRef};

    fn described(name: &str) -> ParamSpec {
        let mut spec = ParamSpec::new(name, ParamKind::String);
        spec.description = Some(format!("The {name}"));
        spec
    }

    #[test]
    fn test_clean_document() {
        let def = Definition::component("web").template(|b| {
            let image = b.param(Param::string("image").required().description("The image"));
            b.output().set("spec.image", &image);
        });
        let ir = build_ir(def.trace()).unwrap();
        assert_eq!(Validator::new().validate(&ir), Vec::new());
    }

    #[test]
    fn test_unknown_reference_and_unused() {
        let ir = IrDocument::new(
            DefinitionMetadata::new("web", DefinitionKind::Component),
            vec![described("image")],
            vec![OpNode::SetField {
                path: FieldPath::parse("output.spec.image").unwrap(),
                value: Expr::Param(ParamRef::new(OwnerId::DETACHED, "imgae")),
            }],
        );
        let diagnostics = Validator::new().validate(&ir);
        let codes: Vec<_> = diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(codes, vec!["IR-E002", "DEFKIT-W001"]);
        assert_eq!(diagnostics[0].path, "operations[0] output.spec.image");
    }

    #[test]
    fn test_allow_suppresses_warnings_only() {
        let ir = IrDocument::new(
            DefinitionMetadata::new("web", DefinitionKind::Component),
            vec![ParamSpec::new("image", ParamKind::String)],
            vec![OpNode::EndConditional],
        );
        let validator = Validator::new().with_allow(["DEFKIT-W001", "DEFKIT-W002", "IR-E001"]);
        let codes: Vec<_> = validator.validate(&ir).iter().map(|d| d.code).collect();
        assert_eq!(codes, vec!["IR-E001"]);
    }

    #[test]
    fn test_raw_warns() {
        let ir = IrDocument::new(
            DefinitionMetadata::new("web", DefinitionKind::Component),
            Vec::new(),
            vec![OpNode::Raw {
                cue: "output: spec: x: 1".to_string(),
            }],
        );
        let diagnostics = Validator::new().validate(&ir);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "IR-W001");
        assert!(!diagnostics[0].is_error());
    }
}
