//! CUE code emitter.
//!
//! This module implements the emitter that turns a validated IR document
//! into an X-Definition CUE file.
//!
//! # Layout
//!
//! - Optional generated-code banner carrying the content hash
//! - `import` block for builtin packages used by constraints
//! - Definition header: type, annotations, labels, description, attributes
//! - `template` block: output resources, then the `parameter` schema

use crate::emit::traits::{EmitConfig, EmittedDocument, Emitter};
use crate::error::EmissionError;
use crate::ir::{scope_tree, Attributes, DefinitionMetadata, IrDocument};

use super::expr;
use super::syntax::{label, quote, Lines};
use super::tree::{check_conflicts, Block};
use super::type_mapper::CueTypeMapper;

/// First line of the generated-code banner.
pub const BANNER: &str = "// Code generated by defkit. DO NOT EDIT.";

/// CUE X-Definition emitter.
///
/// Implements the [`Emitter`] trait. The emitter holds no state between
/// calls; each emission builds its own type mapper.
///
/// # Example
///
/// ```rust
/// use defkit::emit::cue::CueEmitter;
/// use defkit::emit::{EmitConfig, Emitter};
/// use defkit::{build_ir, Definition, Param};
///
/// let def = Definition::component("web").template(|b| {
///     let image = b.param(Param::string("image").required());
///     b.output().set("spec.image", &image);
/// });
/// let ir = build_ir(def.trace()).unwrap();
/// let doc = CueEmitter::new().emit(&ir, &EmitConfig::default()).unwrap();
/// assert!(doc.text.contains("image: string"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CueEmitter;

impl CueEmitter {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    // Header
    // =========================================================================

    fn header(&self, metadata: &DefinitionMetadata) -> Result<Lines, EmissionError> {
        let mut body = Lines::default();
        body.push(format!("type: {}", quote(metadata.kind.as_str())));
        body.extend(string_map("annotations", &metadata.annotations));
        body.extend(string_map("labels", &metadata.labels));
        if let Some(description) = &metadata.description {
            body.push(format!("description: {}", quote(description)));
        }
        if !metadata.attributes.is_empty() {
            body.extend(Lines::block(
                "attributes: {",
                self.attributes(&metadata.attributes)?,
                "}",
            ));
        }

        let mut lines = Lines::default();
        if let Some(version) = &metadata.version {
            lines.push(format!("// version: {}", version.replace(['\n', '\r'], " ")));
        }
        lines.extend(Lines::block(&format!("{}: {{", label(&metadata.name)), body, "}"));
        Ok(lines)
    }

    fn attributes(&self, attributes: &Attributes) -> Result<Lines, EmissionError> {
        let mut lines = Lines::default();
        if let Some(workload) = &attributes.workload {
            let definition: Lines = [
                format!("apiVersion: {}", quote(&workload.api_version)),
                format!("kind: {}", quote(&workload.kind)),
            ]
            .into_iter()
            .collect();
            let mut body = Lines::block("definition: {", definition, "}");
            body.push(format!("type: {}", quote(&workload.definition_ref())));
            lines.extend(Lines::block("workload: {", body, "}"));
        }
        if !attributes.applies_to.is_empty() {
            lines.push(format!("appliesToWorkloads: {}", string_list(&attributes.applies_to)));
        }
        if !attributes.conflicts_with.is_empty() {
            lines.push(format!("conflictsWith: {}", string_list(&attributes.conflicts_with)));
        }
        if let Some(disruptive) = attributes.pod_disruptive {
            lines.push(format!("podDisruptive: {disruptive}"));
        }

        let mut status = Lines::default();
        if let Some(policy) = &attributes.health_policy {
            status.extend(multiline("healthPolicy", &format!("isHealth: {}", expr::render(policy)?)));
        }
        if let Some(custom) = &attributes.custom_status {
            status.extend(multiline("customStatus", &format!("message: {}", expr::render(custom)?)));
        }
        if !status.0.is_empty() {
            lines.extend(Lines::block("status: {", status, "}"));
        }
        Ok(lines)
    }

    // =========================================================================
    // Template
    // =========================================================================

    fn template(&self, ir: &IrDocument, mapper: &mut CueTypeMapper) -> Result<Lines, EmissionError> {
        let scopes = scope_tree(ir.operations()).map_err(|e| EmissionError::UnbalancedScope {
            detail: e.to_string(),
        })?;
        check_conflicts(&scopes)?;
        let root = Block::from_scopes(&scopes)?;
        tracing::trace!(definition = %ir.name(), scopes = scopes.len(), "built output tree");

        let mut body = root.render()?;
        body.extend(mapper.parameter_block(ir.parameters()));
        Ok(Lines::block("template: {", body, "}"))
    }
}

impl Emitter for CueEmitter {
    fn id(&self) -> &'static str {
        "cue"
    }

    fn file_extension(&self) -> &'static str {
        "cue"
    }

    #[tracing::instrument(skip(self, ir, config), fields(definition = %ir.name()))]
    fn emit(&self, ir: &IrDocument, config: &EmitConfig) -> Result<EmittedDocument, EmissionError> {
        let mut mapper = CueTypeMapper::new(config.usage_comments);
        let template = self.template(ir, &mut mapper)?;
        let header = self.header(ir.metadata())?;
        let imports = mapper.imports();

        let mut lines = Lines::default();
        if config.banner {
            lines.push(BANNER);
            lines.push(format!("// content-hash: {}", ir.content_hash()));
            lines.push("");
        }
        match imports.as_slice() {
            [] => {}
            [single] => {
                lines.push(format!("import {}", quote(single)));
                lines.push("");
            }
            many => {
                let body: Lines = many.iter().map(|p| quote(p)).collect();
                lines.extend(Lines::block("import (", body, ")"));
                lines.push("");
            }
        }
        lines.extend(header);
        lines.extend(template);

        let text = lines.render(config);
        tracing::debug!(bytes = text.len(), imports = imports.len(), "emitted CUE");
        Ok(EmittedDocument::new(text, ir.content_hash(), ir.name())
            .with_imports(imports.iter().map(|p| p.to_string()).collect()))
    }
}

/// `name: {}` or a block of quoted string pairs.
fn string_map(name: &str, map: &std::collections::BTreeMap<String, String>) -> Lines {
    if map.is_empty() {
        return Lines::one(format!("{name}: {{}}"));
    }
    let body: Lines = map
        .iter()
        .map(|(k, v)| format!("{}: {}", quote(k), quote(v)))
        .collect();
    Lines::block(&format!("{name}: {{"), body, "}")
}

fn string_list(items: &[String]) -> String {
    let items: Vec<String> = items.iter().map(|i| quote(i)).collect();
    format!("[{}]", items.join(", "))
}

/// A `#"""` raw multi-line string holding one line of CUE.
fn multiline(name: &str, content: &str) -> Lines {
    let mut lines = Lines::one(format!("{name}: #\"\"\""));
    lines.extend_indented([content, "\"\"\"#"].into_iter().collect());
    lines
}
