//! Individual validation checks.
//!
//! Each check appends to a shared diagnostic list and never stops early, so
//! one run reports every problem in the document.

use std::collections::{BTreeMap, HashSet};

use convert_case::{Case, Casing};

use crate::ir::{scope_tree, IrDocument, OpNode};
use crate::param::{ParamKind, ParamSpec, Presence};
use crate::trace::{context, Expr};

use super::diagnostic::Diagnostic;

// =============================================================================
// Errors
// =============================================================================

/// Parameter contradictions, re-checked for documents not built by a builder.
pub(super) fn check_schema(ir: &IrDocument, out: &mut Vec<Diagnostic>) {
    let mut seen = HashSet::new();
    for param in ir.parameters() {
        if !seen.insert(param.name.as_str()) {
            out.push(Diagnostic::error(
                "DEFKIT-E016",
                format!("parameter.{}", param.name),
                format!("parameter '{}' is declared more than once", param.name),
            ));
        }
        out.extend(param.problems().iter().map(Diagnostic::from));
    }
}

pub(super) fn check_scopes(ir: &IrDocument, out: &mut Vec<Diagnostic>) {
    if let Err(err) = scope_tree(ir.operations()) {
        out.push(Diagnostic::error(err.code(), "template", err.to_string()));
    }
}

/// Parameter and context references in operations and attributes.
pub(super) fn check_references(ir: &IrDocument, out: &mut Vec<Diagnostic>) {
    for (i, op) in ir.operations().iter().enumerate() {
        let path = match op.path() {
            Some(path) => format!("operations[{i}] {path}"),
            None => format!("operations[{i}]"),
        };
        for expr in op.expressions() {
            check_expr(ir, expr, &path, out);
        }
    }
    for expr in ir.metadata().expressions() {
        check_expr(ir, expr, "attributes.status", out);
    }
}

fn check_expr(ir: &IrDocument, expr: &Expr, path: &str, out: &mut Vec<Diagnostic>) {
    expr.visit_params(&mut |param| match ir.parameter(&param.name) {
        None => out.push(Diagnostic::error(
            "IR-E002",
            path,
            format!("parameter '{}' is not declared", param.name),
        )),
        Some(spec) if spec.resolve_field(&param.field).is_none() => out.push(Diagnostic::error(
            "IR-E004",
            path,
            format!(
                "parameter '{}' has no field '{}'",
                param.name,
                param.field.join(".")
            ),
        )),
        Some(_) => {}
    });
    expr.visit_context(&mut |segments| {
        if !context::is_recognized(segments) {
            out.push(Diagnostic::error(
                "IR-E008",
                path,
                format!("unrecognized context path 'context.{}'", segments.join(".")),
            ));
        }
    });
}

/// Applies-to and conflicts-with must not contradict each other.
pub(super) fn check_relations(ir: &IrDocument, out: &mut Vec<Diagnostic>) {
    let metadata = ir.metadata();
    let attributes = &metadata.attributes;
    for name in &attributes.conflicts_with {
        if attributes.applies_to.contains(name) {
            out.push(Diagnostic::error(
                "DEFKIT-E019",
                "attributes.conflictsWith",
                format!("'{name}' is both in appliesToWorkloads and conflictsWith"),
            ));
        }
        if *name == metadata.name {
            out.push(Diagnostic::error(
                "DEFKIT-E020",
                "attributes.conflictsWith",
                format!("'{name}' conflicts with itself"),
            ));
        }
    }
}

/// Conditional requirements: unknown trigger fields and dependency cycles.
pub(super) fn check_requirements(ir: &IrDocument, out: &mut Vec<Diagnostic>) {
    let mut dependencies: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for param in ir.parameters() {
        collect_requirements(ir, &param.name, param, &mut dependencies, out);
    }

    for cycle in RequirementGraph::new(&dependencies).find_cycles() {
        let head = cycle.first().cloned().unwrap_or_default();
        out.push(Diagnostic::error(
            "DEFKIT-E009",
            format!("parameter.{head}"),
            format!("conditional requirement cycle: {}", cycle.join(" -> ")),
        ));
    }
}

fn collect_requirements(
    ir: &IrDocument,
    path: &str,
    spec: &ParamSpec,
    dependencies: &mut BTreeMap<String, Vec<String>>,
    out: &mut Vec<Diagnostic>,
) {
    for rule in &spec.required_when {
        if ir.parameter(&rule.field).is_none() {
            out.push(Diagnostic::error(
                "DEFKIT-E010",
                format!("parameter.{path}"),
                format!("required-when refers to unknown parameter '{}'", rule.field),
            ));
            continue;
        }
        if spec.presence() != Presence::Optional {
            out.push(Diagnostic::warning(
                "DEFKIT-W004",
                format!("parameter.{path}"),
                "required-when has no effect on a required or defaulted parameter",
            ));
        }
        dependencies
            .entry(path.to_string())
            .or_default()
            .push(rule.field.clone());
    }
    for field in nested_fields(&spec.kind) {
        collect_requirements(ir, &format!("{path}.{}", field.name), field, dependencies, out);
    }
}

/// Directed "is required depending on" graph between parameters.
struct RequirementGraph<'a> {
    dependencies: &'a BTreeMap<String, Vec<String>>,
}

impl<'a> RequirementGraph<'a> {
    fn new(dependencies: &'a BTreeMap<String, Vec<String>>) -> Self {
        Self { dependencies }
    }

    /// Every cycle, each listed with its first node repeated at the end.
    fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();
        let mut cycles = Vec::new();

        for name in self.dependencies.keys() {
            if !visited.contains(name) {
                self.dfs_cycles(name, &mut visited, &mut rec_stack, &mut path, &mut cycles);
            }
        }
        cycles
    }

    fn dfs_cycles(
        &self,
        node: &String,
        visited: &mut HashSet<String>,
        rec_stack: &mut HashSet<String>,
        path: &mut Vec<String>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        visited.insert(node.clone());
        rec_stack.insert(node.clone());
        path.push(node.clone());

        if let Some(deps) = self.dependencies.get(node) {
            for dep in deps {
                if !visited.contains(dep) {
                    self.dfs_cycles(dep, visited, rec_stack, path, cycles);
                } else if rec_stack.contains(dep) {
                    if let Some(start) = path.iter().position(|n| n == dep) {
                        let mut cycle = path[start..].to_vec();
                        cycle.push(dep.clone());
                        cycles.push(cycle);
                    }
                }
            }
        }

        path.pop();
        rec_stack.remove(node);
    }
}

// =============================================================================
// Warnings
// =============================================================================

/// Parameters nothing reads.
pub(super) fn check_usage(ir: &IrDocument, out: &mut Vec<Diagnostic>) {
    let mut used: HashSet<String> = HashSet::new();
    let op_exprs = ir.operations().iter().flat_map(OpNode::expressions);
    for expr in op_exprs.chain(ir.metadata().expressions()) {
        used.extend(expr.param_names());
    }
    for param in ir.parameters() {
        used.extend(param.required_when.iter().map(|r| r.field.clone()));
    }

    for param in ir.parameters() {
        if !used.contains(&param.name) {
            out.push(Diagnostic::warning(
                "DEFKIT-W001",
                format!("parameter.{}", param.name),
                format!("parameter '{}' is never used", param.name),
            ));
        }
    }
}

/// Missing descriptions and names that are not camelCase.
pub(super) fn check_style(ir: &IrDocument, out: &mut Vec<Diagnostic>) {
    for param in ir.parameters() {
        check_param_style(&param.name, param, out);
    }
}

fn check_param_style(path: &str, spec: &ParamSpec, out: &mut Vec<Diagnostic>) {
    if spec.description.as_deref().map_or(true, |d| d.trim().is_empty()) {
        out.push(Diagnostic::warning(
            "DEFKIT-W002",
            format!("parameter.{path}"),
            "parameter has no description",
        ));
    }
    let camel = spec.name.to_case(Case::Camel);
    if camel != spec.name {
        out.push(Diagnostic::warning(
            "DEFKIT-W003",
            format!("parameter.{path}"),
            format!("'{}' is not camelCase, consider '{camel}'", spec.name),
        ));
    }
    for field in nested_fields(&spec.kind) {
        check_param_style(&format!("{path}.{}", field.name), field, out);
    }
}

/// Raw passthrough is emitted unchecked.
pub(super) fn check_raw(ir: &IrDocument, out: &mut Vec<Diagnostic>) {
    for (i, op) in ir.operations().iter().enumerate() {
        if matches!(op, OpNode::Raw { .. }) {
            out.push(Diagnostic::warning(
                "IR-W001",
                format!("operations[{i}]"),
                "raw CUE is passed through without validation",
            ));
        }
    }
}

/// Struct fields reachable through arrays and maps, plus union variant fields.
fn nested_fields(kind: &ParamKind) -> Vec<&ParamSpec> {
    match kind {
        ParamKind::Struct(s) => s.fields.iter().collect(),
        ParamKind::Array { items } => nested_fields(items),
        ParamKind::Map { values } => nested_fields(values),
        ParamKind::OneOf(u) => u.variants.iter().flat_map(|v| v.fields.iter()).collect(),
        ParamKind::String
        | ParamKind::Int
        | ParamKind::Bool
        | ParamKind::Float
        | ParamKind::Enum { .. } => Vec::new(),
    }
}
