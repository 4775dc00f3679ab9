//! Parameter schema nodes and their consistency checks.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::kind::{OneOfSchema, ParamKind, StructSchema};
use crate::error::SchemaError;

/// A named, typed parameter declaration as captured in the IR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,

    pub kind: ParamKind,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,

    /// Rules making this parameter required depending on a sibling's value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_when: Vec<RequiredWhen>,
}

/// How a parameter is present in the emitted schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// `name?: T`
    Optional,
    /// `name: T`
    Required,
    /// `name: *v | T`
    Defaulted,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
            description: None,
            constraints: Constraints::default(),
            required_when: Vec::new(),
        }
    }

    pub fn presence(&self) -> Presence {
        if self.default.is_some() {
            Presence::Defaulted
        } else if self.required {
            Presence::Required
        } else {
            Presence::Optional
        }
    }

    /// Nested struct schema. Only direct structs have one; arrays of structs do not.
    pub fn struct_schema(&self) -> Option<&StructSchema> {
        match &self.kind {
            ParamKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Resolve a field selector (`resources.cpu`) against the nested schema.
    pub fn resolve_field(&self, path: &[String]) -> Option<&ParamSpec> {
        let mut current = self;
        for segment in path {
            current = current.struct_schema()?.field(segment)?;
        }
        Some(current)
    }

    /// Every consistency problem in this parameter and its nested schema.
    pub fn problems(&self) -> Vec<SchemaError> {
        let mut out = Vec::new();
        check_param(&self.name, self, &mut out);
        out
    }
}

/// Value constraints. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Runes for strings, items for arrays and maps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
            && self.max.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
    }
}

/// `this` is required when top-level parameter `field` equals `equals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredWhen {
    pub field: String,
    pub equals: Value,
}

/// Check that a name is usable as a CUE field identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_param(path: &str, spec: &ParamSpec, out: &mut Vec<SchemaError>) {
    if !is_identifier(&spec.name) {
        out.push(SchemaError::InvalidName {
            name: spec.name.clone(),
        });
    }

    if spec.required && spec.default.is_some() {
        out.push(SchemaError::RequiredWithDefault {
            param: path.to_string(),
        });
    }

    check_constraints(path, spec, out);
    check_kind(path, &spec.kind, out);

    if let Some(default) = &spec.default {
        check_default(path, spec, default, out);
    }
}

fn check_constraints(path: &str, spec: &ParamSpec, out: &mut Vec<SchemaError>) {
    let c = &spec.constraints;
    let mismatch = |constraint: &str| SchemaError::ConstraintMismatch {
        param: path.to_string(),
        constraint: constraint.to_string(),
        kind: spec.kind.name().to_string(),
    };

    if (c.min.is_some() || c.max.is_some()) && !spec.kind.is_numeric() {
        out.push(mismatch("min/max"));
    }
    if (c.min_length.is_some() || c.max_length.is_some()) && !spec.kind.has_length() {
        out.push(mismatch("minLength/maxLength"));
    }
    if c.pattern.is_some() && spec.kind != ParamKind::String {
        out.push(mismatch("pattern"));
    }

    if let (Some(min), Some(max)) = (c.min, c.max) {
        if min > max {
            out.push(SchemaError::InvertedBounds {
                param: path.to_string(),
                constraint: "min".to_string(),
            });
        }
    }
    if let (Some(min), Some(max)) = (c.min_length, c.max_length) {
        if min > max {
            out.push(SchemaError::InvertedBounds {
                param: path.to_string(),
                constraint: "minLength".to_string(),
            });
        }
    }
    if let Some(pattern) = &c.pattern {
        if let Err(e) = Regex::new(pattern) {
            out.push(SchemaError::InvalidPattern {
                param: path.to_string(),
                pattern: pattern.clone(),
                message: e.to_string(),
            });
        }
    }
}

fn check_kind(path: &str, kind: &ParamKind, out: &mut Vec<SchemaError>) {
    match kind {
        ParamKind::Array { items } => check_kind(path, items, out),
        ParamKind::Map { values } => check_kind(path, values, out),
        ParamKind::Struct(s) => check_fields(path, &s.fields, out),
        ParamKind::Enum { values } => {
            if values.is_empty() {
                out.push(SchemaError::EmptyEnum {
                    param: path.to_string(),
                });
            }
        }
        ParamKind::OneOf(u) => check_union(path, u, out),
        ParamKind::String | ParamKind::Int | ParamKind::Bool | ParamKind::Float => {}
    }
}

fn check_fields(path: &str, fields: &[ParamSpec], out: &mut Vec<SchemaError>) {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            out.push(SchemaError::DuplicateField {
                param: path.to_string(),
                field: field.name.clone(),
            });
        }
        check_param(&format!("{path}.{}", field.name), field, out);
    }
}

fn check_union(path: &str, u: &OneOfSchema, out: &mut Vec<SchemaError>) {
    if u.variants.is_empty() {
        out.push(SchemaError::EmptyUnion {
            param: path.to_string(),
        });
        return;
    }

    let mut seen = HashSet::new();
    for variant in &u.variants {
        if !seen.insert(variant.name.as_str()) {
            out.push(SchemaError::DuplicateVariant {
                param: path.to_string(),
                variant: variant.name.clone(),
            });
        }
        if let Some(tag) = &u.discriminator {
            if variant.field(tag).is_some() {
                out.push(SchemaError::DiscriminatorClash {
                    param: path.to_string(),
                    variant: variant.name.clone(),
                    field: tag.clone(),
                });
            }
        }
        check_fields(&format!("{path}.{}", variant.name), &variant.fields, out);
    }

    if let Some((first, second)) = u.find_ambiguity() {
        out.push(SchemaError::AmbiguousUnion {
            param: path.to_string(),
            first: first.to_string(),
            second: second.to_string(),
        });
    }
}

fn check_default(path: &str, spec: &ParamSpec, default: &Value, out: &mut Vec<SchemaError>) {
    if !spec.kind.accepts(default) {
        out.push(match &spec.kind {
            ParamKind::Enum { .. } => SchemaError::DefaultNotInEnum {
                param: path.to_string(),
                value: default.to_string(),
            },
            kind => SchemaError::DefaultTypeMismatch {
                param: path.to_string(),
                expected: kind.name().to_string(),
            },
        });
        return;
    }

    let c = &spec.constraints;
    let out_of_range = |bound: String| SchemaError::DefaultOutOfRange {
        param: path.to_string(),
        value: default.to_string(),
        bound,
    };

    if let Some(n) = default.as_f64() {
        if let Some(min) = c.min.filter(|min| n < *min) {
            out.push(out_of_range(format!(">={min}")));
        }
        if let Some(max) = c.max.filter(|max| n > *max) {
            out.push(out_of_range(format!("<={max}")));
        }
    }

    let length = match default {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(a) => Some(a.len()),
        Value::Object(m) => Some(m.len()),
        _ => None,
    };
    if let Some(len) = length {
        if let Some(min) = c.min_length.filter(|min| len < *min) {
            out.push(out_of_range(format!("minLength {min}")));
        }
        if let Some(max) = c.max_length.filter(|max| len > *max) {
            out.push(out_of_range(format!("maxLength {max}")));
        }
    }

    if let (Some(pattern), Some(s)) = (&c.pattern, default.as_str()) {
        if let Ok(re) = Regex::new(pattern) {
            if !re.is_match(s) {
                out.push(SchemaError::DefaultPatternMismatch {
                    param: path.to_string(),
                    value: default.to_string(),
                    pattern: pattern.clone(),
                });
            }
        }
    }
}
