//! Parameter kind definitions.
//!
//! A [`ParamKind`] describes the shape of a parameter value. Compound kinds
//! carry their nested schema: array items, map values, struct fields and
//! union variants.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::spec::ParamSpec;

/// Kind of a parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ParamKind {
    String,
    Int,
    Bool,
    Float,

    /// Homogeneous list: `[...T]`
    Array { items: Box<ParamKind> },

    /// String-keyed map: `[string]: T`
    Map { values: Box<ParamKind> },

    /// Nested object with declared fields
    Struct(StructSchema),

    /// One of a fixed set of literal values
    Enum { values: Vec<Value> },

    /// Discriminated union of struct-shaped variants
    OneOf(OneOfSchema),
}

impl ParamKind {
    /// Array of the given item kind.
    pub fn array(items: ParamKind) -> Self {
        ParamKind::Array {
            items: Box::new(items),
        }
    }

    /// Map with the given value kind.
    pub fn map(values: ParamKind) -> Self {
        ParamKind::Map {
            values: Box::new(values),
        }
    }

    /// Short name used in messages.
    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Int => "int",
            ParamKind::Bool => "bool",
            ParamKind::Float => "float",
            ParamKind::Array { .. } => "array",
            ParamKind::Map { .. } => "map",
            ParamKind::Struct(_) => "struct",
            ParamKind::Enum { .. } => "enum",
            ParamKind::OneOf(_) => "oneOf",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ParamKind::Int | ParamKind::Float)
    }

    pub fn has_length(&self) -> bool {
        matches!(
            self,
            ParamKind::String | ParamKind::Array { .. } | ParamKind::Map { .. }
        )
    }

    /// Check whether a concrete JSON value is an instance of this kind.
    ///
    /// Constraints are not considered here, only shape.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Int => value.is_i64() || value.is_u64(),
            ParamKind::Bool => value.is_boolean(),
            ParamKind::Float => value.is_number(),
            ParamKind::Array { items } => value
                .as_array()
                .is_some_and(|a| a.iter().all(|v| items.accepts(v))),
            ParamKind::Map { values } => value
                .as_object()
                .is_some_and(|m| m.values().all(|v| values.accepts(v))),
            ParamKind::Struct(s) => value.as_object().is_some_and(|m| {
                fields_accept(&s.fields, m, s.closed)
            }),
            ParamKind::Enum { values } => values.contains(value),
            ParamKind::OneOf(u) => u.match_variant(value).is_some(),
        }
    }

    /// Whether some value could be an instance of both kinds.
    ///
    /// Compound kinds answer conservatively: an empty list or object
    /// satisfies any array, map or struct kind.
    pub fn overlaps(&self, other: &ParamKind) -> bool {
        use ParamKind::*;
        match (self, other) {
            (String, String) | (Int, Int) | (Bool, Bool) | (Float, Float) => true,
            (Int, Float) | (Float, Int) => true,
            (Enum { values }, k) | (k, Enum { values }) => values.iter().any(|v| k.accepts(v)),
            (Array { .. }, Array { .. }) => true,
            (Map { .. } | Struct(_) | OneOf(_), Map { .. } | Struct(_) | OneOf(_)) => true,
            _ => false,
        }
    }
}

fn fields_accept(fields: &[ParamSpec], object: &serde_json::Map<String, Value>, closed: bool) -> bool {
    if closed && object.keys().any(|k| !fields.iter().any(|f| &f.name == k)) {
        return false;
    }
    fields.iter().all(|field| match object.get(&field.name) {
        Some(v) => field.kind.accepts(v),
        None => !field.required,
    })
}

/// Struct schema for nested object parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructSchema {
    /// Fields in declaration order
    pub fields: Vec<ParamSpec>,

    /// Closed structs reject undeclared fields (CUE: `close({...})`)
    #[serde(default)]
    pub closed: bool,
}

impl StructSchema {
    pub fn new(fields: Vec<ParamSpec>) -> Self {
        Self {
            fields,
            closed: false,
        }
    }

    pub fn field(&self, name: &str) -> Option<&ParamSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Discriminated union schema.
///
/// With a `discriminator`, every variant is tagged by a literal field
/// holding the variant name. Without one, variants are told apart by shape
/// and must not overlap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OneOfSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    pub variants: Vec<VariantSchema>,
}

impl OneOfSchema {
    pub fn variant(&self, name: &str) -> Option<&VariantSchema> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Resolve the single variant a concrete value belongs to.
    ///
    /// Returns `None` when no variant matches, or when several do (which an
    /// unambiguous union never allows).
    pub fn match_variant(&self, value: &Value) -> Option<&VariantSchema> {
        let object = value.as_object()?;

        if let Some(tag) = &self.discriminator {
            let name = object.get(tag)?.as_str()?;
            let variant = self.variant(name)?;
            let mut rest = object.clone();
            rest.remove(tag);
            return fields_accept(&variant.fields, &rest, true).then_some(variant);
        }

        let mut matches = self
            .variants
            .iter()
            .filter(|v| fields_accept(&v.fields, object, true));
        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    /// Find the first pair of variants that a single value could satisfy.
    pub fn find_ambiguity(&self) -> Option<(&str, &str)> {
        if self.discriminator.is_some() {
            return None;
        }
        for (i, a) in self.variants.iter().enumerate() {
            for b in &self.variants[i + 1..] {
                if a.overlaps(b) {
                    return Some((a.name.as_str(), b.name.as_str()));
                }
            }
        }
        None
    }
}

/// One variant of a union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSchema {
    pub name: String,

    pub fields: Vec<ParamSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl VariantSchema {
    pub fn new(name: impl Into<String>, fields: Vec<ParamSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
            description: None,
        }
    }

    fn required_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }

    /// Two closed variants overlap when every field either of them requires
    /// is declared by both with overlapping kinds.
    fn overlaps(&self, other: &VariantSchema) -> bool {
        self.required_names()
            .chain(other.required_names())
            .all(|name| match (self.field(name), other.field(name)) {
                (Some(a), Some(b)) => a.kind.overlaps(&b.kind),
                _ => false,
            })
    }

    pub fn field(&self, name: &str) -> Option<&ParamSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}
