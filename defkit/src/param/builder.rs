//! Fluent parameter declarations.
//!
//! [`Param`] is a by-value builder. Modifiers never panic: a contradictory
//! combination is recorded and reported as a [`SchemaError`] when the
//! parameter is declared on a definition.

use serde_json::Value;

use super::kind::{OneOfSchema, ParamKind, StructSchema, VariantSchema};
use super::spec::{ParamSpec, RequiredWhen};
use crate::error::SchemaError;

/// Builder for a single parameter declaration.
///
/// # Example
///
/// ```rust
/// use defkit::Param;
///
/// let replicas = Param::int("replicas")
///     .default(3)
///     .min(1)
///     .max(100)
///     .description("Number of pod replicas");
/// let (spec, errors) = replicas.into_parts();
/// assert_eq!(spec.name, "replicas");
/// assert!(errors.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Param {
    spec: ParamSpec,
    errors: Vec<SchemaError>,
}

impl Param {
    fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            spec: ParamSpec::new(name, kind),
            errors: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Int)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Bool)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Float)
    }

    /// List of scalar or compound items.
    pub fn array(name: impl Into<String>, items: ParamKind) -> Self {
        Self::new(name, ParamKind::array(items))
    }

    /// List of objects with the given fields.
    pub fn list_of(name: impl Into<String>, fields: Vec<Param>) -> Self {
        let mut param = Self::structure(name, fields);
        let item = std::mem::replace(&mut param.spec.kind, ParamKind::Bool);
        param.spec.kind = ParamKind::array(item);
        param
    }

    /// String-keyed map of values.
    pub fn map(name: impl Into<String>, values: ParamKind) -> Self {
        Self::new(name, ParamKind::map(values))
    }

    /// Nested object with declared fields.
    pub fn structure(name: impl Into<String>, fields: Vec<Param>) -> Self {
        let name = name.into();
        let mut errors = Vec::new();
        let fields = absorb(&name, fields, &mut errors);
        Self {
            spec: ParamSpec::new(name, ParamKind::Struct(StructSchema::new(fields))),
            errors,
        }
    }

    /// One of a fixed set of literal values.
    pub fn enumeration<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        Self::new(name, ParamKind::Enum { values })
    }

    /// Union of struct-shaped variants.
    pub fn one_of(name: impl Into<String>, variants: Vec<Variant>) -> Self {
        let name = name.into();
        let mut errors = Vec::new();
        let variants = variants
            .into_iter()
            .map(|v| {
                let scope = format!("{name}.{}", v.schema.name);
                errors.extend(v.errors.into_iter().map(|e| nest(&scope, e)));
                v.schema
            })
            .collect();
        Self {
            spec: ParamSpec::new(
                name,
                ParamKind::OneOf(OneOfSchema {
                    discriminator: None,
                    variants,
                }),
            ),
            errors,
        }
    }

    /// Tag union variants with a literal field holding the variant name.
    ///
    /// Has no effect on non-union parameters.
    pub fn discriminator(mut self, field: impl Into<String>) -> Self {
        if let ParamKind::OneOf(u) = &mut self.spec.kind {
            u.discriminator = Some(field.into());
        }
        self
    }

    /// Mark the parameter as required.
    ///
    /// Rejected when a default is already set; the parameter keeps its
    /// previous state.
    pub fn required(mut self) -> Self {
        if self.spec.default.is_some() {
            self.reject_required_with_default();
        } else {
            self.spec.required = true;
        }
        self
    }

    /// Mark the parameter as optional (the initial state).
    pub fn optional(mut self) -> Self {
        self.spec.required = false;
        self
    }

    /// Set a default value. Defaulted parameters are implicitly optional.
    ///
    /// Rejected when the parameter is already required.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        if self.spec.required {
            self.reject_required_with_default();
        } else {
            self.spec.default = Some(value.into());
        }
        self
    }

    /// Inclusive lower bound for numbers.
    pub fn min(mut self, min: impl Into<f64>) -> Self {
        self.spec.constraints.min = Some(min.into());
        self
    }

    /// Inclusive upper bound for numbers.
    pub fn max(mut self, max: impl Into<f64>) -> Self {
        self.spec.constraints.max = Some(max.into());
        self
    }

    /// Minimum rune count for strings, item count for arrays and maps.
    pub fn min_length(mut self, len: usize) -> Self {
        self.spec.constraints.min_length = Some(len);
        self
    }

    /// Maximum rune count for strings, item count for arrays and maps.
    pub fn max_length(mut self, len: usize) -> Self {
        self.spec.constraints.max_length = Some(len);
        self
    }

    /// Regular expression a string value must match.
    pub fn pattern(mut self, re: impl Into<String>) -> Self {
        self.spec.constraints.pattern = Some(re.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.spec.description = Some(description.into());
        self
    }

    /// Reject undeclared fields. Applies to struct and list-of-struct parameters.
    pub fn closed(mut self) -> Self {
        match &mut self.spec.kind {
            ParamKind::Struct(s) => s.closed = true,
            ParamKind::Array { items } => {
                if let ParamKind::Struct(s) = items.as_mut() {
                    s.closed = true;
                }
            }
            _ => {}
        }
        self
    }

    /// Require this parameter when top-level parameter `field` equals `value`.
    pub fn required_when(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.spec.required_when.push(RequiredWhen {
            field: field.into(),
            equals: value.into(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// The declared schema and every modifier conflict recorded while building it.
    pub fn into_parts(self) -> (ParamSpec, Vec<SchemaError>) {
        (self.spec, self.errors)
    }

    fn reject_required_with_default(&mut self) {
        self.errors.push(SchemaError::RequiredWithDefault {
            param: self.spec.name.clone(),
        });
    }
}

/// One variant of a [`Param::one_of`] union.
#[derive(Debug, Clone)]
pub struct Variant {
    schema: VariantSchema,
    errors: Vec<SchemaError>,
}

impl Variant {
    pub fn new(name: impl Into<String>, fields: Vec<Param>) -> Self {
        let name = name.into();
        let mut errors = Vec::new();
        let fields = absorb(&name, fields, &mut errors);
        Self {
            schema: VariantSchema::new(name, fields),
            errors,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.schema.description = Some(description.into());
        self
    }
}

fn absorb(scope: &str, fields: Vec<Param>, errors: &mut Vec<SchemaError>) -> Vec<ParamSpec> {
    fields
        .into_iter()
        .map(|field| {
            let (spec, field_errors) = field.into_parts();
            errors.extend(field_errors.into_iter().map(|e| nest(scope, e)));
            spec
        })
        .collect()
}

/// Prefix a nested field's error with its enclosing parameter name.
fn nest(scope: &str, err: SchemaError) -> SchemaError {
    match err {
        SchemaError::RequiredWithDefault { param } => SchemaError::RequiredWithDefault {
            param: format!("{scope}.{param}"),
        },
        other => other,
    }
}
