//! Definition building context.
//!
//! A [`DefinitionBuilder`] is handed to a definition's template closure.
//! Every fluent call appends to its operation log; nothing is evaluated.

use crate::error::SchemaError;
use crate::ir::{DefinitionMetadata, OpNode};
use crate::param::{Param, ParamSpec};

use super::expr::{Expr, OwnerId, ParamRef};
use super::path::{FieldPath, Segment};

/// Recording context for one definition.
///
/// # Example
///
/// ```rust
/// use defkit::{DefinitionBuilder, DefinitionKind, DefinitionMetadata, Param};
///
/// let mut b = DefinitionBuilder::new(DefinitionMetadata::new("worker", DefinitionKind::Component));
/// let image = b.param(Param::string("image").required());
/// b.output()
///     .api_version("apps/v1")
///     .kind("Deployment")
///     .set("spec.template.spec.containers[0].image", &image);
/// assert_eq!(b.operations().len(), 3);
/// ```
#[derive(Debug)]
pub struct DefinitionBuilder {
    owner: OwnerId,
    metadata: DefinitionMetadata,
    params: Vec<ParamSpec>,
    ops: Vec<OpNode>,
    errors: Vec<SchemaError>,
}

impl DefinitionBuilder {
    pub fn new(metadata: DefinitionMetadata) -> Self {
        Self {
            owner: OwnerId::next(),
            metadata,
            params: Vec::new(),
            ops: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Declare a parameter and get a handle for use in operations.
    pub fn param(&mut self, param: Param) -> ParamRef {
        let (spec, errors) = param.into_parts();
        self.errors.extend(errors);

        let handle = ParamRef::new(self.owner, spec.name.clone());
        if self.params.iter().any(|p| p.name == spec.name) {
            self.errors.push(SchemaError::DuplicateParameter { name: spec.name });
        } else {
            tracing::trace!(param = %spec.name, kind = spec.kind.name(), "declared parameter");
            self.params.push(spec);
        }
        handle
    }

    /// The primary workload (`output`).
    pub fn output(&mut self) -> Resource<'_> {
        self.resource(vec![Segment::Field("output".to_string())])
    }

    /// An auxiliary resource (`outputs.<name>`).
    pub fn outputs(&mut self, name: impl Into<String>) -> Resource<'_> {
        self.resource(vec![
            Segment::Field("outputs".to_string()),
            Segment::Field(name.into()),
        ])
    }

    /// The trait patch applied to the workload (`patch`).
    pub fn patch(&mut self) -> Resource<'_> {
        self.resource(vec![Segment::Field("patch".to_string())])
    }

    /// Any other top-level template field, e.g. `"patchOutputs"`.
    pub fn at(&mut self, root: &str) -> Resource<'_> {
        let root = match FieldPath::writable(root) {
            Ok(path) => Some(path),
            Err(e) => {
                self.errors.push(e);
                None
            }
        };
        Resource {
            builder: self,
            root,
        }
    }

    fn resource(&mut self, segments: Vec<Segment>) -> Resource<'_> {
        let root = FieldPath::from_segments(segments);
        Resource {
            builder: self,
            root,
        }
    }

    /// Open a conditional scope spanning any resources.
    pub fn begin_if(&mut self, condition: impl Into<Expr>) -> &mut Self {
        self.push(OpNode::BeginConditional {
            condition: condition.into(),
        });
        self
    }

    pub fn end_if(&mut self) -> &mut Self {
        self.push(OpNode::EndConditional);
        self
    }

    /// Record literal CUE to be emitted verbatim at the template root.
    pub fn raw(&mut self, cue: impl Into<String>) -> &mut Self {
        self.push(OpNode::Raw { cue: cue.into() });
        self
    }

    pub fn metadata(&self) -> &DefinitionMetadata {
        &self.metadata
    }

    pub fn parameters(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn operations(&self) -> &[OpNode] {
        &self.ops
    }

    /// Problems recorded while tracing, in recording order.
    pub fn errors(&self) -> &[SchemaError] {
        &self.errors
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub(crate) fn into_parts(self) -> (OwnerId, DefinitionMetadata, Vec<ParamSpec>, Vec<OpNode>, Vec<SchemaError>) {
        (self.owner, self.metadata, self.params, self.ops, self.errors)
    }

    fn push(&mut self, op: OpNode) {
        tracing::trace!(op = ?op, "recorded operation");
        self.ops.push(op);
    }
}

/// A resource rooted at a top-level template field.
///
/// Paths passed to [`Resource::set`] are relative to the root.
pub struct Resource<'a> {
    builder: &'a mut DefinitionBuilder,
    root: Option<FieldPath>,
}

impl Resource<'_> {
    /// Record `path = value`.
    pub fn set(&mut self, path: &str, value: impl Into<Expr>) -> &mut Self {
        let value = value.into();
        if let Some(path) = self.resolve(path) {
            self.builder.push(OpNode::SetField { path, value });
        }
        self
    }

    /// Record `path = value` guarded by `condition`.
    pub fn set_if(
        &mut self,
        condition: impl Into<Expr>,
        path: &str,
        value: impl Into<Expr>,
    ) -> &mut Self {
        let (condition, value) = (condition.into(), value.into());
        if let Some(path) = self.resolve(path) {
            self.builder.push(OpNode::SetFieldIf {
                path,
                value,
                condition,
            });
        }
        self
    }

    pub fn begin_if(&mut self, condition: impl Into<Expr>) -> &mut Self {
        self.builder.begin_if(condition);
        self
    }

    pub fn end_if(&mut self) -> &mut Self {
        self.builder.end_if();
        self
    }

    pub fn api_version(&mut self, api_version: &str) -> &mut Self {
        self.set("apiVersion", api_version)
    }

    pub fn kind(&mut self, kind: &str) -> &mut Self {
        self.set("kind", kind)
    }

    fn resolve(&mut self, path: &str) -> Option<FieldPath> {
        let root = self.root.as_ref()?;
        match FieldPath::parse(path) {
            Ok(relative) => Some(root.join(&relative)),
            Err(e) => {
                self.builder.errors.push(e);
                None
            }
        }
    }
}
