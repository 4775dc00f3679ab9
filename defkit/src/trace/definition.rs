//! Definitions: metadata plus a template closure.

use std::fmt;
use std::sync::Arc;

use crate::ir::{DefinitionKind, DefinitionMetadata, WorkloadRef};

use super::builder::DefinitionBuilder;
use super::expr::Expr;

type Template = Arc<dyn Fn(&mut DefinitionBuilder) + Send + Sync>;

/// A compilable X-Definition.
///
/// The template closure is traced, never run against real resources, so it
/// must be a pure function of the builder it receives.
///
/// # Example
///
/// ```rust
/// use defkit::{Definition, Param};
///
/// let def = Definition::component("worker")
///     .description("Long-running worker")
///     .workload("apps/v1", "Deployment")
///     .template(|b| {
///         let image = b.param(Param::string("image").required());
///         b.output()
///             .api_version("apps/v1")
///             .kind("Deployment")
///             .set("spec.template.spec.containers[0].image", &image);
///     });
/// assert_eq!(def.name(), "worker");
/// ```
#[derive(Clone)]
pub struct Definition {
    metadata: DefinitionMetadata,
    template: Template,
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl Definition {
    pub fn new(name: impl Into<String>, kind: DefinitionKind) -> Self {
        Self {
            metadata: DefinitionMetadata::new(name, kind),
            template: Arc::new(|_: &mut DefinitionBuilder| {}),
        }
    }

    pub fn component(name: impl Into<String>) -> Self {
        Self::new(name, DefinitionKind::Component)
    }

    pub fn trait_(name: impl Into<String>) -> Self {
        Self::new(name, DefinitionKind::Trait)
    }

    pub fn policy(name: impl Into<String>) -> Self {
        Self::new(name, DefinitionKind::Policy)
    }

    pub fn workflow_step(name: impl Into<String>) -> Self {
        Self::new(name, DefinitionKind::WorkflowStep)
    }

    /// Set the template closure.
    pub fn template<F>(mut self, template: F) -> Self
    where
        F: Fn(&mut DefinitionBuilder) + Send + Sync + 'static,
    {
        self.template = Arc::new(template);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.metadata.version = Some(version.into());
        self
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.labels.insert(key.into(), value.into());
        self
    }

    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }

    /// Component types a trait may attach to.
    pub fn applies_to<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata
            .attributes
            .applies_to
            .extend(types.into_iter().map(Into::into));
        self
    }

    /// Traits this trait cannot be combined with.
    pub fn conflicts_with<I, S>(mut self, traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata
            .attributes
            .conflicts_with
            .extend(traits.into_iter().map(Into::into));
        self
    }

    pub fn pod_disruptive(mut self, disruptive: bool) -> Self {
        self.metadata.attributes.pod_disruptive = Some(disruptive);
        self
    }

    pub fn workload(mut self, api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        self.metadata.attributes.workload = Some(WorkloadRef {
            api_version: api_version.into(),
            kind: kind.into(),
        });
        self
    }

    /// Boolean expression over runtime context deciding health.
    pub fn health_policy(mut self, expr: impl Into<Expr>) -> Self {
        self.metadata.attributes.health_policy = Some(expr.into());
        self
    }

    /// String expression rendered as the status message.
    pub fn custom_status(mut self, expr: impl Into<Expr>) -> Self {
        self.metadata.attributes.custom_status = Some(expr.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn kind(&self) -> DefinitionKind {
        self.metadata.kind
    }

    pub fn metadata(&self) -> &DefinitionMetadata {
        &self.metadata
    }

    /// Run the template against a fresh builder.
    pub fn trace(&self) -> DefinitionBuilder {
        let mut builder = DefinitionBuilder::new(self.metadata.clone());
        (self.template)(&mut builder);
        tracing::debug!(
            definition = %self.metadata.name,
            params = builder.parameters().len(),
            ops = builder.operations().len(),
            "traced definition"
        );
        builder
    }
}
