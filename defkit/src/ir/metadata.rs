//! Definition metadata.
//!
//! Metadata is everything in the X-Definition header that is not derived
//! from the parameter schema or the operation log.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::trace::Expr;

/// The class of X-Definition being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefinitionKind {
    Component,
    Trait,
    Policy,
    WorkflowStep,
}

impl DefinitionKind {
    /// Value of the `type` field in the CUE header.
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionKind::Component => "component",
            DefinitionKind::Trait => "trait",
            DefinitionKind::Policy => "policy",
            DefinitionKind::WorkflowStep => "workflow-step",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header metadata of one definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionMetadata {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: DefinitionKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl DefinitionMetadata {
    pub fn new(name: impl Into<String>, kind: DefinitionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            version: None,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            attributes: Attributes::default(),
        }
    }

    /// Every expression carried by the attributes.
    pub fn expressions(&self) -> impl Iterator<Item = &Expr> {
        self.attributes
            .health_policy
            .iter()
            .chain(self.attributes.custom_status.iter())
    }

    pub(crate) fn expressions_mut(&mut self) -> impl Iterator<Item = &mut Expr> {
        self.attributes
            .health_policy
            .iter_mut()
            .chain(self.attributes.custom_status.iter_mut())
    }
}

/// Kind-specific attributes rendered in the header `attributes` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    /// Component types a trait may attach to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applies_to: Vec<String>,

    /// Traits this trait cannot be combined with
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_disruptive: Option<bool>,

    /// Workload resource a component renders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload: Option<WorkloadRef>,

    /// Boolean expression deciding `isHealth`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_policy: Option<Expr>,

    /// String expression rendered as the status `message`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_status: Option<Expr>,
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        self.applies_to.is_empty()
            && self.conflicts_with.is_empty()
            && self.pod_disruptive.is_none()
            && self.workload.is_none()
            && self.health_policy.is_none()
            && self.custom_status.is_none()
    }
}

/// `apiVersion`/`kind` of a component's workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadRef {
    pub api_version: String,
    pub kind: String,
}

impl WorkloadRef {
    /// `apps/v1` + `Deployment` gives `deployments.apps`.
    pub fn definition_ref(&self) -> String {
        let plural = format!("{}s", self.kind.to_lowercase());
        match self.api_version.split_once('/') {
            Some((group, _)) => format!("{plural}.{group}"),
            None => plural,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings() {
        assert_eq!(DefinitionKind::WorkflowStep.as_str(), "workflow-step");
        let json = serde_json::to_string(&DefinitionKind::WorkflowStep).unwrap();
        assert_eq!(json, "\"workflow-step\"");
    }

    #[test]
    fn test_workload_definition_ref() {
        let apps = WorkloadRef {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
        };
        assert_eq!(apps.definition_ref(), "deployments.apps");

        let core = WorkloadRef {
            api_version: "v1".to_string(),
            kind: "Pod".to_string(),
        };
        assert_eq!(core.definition_ref(), "pods");
    }

    #[test]
    fn test_empty_attributes_are_skipped() {
        let meta = DefinitionMetadata::new("webservice", DefinitionKind::Component);
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("attributes").is_none());
        assert_eq!(json["type"], "component");
    }
}
