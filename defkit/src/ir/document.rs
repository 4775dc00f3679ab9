//! The serializable IR document and its content hash.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::metadata::DefinitionMetadata;
use super::ops::OpNode;
use crate::error::SchemaError;
use crate::param::ParamSpec;

/// Snapshot of one definition: metadata, parameter schema and operation log.
///
/// The content hash is a pure function of the other fields. Fields are only
/// reachable through accessors and mutators that rehash, and a deserialized
/// document is rejected when its declared hash does not match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawIrDocument", rename_all = "camelCase")]
pub struct IrDocument {
    metadata: DefinitionMetadata,
    parameters: Vec<ParamSpec>,
    operations: Vec<OpNode>,
    content_hash: String,
}

/// Wire form checked before becoming an [`IrDocument`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIrDocument {
    metadata: DefinitionMetadata,
    #[serde(default)]
    parameters: Vec<ParamSpec>,
    #[serde(default)]
    operations: Vec<OpNode>,
    content_hash: String,
}

/// The hashed body: everything but the hash itself.
#[derive(Serialize)]
struct HashedBody<'a> {
    metadata: &'a DefinitionMetadata,
    parameters: &'a [ParamSpec],
    operations: &'a [OpNode],
}

impl TryFrom<RawIrDocument> for IrDocument {
    type Error = SchemaError;

    fn try_from(raw: RawIrDocument) -> Result<Self, Self::Error> {
        let doc = IrDocument::new(raw.metadata, raw.parameters, raw.operations);
        if doc.content_hash != raw.content_hash {
            return Err(SchemaError::HashMismatch {
                declared: raw.content_hash,
                actual: doc.content_hash,
            });
        }
        Ok(doc)
    }
}

impl IrDocument {
    pub fn new(
        metadata: DefinitionMetadata,
        parameters: Vec<ParamSpec>,
        operations: Vec<OpNode>,
    ) -> Self {
        let mut doc = Self {
            metadata,
            parameters,
            operations,
            content_hash: String::new(),
        };
        doc.rehash();
        doc
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn metadata(&self) -> &DefinitionMetadata {
        &self.metadata
    }

    pub fn parameters(&self) -> &[ParamSpec] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn operations(&self) -> &[OpNode] {
        &self.operations
    }

    /// `sha256:<hex>` over the canonical JSON of every other field.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.metadata.description = description;
        self.rehash();
    }

    pub fn set_version(&mut self, version: Option<String>) {
        self.metadata.version = version;
        self.rehash();
    }

    pub fn insert_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.labels.insert(key.into(), value.into());
        self.rehash();
    }

    pub fn insert_annotation(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.annotations.insert(key.into(), value.into());
        self.rehash();
    }

    pub fn push_parameter(&mut self, parameter: ParamSpec) {
        self.parameters.push(parameter);
        self.rehash();
    }

    pub fn push_operation(&mut self, operation: OpNode) {
        self.operations.push(operation);
        self.rehash();
    }

    /// Break the document back into its parts.
    pub fn into_parts(self) -> (DefinitionMetadata, Vec<ParamSpec>, Vec<OpNode>) {
        (self.metadata, self.parameters, self.operations)
    }

    fn rehash(&mut self) {
        self.content_hash = content_hash(&HashedBody {
            metadata: &self.metadata,
            parameters: &self.parameters,
            operations: &self.operations,
        });
    }
}

fn content_hash(body: &HashedBody<'_>) -> String {
    // Plain data with string map keys; serialization cannot fail.
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    format!("sha256:{}", hex::encode(Sha256::digest(&bytes)))
}
