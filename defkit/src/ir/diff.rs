//! Structural comparison of IR documents.

use serde::Serialize;

use super::document::IrDocument;
use super::ops::OpNode;

/// What changed between two IR documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    pub added_params: Vec<String>,
    pub removed_params: Vec<String>,
    pub modified_params: Vec<String>,
    pub metadata_changed: bool,
    pub added_ops: Vec<OpNode>,
    pub removed_ops: Vec<OpNode>,
}

impl ChangeSet {
    /// True when downstream artifacts need no regeneration.
    pub fn is_empty(&self) -> bool {
        self.added_params.is_empty()
            && self.removed_params.is_empty()
            && self.modified_params.is_empty()
            && !self.metadata_changed
            && self.added_ops.is_empty()
            && self.removed_ops.is_empty()
    }
}

/// Compare two documents.
///
/// Equal content hashes short-circuit to an empty change set; the field
/// level diff only runs when the hashes differ.
pub fn diff_ir(old: &IrDocument, new: &IrDocument) -> ChangeSet {
    if old.content_hash() == new.content_hash() {
        return ChangeSet::default();
    }

    let mut changes = ChangeSet {
        metadata_changed: old.metadata() != new.metadata(),
        ..ChangeSet::default()
    };

    for param in old.parameters() {
        match new.parameter(&param.name) {
            None => changes.removed_params.push(param.name.clone()),
            Some(updated) if updated != param => changes.modified_params.push(param.name.clone()),
            Some(_) => {}
        }
    }
    for param in new.parameters() {
        if old.parameter(&param.name).is_none() {
            changes.added_params.push(param.name.clone());
        }
    }

    let (removed, added) = lcs_diff(old.operations(), new.operations());
    changes.removed_ops = removed;
    changes.added_ops = added;

    tracing::debug!(
        definition = %new.name(),
        added = changes.added_params.len(),
        removed = changes.removed_params.len(),
        modified = changes.modified_params.len(),
        "computed IR diff"
    );
    changes
}

/// Operations only in `old` and only in `new`, by longest common subsequence.
fn lcs_diff(old: &[OpNode], new: &[OpNode]) -> (Vec<OpNode>, Vec<OpNode>) {
    let (n, m) = (old.len(), new.len());
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if old[i] == new[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let (mut removed, mut added) = (Vec::new(), Vec::new());
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            removed.push(old[i].clone());
            i += 1;
        } else {
            added.push(new[j].clone());
            j += 1;
        }
    }
    removed.extend(old[i..].iter().cloned());
    added.extend(new[j..].iter().cloned());
    (removed, added)
}
