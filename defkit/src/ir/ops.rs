//! Operation log nodes and the conditional scope tree.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::trace::{Expr, FieldPath};

/// One recorded effect against the output tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum OpNode {
    SetField {
        path: FieldPath,
        value: Expr,
    },

    /// Single-statement conditional scope
    SetFieldIf {
        path: FieldPath,
        value: Expr,
        condition: Expr,
    },

    BeginConditional {
        condition: Expr,
    },

    EndConditional,

    /// Literal CUE carried through unmodified
    Raw {
        cue: String,
    },
}

impl OpNode {
    /// Every expression held by this node.
    pub fn expressions(&self) -> Vec<&Expr> {
        match self {
            OpNode::SetField { value, .. } => vec![value],
            OpNode::SetFieldIf {
                value, condition, ..
            } => vec![value, condition],
            OpNode::BeginConditional { condition } => vec![condition],
            OpNode::EndConditional | OpNode::Raw { .. } => Vec::new(),
        }
    }

    pub(crate) fn expressions_mut(&mut self) -> Vec<&mut Expr> {
        match self {
            OpNode::SetField { value, .. } => vec![value],
            OpNode::SetFieldIf {
                value, condition, ..
            } => vec![value, condition],
            OpNode::BeginConditional { condition } => vec![condition],
            OpNode::EndConditional | OpNode::Raw { .. } => Vec::new(),
        }
    }

    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            OpNode::SetField { path, .. } | OpNode::SetFieldIf { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// A node of the scope tree rebuilt from the flat log.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeNode {
    Set { path: FieldPath, value: Expr },
    Conditional { condition: Expr, children: Vec<ScopeNode> },
    Raw { cue: String },
}

/// Rebuild the nested scope tree, enforcing stack discipline.
pub fn scope_tree(ops: &[OpNode]) -> Result<Vec<ScopeNode>, SchemaError> {
    // Each frame holds the condition that opened it and its children so far.
    let mut stack: Vec<(Option<Expr>, Vec<ScopeNode>)> = vec![(None, Vec::new())];

    for (index, op) in ops.iter().enumerate() {
        let node = match op {
            OpNode::SetField { path, value } => ScopeNode::Set {
                path: path.clone(),
                value: value.clone(),
            },
            OpNode::SetFieldIf {
                path,
                value,
                condition,
            } => ScopeNode::Conditional {
                condition: condition.clone(),
                children: vec![ScopeNode::Set {
                    path: path.clone(),
                    value: value.clone(),
                }],
            },
            OpNode::Raw { cue } => ScopeNode::Raw { cue: cue.clone() },
            OpNode::BeginConditional { condition } => {
                stack.push((Some(condition.clone()), Vec::new()));
                continue;
            }
            OpNode::EndConditional => {
                if stack.len() == 1 {
                    return Err(SchemaError::UnbalancedScope {
                        detail: format!(
                            "EndConditional at operation {index} has no matching BeginConditional"
                        ),
                    });
                }
                match stack.pop() {
                    Some((Some(condition), children)) => {
                        ScopeNode::Conditional { condition, children }
                    }
                    _ => {
                        return Err(SchemaError::UnbalancedScope {
                            detail: format!("corrupt scope stack at operation {index}"),
                        })
                    }
                }
            }
        };
        if let Some((_, children)) = stack.last_mut() {
            children.push(node);
        }
    }

    if stack.len() > 1 {
        return Err(SchemaError::UnbalancedScope {
            detail: format!("{} conditional scope(s) left open", stack.len() - 1),
        });
    }
    Ok(stack.pop().map(|(_, children)| children).unwrap_or_default())
}
