//! Structural output tree.
//!
//! The scope tree from the IR is checked for conflicting writes, then
//! folded into nested blocks: writes sharing a path prefix merge into one
//! struct, list indices become list literals, and conditional scopes become
//! `if` comprehensions placed inside the resource they write to.

use serde_json::Value;

use crate::error::EmissionError;
use crate::ir::ScopeNode;
use crate::trace::{CompareOp, Expr, FieldPath, Segment};

use super::expr;
use super::syntax::{label, Lines, Line};

/// Marker lines around raw passthrough text.
pub const RAW_BEGIN: &str = "// defkit:raw-begin";
pub const RAW_END: &str = "// defkit:raw-end";

/// Body of a struct: fields, comprehensions and raw text in first-write order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Field { label: String, node: Node },
    Cond { condition: Expr, body: Block },
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Value(Expr),
    Struct(Block),
    List(Vec<Node>),
}

/// A write with the guards of every scope enclosing it.
struct Write<'a> {
    path: &'a FieldPath,
    guards: Vec<&'a Expr>,
}

/// Reject writes the `if {}` form cannot express.
///
/// Two writes conflict when one path equals or prefixes the other and their
/// guards are not statically mutually exclusive.
pub fn check_conflicts(nodes: &[ScopeNode]) -> Result<(), EmissionError> {
    let mut writes = Vec::new();
    collect_writes(nodes, &mut Vec::new(), &mut writes);

    for write in &writes {
        if !write.guards.is_empty() && write.path.has_index() {
            return Err(EmissionError::UnsupportedConditional {
                path: write.path.to_string(),
                reason: "conditional writes through a list index need list unification".to_string(),
            });
        }
    }

    for (i, a) in writes.iter().enumerate() {
        for b in &writes[i + 1..] {
            let same = a.path == b.path;
            let nested = a.path.starts_with(b.path) || b.path.starts_with(a.path);
            if !nested || exclusive(&a.guards, &b.guards) {
                continue;
            }
            let same_guards = a.guards == b.guards;
            let one_unguarded = a.guards.is_empty() != b.guards.is_empty();
            return Err(match (same, same_guards, one_unguarded) {
                (true, _, true) => EmissionError::UnsupportedConditional {
                    path: b.path.to_string(),
                    reason: "overrides an unconditional write; declare a default instead"
                        .to_string(),
                },
                (true, _, false) => EmissionError::AmbiguousOverwrite {
                    path: b.path.to_string(),
                },
                (false, true, _) => EmissionError::PathConflict {
                    path: b.path.to_string(),
                    other: a.path.to_string(),
                },
                (false, false, _) => EmissionError::UnsupportedConditional {
                    path: b.path.to_string(),
                    reason: format!("needs unification with the write to '{}'", a.path),
                },
            });
        }
    }
    Ok(())
}

fn collect_writes<'a>(nodes: &'a [ScopeNode], guards: &mut Vec<&'a Expr>, out: &mut Vec<Write<'a>>) {
    for node in nodes {
        match node {
            ScopeNode::Set { path, .. } => out.push(Write {
                path,
                guards: guards.clone(),
            }),
            ScopeNode::Conditional {
                condition,
                children,
            } => {
                guards.push(condition);
                collect_writes(children, guards, out);
                guards.pop();
            }
            ScopeNode::Raw { .. } => {}
        }
    }
}

/// Whether no assignment of values can make both guard sets true.
fn exclusive(a: &[&Expr], b: &[&Expr]) -> bool {
    a.iter().any(|x| b.iter().any(|y| contradicts(x, y)))
}

fn contradicts(a: &Expr, b: &Expr) -> bool {
    match (a, b) {
        (Expr::Not { operand }, other) | (other, Expr::Not { operand }) if **operand == *other => {
            true
        }
        (
            Expr::Compare {
                op: CompareOp::Eq,
                left: l1,
                right: r1,
            },
            Expr::Compare {
                op: CompareOp::Eq,
                left: l2,
                right: r2,
            },
        ) => match (equality_subject(l1, r1), equality_subject(l2, r2)) {
            (Some((s1, v1)), Some((s2, v2))) => s1 == s2 && !same_literal(v1, v2),
            _ => false,
        },
        _ => false,
    }
}

/// Literal equality where `1` and `1.0` are the same number.
fn same_literal(a: &Expr, b: &Expr) -> bool {
    match (a, b) {
        (
            Expr::Literal {
                value: Value::Number(x),
            },
            Expr::Literal {
                value: Value::Number(y),
            },
        ) => match (x.as_i64(), y.as_i64(), x.as_u64(), y.as_u64()) {
            (Some(x), Some(y), _, _) => x == y,
            (_, _, Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

/// Split `x == literal` (either order) into its subject and literal.
fn equality_subject<'a>(left: &'a Expr, right: &'a Expr) -> Option<(&'a Expr, &'a Expr)> {
    match (left, right) {
        (Expr::Literal { .. }, Expr::Literal { .. }) => None,
        (subject, literal @ Expr::Literal { .. }) | (literal @ Expr::Literal { .. }, subject) => {
            Some((subject, literal))
        }
        _ => None,
    }
}

impl Block {
    /// Fold a checked scope tree into the template root block.
    pub fn from_scopes(nodes: &[ScopeNode]) -> Result<Block, EmissionError> {
        let mut root = Block::default();
        for node in nodes {
            match node {
                ScopeNode::Set { path, value } => root.insert(path.segments(), value.clone(), path)?,
                ScopeNode::Raw { cue } => root.entries.push(Entry::Raw(cue.clone())),
                ScopeNode::Conditional {
                    condition,
                    children,
                } => {
                    let placement = placement(children);
                    let mut body = Block::default();
                    body.fill(children, placement.as_ref())?;
                    let entry = Entry::Cond {
                        condition: condition.clone(),
                        body,
                    };
                    match &placement {
                        Some(prefix) => root.block_at(prefix.segments(), prefix)?.entries.push(entry),
                        None => root.entries.push(entry),
                    }
                }
            }
        }
        Ok(root)
    }

    /// Fill a conditional body, stripping the placement prefix from paths.
    fn fill(&mut self, nodes: &[ScopeNode], strip: Option<&FieldPath>) -> Result<(), EmissionError> {
        for node in nodes {
            match node {
                ScopeNode::Set { path, value } => {
                    let relative = match strip {
                        Some(prefix) => path.strip_prefix(prefix),
                        None => Some(path.clone()),
                    };
                    let relative = relative.ok_or_else(|| EmissionError::PathConflict {
                        path: path.to_string(),
                        other: strip.map(ToString::to_string).unwrap_or_default(),
                    })?;
                    self.insert(relative.segments(), value.clone(), path)?;
                }
                ScopeNode::Raw { cue } => self.entries.push(Entry::Raw(cue.clone())),
                ScopeNode::Conditional {
                    condition,
                    children,
                } => {
                    let mut body = Block::default();
                    body.fill(children, strip)?;
                    self.entries.push(Entry::Cond {
                        condition: condition.clone(),
                        body,
                    });
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, segments: &[Segment], value: Expr, full: &FieldPath) -> Result<(), EmissionError> {
        let Some((Segment::Field(name), rest)) = segments.split_first() else {
            return Err(conflict(full));
        };
        for entry in &mut self.entries {
            if let Entry::Field { label, node } = entry {
                if label == name {
                    return merge(node, rest, value, full);
                }
            }
        }
        let node = build(rest, value, full)?;
        self.entries.push(Entry::Field {
            label: name.clone(),
            node,
        });
        Ok(())
    }

    /// The struct block at `segments`, created on demand.
    fn block_at(&mut self, segments: &[Segment], full: &FieldPath) -> Result<&mut Block, EmissionError> {
        let Some((first, rest)) = segments.split_first() else {
            return Ok(self);
        };
        let Segment::Field(name) = first else {
            return Err(conflict(full));
        };
        let index = match self
            .entries
            .iter()
            .position(|e| matches!(e, Entry::Field { label, .. } if label == name))
        {
            Some(index) => index,
            None => {
                self.entries.push(Entry::Field {
                    label: name.clone(),
                    node: Node::Struct(Block::default()),
                });
                self.entries.len() - 1
            }
        };
        match &mut self.entries[index] {
            Entry::Field {
                node: Node::Struct(block),
                ..
            } => block.block_at(rest, full),
            _ => Err(conflict(full)),
        }
    }

    /// Render the block body.
    pub fn render(&self) -> Result<Lines, EmissionError> {
        let mut lines = Lines::default();
        for entry in &self.entries {
            match entry {
                Entry::Field { label, node } => lines.extend(render_field(label, node)?),
                Entry::Cond { condition, body } => {
                    let open = format!("if {} {{", expr::render(condition)?);
                    lines.extend(Lines::block(&open, body.render()?, "}"));
                }
                Entry::Raw(cue) => {
                    if cue.contains(RAW_BEGIN) || cue.contains(RAW_END) {
                        return Err(EmissionError::InvalidLiteral {
                            detail: "raw CUE must not contain the raw block markers".to_string(),
                        });
                    }
                    lines.push(RAW_BEGIN);
                    lines.0.extend(cue.lines().map(Line::verbatim));
                    lines.push(RAW_END);
                }
            }
        }
        Ok(lines)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resource prefix a conditional's writes share, if any.
///
/// Roots are `outputs.<name>` or a single top-level field. Scopes holding
/// raw text stay at the template root.
fn placement(nodes: &[ScopeNode]) -> Option<FieldPath> {
    let mut prefix: Option<FieldPath> = None;
    if !collect_roots(nodes, &mut prefix) {
        return None;
    }
    prefix
}

fn collect_roots(nodes: &[ScopeNode], prefix: &mut Option<FieldPath>) -> bool {
    for node in nodes {
        match node {
            ScopeNode::Raw { .. } => return false,
            ScopeNode::Conditional { children, .. } => {
                if !collect_roots(children, prefix) {
                    return false;
                }
            }
            ScopeNode::Set { path, .. } => {
                let Some(root) = resource_root(path) else {
                    return false;
                };
                match prefix {
                    Some(existing) if *existing != root => return false,
                    Some(_) => {}
                    None => *prefix = Some(root),
                }
            }
        }
    }
    true
}

fn resource_root(path: &FieldPath) -> Option<FieldPath> {
    let segments = path.segments();
    let depth = match segments {
        [Segment::Field(first), Segment::Field(_), ..] if first == "outputs" => 2,
        [Segment::Field(_), ..] => 1,
        _ => return None,
    };
    // The relative path must still start with a field name.
    match segments.get(depth) {
        Some(Segment::Field(_)) => FieldPath::from_segments(segments[..depth].to_vec()),
        _ => None,
    }
}

/// A fresh node for `rest`. New lists must start at index 0.
fn build(rest: &[Segment], value: Expr, full: &FieldPath) -> Result<Node, EmissionError> {
    Ok(match rest.split_first() {
        None => Node::Value(value),
        Some((Segment::Field(name), tail)) => Node::Struct(Block {
            entries: vec![Entry::Field {
                label: name.clone(),
                node: build(tail, value, full)?,
            }],
        }),
        Some((Segment::Index(index), tail)) => {
            if *index != 0 {
                return Err(sparse(full, *index, 0));
            }
            Node::List(vec![build(tail, value, full)?])
        }
    })
}

fn merge(node: &mut Node, rest: &[Segment], value: Expr, full: &FieldPath) -> Result<(), EmissionError> {
    match (node, rest.split_first()) {
        (Node::Value(_), None) => Err(EmissionError::AmbiguousOverwrite {
            path: full.to_string(),
        }),
        (Node::Struct(block), Some((Segment::Field(_), _))) => block.insert(rest, value, full),
        (Node::List(items), Some((Segment::Index(index), tail))) => {
            let len = items.len();
            if *index < len {
                merge(&mut items[*index], tail, value, full)
            } else if *index == len {
                items.push(build(tail, value, full)?);
                Ok(())
            } else {
                Err(sparse(full, *index, len))
            }
        }
        _ => Err(conflict(full)),
    }
}

/// Lists are written densely so the emitted literal stays concrete.
fn sparse(path: &FieldPath, index: usize, len: usize) -> EmissionError {
    EmissionError::SparseListIndex {
        path: path.to_string(),
        index,
        len,
    }
}

fn conflict(path: &FieldPath) -> EmissionError {
    EmissionError::PathConflict {
        path: path.to_string(),
        other: "an existing value of a different shape".to_string(),
    }
}

/// `label: value`, collapsing single-field struct chains to `a: b: c: v`.
fn render_field(name: &str, node: &Node) -> Result<Lines, EmissionError> {
    let prefix = format!("{}: ", label(name));
    if let Node::Struct(block) = node {
        if let [Entry::Field { label, node }] = block.entries.as_slice() {
            return Ok(render_field(label, node)?.prefix(&prefix));
        }
    }
    Ok(render_value(node)?.prefix(&prefix))
}

fn render_value(node: &Node) -> Result<Lines, EmissionError> {
    match node {
        Node::Value(value) => Ok(Lines::one(expr::render(value)?)),
        Node::Struct(block) if block.is_empty() => Ok(Lines::one("{}")),
        Node::Struct(block) => Ok(Lines::block("{", block.render()?, "}")),
        Node::List(items) => {
            let items = items
                .iter()
                .map(render_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Lines::join(items, ", ").prefix("[").suffix("]"))
        }
    }
}
