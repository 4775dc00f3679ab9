//! Recorded expressions.
//!
//! Expressions are never evaluated. Composing them builds a small AST that
//! the emitter later renders as CUE.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::ContextRef;

/// Identity of the builder that declared a parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Owner of references captured into an IR document.
    pub const DETACHED: OwnerId = OwnerId(0);

    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        OwnerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a declared parameter, optionally selecting a nested field.
///
/// Returned by [`DefinitionBuilder::param`](super::DefinitionBuilder::param).
/// The owner identity is not serialized; references inside an IR document
/// are detached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamRef {
    #[serde(skip)]
    pub(crate) owner: OwnerId,

    pub name: String,

    /// Field selector into a struct parameter
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field: Vec<String>,
}

impl ParamRef {
    pub(crate) fn new(owner: OwnerId, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
            field: Vec::new(),
        }
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Select a nested field of a struct parameter.
    pub fn field(&self, name: impl Into<String>) -> ParamRef {
        let mut selected = self.clone();
        selected.field.push(name.into());
        selected
    }

    /// Presence check: true when the user supplied a value.
    pub fn is_set(&self) -> Expr {
        Expr::IsSet {
            param: self.clone(),
        }
    }

    pub fn eq(&self, other: impl Into<Expr>) -> Expr {
        Expr::from(self).eq(other)
    }

    pub fn ne(&self, other: impl Into<Expr>) -> Expr {
        Expr::from(self).ne(other)
    }

    pub fn lt(&self, other: impl Into<Expr>) -> Expr {
        Expr::from(self).lt(other)
    }

    pub fn lte(&self, other: impl Into<Expr>) -> Expr {
        Expr::from(self).lte(other)
    }

    pub fn gt(&self, other: impl Into<Expr>) -> Expr {
        Expr::from(self).gt(other)
    }

    pub fn gte(&self, other: impl Into<Expr>) -> Expr {
        Expr::from(self).gte(other)
    }

    pub(crate) fn detach(&mut self) {
        self.owner = OwnerId::DETACHED;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

/// Expression AST node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "camelCase")]
pub enum Expr {
    /// Concrete JSON value
    Literal { value: Value },

    /// Value of a declared parameter
    Param(ParamRef),

    /// Runtime context variable, e.g. `context.output.status.readyReplicas`
    Context { path: Vec<String> },

    /// Presence check of an optional parameter
    IsSet { param: ParamRef },

    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Not { operand: Box<Expr> },

    /// String interpolation; literal string parts are inlined
    Interpolate { parts: Vec<Expr> },
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal {
            value: value.into(),
        }
    }

    /// Build a string from literal text and expressions.
    pub fn interpolate<I, E>(parts: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Expr::Interpolate {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    fn compare(self, op: CompareOp, other: impl Into<Expr>) -> Self {
        Expr::Compare {
            op,
            left: Box::new(self),
            right: Box::new(other.into()),
        }
    }

    pub fn eq(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Eq, other)
    }

    pub fn ne(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Ne, other)
    }

    pub fn lt(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Lt, other)
    }

    pub fn lte(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Lte, other)
    }

    pub fn gt(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Gt, other)
    }

    pub fn gte(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Gte, other)
    }

    pub fn and(self, other: impl Into<Expr>) -> Self {
        Expr::Logical {
            op: LogicalOp::And,
            left: Box::new(self),
            right: Box::new(other.into()),
        }
    }

    pub fn or(self, other: impl Into<Expr>) -> Self {
        Expr::Logical {
            op: LogicalOp::Or,
            left: Box::new(self),
            right: Box::new(other.into()),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Not {
            operand: Box::new(self),
        }
    }

    /// Visit every parameter reference in this expression.
    pub fn visit_params(&self, f: &mut impl FnMut(&ParamRef)) {
        match self {
            Expr::Param(p) | Expr::IsSet { param: p } => f(p),
            Expr::Compare { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.visit_params(f);
                right.visit_params(f);
            }
            Expr::Not { operand } => operand.visit_params(f),
            Expr::Interpolate { parts } => parts.iter().for_each(|p| p.visit_params(f)),
            Expr::Literal { .. } | Expr::Context { .. } => {}
        }
    }

    pub(crate) fn visit_params_mut(&mut self, f: &mut impl FnMut(&mut ParamRef)) {
        match self {
            Expr::Param(p) | Expr::IsSet { param: p } => f(p),
            Expr::Compare { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.visit_params_mut(f);
                right.visit_params_mut(f);
            }
            Expr::Not { operand } => operand.visit_params_mut(f),
            Expr::Interpolate { parts } => parts.iter_mut().for_each(|p| p.visit_params_mut(f)),
            Expr::Literal { .. } | Expr::Context { .. } => {}
        }
    }

    /// Visit every runtime context path read by this expression.
    pub fn visit_context(&self, f: &mut impl FnMut(&[String])) {
        match self {
            Expr::Context { path } => f(path),
            Expr::Compare { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.visit_context(f);
                right.visit_context(f);
            }
            Expr::Not { operand } => operand.visit_context(f),
            Expr::Interpolate { parts } => parts.iter().for_each(|p| p.visit_context(f)),
            Expr::Literal { .. } | Expr::Param(_) | Expr::IsSet { .. } => {}
        }
    }

    /// Names of the top-level parameters this expression reads.
    pub fn param_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.visit_params(&mut |p| {
            if !names.contains(&p.name) {
                names.push(p.name.clone());
            }
        });
        names
    }
}

impl From<ParamRef> for Expr {
    fn from(param: ParamRef) -> Self {
        Expr::Param(param)
    }
}

impl From<&ParamRef> for Expr {
    fn from(param: &ParamRef) -> Self {
        Expr::Param(param.clone())
    }
}

impl From<ContextRef> for Expr {
    fn from(context: ContextRef) -> Self {
        Expr::Context {
            path: context.into_path(),
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Literal { value }
    }
}

macro_rules! literal_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Expr {
                fn from(value: $t) -> Self {
                    Expr::Literal { value: Value::from(value) }
                }
            }
        )*
    };
}

literal_from!(&str, String, bool, i32, i64, u32, u64, f64);
