//! Expression rendering.
//!
//! Compound operands are always parenthesized, so the emitted text never
//! depends on CUE's operator precedence.

use serde_json::Value;

use super::syntax::{escape, literal, selector};
use crate::error::EmissionError;
use crate::trace::{context, Expr, ParamRef};

/// Render an expression as CUE source.
pub fn render(expr: &Expr) -> Result<String, EmissionError> {
    Ok(match expr {
        Expr::Literal { value } => literal(value),
        Expr::Param(param) => param_path(param),
        Expr::Context { path } => context_path(path)?,
        Expr::IsSet { param } => format!("{} != _|_", param_path(param)),
        Expr::Compare { op, left, right } => {
            format!("{} {} {}", operand(left)?, op.symbol(), operand(right)?)
        }
        Expr::Logical { op, left, right } => {
            format!("{} {} {}", operand(left)?, op.symbol(), operand(right)?)
        }
        Expr::Not { operand: inner } => format!("!{}", operand(inner)?),
        Expr::Interpolate { parts } => {
            let mut out = String::from("\"");
            for part in parts {
                match part {
                    Expr::Literal {
                        value: Value::String(s),
                    } => out.push_str(&escape(s)),
                    Expr::Literal { value } if !value.is_object() && !value.is_array() => {
                        out.push_str(&escape(&value.to_string()))
                    }
                    other => {
                        out.push_str("\\(");
                        out.push_str(&render(other)?);
                        out.push(')');
                    }
                }
            }
            out.push('"');
            out
        }
    })
}

fn operand(expr: &Expr) -> Result<String, EmissionError> {
    let rendered = render(expr)?;
    Ok(if is_compound(expr) {
        format!("({rendered})")
    } else {
        rendered
    })
}

fn is_compound(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Compare { .. } | Expr::Logical { .. } | Expr::IsSet { .. } | Expr::Not { .. }
    )
}

/// `parameter.name.field`
pub fn param_path(param: &ParamRef) -> String {
    let mut out = format!("parameter{}", selector(&param.name));
    for field in &param.field {
        out.push_str(&selector(field));
    }
    out
}

/// `context.output.status.readyReplicas`, rejecting unknown roots.
pub fn context_path(path: &[String]) -> Result<String, EmissionError> {
    let mut out = String::from("context");
    for segment in path {
        out.push_str(&selector(segment));
    }
    if !context::is_recognized(path) {
        return Err(EmissionError::UnknownContextPath { path: out });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Context, DefinitionBuilder};
    use crate::ir::{DefinitionKind, DefinitionMetadata};
    use crate::param::Param;

    fn params() -> (ParamRef, ParamRef) {
        let mut b =
            DefinitionBuilder::new(DefinitionMetadata::new("t", DefinitionKind::Component));
        (b.param(Param::string("cpu")), b.param(Param::int("replicas")))
    }

    #[test]
    fn test_is_set() {
        let (cpu, _) = params();
        assert_eq!(render(&cpu.is_set()).unwrap(), "parameter.cpu != _|_");
    }

    #[test]
    fn test_context_chain() {
        let expr = Expr::from(Context::output().status().field("readyReplicas"));
        assert_eq!(
            render(&expr).unwrap(),
            "context.output.status.readyReplicas"
        );
        let expr = Expr::from(Context::outputs("my-svc").spec());
        assert_eq!(render(&expr).unwrap(), "context.outputs[\"my-svc\"].spec");
    }

    #[test]
    fn test_unknown_context_rejected() {
        let expr = Expr::from(Context::path("nmae"));
        assert_eq!(
            render(&expr).unwrap_err(),
            EmissionError::UnknownContextPath {
                path: "context.nmae".to_string()
            }
        );
    }

    #[test]
    fn test_compound_operands_are_parenthesized() {
        let (cpu, replicas) = params();
        let expr = cpu.is_set().and(replicas.gt(1).or(replicas.eq(0)));
        assert_eq!(
            render(&expr).unwrap(),
            "(parameter.cpu != _|_) && ((parameter.replicas > 1) || (parameter.replicas == 0))"
        );
        assert_eq!(
            render(&cpu.is_set().not()).unwrap(),
            "!(parameter.cpu != _|_)"
        );
    }

    #[test]
    fn test_interpolation() {
        let expr = Expr::interpolate([
            Expr::from("Ready:"),
            Expr::from(Context::output().status().field("readyReplicas")),
            Expr::from("/"),
            Expr::from(3),
        ]);
        assert_eq!(
            render(&expr).unwrap(),
            "\"Ready:\\(context.output.status.readyReplicas)/3\""
        );
    }
}
