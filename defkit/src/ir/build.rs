//! Capture a traced builder into an IR document.

use crate::error::SchemaError;
use crate::param::ParamSpec;
use crate::trace::{DefinitionBuilder, OwnerId, ParamRef};

use super::document::IrDocument;
use super::ops::scope_tree;

/// Capture the builder's declarations and operation log.
///
/// Fails with the first problem found, checked in this order: errors the
/// builder recorded while tracing, parameter schema contradictions, scope
/// balance, then parameter references in operations and attributes.
#[tracing::instrument(skip(builder), fields(definition = %builder.metadata().name))]
pub fn build_ir(builder: DefinitionBuilder) -> Result<IrDocument, SchemaError> {
    let (owner, mut metadata, params, mut ops, errors) = builder.into_parts();

    if let Some(err) = errors.into_iter().next() {
        return Err(err);
    }

    if let Some(err) = params.iter().flat_map(ParamSpec::problems).next() {
        return Err(err);
    }

    scope_tree(&ops)?;

    for op in &mut ops {
        for expr in op.expressions_mut() {
            let mut result = Ok(());
            expr.visit_params_mut(&mut |param| {
                if result.is_ok() {
                    result = check_ref(owner, &params, param, true);
                }
                param.detach();
            });
            result?;
        }
    }

    for expr in metadata.expressions_mut() {
        let mut result = Ok(());
        expr.visit_params_mut(&mut |param| {
            if result.is_ok() {
                result = check_ref(owner, &params, param, false);
            }
            param.detach();
        });
        result?;
    }

    tracing::debug!(
        params = params.len(),
        ops = ops.len(),
        "captured IR"
    );
    Ok(IrDocument::new(metadata, params, ops))
}

fn check_ref(
    owner: OwnerId,
    params: &[ParamSpec],
    param: &ParamRef,
    check_owner: bool,
) -> Result<(), SchemaError> {
    if check_owner && param.owner() != owner && param.owner() != OwnerId::DETACHED {
        return Err(SchemaError::ForeignParameter {
            param: param.name.clone(),
        });
    }
    let spec = params
        .iter()
        .find(|p| p.name == param.name)
        .ok_or_else(|| SchemaError::UnknownParameter {
            param: param.name.clone(),
        })?;
    if spec.resolve_field(&param.field).is_none() {
        return Err(SchemaError::UnknownParamField {
            param: param.name.clone(),
            field: param.field.join("."),
        });
    }
    Ok(())
}
