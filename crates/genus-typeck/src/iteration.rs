//! The enhanced `for` statement: `for (T x : expr)`.

use genus_core::Span;
use genus_types::{
    format_type, instantiate_as_supertype, is_assignable, TyContext, Type, TypeEnv,
};

use crate::{CheckError, Operand};

fn not_iterable(env: &dyn TypeEnv, source: &Operand) -> CheckError {
    CheckError::NotIterable {
        ty: format_type(env, &source.ty),
        span: source.span,
    }
}

/// Element type of iterating over `source`, checked against the loop variable's declared type.
///
/// Arrays yield their element type. Other sources must be `Iterable`: the source is capture
/// converted and viewed as `Iterable<E>`, so `List<? extends Number>` yields a capture variable
/// bounded by `Number`. Raw iterables yield `Object`.
pub fn enhanced_for_element(
    ctx: &mut TyContext<'_>,
    source: &Operand,
    declared: &Type,
    span: Span,
) -> Result<Type, CheckError> {
    if source.ty.is_errorish() || declared.is_errorish() {
        return Ok(Type::Error);
    }
    let object = Type::class(ctx.well_known().object, vec![]);
    let element = match &source.ty {
        Type::Array(element) => (**element).clone(),
        Type::Class(_) | Type::Raw(_) | Type::TypeVar(_) | Type::Intersection(_) => {
            let iterable = ctx.well_known().iterable;
            let captured = ctx.capture_conversion(&source.ty);
            match instantiate_as_supertype(&*ctx, &captured, iterable) {
                Some(Type::Class(view)) => view.args.first().cloned().unwrap_or(object),
                Some(Type::Raw(_)) => object,
                _ => return Err(not_iterable(&*ctx, source)),
            }
        }
        _ => return Err(not_iterable(&*ctx, source)),
    };

    if element != *declared && !is_assignable(&*ctx, &element, declared) {
        return Err(CheckError::Incompatible {
            from: format_type(&*ctx, &element),
            to: format_type(&*ctx, declared),
            span,
        });
    }
    tracing::trace!(
        target: "genus.typeck",
        element = %format_type(&*ctx, &element),
        "enhanced for"
    );
    Ok(element)
}
