//! Typing of `cond ? a : b` (JLS 15.25).

use genus_core::Span;
use genus_types::{
    binary_numeric_promotion, box_primitive, format_type, lub, unbox, PrimitiveType, TyContext,
    Type, TypeEnv,
};

use crate::{CheckError, ConstValue, Constness, Operand};

/// Type a conditional expression.
///
/// The rules are tried in a fixed order: identical branch types, `boolean`/`Boolean`, a `null`
/// branch, numeric branches (see [`conditional_narrowing`]), and finally the captured `lub` of the
/// boxed branch types. Arrays of references recurse on their element types.
pub fn type_conditional(
    ctx: &mut TyContext<'_>,
    cond: &Operand,
    then_branch: &Operand,
    else_branch: &Operand,
    span: Span,
) -> Result<Operand, CheckError> {
    if !cond.ty.is_errorish() && unbox(&*ctx, &cond.ty) != Some(PrimitiveType::Boolean) {
        return Err(CheckError::ConditionNotBoolean {
            ty: format_type(&*ctx, &cond.ty),
            span: cond.span,
        });
    }

    let (t1, t2) = (&then_branch.ty, &else_branch.ty);
    if t1.is_errorish() || t2.is_errorish() {
        return Ok(Operand::value(Type::Unknown, span));
    }

    let ty = branch_type(ctx, then_branch, else_branch)?;
    tracing::trace!(
        target: "genus.typeck",
        then = %format_type(&*ctx, t1),
        otherwise = %format_type(&*ctx, t2),
        ty = %format_type(&*ctx, &ty),
        "conditional"
    );

    let constant = match &cond.constant {
        Constness::Known(ConstValue::Boolean(pick_then)) => {
            let chosen = if *pick_then { then_branch } else { else_branch };
            let other = if *pick_then { else_branch } else { then_branch };
            match (&chosen.constant, &other.constant) {
                (Constness::Pending, _) | (_, Constness::Pending) => Constness::Pending,
                (Constness::Known(value), Constness::Known(_)) => {
                    convert_constant(&*ctx, value, &ty)
                        .map_or(Constness::NotConstant, Constness::Known)
                }
                _ => Constness::NotConstant,
            }
        }
        Constness::Pending => Constness::Pending,
        _ => Constness::NotConstant,
    };
    Ok(Operand::value(ty, span).with_constant(constant))
}

fn branch_type(
    ctx: &mut TyContext<'_>,
    then_branch: &Operand,
    else_branch: &Operand,
) -> Result<Type, CheckError> {
    let (t1, t2) = (&then_branch.ty, &else_branch.ty);
    let boolean = Type::boolean();
    let boxed_boolean = box_primitive(&*ctx, PrimitiveType::Boolean);

    if t1 == t2 {
        return Ok(t1.clone());
    }
    if (*t1 == boolean && *t2 == boxed_boolean) || (*t1 == boxed_boolean && *t2 == boolean) {
        return Ok(boolean);
    }
    for (null, other) in [(t1, t2), (t2, t1)] {
        if null.is_null() {
            return Ok(match other {
                Type::Primitive(p) => box_primitive(&*ctx, *p),
                reference => reference.clone(),
            });
        }
    }

    let numeric = |ty: &Type| unbox(&*ctx, ty).filter(|p| p.is_numeric());
    if let (Some(a), Some(b)) = (numeric(t1), numeric(t2)) {
        if let Some(narrowed) = conditional_narrowing(&*ctx, then_branch, else_branch)? {
            return Ok(Type::Primitive(narrowed));
        }
        return Ok(binary_numeric_promotion(a, b).map_or(Type::Unknown, Type::Primitive));
    }

    Ok(lub_of_branches(ctx, t1, t2))
}

/// The `byte`/`short`/`char` special cases for numeric branches, or `None` when ordinary binary
/// numeric promotion applies.
///
/// | one branch            | other branch                              | result |
/// |-----------------------|-------------------------------------------|--------|
/// | `byte` or `Byte`      | `short` or `Short`                        | `short`|
/// | `T` or its wrapper, `T` in `byte`/`short`/`char` | `int` constant representable in `T` | `T` |
///
/// Whether an `int` operand is a constant only matters for the second row, so a pending constant
/// yields `NotReady` only there.
pub fn conditional_narrowing(
    env: &dyn TypeEnv,
    a: &Operand,
    b: &Operand,
) -> Result<Option<PrimitiveType>, CheckError> {
    let (Some(pa), Some(pb)) = (unbox(env, &a.ty), unbox(env, &b.ty)) else {
        return Ok(None);
    };
    if matches!(
        (pa, pb),
        (PrimitiveType::Byte, PrimitiveType::Short) | (PrimitiveType::Short, PrimitiveType::Byte)
    ) {
        return Ok(Some(PrimitiveType::Short));
    }

    for (narrow, constant) in [(pa, b), (pb, a)] {
        let narrowable = matches!(
            narrow,
            PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Char
        );
        if !narrowable {
            continue;
        }
        if let Some(value) = constant.int_constant()? {
            if narrow.can_represent(value) {
                return Ok(Some(narrow));
            }
        }
    }
    Ok(None)
}

fn lub_of_branches(ctx: &mut TyContext<'_>, t1: &Type, t2: &Type) -> Type {
    match (t1, t2) {
        (Type::Array(e1), Type::Array(e2)) if e1.is_reference() && e2.is_reference() => {
            Type::array(lub_of_branches(ctx, e1, e2))
        }
        _ => {
            let boxed = |ty: &Type| match ty {
                Type::Primitive(p) => box_primitive(&*ctx, *p),
                other => other.clone(),
            };
            let (s1, s2) = (boxed(t1), boxed(t2));
            lub(ctx, &[s1, s2])
        }
    }
}

fn convert_constant(env: &dyn TypeEnv, value: &ConstValue, ty: &Type) -> Option<ConstValue> {
    match ty {
        Type::Primitive(PrimitiveType::Long) => Some(ConstValue::Long(value.as_integral()?)),
        Type::Primitive(PrimitiveType::Char) => {
            u16::try_from(value.as_integral()?).ok().map(ConstValue::Char)
        }
        Type::Primitive(PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Int) => {
            i32::try_from(value.as_integral()?).ok().map(ConstValue::Int)
        }
        Type::Primitive(PrimitiveType::Boolean) => match value {
            ConstValue::Boolean(_) => Some(value.clone()),
            _ => None,
        },
        Type::Class(ct) if ct.def == env.well_known().string => match value {
            ConstValue::String(_) => Some(value.clone()),
            _ => None,
        },
        _ => None,
    }
}
