use genus_core::Span;

use crate::{
    class_formals, format_type, is_reifiable, is_subtype, upper_bound, ClassId, ClassType,
    Substitution, TyContext, Type, TypeEnv, TypeError, WildcardBound,
};

/// Instantiate generic declaration `decl` with `args` and check the bounds.
///
/// `args` are the declaration's own actual arguments. For an inner class of a generic class the
/// enclosing formals are self-instantiated; use [`instantiate_member`] to instantiate through a
/// parameterized enclosing type. A declaration without formals instantiated with no arguments is
/// returned unchanged.
pub fn instantiate(
    ctx: &mut TyContext<'_>,
    decl: ClassId,
    args: &[Type],
    span: Span,
) -> Result<Type, TypeError> {
    let ty = instantiate_unchecked(ctx, decl, args, span)?;
    check_bounds(ctx, &ty, span)?;
    Ok(ty)
}

/// Like [`instantiate`] but only validates the shape (arity and reference-type arguments).
///
/// Used while the class hierarchy is still being built, when bounds cannot be checked yet.
pub fn instantiate_unchecked(
    env: &dyn TypeEnv,
    decl: ClassId,
    args: &[Type],
    span: Span,
) -> Result<Type, TypeError> {
    let def = env
        .class(decl)
        .ok_or_else(|| TypeError::internal(format!("unknown class {decl:?}")))?;

    let all_formals = class_formals(env, decl);
    let outer_count = all_formals.len() - def.type_params.len();
    if args.is_empty() && def.type_params.is_empty() {
        let outer_args = all_formals[..outer_count]
            .iter()
            .map(|tv| Type::TypeVar(*tv))
            .collect();
        return Ok(Type::class(decl, outer_args));
    }

    Substitution::for_formals(&def.name, &def.type_params, args, span)?;
    for arg in args {
        if matches!(arg, Type::Primitive(_) | Type::Void) {
            return Err(TypeError::PrimitiveTypeArgument {
                actual: format_type(env, arg),
                span,
            });
        }
    }

    let mut full = Vec::with_capacity(all_formals.len());
    full.extend(all_formals[..outer_count].iter().map(|tv| Type::TypeVar(*tv)));
    full.extend(args.iter().cloned());
    tracing::trace!(
        target: "genus.types",
        class = %def.name,
        args = args.len(),
        "instantiate"
    );
    Ok(Type::class(decl, full))
}

/// Resolve a use of class `decl` written with `args`: no arguments on a generic declaration
/// denotes its raw type.
pub fn resolve_class_use(
    ctx: &mut TyContext<'_>,
    decl: ClassId,
    args: &[Type],
    span: Span,
) -> Result<Type, TypeError> {
    let is_generic = ctx
        .class(decl)
        .is_some_and(|def| !def.type_params.is_empty());
    if args.is_empty() && is_generic {
        return Ok(Type::Raw(decl));
    }
    instantiate(ctx, decl, args, span)
}

/// Instantiate member class `member` selected from the enclosing type `outer`
/// (`Outer<..>.Inner<..>`).
///
/// Inner classes of a raw type are raw. Giving type arguments to a member of a raw type, or
/// using a generic inner class raw through a parameterized enclosing type, is a rare type.
/// Static member classes ignore the enclosing instantiation.
pub fn instantiate_member(
    ctx: &mut TyContext<'_>,
    outer: &Type,
    member: ClassId,
    args: &[Type],
    span: Span,
) -> Result<Type, TypeError> {
    let def = ctx
        .class(member)
        .ok_or_else(|| TypeError::internal(format!("unknown class {member:?}")))?;
    if !def.is_inner() {
        return resolve_class_use(ctx, member, args, span);
    }
    let member_name = def.name.clone();
    let own_formals = def.type_params.clone();

    let outer_args = match outer {
        Type::Raw(_) => None,
        Type::Class(ClassType {
            def: outer_def,
            args: outer_args,
        }) => {
            if outer_args.is_empty() && !class_formals(ctx, *outer_def).is_empty() {
                None
            } else {
                Some(outer_args.clone())
            }
        }
        _ => return resolve_class_use(ctx, member, args, span),
    };

    let Some(outer_args) = outer_args else {
        if !args.is_empty() {
            return Err(TypeError::RareType {
                ty: format!("{}.{}", format_type(ctx, outer), simple(&member_name)),
                reason: "type arguments given to a member of a raw type",
                span,
            });
        }
        return Ok(Type::Raw(member));
    };

    if !own_formals.is_empty() && args.is_empty() {
        if outer_args.is_empty() {
            return Ok(Type::Raw(member));
        }
        return Err(TypeError::RareType {
            ty: format!("{}.{}", format_type(ctx, outer), simple(&member_name)),
            reason: "raw member class of a parameterized type",
            span,
        });
    }

    let outer_formals = match &outer {
        Type::Class(ct) => class_formals(ctx, ct.def),
        _ => Vec::new(),
    };
    let outer_subst = Substitution::for_formals(&member_name, &outer_formals, &outer_args, span)?;
    let inner_subst = Substitution::for_formals(&member_name, &own_formals, args, span)?;
    let subst = Substitution::compose(ctx, &outer_subst, &inner_subst, span)?;

    let ty = Type::class(member, subst.iter().map(|(_, ty)| ty.clone()).collect());
    check_bounds(ctx, &ty, span)?;
    Ok(ty)
}

fn simple(name: &str) -> &str {
    name.rsplit(['.', '$']).next().unwrap_or(name)
}

/// Check that every actual type argument of `ty` (recursively) lies within its formal's bound.
///
/// The arguments are capture converted first so that wildcard arguments are checked through
/// their capture variables. Unresolved bounds yield [`TypeError::NotReady`].
pub fn check_bounds(ctx: &mut TyContext<'_>, ty: &Type, span: Span) -> Result<(), TypeError> {
    match ty {
        Type::Class(ct) if !ct.args.is_empty() => {
            let formals = class_formals(ctx, ct.def);
            if formals.len() != ct.args.len() {
                return Err(TypeError::RareType {
                    ty: format_type(ctx, ty),
                    reason: "type arguments do not cover the enclosing class's parameters",
                    span,
                });
            }
            for formal in &formals {
                match ctx.type_param(*formal) {
                    Some(tp) if tp.resolved => {}
                    Some(tp) => {
                        return Err(TypeError::not_ready(format!("bound of `{}`", tp.name)));
                    }
                    None => {
                        return Err(TypeError::internal(format!("no declaration for {formal:?}")))
                    }
                }
            }

            let captured = ctx.try_capture_conversion(ty, span)?;
            let Type::Class(captured_ct) = &captured else {
                return Err(TypeError::internal("capture conversion changed the type's shape"));
            };
            let captured_subst = Substitution::for_class_type(ctx, captured_ct);
            let declared_subst = Substitution::for_class_type(ctx, ct);

            for (idx, formal) in formals.iter().enumerate() {
                let actual = captured_subst.apply(&Type::TypeVar(*formal));
                let declared = upper_bound(ctx, *formal);
                let bound = captured_subst.apply(&declared);
                if !is_subtype(ctx, &actual, &bound) {
                    let var = ctx
                        .type_param(*formal)
                        .map(|tp| tp.name.clone())
                        .unwrap_or_default();
                    tracing::debug!(target: "genus.types", %var, "bound violation");
                    return Err(TypeError::BoundViolation {
                        var,
                        actual: format_type(ctx, &ct.args[idx]),
                        bound: format_type(ctx, &declared_subst.apply(&declared)),
                        span,
                    });
                }
            }

            for arg in &ct.args {
                check_bounds(ctx, arg, span)?;
            }
            Ok(())
        }
        Type::Array(elem) => check_bounds(ctx, elem, span),
        Type::Wildcard(WildcardBound::Extends(bound))
        | Type::Wildcard(WildcardBound::Super(bound)) => check_bounds(ctx, bound, span),
        Type::Intersection(parts) => {
            for part in parts {
                check_bounds(ctx, part, span)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// The implicit supertype `Enum<E>` of an enum declaration.
///
/// Only the shape is checked here since the enum's own supertype is what makes the bound
/// `E extends Enum<E>` hold.
pub fn enum_supertype(
    env: &dyn TypeEnv,
    enum_class: ClassId,
    span: Span,
) -> Result<Type, TypeError> {
    let enum_decl = env.well_known().enum_;
    instantiate_unchecked(env, enum_decl, &[Type::class(enum_class, vec![])], span)
}

/// The type of an array creation expression with element type `elem`. Generic array creation
/// requires a reifiable element type.
pub fn instantiate_array_base(
    env: &dyn TypeEnv,
    elem: &Type,
    span: Span,
) -> Result<Type, TypeError> {
    if !is_reifiable(env, elem) {
        return Err(TypeError::NotReifiable {
            ty: format_type(env, elem),
            span,
        });
    }
    Ok(Type::array(elem.clone()))
}
