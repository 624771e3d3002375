use crate::{
    box_primitive, instantiate_as_supertype, is_interface, is_subclass, unbox, ClassType, Type,
    TypeEnv, WildcardBound,
};

const MAX_DEPTH: u8 = 32;

/// Subtyping (JLS 4.10) extended with raw types, intersections, capture variables and
/// wildcard containment.
///
/// Error types are compatible with everything so that one bad type does not cascade.
pub fn is_subtype(env: &dyn TypeEnv, sub: &Type, sup: &Type) -> bool {
    subtype(env, sub, sup, MAX_DEPTH)
}

fn subtype(env: &dyn TypeEnv, sub: &Type, sup: &Type, depth: u8) -> bool {
    if sub == sup {
        return true;
    }
    if depth == 0 {
        return false;
    }
    let depth = depth - 1;
    let object = env.well_known().object;

    match (sub, sup) {
        (Type::Unknown | Type::Error, _) | (_, Type::Unknown | Type::Error) => true,
        (Type::Primitive(a), Type::Primitive(b)) => a.widens_to(*b),
        (Type::Primitive(_) | Type::Void, _) | (_, Type::Primitive(_) | Type::Void) => false,
        (Type::Null, _) => sup.is_reference(),
        (_, Type::Null) => false,
        (_, Type::Intersection(parts)) => parts.iter().all(|part| subtype(env, sub, part, depth)),
        (_, Type::Wildcard(WildcardBound::Super(lower))) => subtype(env, sub, lower, depth),
        (_, Type::Wildcard(WildcardBound::Unbounded)) => true,
        (_, Type::Wildcard(WildcardBound::Extends(upper))) => subtype(env, sub, upper, depth),
        (Type::Intersection(parts), _) => parts.iter().any(|part| subtype(env, part, sup, depth)),
        (Type::Wildcard(bound), _) => match bound.upper() {
            Some(upper) => subtype(env, upper, sup, depth),
            None => matches!(sup, Type::Class(ClassType { def, .. }) if *def == object),
        },
        (Type::TypeVar(_), Type::TypeVar(b)) if lower_bound_admits(env, sub, *b, depth) => true,
        (Type::TypeVar(id), _) => {
            let bounds = env
                .type_param(*id)
                .map(|tp| tp.upper_bounds.clone())
                .unwrap_or_default();
            if bounds.is_empty() {
                return matches!(sup, Type::Class(ClassType { def, .. }) if *def == object);
            }
            bounds.iter().any(|bound| subtype(env, bound, sup, depth))
        }
        (_, Type::TypeVar(b)) => lower_bound_admits(env, sub, *b, depth),
        (Type::Array(a), Type::Array(b)) => {
            if a.is_primitive() || b.is_primitive() {
                a == b
            } else {
                subtype(env, a, b, depth)
            }
        }
        (Type::Array(_), Type::Class(ClassType { def, args })) => {
            let wk = env.well_known();
            args.is_empty() && (*def == wk.object || *def == wk.cloneable || *def == wk.serializable)
        }
        (Type::Array(_), Type::Raw(_)) => false,
        (Type::Class(_) | Type::Raw(_), Type::Array(_)) => false,
        (Type::Class(_) | Type::Raw(_), Type::Class(target)) => {
            class_subtype(env, sub, target, depth)
        }
        (Type::Class(_) | Type::Raw(_), Type::Raw(target)) => {
            sub.class_id().is_some_and(|def| is_subclass(env, def, *target))
        }
    }
}

/// `sub <: T` through `T`'s lower bound (capture variables of `? super` wildcards).
fn lower_bound_admits(env: &dyn TypeEnv, sub: &Type, var: crate::TypeVarId, depth: u8) -> bool {
    env.type_param(var)
        .and_then(|tp| tp.lower_bound.clone())
        .is_some_and(|lower| subtype(env, sub, &lower, depth))
}

fn class_subtype(env: &dyn TypeEnv, sub: &Type, target: &ClassType, depth: u8) -> bool {
    let Some(sub_def) = sub.class_id() else {
        return false;
    };
    if !is_subclass(env, sub_def, target.def) {
        return false;
    }
    if target.args.is_empty() {
        return true;
    }
    match instantiate_as_supertype(env, sub, target.def) {
        Some(Type::Class(found)) if found.args.len() == target.args.len() => found
            .args
            .iter()
            .zip(&target.args)
            .all(|(a, b)| contained(env, a, b, depth)),
        // Raw supertypes are only unchecked-convertible to parameterized ones.
        _ => false,
    }
}

/// Type argument containment (JLS 4.5.1): whether argument `a` is contained by argument `b`.
pub fn is_contained(env: &dyn TypeEnv, a: &Type, b: &Type) -> bool {
    contained(env, a, b, MAX_DEPTH)
}

fn contained(env: &dyn TypeEnv, a: &Type, b: &Type, depth: u8) -> bool {
    if a == b {
        return true;
    }
    if a.is_errorish() || b.is_errorish() {
        return true;
    }
    let Type::Wildcard(outer) = b else {
        return false;
    };
    let object = || Type::class(env.well_known().object, vec![]);

    match (a, outer) {
        (_, WildcardBound::Unbounded) => true,
        (Type::Wildcard(inner), WildcardBound::Extends(upper)) => match inner {
            WildcardBound::Extends(inner_upper) => subtype(env, inner_upper, upper, depth),
            WildcardBound::Unbounded => subtype(env, &object(), upper, depth),
            WildcardBound::Super(_) => subtype(env, &object(), upper, depth),
        },
        (Type::Wildcard(inner), WildcardBound::Super(lower)) => match inner {
            WildcardBound::Super(inner_lower) => subtype(env, lower, inner_lower, depth),
            _ => false,
        },
        (_, WildcardBound::Extends(upper)) => subtype(env, a, upper, depth),
        (_, WildcardBound::Super(lower)) => subtype(env, lower, a, depth),
    }
}

/// Assignment compatibility without constant narrowing (JLS 5.2): identity, widening, boxing,
/// unboxing and unchecked conversion.
pub fn is_assignable(env: &dyn TypeEnv, from: &Type, to: &Type) -> bool {
    if is_subtype(env, from, to) {
        return true;
    }
    match (from, to) {
        (Type::Primitive(p), _) if to.is_reference() => is_subtype(env, &box_primitive(env, *p), to),
        (_, Type::Primitive(target)) => {
            from.is_reference() && unbox(env, from).is_some_and(|p| p.widens_to(*target))
        }
        (Type::Class(_) | Type::Raw(_), Type::Class(target)) if !target.args.is_empty() => {
            // Unchecked conversion from a raw supertype view.
            matches!(
                instantiate_as_supertype(env, from, target.def),
                Some(Type::Raw(_))
            )
        }
        _ => false,
    }
}

/// Whether a cast from `from` to `to` may succeed at run time. Used for reference equality
/// comparisons.
pub fn is_castable(env: &dyn TypeEnv, from: &Type, to: &Type) -> bool {
    if from.is_errorish() || to.is_errorish() {
        return true;
    }
    match (from, to) {
        (Type::Primitive(a), Type::Primitive(b)) => a.is_numeric() == b.is_numeric(),
        (Type::Primitive(_), _) | (_, Type::Primitive(_)) => is_assignable(env, from, to),
        (Type::Null, _) => to.is_reference() || to.is_null(),
        (_, Type::Null) => from.is_reference(),
        _ => {
            if is_subtype(env, from, to) || is_subtype(env, to, from) {
                return true;
            }
            let erased_from = crate::erasure(env, from);
            let erased_to = crate::erasure(env, to);
            if is_subtype(env, &erased_from, &erased_to) || is_subtype(env, &erased_to, &erased_from) {
                return true;
            }
            // A non-final class may have a subclass implementing any interface.
            let open_interface_pair = |a: &Type, b: &Type| {
                b.class_id().is_some_and(|def| is_interface(env, def))
                    && a.class_id().is_some_and(|def| {
                        is_interface(env, def) || env.class(def).is_some_and(|c| !c.is_final)
                    })
            };
            matches!(from, Type::TypeVar(_) | Type::Intersection(_))
                || matches!(to, Type::TypeVar(_) | Type::Intersection(_))
                || open_interface_pair(&erased_from, &erased_to)
                || open_interface_pair(&erased_to, &erased_from)
        }
    }
}
