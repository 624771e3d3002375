use std::collections::HashSet;

use crate::{
    class_formals, is_interface, is_subtype, ClassType, Type, TypeEnv, TypeVarId, WildcardBound,
};

/// Whether `def` or a class it is an inner class of declares type parameters, i.e. whether the
/// declaration has a raw form.
pub fn can_be_raw(env: &dyn TypeEnv, def: crate::ClassId) -> bool {
    !class_formals(env, def).is_empty()
}

/// Erase type arguments of class types without erasing type variables. Generic declarations
/// become [`Type::Raw`].
pub fn to_raw_type(env: &dyn TypeEnv, ty: &Type) -> Type {
    match ty {
        Type::Class(ClassType { def, .. }) if can_be_raw(env, *def) => Type::Raw(*def),
        Type::Array(elem) => Type::array(to_raw_type(env, elem)),
        other => other.clone(),
    }
}

/// Type erasure (JLS 4.6).
///
/// Parameterized types erase to their raw form, type variables to the erasure of their leftmost
/// bound, and intersections to the erasure of their most specific class component (or their
/// first interface when they have no class component).
pub fn erasure(env: &dyn TypeEnv, ty: &Type) -> Type {
    let mut visiting = HashSet::new();
    erase(env, ty, &mut visiting)
}

fn erase(env: &dyn TypeEnv, ty: &Type, visiting: &mut HashSet<TypeVarId>) -> Type {
    let object = || Type::class(env.well_known().object, vec![]);
    match ty {
        Type::Class(ClassType { def, .. }) => {
            if can_be_raw(env, *def) {
                Type::Raw(*def)
            } else {
                Type::class(*def, vec![])
            }
        }
        Type::Array(elem) => Type::array(erase(env, elem, visiting)),
        Type::TypeVar(id) => {
            if !visiting.insert(*id) {
                return object();
            }
            let erased = env
                .type_param(*id)
                .and_then(|tp| tp.upper_bounds.first().cloned())
                .map(|bound| erase(env, &bound, visiting))
                .unwrap_or_else(object);
            visiting.remove(id);
            erased
        }
        Type::Intersection(parts) => {
            let erased: Vec<Type> = parts.iter().map(|p| erase(env, p, visiting)).collect();
            let classes: Vec<&Type> = erased
                .iter()
                .filter(|t| t.class_id().is_some_and(|def| !is_interface(env, def)))
                .collect();
            let pool: Vec<&Type> = if classes.is_empty() {
                erased.iter().collect()
            } else {
                classes
            };
            pool.iter()
                .find(|candidate| pool.iter().all(|other| is_subtype(env, candidate, other)))
                .or_else(|| pool.first())
                .map(|t| (*t).clone())
                .unwrap_or_else(object)
        }
        Type::Wildcard(WildcardBound::Extends(upper)) => erase(env, upper, visiting),
        Type::Wildcard(_) => object(),
        Type::Void
        | Type::Primitive(_)
        | Type::Null
        | Type::Raw(_)
        | Type::Unknown
        | Type::Error => ty.clone(),
    }
}

/// Whether `ty` is fully available at run time (JLS 4.7).
pub fn is_reifiable(env: &dyn TypeEnv, ty: &Type) -> bool {
    match ty {
        Type::Primitive(_) | Type::Raw(_) | Type::Unknown | Type::Error => true,
        Type::Class(ClassType { args, .. }) => args
            .iter()
            .all(|arg| matches!(arg, Type::Wildcard(WildcardBound::Unbounded))),
        Type::Array(elem) => is_reifiable(env, elem),
        Type::Void
        | Type::Null
        | Type::TypeVar(_)
        | Type::Wildcard(_)
        | Type::Intersection(_) => false,
    }
}
