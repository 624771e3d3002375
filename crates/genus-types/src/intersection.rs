use std::collections::HashMap;

use crate::{
    all_supertypes, format_type, is_interface, is_subtype, ClassId, ClassType, Type, TypeEnv,
};

/// Greatest lower bound of two types.
///
/// Related types collapse to the more specific one; unrelated types form an intersection. If the
/// intersection would be uninhabitable (two unrelated classes, or two different parameterizations
/// of one interface) the result is `Object`.
pub fn glb(env: &dyn TypeEnv, a: &Type, b: &Type) -> Type {
    if a == b || is_subtype(env, a, b) {
        return a.clone();
    }
    if is_subtype(env, b, a) {
        return b.clone();
    }
    let parts = vec![a.clone(), b.clone()];
    match check_intersection_bounds(env, &parts) {
        Ok(()) => make_intersection(env, parts),
        Err(reason) => {
            tracing::debug!(
                target: "genus.types",
                a = %format_type(env, a),
                b = %format_type(env, b),
                %reason,
                "glb falls back to Object"
            );
            Type::class(env.well_known().object, vec![])
        }
    }
}

/// Build a canonical intersection: nested intersections are flattened, duplicates and redundant
/// supertypes removed, and components ordered classes first, then interfaces, then type
/// variables. A single remaining component is returned as is.
pub fn make_intersection(env: &dyn TypeEnv, parts: Vec<Type>) -> Type {
    let mut flat: Vec<Type> = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            Type::Intersection(inner) => {
                for p in inner {
                    if !flat.contains(&p) {
                        flat.push(p);
                    }
                }
            }
            other => {
                if !flat.contains(&other) {
                    flat.push(other);
                }
            }
        }
    }

    let minimal: Vec<Type> = flat
        .iter()
        .enumerate()
        .filter(|(idx, candidate)| {
            !flat
                .iter()
                .enumerate()
                .any(|(other_idx, other)| other_idx != *idx && is_subtype(env, other, candidate))
        })
        .map(|(_, ty)| ty.clone())
        .collect();
    // Mutually-subtyped components (equivalent types) would eliminate each other.
    let mut minimal = if minimal.is_empty() {
        flat.into_iter().take(1).collect()
    } else {
        minimal
    };

    minimal.sort_by_cached_key(|ty| (component_rank(env, ty), format_type(env, ty)));
    match minimal.len() {
        0 => Type::class(env.well_known().object, vec![]),
        1 => minimal.pop().unwrap_or(Type::Unknown),
        _ => Type::Intersection(minimal),
    }
}

/// Check that an intersection can be inhabited: at most one class among the components (modulo
/// subclassing) and no interface reached through two different parameterizations.
pub fn check_intersection_bounds(env: &dyn TypeEnv, parts: &[Type]) -> Result<(), String> {
    let mut class_bound: Option<Type> = None;
    let mut seen: HashMap<ClassId, Type> = HashMap::new();

    for part in parts {
        match part {
            Type::Primitive(_) | Type::Void | Type::Null | Type::Array(_) | Type::Wildcard(_) => {
                return Err(format!(
                    "`{}` cannot be a component of an intersection type",
                    format_type(env, part)
                ));
            }
            _ => {}
        }

        if let Some(def) = concrete_class(env, part) {
            if !is_interface(env, def) {
                match &class_bound {
                    Some(existing)
                        if !is_subtype(env, part, existing) && !is_subtype(env, existing, part) =>
                    {
                        return Err(format!(
                            "classes `{}` and `{}` are unrelated",
                            format_type(env, existing),
                            format_type(env, part)
                        ));
                    }
                    Some(existing) if is_subtype(env, existing, part) => {}
                    _ => class_bound = Some(part.clone()),
                }
            }
        }

        for sup in all_supertypes(env, part) {
            let Type::Class(ClassType { def, args }) = &sup else {
                continue;
            };
            if args.is_empty() {
                continue;
            }
            match seen.get(def) {
                Some(previous) if previous != &sup => {
                    return Err(format!(
                        "`{}` and `{}` are different parameterizations of the same type",
                        format_type(env, previous),
                        format_type(env, &sup)
                    ));
                }
                Some(_) => {}
                None => {
                    seen.insert(*def, sup);
                }
            }
        }
    }
    Ok(())
}

fn concrete_class(env: &dyn TypeEnv, ty: &Type) -> Option<ClassId> {
    match ty {
        Type::Class(ClassType { def, .. }) | Type::Raw(def) => Some(*def),
        Type::TypeVar(id) => env
            .type_param(*id)
            .and_then(|tp| tp.upper_bounds.first())
            .and_then(|b| b.class_id()),
        _ => None,
    }
}

fn component_rank(env: &dyn TypeEnv, ty: &Type) -> u8 {
    match ty {
        Type::Class(ClassType { def, .. }) | Type::Raw(def) => {
            if is_interface(env, *def) {
                1
            } else {
                0
            }
        }
        Type::TypeVar(_) => 2,
        _ => 3,
    }
}
