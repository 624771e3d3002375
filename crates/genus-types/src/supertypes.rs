use std::collections::{HashSet, VecDeque};

use crate::{
    can_be_raw, is_subtype, to_raw_type, ClassDef, ClassId, Substitution, Type, TypeEnv, TypeVarId,
};

/// Immediate supertypes of `ty`, with the instantiation's substitution applied.
///
/// Raw types have raw supertypes. Interfaces and classes without a declared superclass have
/// `Object` as a supertype (JLS 4.10.2).
pub fn direct_supertypes(env: &dyn TypeEnv, ty: &Type) -> Vec<Type> {
    let wk = env.well_known();
    let object = Type::class(wk.object, vec![]);
    match ty {
        Type::Class(ct) => {
            let Some(class_def) = env.class(ct.def) else {
                return Vec::new();
            };
            let raw = ct.args.is_empty() && can_be_raw(env, ct.def);
            let subst = Substitution::for_class_type(env, ct);
            let view = |sup: &Type| {
                if raw {
                    to_raw_type(env, sup)
                } else {
                    subst.apply(sup)
                }
            };
            declared_supertypes(env, ct.def, class_def, &object, view)
        }
        Type::Raw(def) => {
            let Some(class_def) = env.class(*def) else {
                return Vec::new();
            };
            declared_supertypes(env, *def, class_def, &object, |sup| to_raw_type(env, sup))
        }
        Type::TypeVar(id) => match env.type_param(*id) {
            Some(tp) if !tp.upper_bounds.is_empty() => tp.upper_bounds.clone(),
            _ => vec![object],
        },
        Type::Intersection(parts) => parts.clone(),
        Type::Array(_) => vec![
            object,
            Type::class(wk.cloneable, vec![]),
            Type::class(wk.serializable, vec![]),
        ],
        Type::Wildcard(bound) => vec![bound.upper().cloned().unwrap_or(object)],
        Type::Void
        | Type::Primitive(_)
        | Type::Null
        | Type::Unknown
        | Type::Error => Vec::new(),
    }
}

fn declared_supertypes(
    env: &dyn TypeEnv,
    def: ClassId,
    class_def: &ClassDef,
    object: &Type,
    view: impl Fn(&Type) -> Type,
) -> Vec<Type> {
    let mut out = Vec::with_capacity(class_def.interfaces.len() + 1);
    if let Some(sc) = &class_def.super_class {
        out.push(view(sc));
    }
    out.extend(class_def.interfaces.iter().map(&view));
    if class_def.super_class.is_none() && def != env.well_known().object {
        out.push(object.clone());
    }
    out
}

/// `ty` and all of its supertypes in breadth-first order, without duplicates.
pub fn all_supertypes(env: &dyn TypeEnv, ty: &Type) -> Vec<Type> {
    let mut out = Vec::new();
    let mut seen: HashSet<Type> = HashSet::new();
    let mut queue: VecDeque<Type> = VecDeque::new();
    queue.push_back(ty.clone());

    while let Some(current) = queue.pop_front() {
        if !seen.insert(current.clone()) {
            continue;
        }
        queue.extend(direct_supertypes(env, &current));
        out.push(current);
    }
    out
}

/// Whether declaration `sub` is `sup` or inherits from it (ignoring type arguments).
pub fn is_subclass(env: &dyn TypeEnv, sub: ClassId, sup: ClassId) -> bool {
    if sub == sup || sup == env.well_known().object {
        return true;
    }
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([sub]);
    while let Some(current) = queue.pop_front() {
        if current == sup {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        let Some(def) = env.class(current) else {
            continue;
        };
        queue.extend(def.super_class.iter().filter_map(Type::class_id));
        queue.extend(def.interfaces.iter().filter_map(Type::class_id));
    }
    false
}

/// View `ty` as an instantiation of `target`, applying type-argument substitution along the
/// supertype graph: `ArrayList<String>` viewed as `List` is `List<String>`.
///
/// Raw types stay raw. A type variable or intersection whose bounds reach `target` through
/// incompatible instantiations has no single view and yields `None`.
pub fn instantiate_as_supertype(env: &dyn TypeEnv, ty: &Type, target: ClassId) -> Option<Type> {
    view_as(env, ty, target, &mut Vec::new())
}

fn view_as(
    env: &dyn TypeEnv,
    ty: &Type,
    target: ClassId,
    visiting: &mut Vec<TypeVarId>,
) -> Option<Type> {
    let bounds = match ty {
        Type::Class(_) | Type::Raw(_) => {
            return all_supertypes(env, ty)
                .into_iter()
                .find(|sup| sup.class_id() == Some(target));
        }
        Type::Array(_) => {
            let wk = env.well_known();
            let array_super = [wk.object, wk.cloneable, wk.serializable].contains(&target);
            return array_super.then(|| Type::class(target, vec![]));
        }
        Type::TypeVar(id) => {
            if visiting.contains(id) {
                return None;
            }
            visiting.push(*id);
            let bounds = match env.type_param(*id) {
                Some(tp) if !tp.upper_bounds.is_empty() => tp.upper_bounds.clone(),
                _ => vec![Type::class(env.well_known().object, vec![])],
            };
            let found = most_specific_view(env, &bounds, target, visiting);
            visiting.pop();
            return found;
        }
        Type::Intersection(parts) => parts,
        _ => return None,
    };
    most_specific_view(env, bounds, target, visiting)
}

/// The views of `target` reachable from `parts` must form a chain; the lowest one wins.
fn most_specific_view(
    env: &dyn TypeEnv,
    parts: &[Type],
    target: ClassId,
    visiting: &mut Vec<TypeVarId>,
) -> Option<Type> {
    let mut best: Option<Type> = None;
    for part in parts {
        let Some(view) = view_as(env, part, target, visiting) else {
            continue;
        };
        best = Some(match best {
            None => view,
            Some(current) if current == view || is_subtype(env, &current, &view) => current,
            Some(current) if is_subtype(env, &view, &current) => view,
            Some(_) => return None,
        });
    }
    best
}
