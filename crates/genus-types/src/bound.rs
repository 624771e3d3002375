//! Phase two of the bound model: resolving and validating declared bounds.

use std::collections::HashSet;

use genus_core::Span;

use crate::{
    check_intersection_bounds, format_type, is_interface, Type, TypeEnv, TypeError, TypeStore,
    TypeVarId,
};

/// A type variable whose identity exists but whose bounds are not resolved yet.
///
/// The handle is deliberately neither `Clone` nor `Copy`: [`resolve`](Self::resolve) consumes it,
/// so a variable is finalized exactly once. Bound expressions may mention [`id`](Self::id) before
/// resolution, which is how F-bounds such as `T extends Comparable<T>` are built.
#[must_use = "a pending type variable must be resolved"]
#[derive(Debug)]
pub struct PendingTypeVar {
    id: TypeVarId,
    span: Span,
}

impl PendingTypeVar {
    pub(crate) fn new(id: TypeVarId, span: Span) -> Self {
        Self { id, span }
    }

    pub fn id(&self) -> TypeVarId {
        self.id
    }

    pub fn as_type(&self) -> Type {
        Type::TypeVar(self.id)
    }

    /// Install the resolved bounds (empty means `Object`) and mark the variable resolved.
    ///
    /// Invalid bounds are reported but the variable is still finalized, with `Object` as its
    /// bound, so dependent checks can make progress.
    pub fn resolve(self, store: &mut TypeStore, bounds: Vec<Type>) -> Result<TypeVarId, TypeError> {
        let name = store
            .type_param(self.id)
            .map(|tp| tp.name.clone())
            .ok_or_else(|| TypeError::internal(format!("no declaration for {:?}", self.id)))?;

        let checked = validate_bounds(store, self.id, &name, &bounds, self.span);
        let object = Type::class(store.well_known().object, vec![]);
        let installed = match &checked {
            Ok(()) if bounds.is_empty() => vec![object],
            Ok(()) => bounds,
            Err(_) => vec![object],
        };

        let def = store
            .type_param_mut(self.id)
            .ok_or_else(|| TypeError::internal(format!("no declaration for {:?}", self.id)))?;
        def.upper_bounds = installed;
        def.resolved = true;

        match &checked {
            Ok(()) => tracing::trace!(target: "genus.types", var = %name, "type variable resolved"),
            Err(err) => {
                tracing::debug!(target: "genus.types", var = %name, %err, "invalid type variable bound")
            }
        }
        checked.map(|()| self.id)
    }
}

fn validate_bounds(
    env: &dyn TypeEnv,
    id: TypeVarId,
    name: &str,
    bounds: &[Type],
    span: Span,
) -> Result<(), TypeError> {
    let invalid = |reason: String| TypeError::InvalidBound {
        var: name.to_string(),
        reason,
        span,
    };

    for (idx, bound) in bounds.iter().enumerate() {
        match bound {
            Type::Array(_) => return Err(invalid("a bound may not be an array type".into())),
            Type::Primitive(_) | Type::Void | Type::Null => {
                return Err(invalid(format!(
                    "`{}` is not a reference type",
                    format_type(env, bound)
                )))
            }
            Type::Wildcard(_) | Type::Intersection(_) => {
                return Err(invalid(format!(
                    "`{}` cannot be used as a bound",
                    format_type(env, bound)
                )))
            }
            Type::TypeVar(_) if bounds.len() > 1 => {
                return Err(invalid(
                    "a type variable bound may not be followed by other bounds".into(),
                ))
            }
            Type::Class(_) | Type::Raw(_) if idx > 0 => {
                let def = bound.class_id();
                if !def.is_some_and(|def| is_interface(env, def)) {
                    return Err(invalid(format!(
                        "additional bound `{}` is not an interface",
                        format_type(env, bound)
                    )));
                }
            }
            _ => {}
        }
    }

    if let Some(Type::TypeVar(first)) = bounds.first() {
        if reaches(env, *first, id) {
            return Err(TypeError::CyclicBound {
                var: name.to_string(),
                span,
            });
        }
    }

    if bounds.len() > 1 {
        check_intersection_bounds(env, bounds).map_err(invalid)?;
    }
    Ok(())
}

/// Follow the chain of bare type-variable bounds starting at `start`, looking for `target`.
fn reaches(env: &dyn TypeEnv, start: TypeVarId, target: TypeVarId) -> bool {
    let mut seen = HashSet::new();
    let mut current = start;
    loop {
        if current == target {
            return true;
        }
        if !seen.insert(current) {
            return false;
        }
        let Some(def) = env.type_param(current) else {
            return false;
        };
        match def.upper_bounds.first() {
            Some(Type::TypeVar(next)) => current = *next,
            _ => return false,
        }
    }
}
