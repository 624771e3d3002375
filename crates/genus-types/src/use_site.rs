use genus_core::Span;

use crate::{check_bounds, format_type, ClassId, TyContext, Type, TypeEnv, TypeError};

/// Where a type expression occurs: the enclosing class and whether the position is static.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UseSite {
    pub current_class: Option<ClassId>,
    /// Inside a static member or static initializer.
    pub in_static_context: bool,
    /// Inside the arguments of an explicit `this(..)`/`super(..)` constructor call.
    pub in_constructor_call: bool,
}

/// Validate a type written at `site`.
///
/// Class-level type variables may not be referenced from a static context (explicit
/// constructor call arguments excepted) nor from a static nested class of their owner. The type's
/// arguments must satisfy their bounds.
pub fn check_type_use(
    ctx: &mut TyContext<'_>,
    ty: &Type,
    site: &UseSite,
    span: Span,
) -> Result<(), TypeError> {
    let mut vars = Vec::new();
    ty.for_each_type_var(&mut |tv| vars.push(tv));

    for tv in vars {
        let Some(owner) = ctx.type_param(tv).and_then(|tp| tp.declaring_class()) else {
            continue;
        };
        let var = format_type(ctx, &Type::TypeVar(tv));
        if site.in_static_context && !site.in_constructor_call {
            return Err(TypeError::StaticContext { var, span });
        }
        if let Some(current) = site.current_class {
            if let Some(static_class) = static_class_between(ctx, current, owner) {
                let class = ctx
                    .class(static_class)
                    .map(|def| def.name.clone())
                    .unwrap_or_default();
                return Err(TypeError::NestedStaticContext { var, class, span });
            }
        }
    }

    check_bounds(ctx, ty, span)
}

/// The first non-inner class crossed walking outwards from `current` to `owner`, if `owner`
/// encloses `current` at all.
fn static_class_between(env: &dyn TypeEnv, current: ClassId, owner: ClassId) -> Option<ClassId> {
    let mut cls = current;
    let mut crossed = None;
    for _ in 0..32 {
        if cls == owner {
            return crossed;
        }
        let def = env.class(cls)?;
        if crossed.is_none() && !def.is_inner() {
            crossed = Some(cls);
        }
        cls = def.outer?;
    }
    None
}
