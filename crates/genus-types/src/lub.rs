//! Least upper bound (JLS 15.12.2.7 `lub`): minimal erased candidates, least containing
//! invocations and capture of the result.

use crate::{
    all_supertypes, box_primitive, check_intersection_bounds, format_type, glb, is_subclass,
    is_subtype, make_intersection, ClassId, ClassType, TyContext, Type, TypeEnv, TypeVarId,
    WildcardBound,
};

/// Erased supertype candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Candidate {
    Class(ClassId),
    Var(TypeVarId),
}

/// The least upper bound of `types`, capture converted.
///
/// Primitives are boxed first and `null` contributes nothing. The computation recurses through
/// type arguments (`lub(Integer, String)` needs `lub(Integer, String)` again for the argument of
/// `Comparable`); a given input set is expanded at most twice on the stack and nesting is bounded
/// by [`crate::EngineOptions::lub_depth_limit`], after which the argument becomes `?`.
///
/// When the least upper bound is one of the inputs it is returned as is.
pub fn lub(ctx: &mut TyContext<'_>, types: &[Type]) -> Type {
    let result = lub_uncaptured(ctx, types);
    if types.contains(&result) {
        return result;
    }
    let captured = ctx.capture_conversion(&result);
    tracing::debug!(
        target: "genus.types",
        inputs = types.len(),
        result = %format_type(ctx, &captured),
        "lub"
    );
    captured
}

/// The least upper bound before capture conversion, with wildcard type arguments such as
/// `List<? extends Number>`. Every input is a subtype of the result.
pub fn lub_uncaptured(ctx: &mut TyContext<'_>, types: &[Type]) -> Type {
    let object = Type::class(ctx.well_known().object, vec![]);

    let mut inputs: Vec<Type> = Vec::with_capacity(types.len());
    for ty in types {
        let ty = match ty {
            Type::Null => continue,
            Type::Primitive(p) => box_primitive(ctx, *p),
            other => other.clone(),
        };
        if !inputs.contains(&ty) {
            inputs.push(ty);
        }
    }

    if inputs.is_empty() {
        return if types.is_empty() { object } else { Type::Null };
    }
    if let Some(bad) = inputs.iter().find(|t| t.is_errorish()) {
        return bad.clone();
    }
    if inputs.len() == 1 {
        return inputs.swap_remove(0);
    }

    if inputs
        .iter()
        .all(|t| matches!(t, Type::Array(elem) if !elem.is_primitive()))
    {
        let elems: Vec<Type> = inputs
            .iter()
            .filter_map(|t| match t {
                Type::Array(elem) => Some((**elem).clone()),
                _ => None,
            })
            .collect();
        return Type::array(lub_uncaptured(ctx, &elems));
    }

    let key = stack_key(ctx, &inputs);
    ctx.lub_stack.push(key);
    let result = minimal_erased_lub(ctx, &inputs);
    ctx.lub_stack.pop();
    result
}

/// `lub` of two type arguments inside `lcta`, or `None` when recursion has to stop.
fn nested_lub(ctx: &mut TyContext<'_>, a: &Type, b: &Type) -> Option<Type> {
    let key = stack_key(ctx, &[a.clone(), b.clone()]);
    let expansions = ctx.lub_stack.iter().filter(|entry| **entry == key).count();
    if expansions >= 2 || ctx.lub_stack.len() >= ctx.options().lub_depth_limit {
        tracing::trace!(target: "genus.types", depth = ctx.lub_stack.len(), "lub recursion cut off");
        return None;
    }
    Some(lub_uncaptured(ctx, &[a.clone(), b.clone()]))
}

fn stack_key(env: &dyn TypeEnv, inputs: &[Type]) -> Vec<Type> {
    let mut key = inputs.to_vec();
    key.sort_by_cached_key(|t| format_type(env, t));
    key.dedup();
    key
}

fn minimal_erased_lub(ctx: &mut TyContext<'_>, inputs: &[Type]) -> Type {
    let env: &dyn TypeEnv = &*ctx;
    let object = Type::class(env.well_known().object, vec![]);
    let supertype_sets: Vec<Vec<Type>> = inputs.iter().map(|t| all_supertypes(env, t)).collect();

    // Erased candidates common to every input, in the first input's order.
    let erased_sets: Vec<Vec<Candidate>> = supertype_sets
        .iter()
        .map(|set| set.iter().filter_map(candidate).collect())
        .collect();
    let mut common: Vec<Candidate> = Vec::new();
    for cand in erased_sets.first().into_iter().flatten() {
        if !common.contains(cand) && erased_sets.iter().all(|set| set.contains(cand)) {
            common.push(*cand);
        }
    }

    let minimal: Vec<Candidate> = common
        .iter()
        .copied()
        .filter(|v| {
            !common
                .iter()
                .any(|w| w != v && erased_subtype(env, *w, *v))
        })
        .collect();

    let mut parts = Vec::with_capacity(minimal.len());
    for cand in minimal {
        match cand {
            Candidate::Var(id) => parts.push(Type::TypeVar(id)),
            Candidate::Class(def) => {
                let mut invocations: Vec<Type> = Vec::new();
                for set in &supertype_sets {
                    for sup in set {
                        if sup.class_id() == Some(def) && !invocations.contains(sup) {
                            invocations.push(sup.clone());
                        }
                    }
                }
                parts.push(least_containing_invocation(ctx, def, &invocations));
            }
        }
    }

    match parts.len() {
        0 => object,
        1 => parts.swap_remove(0),
        _ if check_intersection_bounds(ctx, &parts).is_ok() => make_intersection(ctx, parts),
        _ => object,
    }
}

fn candidate(ty: &Type) -> Option<Candidate> {
    match ty {
        Type::Class(ClassType { def, .. }) | Type::Raw(def) => Some(Candidate::Class(*def)),
        Type::TypeVar(id) => Some(Candidate::Var(*id)),
        _ => None,
    }
}

fn erased_subtype(env: &dyn TypeEnv, sub: Candidate, sup: Candidate) -> bool {
    match (sub, sup) {
        (Candidate::Class(a), Candidate::Class(b)) => is_subclass(env, a, b),
        (Candidate::Var(a), Candidate::Class(b)) => {
            is_subtype(env, &Type::TypeVar(a), &Type::Raw(b))
                || is_subtype(env, &Type::TypeVar(a), &Type::class(b, vec![]))
        }
        (Candidate::Var(a), Candidate::Var(b)) => {
            is_subtype(env, &Type::TypeVar(a), &Type::TypeVar(b))
        }
        (Candidate::Class(_), Candidate::Var(_)) => false,
    }
}

/// `lci`: a single invocation of `def` containing every invocation in `invocations`.
fn least_containing_invocation(
    ctx: &mut TyContext<'_>,
    def: ClassId,
    invocations: &[Type],
) -> Type {
    let mut parameterized: Vec<&Vec<Type>> = Vec::with_capacity(invocations.len());
    for inv in invocations {
        match inv {
            Type::Class(ClassType { args, .. }) if !args.is_empty() => parameterized.push(args),
            Type::Raw(_) => return Type::Raw(def),
            _ => return Type::class(def, vec![]),
        }
    }
    let Some((first, rest)) = parameterized.split_first() else {
        return Type::class(def, vec![]);
    };

    let mut acc: Vec<Type> = (*first).clone();
    for args in rest {
        if args.len() != acc.len() {
            return Type::Raw(def);
        }
        acc = acc
            .iter()
            .zip(args.iter())
            .map(|(a, b)| least_containing_argument(ctx, a, b))
            .collect();
    }
    Type::class(def, acc)
}

/// `lcta`: the least type argument containing both `a` and `b`.
fn least_containing_argument(ctx: &mut TyContext<'_>, a: &Type, b: &Type) -> Type {
    let unbounded = Type::Wildcard(WildcardBound::Unbounded);
    match (a, b) {
        (Type::Wildcard(wa), Type::Wildcard(wb)) => match (wa, wb) {
            (WildcardBound::Extends(u), WildcardBound::Extends(v)) => extends_lub(ctx, u, v),
            (WildcardBound::Super(u), WildcardBound::Super(v)) => super_glb(ctx, u, v),
            // `? extends U` and `? super U` share only `U` itself, which contains neither.
            _ => unbounded,
        },
        (Type::Wildcard(w), other) | (other, Type::Wildcard(w)) => match w {
            WildcardBound::Extends(upper) => extends_lub(ctx, other, upper),
            WildcardBound::Super(lower) => super_glb(ctx, other, lower),
            WildcardBound::Unbounded => unbounded,
        },
        _ if a == b => a.clone(),
        _ => extends_lub(ctx, a, b),
    }
}

/// `? super glb(a, b)`, or `?` when the two have no common subtype to serve as the lower bound.
fn super_glb(ctx: &mut TyContext<'_>, a: &Type, b: &Type) -> Type {
    let lower = glb(ctx, a, b);
    if is_subtype(ctx, &lower, a) && is_subtype(ctx, &lower, b) {
        Type::wildcard_super(lower)
    } else {
        Type::Wildcard(WildcardBound::Unbounded)
    }
}

fn extends_lub(ctx: &mut TyContext<'_>, a: &Type, b: &Type) -> Type {
    let object = Type::class(ctx.well_known().object, vec![]);
    match nested_lub(ctx, a, b) {
        Some(bound) if bound != object => Type::wildcard_extends(bound),
        _ => Type::Wildcard(WildcardBound::Unbounded),
    }
}
