use std::sync::Arc;

use genus_core::Span;
use indexmap::IndexMap;

use crate::{class_formals, format_type, ClassType, Type, TypeEnv, TypeError, TypeVarId, WildcardBound};

/// A finite mapping from type variables to types.
///
/// Substitutions are immutable values shared by reference: cloning one is cheap and every
/// modifying operation returns a new value. Iteration follows insertion order, which for class
/// instantiations is enclosing formals first, then the class's own formals.
///
/// Two substitutions are equal iff they agree on every formal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitution {
    entries: Arc<IndexMap<TypeVarId, Type>>,
}

impl Substitution {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pair `formals` with `actuals`, failing on an arity mismatch.
    pub fn for_formals(
        owner: &str,
        formals: &[TypeVarId],
        actuals: &[Type],
        span: Span,
    ) -> Result<Self, TypeError> {
        if formals.len() != actuals.len() {
            return Err(TypeError::ArityMismatch {
                class: owner.to_string(),
                expected: formals.len(),
                found: actuals.len(),
                span,
            });
        }
        Ok(Self {
            entries: Arc::new(formals.iter().copied().zip(actuals.iter().cloned()).collect()),
        })
    }

    /// The substitution a parameterized class type denotes (all formals including enclosing
    /// ones). Missing arguments map to `Unknown`.
    pub fn for_class_type(env: &dyn TypeEnv, ty: &ClassType) -> Self {
        if ty.args.is_empty() {
            return Self::empty();
        }
        let formals = class_formals(env, ty.def);
        let entries = formals
            .into_iter()
            .enumerate()
            .map(|(idx, formal)| (formal, ty.args.get(idx).cloned().unwrap_or(Type::Unknown)))
            .collect();
        Self {
            entries: Arc::new(entries),
        }
    }

    pub(crate) fn from_map(entries: IndexMap<TypeVarId, Type>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Extend with `var := ty`. Binding a variable twice is an error.
    pub fn bind(
        &self,
        env: &dyn TypeEnv,
        var: TypeVarId,
        ty: Type,
        span: Span,
    ) -> Result<Self, TypeError> {
        if self.entries.contains_key(&var) {
            return Err(TypeError::Rebind {
                var: format_type(env, &Type::TypeVar(var)),
                span,
            });
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.entries).insert(var, ty);
        Ok(next)
    }

    /// Union of two substitutions with disjoint domains; `outer`'s entries come first.
    pub fn compose(
        env: &dyn TypeEnv,
        outer: &Self,
        inner: &Self,
        span: Span,
    ) -> Result<Self, TypeError> {
        let mut out = outer.clone();
        for (var, ty) in inner.iter() {
            out = out.bind(env, var, ty.clone(), span)?;
        }
        Ok(out)
    }

    pub fn get(&self, var: TypeVarId) -> Option<&Type> {
        self.entries.get(&var)
    }

    pub fn contains(&self, var: TypeVarId) -> bool {
        self.entries.contains_key(&var)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeVarId, &Type)> {
        self.entries.iter().map(|(var, ty)| (*var, ty))
    }

    /// Replace every mapped type variable in `ty`.
    ///
    /// Unmapped variables are left alone and bounds are never entered, so substitution
    /// terminates even for F-bounded variables.
    pub fn apply(&self, ty: &Type) -> Type {
        if self.entries.is_empty() {
            return ty.clone();
        }
        match ty {
            Type::TypeVar(id) => self.entries.get(id).cloned().unwrap_or_else(|| ty.clone()),
            Type::Class(ClassType { def, args }) => {
                Type::class(*def, args.iter().map(|arg| self.apply(arg)).collect())
            }
            Type::Array(elem) => Type::array(self.apply(elem)),
            Type::Wildcard(WildcardBound::Extends(upper)) => Type::wildcard_extends(self.apply(upper)),
            Type::Wildcard(WildcardBound::Super(lower)) => Type::wildcard_super(self.apply(lower)),
            Type::Intersection(parts) => {
                Type::Intersection(parts.iter().map(|part| self.apply(part)).collect())
            }
            Type::Void
            | Type::Primitive(_)
            | Type::Null
            | Type::Raw(_)
            | Type::Wildcard(WildcardBound::Unbounded)
            | Type::Unknown
            | Type::Error => ty.clone(),
        }
    }

    pub fn apply_all(&self, tys: &[Type]) -> Vec<Type> {
        tys.iter().map(|ty| self.apply(ty)).collect()
    }
}
