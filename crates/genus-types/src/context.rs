use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use genus_core::Span;
use indexmap::IndexMap;

use crate::raw::RawClass;
use crate::{
    check_intersection_bounds, class_formals, format_type, is_interface, is_subtype,
    make_intersection, upper_bound, ClassDef, ClassId, ClassType, Substitution, Type, TypeEnv,
    TypeError, TypeParamDef, TypeVarId, TypeVarOwner, WellKnownTypes, WildcardBound,
};

/// Knobs of the engine that callers may tune.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum nesting of recursive `lub` computations before falling back to `?`.
    pub lub_depth_limit: usize,
    /// Report unchecked accesses through raw types.
    pub unchecked_warnings: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            lub_depth_limit: 4,
            unchecked_warnings: true,
        }
    }
}

/// Per-invocation typing context.
///
/// Side-effect free with respect to the shared [`crate::TypeStore`]: capture variables and raw
/// member views are allocated here and disappear with the context.
pub struct TyContext<'env> {
    base: &'env dyn TypeEnv,
    locals: Vec<TypeParamDef>,
    raw_views: HashMap<ClassId, Arc<RawClass>>,
    options: EngineOptions,
    /// Input sets of the `lub` computations currently in progress.
    pub(crate) lub_stack: Vec<Vec<Type>>,
}

impl fmt::Debug for TyContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TyContext")
            .field("locals", &self.locals)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'env> TyContext<'env> {
    pub fn new(base: &'env dyn TypeEnv) -> Self {
        Self::with_options(base, EngineOptions::default())
    }

    pub fn with_options(base: &'env dyn TypeEnv, options: EngineOptions) -> Self {
        Self {
            base,
            locals: Vec::new(),
            raw_views: HashMap::new(),
            options,
            lub_stack: Vec::new(),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Clear all context-local allocations.
    ///
    /// Callers that want deterministic ids across repeated invocations should prefer a fresh
    /// context per invocation.
    pub fn reset(&mut self) {
        self.locals.clear();
        self.raw_views.clear();
        self.lub_stack.clear();
    }

    /// Number of capture variables allocated so far.
    pub fn capture_count(&self) -> usize {
        self.locals.len()
    }

    pub(crate) fn cached_raw_view(&self, class: ClassId) -> Option<Arc<RawClass>> {
        self.raw_views.get(&class).cloned()
    }

    pub(crate) fn cache_raw_view(&mut self, class: ClassId, view: Arc<RawClass>) {
        self.raw_views.insert(class, view);
    }

    fn add_capture_type_param(&mut self) -> Result<TypeVarId, TypeError> {
        let idx: u32 = self
            .locals
            .len()
            .try_into()
            .map_err(|_| TypeError::internal("too many capture variables"))?;
        let id = TypeVarId::new_context_local(idx);
        self.locals.push(TypeParamDef {
            name: format!("CAP#{}", idx + 1),
            owner: TypeVarOwner::Synthetic,
            upper_bounds: Vec::new(),
            lower_bound: None,
            resolved: true,
        });
        Ok(id)
    }

    fn set_capture_bounds(&mut self, id: TypeVarId, upper: Type, lower: Option<Type>) {
        let Some(def) = id.context_local_index().and_then(|idx| self.locals.get_mut(idx)) else {
            return;
        };
        def.upper_bounds = match upper {
            Type::Intersection(parts) => parts,
            other => vec![other],
        };
        def.lower_bound = lower;
    }

    /// Capture conversion (JLS 5.1.10), best effort.
    ///
    /// Types that cannot be captured are returned unchanged; use
    /// [`try_capture_conversion`](Self::try_capture_conversion) to observe the failure.
    pub fn capture_conversion(&mut self, ty: &Type) -> Type {
        self.try_capture_conversion(ty, Span::synthetic())
            .unwrap_or_else(|_| ty.clone())
    }

    /// Capture conversion (JLS 5.1.10).
    ///
    /// Every wildcard argument is replaced by a fresh capture variable whose upper bound combines
    /// the wildcard's bound with the formal's declared bound (itself substituted with the
    /// captured arguments, so F-bounds refer to the capture variables). Types without wildcard
    /// arguments are returned unchanged, which makes the conversion idempotent.
    pub fn try_capture_conversion(&mut self, ty: &Type, span: Span) -> Result<Type, TypeError> {
        let (def, args) = match ty {
            Type::Intersection(parts) => {
                let mut captured = Vec::with_capacity(parts.len());
                for part in parts {
                    captured.push(self.try_capture_conversion(part, span)?);
                }
                return Ok(Type::Intersection(captured));
            }
            Type::Class(ClassType { def, args }) if args.iter().any(Type::is_wildcard) => {
                (*def, args)
            }
            _ => return Ok(ty.clone()),
        };

        let formals = class_formals(self, def);
        if formals.len() != args.len() {
            return Ok(ty.clone());
        }

        let mut map = IndexMap::with_capacity(formals.len());
        let mut captures = Vec::new();
        for (formal, arg) in formals.iter().zip(args) {
            match arg {
                Type::Wildcard(bound) => {
                    let cap = self.add_capture_type_param()?;
                    captures.push((*formal, cap, bound.clone()));
                    map.insert(*formal, Type::TypeVar(cap));
                }
                other => {
                    map.insert(*formal, other.clone());
                }
            }
        }
        let subst = Substitution::from_map(map);

        for (formal, cap, bound) in captures {
            let declared = subst.apply(&upper_bound(self, formal));
            let (upper, lower) = match bound {
                WildcardBound::Unbounded => (declared, None),
                WildcardBound::Extends(wildcard) => {
                    (self.capture_upper(ty, &wildcard, &declared, span)?, None)
                }
                WildcardBound::Super(lower) => (declared, Some(*lower)),
            };
            self.set_capture_bounds(cap, upper, lower);
        }

        let captured = Type::class(
            def,
            formals
                .iter()
                .map(|formal| subst.apply(&Type::TypeVar(*formal)))
                .collect(),
        );
        tracing::trace!(
            target: "genus.types",
            from = %format_type(self, ty),
            to = %format_type(self, &captured),
            "capture conversion"
        );
        Ok(captured)
    }

    /// Upper bound of a capture variable for `? extends wildcard` against a formal bounded by
    /// `declared`.
    fn capture_upper(
        &self,
        ty: &Type,
        wildcard: &Type,
        declared: &Type,
        span: Span,
    ) -> Result<Type, TypeError> {
        if wildcard == declared || is_subtype(self, wildcard, declared) {
            return Ok(wildcard.clone());
        }
        if is_subtype(self, declared, wildcard) {
            return Ok(declared.clone());
        }

        let is_class = |t: &Type| t.class_id().is_some_and(|def| !is_interface(self, def));
        let declared_parts: Vec<&Type> = match declared {
            Type::Intersection(parts) => parts.iter().collect(),
            other => vec![other],
        };
        if is_class(wildcard) {
            if let Some(class_bound) = declared_parts.iter().find(|p| is_class(p)) {
                if !is_subtype(self, wildcard, class_bound) && !is_subtype(self, class_bound, wildcard)
                {
                    return Err(TypeError::CaptureFailed {
                        ty: format_type(self, ty),
                        wildcard: format_type(self, wildcard),
                        bound: format_type(self, class_bound),
                        span,
                    });
                }
            }
        }

        let mut parts = vec![wildcard.clone()];
        parts.extend(declared_parts.into_iter().cloned());
        if check_intersection_bounds(self, &parts).is_ok() {
            Ok(make_intersection(self, parts))
        } else {
            // The user-written bound is the more informative one.
            Ok(wildcard.clone())
        }
    }
}

impl TypeEnv for TyContext<'_> {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.base.class(id)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        if let Some(idx) = id.context_local_index() {
            return self.locals.get(idx);
        }
        self.base.type_param(id)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.base.lookup_class(name)
    }

    fn well_known(&self) -> &WellKnownTypes {
        self.base.well_known()
    }
}

impl TypeVarId {
    const CONTEXT_LOCAL_BIT: u32 = 1 << 31;

    pub(crate) fn new_context_local(index: u32) -> Self {
        Self(Self::CONTEXT_LOCAL_BIT | index)
    }

    pub(crate) fn context_local_index(self) -> Option<usize> {
        if (self.0 & Self::CONTEXT_LOCAL_BIT) == 0 {
            return None;
        }
        Some((self.0 & !Self::CONTEXT_LOCAL_BIT) as usize)
    }

    /// Whether this id denotes a capture variable owned by a [`TyContext`].
    pub fn is_capture(self) -> bool {
        self.context_local_index().is_some()
    }
}
