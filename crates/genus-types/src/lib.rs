//! The parametric type engine of genus.
//!
//! Types are plain values ([`Type`]) that refer to declarations stored in a [`TypeEnv`] (usually a
//! [`TypeStore`]). Everything that needs to allocate analysis-local state, such as capture
//! variables or memoized raw views, goes through a [`TyContext`] so the shared store is never
//! mutated while a compilation unit is being checked.
//!
//! The main entry points are:
//! - [`TypeStore::build_type_variable`] / [`PendingTypeVar::resolve`] for the two-phase bound model,
//! - [`Substitution`] for instantiating generic declarations,
//! - [`TyContext::capture_conversion`] for wildcard capture,
//! - [`TyContext::raw_of`] and [`erasure`] for raw types,
//! - [`lub`] for least upper bounds,
//! - [`instantiate`] for explicit and implicit generic instantiation.

use std::fmt;

use serde::{Deserialize, Serialize};

mod bound;
mod context;
mod erasure;
mod error;
mod format;
mod instantiate;
mod intersection;
mod jdk;
mod lub;
mod primitive;
mod raw;
mod store;
mod subst;
mod subtyping;
mod supertypes;
mod use_site;
mod varargs;

pub use bound::PendingTypeVar;
pub use context::{EngineOptions, TyContext};
pub use erasure::{can_be_raw, erasure, is_reifiable, to_raw_type};
pub use error::{ErrorKind, TypeError};
pub use format::format_type;
pub use genus_core::Span;
pub use instantiate::{
    check_bounds, enum_supertype, instantiate, instantiate_array_base, instantiate_member,
    instantiate_unchecked, resolve_class_use,
};
pub use intersection::{check_intersection_bounds, glb, make_intersection};
pub use lub::{lub, lub_uncaptured};
pub use primitive::{
    binary_numeric_promotion, box_primitive, is_primitive_wrapper, unary_numeric_promotion, unbox,
    PrimitiveType,
};
pub use raw::RawClass;
pub use store::{TypeStore, WellKnownTypes};
pub use subst::Substitution;
pub use subtyping::{is_assignable, is_castable, is_contained, is_subtype};
pub use supertypes::{all_supertypes, direct_supertypes, instantiate_as_supertype, is_subclass};
pub use use_site::{check_type_use, UseSite};
pub use varargs::{variable_arity_param, VarargsParam};

/// Identifier of a class, interface, enum or annotation declaration in a [`TypeEnv`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(u32);

impl ClassId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

/// Identifier of a type variable.
///
/// Ids with the high bit set are context-local (capture variables allocated by a [`TyContext`]).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeVarId(u32);

impl TypeVarId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TypeVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context_local_index() {
            Some(idx) => write!(f, "TypeVarId(cap {idx})"),
            None => write!(f, "TypeVarId({})", self.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

impl WildcardBound {
    /// The wildcard's upper bound, `None` meaning the top type.
    pub fn upper(&self) -> Option<&Type> {
        match self {
            WildcardBound::Extends(upper) => Some(upper),
            _ => None,
        }
    }

    pub fn lower(&self) -> Option<&Type> {
        match self {
            WildcardBound::Super(lower) => Some(lower),
            _ => None,
        }
    }
}

/// A (possibly parameterized) class type.
///
/// `args` covers the declaration's full formal list as returned by [`class_formals`]: formals of
/// enclosing classes first (for inner classes), then the class's own formals. An empty `args`
/// denotes a declaration without formals.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Primitive(PrimitiveType),
    /// The type of the `null` literal.
    Null,
    Class(ClassType),
    /// A generic declaration used without type arguments.
    Raw(ClassId),
    Array(Box<Type>),
    TypeVar(TypeVarId),
    /// Only valid as a type argument of a [`ClassType`].
    Wildcard(WildcardBound),
    /// `A & B & ...`; build with [`make_intersection`] to keep the component order canonical.
    Intersection(Vec<Type>),
    Unknown,
    Error,
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Self {
        Type::Class(ClassType { def, args })
    }

    pub fn array(elem: Type) -> Self {
        Type::Array(Box::new(elem))
    }

    pub fn boolean() -> Self {
        Type::Primitive(PrimitiveType::Boolean)
    }

    pub fn int() -> Self {
        Type::Primitive(PrimitiveType::Int)
    }

    pub fn wildcard_extends(upper: Type) -> Self {
        Type::Wildcard(WildcardBound::Extends(Box::new(upper)))
    }

    pub fn wildcard_super(lower: Type) -> Self {
        Type::Wildcard(WildcardBound::Super(Box::new(lower)))
    }

    pub fn is_errorish(&self) -> bool {
        matches!(self, Type::Unknown | Type::Error)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Type::Null)
    }

    /// Reference types, excluding the null type.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Class(_)
                | Type::Raw(_)
                | Type::Array(_)
                | Type::TypeVar(_)
                | Type::Intersection(_)
                | Type::Wildcard(_)
        )
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Type::Wildcard(_))
    }

    pub fn has_wildcard_args(&self) -> bool {
        match self {
            Type::Class(ClassType { args, .. }) => args.iter().any(Type::is_wildcard),
            _ => false,
        }
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            Type::Class(ct) => Some(ct),
            _ => None,
        }
    }

    /// Declaration id of a class or raw type.
    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            Type::Class(ct) => Some(ct.def),
            Type::Raw(def) => Some(*def),
            _ => None,
        }
    }

    /// Visit every type variable mentioned by this type (not following bounds).
    pub fn for_each_type_var(&self, f: &mut dyn FnMut(TypeVarId)) {
        match self {
            Type::TypeVar(id) => f(*id),
            Type::Class(ClassType { args, .. }) => {
                for arg in args {
                    arg.for_each_type_var(f);
                }
            }
            Type::Array(elem) => elem.for_each_type_var(f),
            Type::Wildcard(WildcardBound::Extends(b)) | Type::Wildcard(WildcardBound::Super(b)) => {
                b.for_each_type_var(f)
            }
            Type::Intersection(parts) => {
                for part in parts {
                    part.for_each_type_var(f);
                }
            }
            _ => {}
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

impl ClassKind {
    pub fn is_interface(self) -> bool {
        matches!(self, ClassKind::Interface | ClassKind::Annotation)
    }
}

/// Kinds of declarations an annotation may be applied to (`java.lang.annotation.ElementType`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Type,
    Field,
    Method,
    Parameter,
    Constructor,
    LocalVariable,
    AnnotationType,
    Package,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationUse {
    pub annotation: ClassId,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: Type,
    pub is_static: bool,
    pub is_final: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub is_static: bool,
    /// The last parameter is declared `T...` and stored as `T[]`.
    pub is_varargs: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorDef {
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub is_varargs: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    /// Lexically enclosing class for member classes.
    pub outer: Option<ClassId>,
    /// `static` member classes do not see the enclosing class's type variables.
    pub is_static: bool,
    pub is_final: bool,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub fields: Vec<FieldDef>,
    pub constructors: Vec<ConstructorDef>,
    pub methods: Vec<MethodDef>,
    pub annotations: Vec<AnnotationUse>,
    /// `@Target` of an annotation type; `None` means applicable everywhere.
    pub annotation_targets: Option<Vec<ElementKind>>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    /// Inner classes are non-static member classes; they capture the enclosing instance.
    pub fn is_inner(&self) -> bool {
        self.outer.is_some() && !self.is_static && !self.kind.is_interface()
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit(['.', '$']).next().unwrap_or(&self.name)
    }
}

/// Kind of declaration a type variable belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeVarKind {
    Class,
    Method,
    Constructor,
    Synthetic,
}

/// Declaration site of a type variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeVarOwner {
    /// Not yet attached to a declaration; [`TypeStore::define_class`] attaches class formals.
    Unattached,
    Class(ClassId),
    Method { class: ClassId, method: String },
    Constructor(ClassId),
    /// Capture variables and other compiler-generated variables.
    Synthetic,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub name: String,
    pub owner: TypeVarOwner,
    /// Empty means `Object`.
    pub upper_bounds: Vec<Type>,
    pub lower_bound: Option<Type>,
    /// `false` until the bound expression has been resolved.
    pub resolved: bool,
}

impl TypeParamDef {
    pub fn new(name: impl Into<String>, upper_bounds: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            owner: TypeVarOwner::Unattached,
            upper_bounds,
            lower_bound: None,
            resolved: true,
        }
    }

    pub fn kind(&self) -> TypeVarKind {
        match self.owner {
            TypeVarOwner::Class(_) => TypeVarKind::Class,
            TypeVarOwner::Method { .. } => TypeVarKind::Method,
            TypeVarOwner::Constructor(_) => TypeVarKind::Constructor,
            TypeVarOwner::Unattached | TypeVarOwner::Synthetic => TypeVarKind::Synthetic,
        }
    }

    /// The class whose instances a class-level type variable is scoped to.
    pub fn declaring_class(&self) -> Option<ClassId> {
        match self.owner {
            TypeVarOwner::Class(id) => Some(id),
            _ => None,
        }
    }
}

/// Read-only view of the symbol table.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;
}

/// Formal type parameters of `def` including those of enclosing classes it can see, outermost
/// first.
pub fn class_formals(env: &dyn TypeEnv, def: ClassId) -> Vec<TypeVarId> {
    fn collect(env: &dyn TypeEnv, def: ClassId, out: &mut Vec<TypeVarId>, depth: u8) {
        let Some(class_def) = env.class(def) else {
            return;
        };
        if class_def.is_inner() && depth > 0 {
            if let Some(outer) = class_def.outer {
                collect(env, outer, out, depth - 1);
            }
        }
        out.extend(class_def.type_params.iter().copied());
    }

    let mut out = Vec::new();
    collect(env, def, &mut out, 32);
    out
}

/// The upper bound of a type variable as a single type (`Object`, one bound, or an intersection).
pub fn upper_bound(env: &dyn TypeEnv, tv: TypeVarId) -> Type {
    let object = Type::class(env.well_known().object, vec![]);
    match env.type_param(tv) {
        Some(def) => match def.upper_bounds.as_slice() {
            [] => object,
            [single] => single.clone(),
            many => Type::Intersection(many.to_vec()),
        },
        None => object,
    }
}

pub fn is_interface(env: &dyn TypeEnv, def: ClassId) -> bool {
    env.class(def).is_some_and(|c| c.kind.is_interface())
}
