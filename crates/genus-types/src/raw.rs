//! Raw types: the member view of a generic declaration used without type arguments.

use std::sync::Arc;

use crate::{
    can_be_raw, erasure, format_type, to_raw_type, ClassId, ConstructorDef, FieldDef, MethodDef,
    TyContext, Type, TypeEnv, TypeError,
};

/// Member signatures of a generic declaration as seen through its raw type.
///
/// Instance members and constructors are erased. Static members keep their declared types since
/// they never depended on the class's type parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawClass {
    pub base: ClassId,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
    pub constructors: Vec<ConstructorDef>,
}

impl RawClass {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodDef> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }
}

impl TyContext<'_> {
    /// The raw view of a generic declaration, memoized per context.
    pub fn raw_of(&mut self, class: ClassId) -> Result<Arc<RawClass>, TypeError> {
        if let Some(view) = self.cached_raw_view(class) {
            return Ok(view);
        }
        if !can_be_raw(self, class) {
            let name = format_type(self, &Type::class(class, vec![]));
            return Err(TypeError::internal(format!(
                "`{name}` is not generic and has no raw form"
            )));
        }
        let view = Arc::new(build_raw_view(self, class)?);
        self.cache_raw_view(class, Arc::clone(&view));
        Ok(view)
    }
}

fn build_raw_view(env: &dyn TypeEnv, class: ClassId) -> Result<RawClass, TypeError> {
    let def = env
        .class(class)
        .ok_or_else(|| TypeError::internal(format!("unknown class {class:?}")))?;

    let fields = def
        .fields
        .iter()
        .map(|field| FieldDef {
            ty: if field.is_static {
                field.ty.clone()
            } else {
                erasure(env, &field.ty)
            },
            ..field.clone()
        })
        .collect();

    let methods = def
        .methods
        .iter()
        .map(|method| {
            if method.is_static {
                return method.clone();
            }
            MethodDef {
                type_params: Vec::new(),
                params: method.params.iter().map(|p| erasure(env, p)).collect(),
                return_type: erasure(env, &method.return_type),
                ..method.clone()
            }
        })
        .collect();

    let constructors = def
        .constructors
        .iter()
        .map(|ctor| ConstructorDef {
            type_params: Vec::new(),
            params: ctor.params.iter().map(|p| erasure(env, p)).collect(),
            is_varargs: ctor.is_varargs,
        })
        .collect();

    tracing::trace!(target: "genus.types", class = %def.name, "built raw member view");
    Ok(RawClass {
        base: class,
        super_class: def.super_class.as_ref().map(|sc| to_raw_type(env, sc)),
        interfaces: def.interfaces.iter().map(|i| to_raw_type(env, i)).collect(),
        fields,
        methods,
        constructors,
    })
}
