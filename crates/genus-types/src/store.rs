use std::collections::HashMap;

use genus_core::Span;

use crate::{
    ClassDef, ClassId, ClassKind, PendingTypeVar, TypeEnv, TypeParamDef, TypeVarId, TypeVarOwner,
};

/// Ids of the platform classes the engine needs to know about.
///
/// A fresh [`TypeStore`] interns placeholders for all of them so the ids are stable even before the
/// platform library is loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub number: ClassId,
    pub boolean: ClassId,
    pub byte: ClassId,
    pub short: ClassId,
    pub character: ClassId,
    pub integer: ClassId,
    pub long: ClassId,
    pub float: ClassId,
    pub double: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub comparable: ClassId,
    pub iterable: ClassId,
    pub enum_: ClassId,
    pub annotation: ClassId,
    pub override_: ClassId,
    pub target: ClassId,
}

/// The shared symbol table: class declarations and type variable declarations.
#[derive(Clone, Debug)]
pub struct TypeStore {
    classes: Vec<ClassDef>,
    class_by_name: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: WellKnownTypes,
}

impl Default for TypeStore {
    fn default() -> Self {
        let mut classes = Vec::new();
        let mut class_by_name = HashMap::new();
        let mut intern = |name: &str| {
            let id = ClassId::from_raw(classes.len() as u32);
            classes.push(ClassDef::new(name, ClassKind::Class));
            class_by_name.insert(name.to_string(), id);
            id
        };

        let well_known = WellKnownTypes {
            object: intern("java.lang.Object"),
            string: intern("java.lang.String"),
            number: intern("java.lang.Number"),
            boolean: intern("java.lang.Boolean"),
            byte: intern("java.lang.Byte"),
            short: intern("java.lang.Short"),
            character: intern("java.lang.Character"),
            integer: intern("java.lang.Integer"),
            long: intern("java.lang.Long"),
            float: intern("java.lang.Float"),
            double: intern("java.lang.Double"),
            cloneable: intern("java.lang.Cloneable"),
            serializable: intern("java.io.Serializable"),
            comparable: intern("java.lang.Comparable"),
            iterable: intern("java.lang.Iterable"),
            enum_: intern("java.lang.Enum"),
            annotation: intern("java.lang.annotation.Annotation"),
            override_: intern("java.lang.Override"),
            target: intern("java.lang.annotation.Target"),
        };

        Self {
            classes,
            class_by_name,
            type_params: Vec::new(),
            well_known,
        }
    }
}

impl TypeStore {
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    /// Return the id for `name`, creating an empty placeholder declaration if needed.
    ///
    /// Placeholders allow mutually recursive declarations to refer to each other before either
    /// is defined.
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.class_by_name.get(name) {
            return *id;
        }
        let id = ClassId::from_raw(self.classes.len() as u32);
        self.classes.push(ClassDef::new(name, ClassKind::Class));
        self.class_by_name.insert(name.to_string(), id);
        id
    }

    /// Replace the declaration behind `id`, attaching its type variables to it.
    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        let idx = id.to_raw() as usize;
        if idx >= self.classes.len() {
            tracing::warn!(target: "genus.types", ?id, name = %def.name, "define_class on unknown id");
            return;
        }

        for tv in &def.type_params {
            self.attach(*tv, TypeVarOwner::Class(id));
        }
        for method in &def.methods {
            for tv in &method.type_params {
                self.attach(
                    *tv,
                    TypeVarOwner::Method {
                        class: id,
                        method: method.name.clone(),
                    },
                );
            }
        }
        for ctor in &def.constructors {
            for tv in &ctor.type_params {
                self.attach(*tv, TypeVarOwner::Constructor(id));
            }
        }

        let old_name = std::mem::take(&mut self.classes[idx].name);
        if old_name != def.name {
            self.class_by_name.remove(&old_name);
        }
        self.class_by_name.insert(def.name.clone(), id);
        self.classes[idx] = def;
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class_id(&def.name);
        self.define_class(id, def);
        id
    }

    /// Define `def` under its name, replacing any previous declaration with that name.
    pub fn upsert_class(&mut self, def: ClassDef) -> ClassId {
        self.add_class(def)
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.to_raw() as usize)
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassDef)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(idx, def)| (ClassId::from_raw(idx as u32), def))
    }

    /// Add an already-resolved type variable. Convenient for platform declarations whose
    /// bounds are known up front.
    pub fn add_type_param(
        &mut self,
        name: impl Into<String>,
        upper_bounds: Vec<crate::Type>,
    ) -> TypeVarId {
        self.push_type_param(TypeParamDef::new(name, upper_bounds))
    }

    pub fn define_type_param(&mut self, id: TypeVarId, def: TypeParamDef) {
        if let Some(slot) = self.type_params.get_mut(id.to_raw() as usize) {
            *slot = def;
        }
    }

    /// Phase one of the bound model: allocate an identity for a type variable whose bounds have
    /// not been resolved yet.
    ///
    /// The returned handle must be [resolved](PendingTypeVar::resolve) exactly once. Until then
    /// bound-dependent checks involving the variable report [`crate::TypeError::NotReady`].
    pub fn build_type_variable(
        &mut self,
        name: impl Into<String>,
        owner: TypeVarOwner,
        span: Span,
    ) -> PendingTypeVar {
        let id = self.push_type_param(TypeParamDef {
            name: name.into(),
            owner,
            upper_bounds: Vec::new(),
            lower_bound: None,
            resolved: false,
        });
        PendingTypeVar::new(id, span)
    }

    pub(crate) fn type_param_mut(&mut self, id: TypeVarId) -> Option<&mut TypeParamDef> {
        if id.context_local_index().is_some() {
            return None;
        }
        self.type_params.get_mut(id.to_raw() as usize)
    }

    fn push_type_param(&mut self, def: TypeParamDef) -> TypeVarId {
        let id = TypeVarId::from_raw(self.type_params.len() as u32);
        self.type_params.push(def);
        id
    }

    fn attach(&mut self, tv: TypeVarId, owner: TypeVarOwner) {
        if let Some(def) = self.type_param_mut(tv) {
            if def.owner == TypeVarOwner::Unattached {
                def.owner = owner;
            }
        }
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.to_raw() as usize)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        if id.context_local_index().is_some() {
            return None;
        }
        self.type_params.get(id.to_raw() as usize)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.class_id(name)
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }
}
