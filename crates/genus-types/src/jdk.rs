//! A small slice of the Java platform library, enough to exercise the engine.

use crate::{
    ClassDef, ClassId, ClassKind, ConstructorDef, ElementKind, MethodDef, PrimitiveType, Type,
    TypeEnv, TypeParamDef, TypeStore,
};

fn method(name: &str, params: Vec<Type>, return_type: Type) -> MethodDef {
    MethodDef {
        name: name.to_string(),
        type_params: Vec::new(),
        params,
        return_type,
        is_static: false,
        is_varargs: false,
    }
}

impl TypeStore {
    /// A store preloaded with `java.lang` basics, the wrapper classes, `Comparable`, the
    /// collection interfaces down to `ArrayList`, `Enum` and the annotation types.
    pub fn with_minimal_jdk() -> Self {
        let mut store = TypeStore::default();
        let wk = store.well_known().clone();
        let object = Type::class(wk.object, vec![]);
        let string = Type::class(wk.string, vec![]);
        let serializable = Type::class(wk.serializable, vec![]);
        let int = Type::Primitive(PrimitiveType::Int);
        let boolean = Type::Primitive(PrimitiveType::Boolean);
        let comparable_of =
            |def: ClassId| Type::class(wk.comparable, vec![Type::class(def, vec![])]);

        store.define_class(
            wk.object,
            ClassDef {
                methods: vec![
                    method("hashCode", vec![], int.clone()),
                    method("toString", vec![], string.clone()),
                    method("equals", vec![object.clone()], boolean.clone()),
                ],
                ..ClassDef::new("java.lang.Object", ClassKind::Class)
            },
        );
        store.define_class(
            wk.serializable,
            ClassDef::new("java.io.Serializable", ClassKind::Interface),
        );
        store.define_class(
            wk.cloneable,
            ClassDef::new("java.lang.Cloneable", ClassKind::Interface),
        );

        let comparable_t = store.add_type_param("T", vec![object.clone()]);
        store.define_class(
            wk.comparable,
            ClassDef {
                type_params: vec![comparable_t],
                methods: vec![method(
                    "compareTo",
                    vec![Type::TypeVar(comparable_t)],
                    int.clone(),
                )],
                ..ClassDef::new("java.lang.Comparable", ClassKind::Interface)
            },
        );

        let char_sequence = store.add_class(ClassDef {
            methods: vec![method("length", vec![], int.clone())],
            ..ClassDef::new("java.lang.CharSequence", ClassKind::Interface)
        });
        store.define_class(
            wk.string,
            ClassDef {
                is_final: true,
                super_class: Some(object.clone()),
                interfaces: vec![
                    serializable.clone(),
                    comparable_of(wk.string),
                    Type::class(char_sequence, vec![]),
                ],
                methods: vec![method("length", vec![], int.clone())],
                ..ClassDef::new("java.lang.String", ClassKind::Class)
            },
        );

        store.define_class(
            wk.number,
            ClassDef {
                super_class: Some(object.clone()),
                interfaces: vec![serializable.clone()],
                methods: vec![method("intValue", vec![], int.clone())],
                ..ClassDef::new("java.lang.Number", ClassKind::Class)
            },
        );

        let wrappers = [
            (wk.boolean, "java.lang.Boolean", PrimitiveType::Boolean),
            (wk.byte, "java.lang.Byte", PrimitiveType::Byte),
            (wk.short, "java.lang.Short", PrimitiveType::Short),
            (wk.character, "java.lang.Character", PrimitiveType::Char),
            (wk.integer, "java.lang.Integer", PrimitiveType::Int),
            (wk.long, "java.lang.Long", PrimitiveType::Long),
            (wk.float, "java.lang.Float", PrimitiveType::Float),
            (wk.double, "java.lang.Double", PrimitiveType::Double),
        ];
        for (id, name, prim) in wrappers {
            // Boolean and Character are not numbers.
            let numeric = !matches!(prim, PrimitiveType::Boolean | PrimitiveType::Char);
            let mut interfaces = vec![comparable_of(id)];
            if !numeric {
                interfaces.insert(0, serializable.clone());
            }
            store.define_class(
                id,
                ClassDef {
                    is_final: true,
                    super_class: Some(if numeric {
                        Type::class(wk.number, vec![])
                    } else {
                        object.clone()
                    }),
                    interfaces,
                    ..ClassDef::new(name, ClassKind::Class)
                },
            );
        }

        let iterable_t = store.add_type_param("T", vec![object.clone()]);
        let iterable = store.add_class(ClassDef {
            type_params: vec![iterable_t],
            ..ClassDef::new("java.lang.Iterable", ClassKind::Interface)
        });

        let collection_e = store.add_type_param("E", vec![object.clone()]);
        let collection = store.add_class(ClassDef {
            type_params: vec![collection_e],
            interfaces: vec![Type::class(iterable, vec![Type::TypeVar(collection_e)])],
            methods: vec![
                method("size", vec![], int.clone()),
                method("add", vec![Type::TypeVar(collection_e)], boolean.clone()),
            ],
            ..ClassDef::new("java.util.Collection", ClassKind::Interface)
        });

        let list_e = store.add_type_param("E", vec![object.clone()]);
        let list = store.add_class(ClassDef {
            type_params: vec![list_e],
            interfaces: vec![Type::class(collection, vec![Type::TypeVar(list_e)])],
            methods: vec![
                method("get", vec![int.clone()], Type::TypeVar(list_e)),
                method("add", vec![Type::TypeVar(list_e)], boolean.clone()),
            ],
            ..ClassDef::new("java.util.List", ClassKind::Interface)
        });

        let array_list_e = store.add_type_param("E", vec![object.clone()]);
        store.add_class(ClassDef {
            type_params: vec![array_list_e],
            super_class: Some(object.clone()),
            interfaces: vec![
                Type::class(list, vec![Type::TypeVar(array_list_e)]),
                serializable.clone(),
                Type::class(wk.cloneable, vec![]),
            ],
            constructors: vec![ConstructorDef {
                type_params: Vec::new(),
                params: Vec::new(),
                is_varargs: false,
            }],
            methods: vec![method("get", vec![int.clone()], Type::TypeVar(array_list_e))],
            ..ClassDef::new("java.util.ArrayList", ClassKind::Class)
        });

        // `Enum<E extends Enum<E>>`: the bound mentions the variable itself.
        let enum_e = store.add_type_param("E", Vec::new());
        store.define_type_param(
            enum_e,
            TypeParamDef::new("E", vec![Type::class(wk.enum_, vec![Type::TypeVar(enum_e)])]),
        );
        store.define_class(
            wk.enum_,
            ClassDef {
                super_class: Some(object.clone()),
                interfaces: vec![
                    Type::class(wk.comparable, vec![Type::TypeVar(enum_e)]),
                    serializable.clone(),
                ],
                methods: vec![
                    method("name", vec![], string.clone()),
                    method("ordinal", vec![], int),
                ],
                ..ClassDef::new("java.lang.Enum", ClassKind::Class)
            },
        );

        let annotation = Type::class(wk.annotation, vec![]);
        store.define_class(
            wk.annotation,
            ClassDef::new("java.lang.annotation.Annotation", ClassKind::Interface),
        );
        store.define_class(
            wk.override_,
            ClassDef {
                interfaces: vec![annotation.clone()],
                annotation_targets: Some(vec![ElementKind::Method]),
                ..ClassDef::new("java.lang.Override", ClassKind::Annotation)
            },
        );
        store.define_class(
            wk.target,
            ClassDef {
                interfaces: vec![annotation],
                annotation_targets: Some(vec![ElementKind::AnnotationType]),
                ..ClassDef::new("java.lang.annotation.Target", ClassKind::Annotation)
            },
        );

        let element_type = store.intern_class_id("java.lang.annotation.ElementType");
        store.define_class(
            element_type,
            ClassDef {
                is_final: true,
                super_class: Some(Type::class(wk.enum_, vec![Type::class(element_type, vec![])])),
                ..ClassDef::new("java.lang.annotation.ElementType", ClassKind::Enum)
            },
        );

        tracing::debug!(
            target: "genus.types",
            classes = store.classes().count(),
            "minimal JDK loaded"
        );
        store
    }
}
