use std::sync::Arc;

use genus_types::{
    erasure, format_type, instantiate_array_base, instantiate_member, is_assignable, is_reifiable,
    is_subtype, resolve_class_use, ClassDef, ClassId, ClassKind, FieldDef, Span, TyContext, Type,
    TypeEnv, TypeError, TypeStore, WildcardBound,
};
use pretty_assertions::assert_eq;

struct Nested {
    store: TypeStore,
    outer: ClassId,
    inner: ClassId,
    nested: ClassId,
}

/// `class Outer<T> { class Inner<U> {} static class Nested<V> {} }`
fn nested_store() -> Nested {
    let mut store = TypeStore::with_minimal_jdk();
    let object = Type::class(store.well_known().object, vec![]);
    let t = store.add_type_param("T", vec![]);
    let outer = store.add_class(ClassDef {
        type_params: vec![t],
        super_class: Some(object.clone()),
        ..ClassDef::new("com.example.Outer", ClassKind::Class)
    });
    let u = store.add_type_param("U", vec![]);
    let inner = store.add_class(ClassDef {
        outer: Some(outer),
        type_params: vec![u],
        super_class: Some(object.clone()),
        ..ClassDef::new("com.example.Outer.Inner", ClassKind::Class)
    });
    let v = store.add_type_param("V", vec![]);
    let nested = store.add_class(ClassDef {
        outer: Some(outer),
        is_static: true,
        type_params: vec![v],
        super_class: Some(object),
        ..ClassDef::new("com.example.Outer.Nested", ClassKind::Class)
    });
    Nested {
        store,
        outer,
        inner,
        nested,
    }
}

#[test]
fn raw_outer_makes_inner_class_raw() {
    let fx = nested_store();
    let mut ctx = TyContext::new(&fx.store);
    let ty = instantiate_member(&mut ctx, &Type::Raw(fx.outer), fx.inner, &[], Span::synthetic())
        .expect("Outer.Inner through a raw Outer");
    assert_eq!(ty, Type::Raw(fx.inner));
}

#[test]
fn type_arguments_on_a_member_of_a_raw_type_are_rare() {
    let fx = nested_store();
    let string = Type::class(fx.store.well_known().string, vec![]);
    let mut ctx = TyContext::new(&fx.store);

    let err = instantiate_member(
        &mut ctx,
        &Type::Raw(fx.outer),
        fx.inner,
        &[string],
        Span::new(5, 30),
    )
    .expect_err("raw Outer with Inner<String>");
    assert!(matches!(err, TypeError::RareType { .. }), "{err:?}");
    assert_eq!(err.to_diagnostic().expect("user-facing").code, "rare-type");
}

#[test]
fn raw_inner_class_of_a_parameterized_outer_is_rare() {
    let fx = nested_store();
    let string = Type::class(fx.store.well_known().string, vec![]);
    let mut ctx = TyContext::new(&fx.store);
    let outer = Type::class(fx.outer, vec![string]);

    let err = instantiate_member(&mut ctx, &outer, fx.inner, &[], Span::synthetic())
        .expect_err("Outer<String>.Inner");
    assert!(matches!(err, TypeError::RareType { .. }), "{err:?}");
}

#[test]
fn inner_class_arguments_follow_the_enclosing_arguments() {
    let fx = nested_store();
    let wk = fx.store.well_known().clone();
    let string = Type::class(wk.string, vec![]);
    let integer = Type::class(wk.integer, vec![]);
    let mut ctx = TyContext::new(&fx.store);

    let ty = instantiate_member(
        &mut ctx,
        &Type::class(fx.outer, vec![string.clone()]),
        fx.inner,
        &[integer.clone()],
        Span::synthetic(),
    )
    .expect("Outer<String>.Inner<Integer>");
    assert_eq!(ty, Type::class(fx.inner, vec![string, integer]));
    assert_eq!(format_type(&ctx, &ty), "Outer<String>.Inner<Integer>");
}

#[test]
fn static_nested_classes_ignore_the_enclosing_instantiation() {
    let fx = nested_store();
    let string = Type::class(fx.store.well_known().string, vec![]);
    let mut ctx = TyContext::new(&fx.store);

    let through_raw = instantiate_member(
        &mut ctx,
        &Type::Raw(fx.outer),
        fx.nested,
        &[string.clone()],
        Span::synthetic(),
    )
    .expect("static member of a raw type may be parameterized");
    assert_eq!(through_raw, Type::class(fx.nested, vec![string]));

    let raw_use = resolve_class_use(&mut ctx, fx.nested, &[], Span::synthetic()).expect("raw use");
    assert_eq!(raw_use, Type::Raw(fx.nested));
}

#[test]
fn raw_member_view_erases_instance_members_only() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let list = store.class_id("java.util.List").expect("List");
    let string = Type::class(wk.string, vec![]);
    let t = store.add_type_param("T", vec![Type::class(wk.number, vec![])]);
    let holder = store.add_class(ClassDef {
        type_params: vec![t],
        super_class: Some(Type::class(wk.object, vec![])),
        interfaces: vec![Type::class(wk.comparable, vec![Type::TypeVar(t)])],
        fields: vec![
            FieldDef {
                name: "value".to_string(),
                ty: Type::TypeVar(t),
                is_static: false,
                is_final: false,
            },
            FieldDef {
                name: "items".to_string(),
                ty: Type::class(list, vec![Type::TypeVar(t)]),
                is_static: false,
                is_final: false,
            },
            FieldDef {
                name: "NAMES".to_string(),
                ty: Type::class(list, vec![string.clone()]),
                is_static: true,
                is_final: true,
            },
        ],
        ..ClassDef::new("com.example.Holder", ClassKind::Class)
    });

    let mut ctx = TyContext::new(&store);
    let view = ctx.raw_of(holder).expect("Holder is generic");
    assert_eq!(view.field("value").map(|f| &f.ty), Some(&Type::class(wk.number, vec![])));
    assert_eq!(view.field("items").map(|f| &f.ty), Some(&Type::Raw(list)));
    assert_eq!(
        view.field("NAMES").map(|f| &f.ty),
        Some(&Type::class(list, vec![string]))
    );
    assert_eq!(view.interfaces, vec![Type::Raw(wk.comparable)]);

    let again = ctx.raw_of(holder).expect("memoized");
    assert!(Arc::ptr_eq(&view, &again));
}

#[test]
fn raw_list_methods_return_object() {
    let store = TypeStore::with_minimal_jdk();
    let list = store.class_id("java.util.List").expect("List");
    let object = Type::class(store.well_known().object, vec![]);

    let mut ctx = TyContext::new(&store);
    let view = ctx.raw_of(list).expect("List is generic");
    let get = view.methods_named("get").next().expect("List.get");
    assert_eq!(get.return_type, object);
    assert_eq!(get.params, vec![Type::int()]);
}

#[test]
fn raw_types_relate_to_their_parameterizations() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known();
    let list = store.class_id("java.util.List").expect("List");
    let collection = store.class_id("java.util.Collection").expect("Collection");
    let list_of_string = Type::class(list, vec![Type::class(wk.string, vec![])]);

    assert!(is_subtype(&store, &list_of_string, &Type::Raw(list)));
    assert!(is_subtype(&store, &Type::Raw(list), &Type::Raw(collection)));
    assert!(!is_subtype(&store, &Type::Raw(list), &list_of_string));
    // Unchecked conversion.
    assert!(is_assignable(&store, &Type::Raw(list), &list_of_string));
}

#[test]
fn erasure_follows_leftmost_bounds() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let list = store.class_id("java.util.List").expect("List");
    let number = Type::class(wk.number, vec![]);

    let t = store.add_type_param(
        "T",
        vec![
            number.clone(),
            Type::class(wk.comparable, vec![Type::class(wk.integer, vec![])]),
        ],
    );
    let u = store.add_type_param("U", vec![Type::TypeVar(t)]);

    assert_eq!(erasure(&store, &Type::TypeVar(t)), number);
    assert_eq!(erasure(&store, &Type::TypeVar(u)), number);
    assert_eq!(
        erasure(&store, &Type::class(list, vec![Type::TypeVar(u)])),
        Type::Raw(list)
    );
    assert_eq!(
        erasure(&store, &Type::array(Type::TypeVar(t))),
        Type::array(number.clone())
    );
    assert_eq!(
        erasure(
            &store,
            &Type::Intersection(vec![
                Type::class(wk.serializable, vec![]),
                number.clone()
            ])
        ),
        number
    );
}

#[test]
fn generic_array_creation_requires_a_reifiable_element() {
    let mut store = TypeStore::with_minimal_jdk();
    let list = store.class_id("java.util.List").expect("List");
    let string = Type::class(store.well_known().string, vec![]);
    let t = store.add_type_param("T", vec![]);

    let list_of_string = Type::class(list, vec![string]);
    let list_of_any = Type::class(list, vec![Type::Wildcard(WildcardBound::Unbounded)]);

    assert!(!is_reifiable(&store, &list_of_string));
    assert!(!is_reifiable(&store, &Type::TypeVar(t)));
    assert!(is_reifiable(&store, &list_of_any));
    assert!(is_reifiable(&store, &Type::Raw(list)));

    let err = instantiate_array_base(&store, &list_of_string, Span::new(0, 4))
        .expect_err("new List<String>[1]");
    assert_eq!(
        err,
        TypeError::NotReifiable {
            ty: "List<String>".to_string(),
            span: Span::new(0, 4)
        }
    );
    assert_eq!(
        instantiate_array_base(&store, &list_of_any, Span::synthetic()),
        Ok(Type::array(list_of_any.clone()))
    );
}
