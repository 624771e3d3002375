use genus_types::{
    erasure, format_type, is_subtype, lub, lub_uncaptured, ClassDef, ClassKind, EngineOptions,
    TyContext, Type, TypeEnv, TypeStore, WildcardBound,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn pool(store: &TypeStore) -> Vec<Type> {
    let wk = store.well_known();
    let list = store.class_id("java.util.List").expect("List");
    let collection = store.class_id("java.util.Collection").expect("Collection");
    let array_list = store.class_id("java.util.ArrayList").expect("ArrayList");
    let class = |def| Type::class(def, vec![]);
    vec![
        class(wk.object),
        class(wk.string),
        class(wk.number),
        class(wk.integer),
        class(wk.double),
        class(wk.boolean),
        class(wk.serializable),
        Type::class(wk.comparable, vec![class(wk.string)]),
        Type::class(list, vec![class(wk.integer)]),
        Type::class(list, vec![class(wk.string)]),
        Type::class(array_list, vec![class(wk.string)]),
        Type::class(collection, vec![class(wk.number)]),
        Type::class(list, vec![Type::wildcard_extends(class(wk.integer))]),
        Type::class(array_list, vec![Type::wildcard_super(class(wk.integer))]),
        Type::class(list, vec![Type::wildcard_super(class(wk.number))]),
        Type::Raw(list),
        Type::array(class(wk.integer)),
        Type::array(class(wk.string)),
        Type::array(Type::int()),
    ]
}

#[test]
fn lub_of_a_class_and_its_superclass_is_the_superclass() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known();
    let number = Type::class(wk.number, vec![]);

    let mut ctx = TyContext::new(&store);
    assert_eq!(
        lub(&mut ctx, &[Type::class(wk.integer, vec![]), number.clone()]),
        number
    );
}

#[test]
fn lub_of_numeric_wrappers_is_number_and_comparable() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known();
    let integer = Type::class(wk.integer, vec![]);
    let double = Type::class(wk.double, vec![]);

    let mut ctx = TyContext::new(&store);
    let result = lub_uncaptured(&mut ctx, &[integer, double]);
    assert_eq!(
        format_type(&ctx, &result),
        "Number & Comparable<? extends Number & Comparable<?>>"
    );
}

#[test]
fn lub_result_is_capture_converted() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known();
    let list = store.class_id("java.util.List").expect("List");
    let list_of = |def| Type::class(list, vec![Type::class(def, vec![])]);

    let mut ctx = TyContext::new(&store);
    let result = lub(&mut ctx, &[list_of(wk.integer), list_of(wk.double)]);
    let Type::Class(ct) = &result else {
        panic!("expected List<CAP>, got {result:?}");
    };
    assert_eq!(ct.def, list);
    assert!(matches!(ct.args.as_slice(), [Type::TypeVar(cap)] if cap.is_capture()));
    assert_eq!(format_type(&ctx, &result), "List<CAP#1>");
}

#[test]
fn lub_of_reference_arrays_is_an_array_of_the_lub() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known();
    let mut ctx = TyContext::new(&store);

    let result = lub(
        &mut ctx,
        &[
            Type::array(Type::class(wk.integer, vec![])),
            Type::array(Type::class(wk.number, vec![])),
        ],
    );
    assert_eq!(result, Type::array(Type::class(wk.number, vec![])));
}

#[test]
fn lub_of_primitive_arrays_falls_back_to_array_supertypes() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known();
    let mut ctx = TyContext::new(&store);

    let result = lub(
        &mut ctx,
        &[Type::array(Type::int()), Type::array(Type::boolean())],
    );
    assert_eq!(
        result,
        Type::Intersection(vec![
            Type::class(wk.cloneable, vec![]),
            Type::class(wk.serializable, vec![]),
        ])
    );
}

#[test]
fn null_contributes_nothing_and_primitives_are_boxed() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known();
    let string = Type::class(wk.string, vec![]);
    let mut ctx = TyContext::new(&store);

    assert_eq!(lub(&mut ctx, &[Type::Null, string.clone()]), string);
    assert_eq!(
        lub(&mut ctx, &[Type::int(), Type::Null]),
        Type::class(wk.integer, vec![])
    );
}

#[test]
fn raw_invocations_make_the_candidate_raw() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known();
    let list = store.class_id("java.util.List").expect("List");
    let array_list = store.class_id("java.util.ArrayList").expect("ArrayList");
    let mut ctx = TyContext::new(&store);

    let result = lub(
        &mut ctx,
        &[
            Type::Raw(array_list),
            Type::class(list, vec![Type::class(wk.string, vec![])]),
        ],
    );
    assert_eq!(result, Type::Raw(list));
}

#[test]
fn common_type_variable_is_a_candidate() {
    let mut store = TypeStore::with_minimal_jdk();
    let number = Type::class(store.well_known().number, vec![]);
    let t = store.add_type_param("T", vec![number]);
    let u = store.add_type_param("U", vec![Type::TypeVar(t)]);
    let w = store.add_type_param("W", vec![Type::TypeVar(t)]);

    let mut ctx = TyContext::new(&store);
    assert_eq!(
        lub(&mut ctx, &[Type::TypeVar(u), Type::TypeVar(w)]),
        Type::TypeVar(t)
    );
}

#[test]
fn depth_limit_cuts_recursion_early() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known();
    let integer = Type::class(wk.integer, vec![]);
    let double = Type::class(wk.double, vec![]);

    let options = EngineOptions {
        lub_depth_limit: 1,
        ..EngineOptions::default()
    };
    let mut ctx = TyContext::with_options(&store, options);
    let result = lub_uncaptured(&mut ctx, &[integer, double]);
    assert_eq!(format_type(&ctx, &result), "Number & Comparable<?>");
}

#[test]
fn interface_only_hierarchies_produce_an_intersection() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let object = Type::class(wk.object, vec![]);
    let runnable = store.add_class(ClassDef::new("java.lang.Runnable", ClassKind::Interface));
    let task = store.add_class(ClassDef::new("com.example.Task", ClassKind::Interface));
    let class = |name: &str, store: &mut TypeStore| {
        store.add_class(ClassDef {
            super_class: Some(object.clone()),
            interfaces: vec![Type::class(runnable, vec![]), Type::class(task, vec![])],
            ..ClassDef::new(name, ClassKind::Class)
        })
    };
    let a = class("com.example.A", &mut store);
    let b = class("com.example.B", &mut store);

    let mut ctx = TyContext::new(&store);
    let result = lub(&mut ctx, &[Type::class(a, vec![]), Type::class(b, vec![])]);
    assert_eq!(format_type(&ctx, &result), "Runnable & Task");
    assert_eq!(
        erasure(&ctx, &result),
        Type::class(runnable, vec![]),
    );
}

#[test]
fn lub_of_unbounded_wildcard_lists_stays_unbounded() {
    let store = TypeStore::with_minimal_jdk();
    let list = store.class_id("java.util.List").expect("List");
    let any_list = Type::class(list, vec![Type::Wildcard(WildcardBound::Unbounded)]);
    let string_list = Type::class(list, vec![Type::class(store.well_known().string, vec![])]);

    let mut ctx = TyContext::new(&store);
    assert_eq!(lub_uncaptured(&mut ctx, &[any_list.clone(), string_list]), any_list);
}

#[test]
fn extends_and_super_arguments_meet_at_an_unbounded_wildcard() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known();
    let list = store.class_id("java.util.List").expect("List");
    let array_list = store.class_id("java.util.ArrayList").expect("ArrayList");
    let integer = Type::class(wk.integer, vec![]);
    let string = Type::class(wk.string, vec![]);
    let extends_integer = Type::class(list, vec![Type::wildcard_extends(integer.clone())]);
    let super_integer = Type::class(array_list, vec![Type::wildcard_super(integer)]);

    let mut ctx = TyContext::new(&store);
    let bound = lub_uncaptured(&mut ctx, &[extends_integer.clone(), super_integer.clone()]);
    assert_eq!(bound, Type::class(list, vec![Type::Wildcard(WildcardBound::Unbounded)]));
    assert!(is_subtype(&ctx, &extends_integer, &bound));
    assert!(is_subtype(&ctx, &super_integer, &bound));

    // String and Integer have no common subtype to act as a lower bound.
    let strings = Type::class(list, vec![string]);
    let bound = lub_uncaptured(&mut ctx, &[strings.clone(), super_integer.clone()]);
    assert_eq!(format_type(&ctx, &bound), "List<?>");
    assert!(is_subtype(&ctx, &strings, &bound));
}

proptest! {
    #[test]
    fn lub_is_reflexive(idx in 0usize..19) {
        let store = TypeStore::with_minimal_jdk();
        let ty = pool(&store)[idx].clone();
        let mut ctx = TyContext::new(&store);
        prop_assert_eq!(lub(&mut ctx, &[ty.clone(), ty.clone()]), ty);
    }

    #[test]
    fn lub_is_symmetric(a in 0usize..19, b in 0usize..19) {
        let store = TypeStore::with_minimal_jdk();
        let types = pool(&store);
        let (a, b) = (types[a].clone(), types[b].clone());

        let forward = lub(&mut TyContext::new(&store), &[a.clone(), b.clone()]);
        let backward = lub(&mut TyContext::new(&store), &[b, a]);
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn lub_is_an_upper_bound(a in 0usize..19, b in 0usize..19) {
        let store = TypeStore::with_minimal_jdk();
        let types = pool(&store);
        let (a, b) = (types[a].clone(), types[b].clone());

        let mut ctx = TyContext::new(&store);
        let bound = lub_uncaptured(&mut ctx, &[a.clone(), b.clone()]);
        let boxed = |ty: &Type| match ty {
            Type::Primitive(p) => genus_types::box_primitive(&store, *p),
            other => other.clone(),
        };
        prop_assert!(is_subtype(&ctx, &boxed(&a), &bound), "{:?} </: {:?}", a, bound);
        prop_assert!(is_subtype(&ctx, &boxed(&b), &bound), "{:?} </: {:?}", b, bound);
    }
}
