use genus_core::Span;
use genus_typeck::{conditional_narrowing, type_conditional, CheckError, ConstValue, Constness, Operand};
use genus_types::{box_primitive, PrimitiveType, TyContext, Type, TypeEnv, TypeStore};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn sp(start: usize) -> Span {
    Span::new(start, start + 1)
}

fn cond() -> Operand {
    Operand::value(Type::boolean(), sp(0))
}

fn value(ty: Type) -> Operand {
    Operand::value(ty, sp(4))
}

fn int_const(v: i32) -> Operand {
    Operand::value(Type::int(), sp(8)).with_constant(Constness::Known(ConstValue::Int(v)))
}

fn conditional_type(store: &TypeStore, then: &Operand, otherwise: &Operand) -> Type {
    let mut ctx = TyContext::new(store);
    type_conditional(&mut ctx, &cond(), then, otherwise, Span::new(0, 10))
        .expect("conditional should type")
        .ty
}

#[test]
fn condition_must_be_boolean() {
    let store = TypeStore::with_minimal_jdk();
    let mut ctx = TyContext::new(&store);
    let boxed_flag = Operand::value(box_primitive(&store, PrimitiveType::Boolean), sp(0));
    assert!(type_conditional(&mut ctx, &boxed_flag, &int_const(1), &int_const(2), sp(0)).is_ok());

    let err = type_conditional(&mut ctx, &int_const(1), &int_const(1), &int_const(2), sp(0))
        .expect_err("int condition");
    assert_eq!(
        err,
        CheckError::ConditionNotBoolean {
            ty: "int".into(),
            span: sp(8),
        }
    );
}

#[test]
fn identical_boolean_and_null_branches() {
    let store = TypeStore::with_minimal_jdk();
    let integer = box_primitive(&store, PrimitiveType::Int);
    let boolean_box = box_primitive(&store, PrimitiveType::Boolean);
    let string = Type::class(store.well_known().string, vec![]);

    assert_eq!(
        conditional_type(&store, &value(integer.clone()), &value(integer.clone())),
        integer.clone()
    );
    assert_eq!(
        conditional_type(&store, &value(boolean_box), &value(Type::boolean())),
        Type::boolean()
    );
    assert_eq!(
        conditional_type(&store, &value(Type::Null), &value(Type::int())),
        integer
    );
    assert_eq!(
        conditional_type(&store, &value(string.clone()), &value(Type::Null)),
        string
    );
}

#[test]
fn numeric_branches_narrow_or_promote() {
    let store = TypeStore::with_minimal_jdk();
    let byte = Type::Primitive(PrimitiveType::Byte);
    let char_ = Type::Primitive(PrimitiveType::Char);
    let short_box = box_primitive(&store, PrimitiveType::Short);
    let byte_box = box_primitive(&store, PrimitiveType::Byte);
    let integer = box_primitive(&store, PrimitiveType::Int);
    let double_box = box_primitive(&store, PrimitiveType::Double);

    assert_eq!(
        conditional_type(&store, &value(byte.clone()), &value(short_box)),
        Type::Primitive(PrimitiveType::Short)
    );
    assert_eq!(
        conditional_type(&store, &value(byte_box), &int_const(10)),
        byte
    );
    // Not representable: ordinary promotion.
    assert_eq!(
        conditional_type(&store, &int_const(70_000), &value(char_.clone())),
        Type::int()
    );
    assert_eq!(conditional_type(&store, &value(char_), &int_const(65)), Type::Primitive(PrimitiveType::Char));
    assert_eq!(
        conditional_type(&store, &value(integer), &value(double_box)),
        Type::Primitive(PrimitiveType::Double)
    );
}

#[test]
fn pending_constant_defers_only_when_narrowing_depends_on_it() {
    let store = TypeStore::with_minimal_jdk();
    let pending = Operand::value(Type::int(), sp(8)).with_constant(Constness::Pending);
    let short = Operand::value(Type::Primitive(PrimitiveType::Short), sp(4));
    let long = Operand::value(Type::Primitive(PrimitiveType::Long), sp(4));

    let err = conditional_narrowing(&store, &short, &pending).expect_err("value needed");
    assert!(err.is_not_ready());

    assert_eq!(conditional_narrowing(&store, &long, &pending), Ok(None));
    assert_eq!(conditional_type(&store, &long, &pending), Type::Primitive(PrimitiveType::Long));
}

#[test]
fn reference_branches_use_the_least_upper_bound() {
    let store = TypeStore::with_minimal_jdk();
    let list = store.class_id("java.util.List").expect("List");
    let array_list = store.class_id("java.util.ArrayList").expect("ArrayList");
    let string = Type::class(store.well_known().string, vec![]);
    let list_of_string = Type::class(list, vec![string.clone()]);

    assert_eq!(
        conditional_type(
            &store,
            &value(Type::class(array_list, vec![string])),
            &value(list_of_string.clone())
        ),
        list_of_string
    );

    let integers = Type::array(box_primitive(&store, PrimitiveType::Int));
    let doubles = Type::array(box_primitive(&store, PrimitiveType::Double));
    let number = Type::class(store.well_known().number, vec![]);
    match conditional_type(&store, &value(integers), &value(doubles)) {
        Type::Array(elem) => match *elem {
            Type::Intersection(parts) => assert_eq!(parts.first(), Some(&number)),
            other => panic!("expected an intersection element, got {other:?}"),
        },
        other => panic!("expected an array, got {other:?}"),
    }
}

#[test]
fn constant_condition_selects_a_branch_value() {
    let store = TypeStore::with_minimal_jdk();
    let mut ctx = TyContext::new(&store);
    let always = Operand::literal(&store, ConstValue::Boolean(false), sp(0));
    let letter = Operand::literal(&store, ConstValue::Char(u16::from(b'a')), sp(4));

    let result = type_conditional(&mut ctx, &always, &int_const(1), &letter, sp(0))
        .expect("constant conditional");
    assert_eq!(result.ty, Type::Primitive(PrimitiveType::Char));
    assert_eq!(result.constant, Constness::Known(ConstValue::Char(97)));

    let runtime = type_conditional(&mut ctx, &cond(), &int_const(1), &int_const(2), sp(0))
        .expect("runtime conditional");
    assert_eq!(runtime.constant, Constness::NotConstant);
}

const NUMERIC: [PrimitiveType; 7] = [
    PrimitiveType::Byte,
    PrimitiveType::Short,
    PrimitiveType::Char,
    PrimitiveType::Int,
    PrimitiveType::Long,
    PrimitiveType::Float,
    PrimitiveType::Double,
];

fn arb_branch(store: &TypeStore) -> impl Strategy<Value = Operand> {
    let boxed: Vec<Type> = NUMERIC.iter().map(|p| box_primitive(store, *p)).collect();
    prop_oneof![
        proptest::sample::select(NUMERIC.to_vec()).prop_map(|p| value(Type::Primitive(p))),
        proptest::sample::select(boxed).prop_map(value),
        (-70_000i32..70_000).prop_map(int_const),
    ]
}

proptest! {
    #[test]
    fn numeric_result_ignores_branch_order(
        (a, b) in {
            let store = TypeStore::with_minimal_jdk();
            (arb_branch(&store), arb_branch(&store))
        }
    ) {
        let store = TypeStore::with_minimal_jdk();
        prop_assert_eq!(conditional_type(&store, &a, &b), conditional_type(&store, &b, &a));
    }
}
