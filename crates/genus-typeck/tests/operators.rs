use genus_core::Span;
use genus_typeck::{
    check_assert_condition, field_type, type_assign, type_binary, type_unary, AssignOp, BinaryOp,
    CheckError, ConstValue, Constness, Operand, Place, UnaryOp,
};
use genus_types::{
    ClassDef, ClassKind, FieldDef, PrimitiveType, TyContext, Type, TypeEnv, TypeStore,
    WildcardBound,
};
use pretty_assertions::assert_eq;

fn sp(start: usize) -> Span {
    Span::new(start, start + 1)
}

fn prim(p: PrimitiveType) -> Type {
    Type::Primitive(p)
}

fn boxed(store: &TypeStore, p: PrimitiveType) -> Type {
    genus_types::box_primitive(store, p)
}

fn int_const(value: i32, at: usize) -> Operand {
    Operand::value(Type::int(), sp(at)).with_constant(Constness::Known(ConstValue::Int(value)))
}

#[test]
fn wrapper_operands_are_unboxed_before_promotion() {
    let store = TypeStore::with_minimal_jdk();
    let integer = Operand::value(boxed(&store, PrimitiveType::Int), sp(0));
    let double = Operand::value(boxed(&store, PrimitiveType::Double), sp(4));
    let int = Operand::value(Type::int(), sp(4));

    let sum = type_binary(&store, BinaryOp::Add, &integer, &int, sp(0)).expect("Integer + int");
    assert_eq!(sum.ty, Type::int());

    let product = type_binary(&store, BinaryOp::Mul, &integer, &double, sp(0)).expect("Integer * Double");
    assert_eq!(product.ty, prim(PrimitiveType::Double));

    let long = Operand::value(boxed(&store, PrimitiveType::Long), sp(4));
    let cmp = type_binary(&store, BinaryOp::Less, &integer, &long, sp(0)).expect("Integer < Long");
    assert_eq!(cmp.ty, Type::boolean());

    let shift = type_binary(&store, BinaryOp::Shl, &long, &integer, sp(0)).expect("Long << Integer");
    assert_eq!(shift.ty, prim(PrimitiveType::Long));

    let flag = Operand::value(boxed(&store, PrimitiveType::Boolean), sp(0));
    let both = type_binary(&store, BinaryOp::BitAnd, &flag, &Operand::value(Type::boolean(), sp(4)), sp(0))
        .expect("Boolean & boolean");
    assert_eq!(both.ty, Type::boolean());
}

#[test]
fn non_numeric_wrapper_operand_is_reported_with_its_declared_type() {
    let store = TypeStore::with_minimal_jdk();
    let flag = Operand::value(boxed(&store, PrimitiveType::Boolean), Span::new(0, 4));
    let int = Operand::value(Type::int(), Span::new(7, 8));

    let err = type_binary(&store, BinaryOp::Sub, &flag, &int, Span::new(0, 8)).expect_err("Boolean - int");
    assert_eq!(
        err,
        CheckError::OperandType {
            op: "-",
            expected: "numeric",
            ty: "Boolean".into(),
            span: Span::new(0, 4),
        }
    );
    assert_eq!(err.code(), "operand-type");
}

#[test]
fn string_concatenation_folds_constants() {
    let store = TypeStore::with_minimal_jdk();
    let hello = Operand::literal(&store, ConstValue::String("n=".into()), sp(0));
    let one = int_const(1, 5);

    let concat = type_binary(&store, BinaryOp::Add, &hello, &one, sp(0)).expect("String + int");
    assert_eq!(concat.ty, Type::class(store.well_known().string, vec![]));
    assert_eq!(concat.constant, Constness::Known(ConstValue::String("n=1".into())));

    let integer = Operand::value(boxed(&store, PrimitiveType::Int), sp(5));
    let mixed = type_binary(&store, BinaryOp::Add, &hello, &integer, sp(0)).expect("String + Integer");
    assert_eq!(mixed.ty, Type::class(store.well_known().string, vec![]));
    assert_eq!(mixed.constant, Constness::NotConstant);
}

#[test]
fn equality_distinguishes_numeric_and_reference_comparison() {
    let store = TypeStore::with_minimal_jdk();
    let integer = Operand::value(boxed(&store, PrimitiveType::Int), sp(0));
    let long_box = Operand::value(boxed(&store, PrimitiveType::Long), sp(4));
    let long = Operand::value(prim(PrimitiveType::Long), sp(4));
    let null = Operand::value(Type::Null, sp(4));

    // Both wrappers: reference comparison, and Integer/Long are unrelated classes.
    let err = type_binary(&store, BinaryOp::EqEq, &integer, &long_box, sp(0)).expect_err("Integer == Long");
    assert_eq!(err.code(), "incomparable-types");

    for other in [&integer, &long, &null] {
        let ty = type_binary(&store, BinaryOp::NotEq, &integer, other, sp(0))
            .expect("comparable operands")
            .ty;
        assert_eq!(ty, Type::boolean());
    }

    let flag = Operand::value(Type::boolean(), sp(0));
    let err = type_binary(&store, BinaryOp::EqEq, &flag, &integer, sp(0)).expect_err("boolean == Integer");
    assert!(matches!(err, CheckError::Incomparable { .. }));
}

#[test]
fn constant_arithmetic_is_folded() {
    let store = TypeStore::with_minimal_jdk();
    let folded = type_binary(&store, BinaryOp::Mul, &int_const(6, 0), &int_const(7, 4), sp(0))
        .expect("6 * 7");
    assert_eq!(folded.constant, Constness::Known(ConstValue::Int(42)));

    let pending = Operand::value(Type::int(), sp(4)).with_constant(Constness::Pending);
    let deferred = type_binary(&store, BinaryOp::Add, &int_const(1, 0), &pending, sp(0))
        .expect("typing does not need the value");
    assert_eq!(deferred.ty, Type::int());
    assert_eq!(deferred.constant, Constness::Pending);

    let negated = type_unary(&store, UnaryOp::Neg, &int_const(5, 1), sp(0)).expect("-5");
    assert_eq!(negated.constant, Constness::Known(ConstValue::Int(-5)));
}

#[test]
fn unary_operators_on_wrappers() {
    let store = TypeStore::with_minimal_jdk();
    let integer = boxed(&store, PrimitiveType::Int);
    let var = Operand::variable(integer.clone(), sp(0));

    let inc = type_unary(&store, UnaryOp::PostInc, &var, sp(0)).expect("i++");
    assert_eq!(inc.ty, integer);

    let byte = Operand::value(boxed(&store, PrimitiveType::Byte), sp(1));
    assert_eq!(
        type_unary(&store, UnaryOp::Neg, &byte, sp(0)).expect("-Byte").ty,
        Type::int()
    );

    let long = Operand::value(boxed(&store, PrimitiveType::Long), sp(1));
    assert_eq!(
        type_unary(&store, UnaryOp::BitNot, &long, sp(0)).expect("~Long").ty,
        prim(PrimitiveType::Long)
    );

    let flag = Operand::value(boxed(&store, PrimitiveType::Boolean), sp(1));
    assert_eq!(
        type_unary(&store, UnaryOp::Not, &flag, sp(0)).expect("!Boolean").ty,
        Type::boolean()
    );

    let double = Operand::value(boxed(&store, PrimitiveType::Double), sp(1));
    let err = type_unary(&store, UnaryOp::BitNot, &double, sp(0)).expect_err("~Double");
    assert!(matches!(err, CheckError::OperandType { expected: "integral", .. }));
}

#[test]
fn increment_needs_a_mutable_variable() {
    let store = TypeStore::with_minimal_jdk();
    let integer = boxed(&store, PrimitiveType::Int);

    let value = Operand::value(integer.clone(), sp(2));
    assert_eq!(
        type_unary(&store, UnaryOp::PreInc, &value, sp(0)),
        Err(CheckError::NotAVariable { op: "++", span: sp(2) })
    );

    let constant = Operand::variable(integer, sp(2)).with_place(Place::FinalVariable);
    assert_eq!(
        type_unary(&store, UnaryOp::PostDec, &constant, sp(0)),
        Err(CheckError::FinalVariable { op: "--", span: sp(2) })
    );
}

#[test]
fn assignment_narrows_representable_int_constants() {
    let store = TypeStore::with_minimal_jdk();
    let byte_var = Operand::variable(prim(PrimitiveType::Byte), sp(0));
    let byte_box = Operand::variable(boxed(&store, PrimitiveType::Byte), sp(0));

    assert!(type_assign(&store, AssignOp::Assign, &byte_var, &int_const(10, 4), sp(0)).is_ok());
    assert!(type_assign(&store, AssignOp::Assign, &byte_box, &int_const(-128, 4), sp(0)).is_ok());

    let err = type_assign(&store, AssignOp::Assign, &byte_var, &int_const(200, 4), sp(0))
        .expect_err("200 does not fit a byte");
    assert_eq!(
        err,
        CheckError::Incompatible {
            from: "int".into(),
            to: "byte".into(),
            span: sp(4),
        }
    );

    let pending = Operand::value(Type::int(), sp(4)).with_constant(Constness::Pending);
    let err = type_assign(&store, AssignOp::Assign, &byte_var, &pending, sp(0)).expect_err("pending");
    assert!(err.is_not_ready());
    assert_eq!(err.to_diagnostic(), None);
}

#[test]
fn assignment_narrows_char_and_short_constants() {
    let store = TypeStore::with_minimal_jdk();
    let byte_var = Operand::variable(prim(PrimitiveType::Byte), sp(0));
    let char_var = Operand::variable(prim(PrimitiveType::Char), sp(0));

    let letter = Operand::literal(&store, ConstValue::Char(u16::from(b'a')), sp(4));
    assert!(type_assign(&store, AssignOp::Assign, &byte_var, &letter, sp(0)).is_ok());

    let short_const = Operand::value(prim(PrimitiveType::Short), sp(4))
        .with_place(Place::FinalVariable)
        .with_constant(Constness::Known(ConstValue::Int(10)));
    assert!(type_assign(&store, AssignOp::Assign, &byte_var, &short_const, sp(0)).is_ok());
    assert!(type_assign(&store, AssignOp::Assign, &char_var, &short_const, sp(0)).is_ok());

    let negative = Operand::value(prim(PrimitiveType::Short), sp(4))
        .with_constant(Constness::Known(ConstValue::Int(-1)));
    let err = type_assign(&store, AssignOp::Assign, &char_var, &negative, sp(0))
        .expect_err("-1 is not a char");
    assert_eq!(err.code(), "incompatible-types");

    // Only constant expressions narrow.
    let short_var = Operand::variable(prim(PrimitiveType::Short), sp(4));
    let err = type_assign(&store, AssignOp::Assign, &byte_var, &short_var, sp(0))
        .expect_err("short variable");
    assert_eq!(
        err,
        CheckError::Incompatible {
            from: "short".into(),
            to: "byte".into(),
            span: sp(4),
        }
    );

    let pending = Operand::value(prim(PrimitiveType::Short), sp(4)).with_constant(Constness::Pending);
    let err = type_assign(&store, AssignOp::Assign, &byte_var, &pending, sp(0)).expect_err("pending");
    assert!(err.is_not_ready());
}

#[test]
fn final_variables_only_take_their_initializer() {
    let store = TypeStore::with_minimal_jdk();
    let one = int_const(1, 5);

    let fixed = Operand::variable(Type::int(), sp(0)).with_place(Place::FinalVariable);
    assert_eq!(
        type_assign(&store, AssignOp::AddAssign, &fixed, &one, sp(0)),
        Err(CheckError::FinalVariable { op: "+=", span: sp(0) })
    );
    assert_eq!(
        type_assign(&store, AssignOp::Assign, &fixed, &one, sp(0)),
        Err(CheckError::FinalVariable { op: "=", span: sp(0) })
    );

    let declared = Operand::variable(Type::int(), sp(0)).with_place(Place::Initializer);
    let assigned = type_assign(&store, AssignOp::Assign, &declared, &one, sp(0))
        .expect("a final declaration takes its initializer");
    assert_eq!(assigned.constant, Constness::Known(ConstValue::Int(1)));
    assert_eq!(
        type_assign(&store, AssignOp::MulAssign, &declared, &one, sp(0)),
        Err(CheckError::FinalVariable { op: "*=", span: sp(0) })
    );
}

#[test]
fn assignment_boxes_and_unboxes() {
    let store = TypeStore::with_minimal_jdk();
    let integer = boxed(&store, PrimitiveType::Int);

    let long_var = Operand::variable(prim(PrimitiveType::Long), sp(0));
    let from_box = Operand::value(integer.clone(), sp(4));
    assert_eq!(
        type_assign(&store, AssignOp::Assign, &long_var, &from_box, sp(0)).map(|o| o.ty),
        Ok(prim(PrimitiveType::Long))
    );

    let box_var = Operand::variable(integer.clone(), sp(0));
    let int = Operand::value(Type::int(), sp(4));
    assert!(type_assign(&store, AssignOp::Assign, &box_var, &int, sp(0)).is_ok());

    let err = type_assign(&store, AssignOp::Assign, &int, &from_box, sp(0)).expect_err("not a variable");
    assert!(matches!(err, CheckError::NotAVariable { op: "=", .. }));
}

#[test]
fn compound_assignment_keeps_the_variable_type() {
    let store = TypeStore::with_minimal_jdk();
    let string = Type::class(store.well_known().string, vec![]);
    let integer = boxed(&store, PrimitiveType::Int);
    let object = Type::class(store.well_known().object, vec![]);
    let one = int_const(1, 5);

    let counter = Operand::variable(integer.clone(), sp(0));
    assert_eq!(
        type_assign(&store, AssignOp::AddAssign, &counter, &one, sp(0)).map(|o| o.ty),
        Ok(integer)
    );

    let text = Operand::variable(string.clone(), sp(0));
    assert_eq!(
        type_assign(&store, AssignOp::AddAssign, &text, &one, sp(0)).map(|o| o.ty),
        Ok(string.clone())
    );

    let any = Operand::variable(object, sp(0));
    let suffix = Operand::value(string, sp(5));
    let err = type_assign(&store, AssignOp::AddAssign, &any, &suffix, sp(0)).expect_err("Object += String");
    assert_eq!(err.code(), "incompatible-types");

    // The implied cast from a primitive result to a wrapper needs an exact box.
    let half = Operand::value(prim(PrimitiveType::Double), sp(5));
    let err = type_assign(&store, AssignOp::AddAssign, &counter, &half, sp(0))
        .expect_err("Integer += double");
    assert_eq!(
        err,
        CheckError::Incompatible {
            from: "double".into(),
            to: "Integer".into(),
            span: sp(5),
        }
    );
    let wide = Operand::value(prim(PrimitiveType::Long), sp(5));
    assert!(type_assign(&store, AssignOp::AddAssign, &counter, &wide, sp(0)).is_err());
    let small = Operand::variable(boxed(&store, PrimitiveType::Short), sp(0));
    assert!(type_assign(&store, AssignOp::AddAssign, &small, &one, sp(0)).is_err());

    // Primitive variables take any numeric result.
    let narrow = Operand::variable(prim(PrimitiveType::Byte), sp(0));
    assert_eq!(
        type_assign(&store, AssignOp::AddAssign, &narrow, &half, sp(0)).map(|o| o.ty),
        Ok(prim(PrimitiveType::Byte))
    );

    let flags = Operand::variable(Type::boolean(), sp(0));
    let shift = type_assign(&store, AssignOp::ShlAssign, &flags, &one, sp(0)).expect_err("boolean <<= int");
    assert!(matches!(shift, CheckError::OperandType { op: "<<", .. }));
}

#[test]
fn assert_condition_keeps_its_declared_type() {
    let store = TypeStore::with_minimal_jdk();
    let flag = boxed(&store, PrimitiveType::Boolean);

    assert_eq!(
        check_assert_condition(&store, &Operand::value(flag.clone(), sp(7))),
        Ok(flag)
    );
    let err = check_assert_condition(&store, &Operand::value(boxed(&store, PrimitiveType::Int), sp(7)))
        .expect_err("Integer condition");
    assert_eq!(
        err,
        CheckError::ConditionNotBoolean {
            ty: "Integer".into(),
            span: sp(7),
        }
    );
}

/// `class Box<T> { T value; static int COUNT; }` and `class StringBox extends Box<String> {}`
fn box_store() -> (TypeStore, genus_types::ClassId, genus_types::ClassId) {
    let mut store = TypeStore::with_minimal_jdk();
    let object = Type::class(store.well_known().object, vec![]);
    let t = store.add_type_param("T", vec![]);
    let box_class = store.add_class(ClassDef {
        type_params: vec![t],
        super_class: Some(object),
        fields: vec![
            FieldDef {
                name: "value".into(),
                ty: Type::TypeVar(t),
                is_static: false,
                is_final: false,
            },
            FieldDef {
                name: "COUNT".into(),
                ty: Type::int(),
                is_static: true,
                is_final: true,
            },
        ],
        ..ClassDef::new("com.example.Box", ClassKind::Class)
    });
    let string = Type::class(store.well_known().string, vec![]);
    let string_box = store.add_class(ClassDef {
        super_class: Some(Type::class(box_class, vec![string])),
        ..ClassDef::new("com.example.StringBox", ClassKind::Class)
    });
    (store, box_class, string_box)
}

#[test]
fn field_types_follow_the_receiver() {
    let (store, box_class, string_box) = box_store();
    let wk = store.well_known().clone();
    let string = Type::class(wk.string, vec![]);
    let mut ctx = TyContext::new(&store);

    let access = field_type(&mut ctx, &Type::class(box_class, vec![string.clone()]), "value", sp(0))
        .expect("Box<String>.value");
    assert_eq!(access.ty, string);
    assert!(!access.unchecked);

    let inherited = field_type(&mut ctx, &Type::class(string_box, vec![]), "value", sp(0))
        .expect("StringBox.value");
    assert_eq!(inherited.ty, string);

    let raw = field_type(&mut ctx, &Type::Raw(box_class), "value", sp(0)).expect("Box.value");
    assert_eq!(raw.ty, Type::class(wk.object, vec![]));
    assert!(raw.unchecked);

    let count = field_type(&mut ctx, &Type::Raw(box_class), "COUNT", sp(0)).expect("Box.COUNT");
    assert_eq!(count.ty, Type::int());
    assert!(count.is_final);
    assert!(!count.unchecked);

    let length = field_type(&mut ctx, &Type::array(string), "length", sp(0)).expect("length");
    assert_eq!(length.ty, Type::int());
}

#[test]
fn wildcard_receivers_are_captured() {
    let (store, box_class, _) = box_store();
    let number = Type::class(store.well_known().number, vec![]);
    let mut ctx = TyContext::new(&store);

    let receiver = Type::class(
        box_class,
        vec![Type::Wildcard(WildcardBound::Extends(Box::new(number.clone())))],
    );
    let access = field_type(&mut ctx, &receiver, "value", sp(0)).expect("Box<? extends Number>.value");
    let Type::TypeVar(cap) = access.ty else {
        panic!("expected a capture variable, got {:?}", access.ty);
    };
    assert!(cap.is_capture());
    assert_eq!(ctx.type_param(cap).map(|tp| tp.upper_bounds.clone()), Some(vec![number]));

    let err = field_type(&mut ctx, &receiver, "missing", sp(3)).expect_err("no such field");
    assert_eq!(err.code(), "unknown-field");
}
