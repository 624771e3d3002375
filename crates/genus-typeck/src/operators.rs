//! Boxing-aware typing of unary, binary and assignment operators.
//!
//! When neither operand is a primitive wrapper the base rules apply to the declared types
//! unchanged. Otherwise wrappers are unboxed first (unless the other operand is `null`) and the
//! same rules run on the primitive types.

use genus_core::Span;
use genus_types::{
    all_supertypes, binary_numeric_promotion, box_primitive, format_type, is_assignable,
    is_castable, is_primitive_wrapper, unary_numeric_promotion, unbox, PrimitiveType, Substitution,
    TyContext, Type, TypeEnv,
};

use crate::constant::{fold_binary, fold_unary};
use crate::{CheckError, Constness, Operand, Place};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    UShr,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    EqEq,
    NotEq,
    BitAnd,
    BitOr,
    BitXor,
    AndAnd,
    OrOr,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::EqEq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::AndAnd => "&&",
            BinaryOp::OrOr => "||",
        }
    }

    fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Less
                | BinaryOp::LessEq
                | BinaryOp::Greater
                | BinaryOp::GreaterEq
                | BinaryOp::EqEq
                | BinaryOp::NotEq
                | BinaryOp::AndAnd
                | BinaryOp::OrOr
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    Pos,
    Neg,
    BitNot,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
            UnaryOp::Pos => "+",
            UnaryOp::Neg => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    ShlAssign,
    ShrAssign,
    UShrAssign,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::RemAssign => "%=",
            AssignOp::BitAndAssign => "&=",
            AssignOp::BitOrAssign => "|=",
            AssignOp::BitXorAssign => "^=",
            AssignOp::ShlAssign => "<<=",
            AssignOp::ShrAssign => ">>=",
            AssignOp::UShrAssign => ">>>=",
        }
    }

    /// The binary operator a compound assignment applies.
    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            AssignOp::Assign => return None,
            AssignOp::AddAssign => BinaryOp::Add,
            AssignOp::SubAssign => BinaryOp::Sub,
            AssignOp::MulAssign => BinaryOp::Mul,
            AssignOp::DivAssign => BinaryOp::Div,
            AssignOp::RemAssign => BinaryOp::Rem,
            AssignOp::BitAndAssign => BinaryOp::BitAnd,
            AssignOp::BitOrAssign => BinaryOp::BitOr,
            AssignOp::BitXorAssign => BinaryOp::BitXor,
            AssignOp::ShlAssign => BinaryOp::Shl,
            AssignOp::ShrAssign => BinaryOp::Shr,
            AssignOp::UShrAssign => BinaryOp::UShr,
        })
    }
}

/// The type the base rules see for an operand: wrappers unboxed when boxing is in play.
fn working_type(env: &dyn TypeEnv, ty: &Type, unbox_wrappers: bool) -> Type {
    if unbox_wrappers && is_primitive_wrapper(env, ty) {
        if let Some(p) = unbox(env, ty) {
            return Type::Primitive(p);
        }
    }
    ty.clone()
}

fn primitive(ty: &Type) -> Option<PrimitiveType> {
    match ty {
        Type::Primitive(p) => Some(*p),
        _ => None,
    }
}

fn is_string(env: &dyn TypeEnv, ty: &Type) -> bool {
    ty.class_id() == Some(env.well_known().string)
}

fn operand_error(
    env: &dyn TypeEnv,
    op: &'static str,
    expected: &'static str,
    ty: &Type,
    span: Span,
) -> CheckError {
    CheckError::OperandType {
        op,
        expected,
        ty: format_type(env, ty),
        span,
    }
}

/// Type `lhs op rhs`, folding the constant value when both operands are constants.
pub fn type_binary(
    env: &dyn TypeEnv,
    op: BinaryOp,
    lhs: &Operand,
    rhs: &Operand,
    span: Span,
) -> Result<Operand, CheckError> {
    let ty = binary_result(env, op, lhs, rhs, span)?;
    let constant = lhs
        .constant
        .zip_with(&rhs.constant, |a, b| fold_binary(op, &ty, a, b));
    Ok(Operand::value(ty, span).with_constant(constant))
}

fn binary_result(
    env: &dyn TypeEnv,
    op: BinaryOp,
    lhs: &Operand,
    rhs: &Operand,
    span: Span,
) -> Result<Type, CheckError> {
    if lhs.ty.is_errorish() || rhs.ty.is_errorish() {
        return Ok(if op.is_comparison() {
            Type::boolean()
        } else {
            Type::Unknown
        });
    }

    let boxing = is_primitive_wrapper(env, &lhs.ty) || is_primitive_wrapper(env, &rhs.ty);
    let unbox_wrappers = boxing && !lhs.ty.is_null() && !rhs.ty.is_null();
    let l = working_type(env, &lhs.ty, unbox_wrappers);
    let r = working_type(env, &rhs.ty, unbox_wrappers);
    let (lp, rp) = (primitive(&l), primitive(&r));
    let sym = op.symbol();

    let require = |p: Option<PrimitiveType>,
                   ty: &Type,
                   at: Span,
                   expected: &'static str,
                   ok: fn(PrimitiveType) -> bool|
     -> Result<PrimitiveType, CheckError> {
        p.filter(|p| ok(*p))
            .ok_or_else(|| operand_error(env, sym, expected, ty, at))
    };
    let promote = |a: PrimitiveType, b: PrimitiveType| {
        binary_numeric_promotion(a, b).map_or(Type::Unknown, Type::Primitive)
    };

    let ty = match op {
        BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
            require(lp, &lhs.ty, lhs.span, "numeric", PrimitiveType::is_numeric)?;
            require(rp, &rhs.ty, rhs.span, "numeric", PrimitiveType::is_numeric)?;
            Type::boolean()
        }
        BinaryOp::EqEq | BinaryOp::NotEq => {
            check_equality(env, op, lhs, rhs, span)?;
            Type::boolean()
        }
        BinaryOp::AndAnd | BinaryOp::OrOr => {
            require(lp, &lhs.ty, lhs.span, "boolean", is_boolean)?;
            require(rp, &rhs.ty, rhs.span, "boolean", is_boolean)?;
            Type::boolean()
        }
        BinaryOp::Add if is_string(env, &l) || is_string(env, &r) => {
            for operand in [lhs, rhs] {
                if operand.ty == Type::Void {
                    return Err(operand_error(env, sym, "non-void", &operand.ty, operand.span));
                }
            }
            Type::class(env.well_known().string, vec![])
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let expected = if op == BinaryOp::Add {
                "numeric or String"
            } else {
                "numeric"
            };
            let a = require(lp, &lhs.ty, lhs.span, expected, PrimitiveType::is_numeric)?;
            let b = require(rp, &rhs.ty, rhs.span, expected, PrimitiveType::is_numeric)?;
            promote(a, b)
        }
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
            if lp == Some(PrimitiveType::Boolean) && rp == Some(PrimitiveType::Boolean) {
                Type::boolean()
            } else {
                let expected = "integral or boolean";
                let a = require(lp, &lhs.ty, lhs.span, expected, PrimitiveType::is_integral)?;
                let b = require(rp, &rhs.ty, rhs.span, expected, PrimitiveType::is_integral)?;
                promote(a, b)
            }
        }
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => {
            // Only the left operand is promoted.
            let a = require(lp, &lhs.ty, lhs.span, "integral", PrimitiveType::is_integral)?;
            require(rp, &rhs.ty, rhs.span, "integral", PrimitiveType::is_integral)?;
            unary_numeric_promotion(a).map_or(Type::Unknown, Type::Primitive)
        }
    };

    tracing::trace!(
        target: "genus.typeck",
        op = sym,
        boxing,
        ty = %format_type(env, &ty),
        "binary"
    );
    Ok(ty)
}

fn is_boolean(p: PrimitiveType) -> bool {
    p == PrimitiveType::Boolean
}

/// `==`/`!=`: numeric or boolean equality when a primitive is involved, reference equality
/// (which needs a cast between the operands) otherwise.
fn check_equality(
    env: &dyn TypeEnv,
    op: BinaryOp,
    lhs: &Operand,
    rhs: &Operand,
    span: Span,
) -> Result<(), CheckError> {
    let ok = if lhs.ty.is_primitive() || rhs.ty.is_primitive() {
        match (unbox(env, &lhs.ty), unbox(env, &rhs.ty)) {
            (Some(a), Some(b)) => {
                (a.is_numeric() && b.is_numeric())
                    || (a == PrimitiveType::Boolean && b == PrimitiveType::Boolean)
            }
            _ => false,
        }
    } else if lhs.ty.is_null() || rhs.ty.is_null() {
        true
    } else {
        lhs.ty == rhs.ty
            || is_castable(env, &lhs.ty, &rhs.ty)
            || is_castable(env, &rhs.ty, &lhs.ty)
    };
    if ok {
        Ok(())
    } else {
        Err(CheckError::Incomparable {
            op: op.symbol(),
            left: format_type(env, &lhs.ty),
            right: format_type(env, &rhs.ty),
            span,
        })
    }
}

pub fn type_unary(
    env: &dyn TypeEnv,
    op: UnaryOp,
    operand: &Operand,
    span: Span,
) -> Result<Operand, CheckError> {
    if operand.ty.is_errorish() {
        let ty = if op == UnaryOp::Not {
            Type::boolean()
        } else {
            Type::Unknown
        };
        return Ok(Operand::value(ty, span));
    }

    let boxing = is_primitive_wrapper(env, &operand.ty);
    let work = working_type(env, &operand.ty, boxing);
    let p = primitive(&work);
    let sym = op.symbol();
    let expect = |expected: &'static str, ok: fn(PrimitiveType) -> bool| {
        p.filter(|p| ok(*p))
            .ok_or_else(|| operand_error(env, sym, expected, &operand.ty, operand.span))
    };

    let ty = match op {
        UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
            expect("numeric", PrimitiveType::is_numeric)?;
            match operand.place {
                Place::Value => return Err(CheckError::NotAVariable { op: sym, span: operand.span }),
                Place::FinalVariable | Place::Initializer => {
                    return Err(CheckError::FinalVariable {
                        op: sym,
                        span: operand.span,
                    })
                }
                Place::Variable => {}
            }
            // The variable keeps its declared, possibly boxed, type.
            return Ok(Operand::value(operand.ty.clone(), span));
        }
        UnaryOp::BitNot => {
            let p = expect("integral", PrimitiveType::is_integral)?;
            unary_numeric_promotion(p).map_or(Type::Unknown, Type::Primitive)
        }
        UnaryOp::Pos | UnaryOp::Neg => {
            let p = expect("numeric", PrimitiveType::is_numeric)?;
            unary_numeric_promotion(p).map_or(Type::Unknown, Type::Primitive)
        }
        UnaryOp::Not => {
            expect("boolean", is_boolean)?;
            Type::boolean()
        }
    };

    let constant = match &operand.constant {
        Constness::Known(value) => {
            fold_unary(op, &ty, value).map_or(Constness::NotConstant, Constness::Known)
        }
        Constness::Pending => Constness::Pending,
        Constness::NotConstant => Constness::NotConstant,
    };
    Ok(Operand::value(ty, span).with_constant(constant))
}

/// Whether `value` is a constant narrowable to `target` (JLS 5.2): a `byte`, `short`, `char` or
/// `int` constant fits `byte`, `short`, `char` and their wrappers when representable.
pub(crate) fn narrows_constant(
    env: &dyn TypeEnv,
    value: &Operand,
    target: &Type,
) -> Result<bool, CheckError> {
    let Some(t) = unbox(env, target) else {
        return Ok(false);
    };
    if !matches!(
        t,
        PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Char
    ) || !(target.is_primitive() || is_primitive_wrapper(env, target))
    {
        return Ok(false);
    }
    let source = [
        PrimitiveType::Byte,
        PrimitiveType::Short,
        PrimitiveType::Char,
        PrimitiveType::Int,
    ];
    Ok(value
        .integral_constant(&source)?
        .is_some_and(|v| t.can_represent(v)))
}

/// Type `target op= value`. The result has the variable's declared type.
pub fn type_assign(
    env: &dyn TypeEnv,
    op: AssignOp,
    target: &Operand,
    value: &Operand,
    span: Span,
) -> Result<Operand, CheckError> {
    match target.place {
        Place::Value => {
            return Err(CheckError::NotAVariable {
                op: op.symbol(),
                span: target.span,
            })
        }
        Place::FinalVariable => {
            return Err(CheckError::FinalVariable {
                op: op.symbol(),
                span: target.span,
            })
        }
        Place::Initializer if op != AssignOp::Assign => {
            return Err(CheckError::FinalVariable {
                op: op.symbol(),
                span: target.span,
            })
        }
        Place::Initializer | Place::Variable => {}
    }
    let result = Operand::value(target.ty.clone(), span);
    if target.ty.is_errorish() || value.ty.is_errorish() {
        return Ok(result);
    }

    let incompatible = || CheckError::Incompatible {
        from: format_type(env, &value.ty),
        to: format_type(env, &target.ty),
        span: value.span,
    };

    match op.binary_op() {
        None => {
            if value.ty == target.ty
                || is_assignable(env, &value.ty, &target.ty)
                || narrows_constant(env, value, &target.ty)?
            {
                let constant = match target.place {
                    Place::Initializer => value.constant.clone(),
                    _ => Constness::NotConstant,
                };
                Ok(result.with_constant(constant))
            } else {
                Err(incompatible())
            }
        }
        Some(bin) => {
            let combined = binary_result(env, bin, target, value, span)?;
            // `E1 op= E2` implies a cast back to the variable's type. Primitive variables take
            // any primitive result; a wrapper only takes the result that boxes to it.
            let fits = match primitive(&combined) {
                _ if is_string(env, &combined) => is_string(env, &target.ty),
                Some(_) if target.ty.is_primitive() => true,
                Some(p) => box_primitive(env, p) == target.ty,
                None => false,
            };
            if fits {
                Ok(result)
            } else {
                Err(incompatible())
            }
        }
    }
}

/// `assert cond`: the condition must be (or unbox to) `boolean`. Returns the declared type of
/// the condition, which the node keeps.
pub fn check_assert_condition(env: &dyn TypeEnv, cond: &Operand) -> Result<Type, CheckError> {
    if cond.ty.is_errorish() || unbox(env, &cond.ty) == Some(PrimitiveType::Boolean) {
        return Ok(cond.ty.clone());
    }
    Err(CheckError::ConditionNotBoolean {
        ty: format_type(env, &cond.ty),
        span: cond.span,
    })
}

/// Result of looking up a field through a receiver type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldAccess {
    pub ty: Type,
    pub is_final: bool,
    /// The access goes through a raw receiver and its declared type mentions type variables.
    pub unchecked: bool,
}

/// Look up `name` on `receiver`, substituting the receiver's type arguments into the field type.
///
/// Wildcard-parameterized receivers are captured first. Raw receivers see the erased field.
pub fn field_type(
    ctx: &mut TyContext<'_>,
    receiver: &Type,
    name: &str,
    span: Span,
) -> Result<FieldAccess, CheckError> {
    if receiver.is_errorish() {
        return Ok(FieldAccess {
            ty: Type::Unknown,
            is_final: false,
            unchecked: false,
        });
    }
    if matches!(receiver, Type::Array(_)) && name == "length" {
        return Ok(FieldAccess {
            ty: Type::int(),
            is_final: true,
            unchecked: false,
        });
    }

    let receiver = ctx.try_capture_conversion(receiver, span)?;
    let supertypes = all_supertypes(&*ctx, &receiver);
    for sup in supertypes {
        match &sup {
            Type::Raw(def) => {
                let raw = ctx.raw_of(*def)?;
                let Some(field) = raw.field(name) else {
                    continue;
                };
                let declared = ctx
                    .class(*def)
                    .and_then(|class| class.fields.iter().find(|f| f.name == name))
                    .map(|f| &f.ty);
                let unchecked =
                    ctx.options().unchecked_warnings && declared != Some(&field.ty);
                return Ok(FieldAccess {
                    ty: field.ty.clone(),
                    is_final: field.is_final,
                    unchecked,
                });
            }
            Type::Class(ct) => {
                let Some(field) = ctx
                    .class(ct.def)
                    .and_then(|class| class.fields.iter().find(|f| f.name == name))
                else {
                    continue;
                };
                let ty = if field.is_static {
                    field.ty.clone()
                } else {
                    Substitution::for_class_type(&*ctx, ct).apply(&field.ty)
                };
                return Ok(FieldAccess {
                    ty,
                    is_final: field.is_final,
                    unchecked: false,
                });
            }
            _ => {}
        }
    }

    Err(CheckError::UnknownField {
        receiver: format_type(&*ctx, &receiver),
        name: name.to_string(),
        span,
    })
}
