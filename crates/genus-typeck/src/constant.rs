//! Compile-time constants and checked operands.

use genus_core::Span;
use genus_types::{PrimitiveType, Type, TypeEnv, TypeError};
use serde::{Deserialize, Serialize};

use crate::{BinaryOp, CheckError, UnaryOp};

/// Value of a constant expression (JLS 15.28).
///
/// `byte`, `short` and `int` constants are all carried as `Int`; the operand's type says which.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstValue {
    Boolean(bool),
    Char(u16),
    Int(i32),
    Long(i64),
    String(String),
}

impl ConstValue {
    /// The type of a literal with this value.
    pub fn literal_type(&self, env: &dyn TypeEnv) -> Type {
        match self {
            ConstValue::Boolean(_) => Type::Primitive(PrimitiveType::Boolean),
            ConstValue::Char(_) => Type::Primitive(PrimitiveType::Char),
            ConstValue::Int(_) => Type::Primitive(PrimitiveType::Int),
            ConstValue::Long(_) => Type::Primitive(PrimitiveType::Long),
            ConstValue::String(_) => Type::class(env.well_known().string, vec![]),
        }
    }

    pub fn as_integral(&self) -> Option<i64> {
        match self {
            ConstValue::Char(c) => Some(i64::from(*c)),
            ConstValue::Int(v) => Some(i64::from(*v)),
            ConstValue::Long(v) => Some(*v),
            ConstValue::Boolean(_) | ConstValue::String(_) => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            ConstValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn concat_text(&self) -> String {
        match self {
            ConstValue::Boolean(b) => b.to_string(),
            ConstValue::Char(c) => char::from_u32(u32::from(*c))
                .map(String::from)
                .unwrap_or_default(),
            ConstValue::Int(v) => v.to_string(),
            ConstValue::Long(v) => v.to_string(),
            ConstValue::String(s) => s.clone(),
        }
    }
}

/// Whether an operand is a constant expression.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Constness {
    Known(ConstValue),
    #[default]
    NotConstant,
    /// The operand names a constant whose initializer has not been evaluated yet.
    Pending,
}

impl Constness {
    pub fn value(&self) -> Option<&ConstValue> {
        match self {
            Constness::Known(value) => Some(value),
            Constness::NotConstant | Constness::Pending => None,
        }
    }

    /// Combine two operand constnesses; `fold` runs only when both values are known.
    pub fn zip_with(
        &self,
        other: &Constness,
        fold: impl FnOnce(&ConstValue, &ConstValue) -> Option<ConstValue>,
    ) -> Constness {
        match (self, other) {
            (Constness::Pending, _) | (_, Constness::Pending) => Constness::Pending,
            (Constness::Known(a), Constness::Known(b)) => {
                fold(a, b).map_or(Constness::NotConstant, Constness::Known)
            }
            _ => Constness::NotConstant,
        }
    }
}

/// What an operand denotes besides its value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Place {
    #[default]
    Value,
    Variable,
    FinalVariable,
    /// A final variable's declaration receiving its initializer: `=` is allowed exactly here.
    Initializer,
}

/// A checked subexpression: its static type, constant value and whether it can be assigned to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operand {
    pub ty: Type,
    pub constant: Constness,
    pub place: Place,
    pub span: Span,
}

impl Operand {
    pub fn value(ty: Type, span: Span) -> Self {
        Self {
            ty,
            constant: Constness::NotConstant,
            place: Place::Value,
            span,
        }
    }

    pub fn variable(ty: Type, span: Span) -> Self {
        Self {
            place: Place::Variable,
            ..Self::value(ty, span)
        }
    }

    /// A literal: its type is derived from the value.
    pub fn literal(env: &dyn TypeEnv, value: ConstValue, span: Span) -> Self {
        Self {
            ty: value.literal_type(env),
            constant: Constness::Known(value),
            place: Place::Value,
            span,
        }
    }

    pub fn with_constant(mut self, constant: Constness) -> Self {
        self.constant = constant;
        self
    }

    pub fn with_place(mut self, place: Place) -> Self {
        self.place = place;
        self
    }

    /// The value of this operand if it is an `int` constant expression.
    ///
    /// Reports `NotReady` when the operand is an `int` whose constant value is still pending,
    /// because the caller's answer depends on it.
    pub fn int_constant(&self) -> Result<Option<i64>, CheckError> {
        self.integral_constant(&[PrimitiveType::Int])
    }

    /// Like [`Operand::int_constant`] for a constant expression of any of the `types`.
    pub fn integral_constant(&self, types: &[PrimitiveType]) -> Result<Option<i64>, CheckError> {
        let Type::Primitive(p) = &self.ty else {
            return Ok(None);
        };
        if !types.contains(p) {
            return Ok(None);
        }
        match &self.constant {
            Constness::Known(value) => Ok(value.as_integral()),
            Constness::NotConstant => Ok(None),
            Constness::Pending => Err(TypeError::not_ready(format!(
                "constant value of the expression at {:?}",
                self.span
            ))
            .into()),
        }
    }
}

/// Fold `a op b` given the already computed result type of the expression.
pub(crate) fn fold_binary(
    op: BinaryOp,
    result: &Type,
    a: &ConstValue,
    b: &ConstValue,
) -> Option<ConstValue> {
    match result {
        Type::Primitive(PrimitiveType::Boolean) => fold_boolean(op, a, b),
        Type::Primitive(PrimitiveType::Int) => {
            let value = fold_integral(op, a.as_integral()?, b.as_integral()?, Width::Int)?;
            Some(ConstValue::Int(value as i32))
        }
        Type::Primitive(PrimitiveType::Long) => {
            let value = fold_integral(op, a.as_integral()?, b.as_integral()?, Width::Long)?;
            Some(ConstValue::Long(value))
        }
        Type::Class(_) if op == BinaryOp::Add => Some(ConstValue::String(format!(
            "{}{}",
            a.concat_text(),
            b.concat_text()
        ))),
        _ => None,
    }
}

pub(crate) fn fold_unary(op: UnaryOp, result: &Type, value: &ConstValue) -> Option<ConstValue> {
    match (op, result) {
        (UnaryOp::Not, _) => Some(ConstValue::Boolean(!value.as_bool()?)),
        (UnaryOp::Pos, Type::Primitive(PrimitiveType::Int)) => {
            Some(ConstValue::Int(value.as_integral()? as i32))
        }
        (UnaryOp::Neg, Type::Primitive(PrimitiveType::Int)) => {
            Some(ConstValue::Int((value.as_integral()? as i32).wrapping_neg()))
        }
        (UnaryOp::BitNot, Type::Primitive(PrimitiveType::Int)) => {
            Some(ConstValue::Int(!(value.as_integral()? as i32)))
        }
        (UnaryOp::Pos, Type::Primitive(PrimitiveType::Long)) => {
            Some(ConstValue::Long(value.as_integral()?))
        }
        (UnaryOp::Neg, Type::Primitive(PrimitiveType::Long)) => {
            Some(ConstValue::Long(value.as_integral()?.wrapping_neg()))
        }
        (UnaryOp::BitNot, Type::Primitive(PrimitiveType::Long)) => {
            Some(ConstValue::Long(!value.as_integral()?))
        }
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Width {
    Int,
    Long,
}

fn fold_integral(op: BinaryOp, a: i64, b: i64, width: Width) -> Option<i64> {
    // `int` arithmetic wraps at 32 bits.
    let wrap = |v: i64| match width {
        Width::Int => i64::from(v as i32),
        Width::Long => v,
    };
    let (a, b) = (wrap(a), wrap(b));
    let shift_mask = match width {
        Width::Int => 0x1f,
        Width::Long => 0x3f,
    };
    let value = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div if b != 0 => a.wrapping_div(b),
        BinaryOp::Rem if b != 0 => a.wrapping_rem(b),
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::Shl => a.wrapping_shl((b & shift_mask) as u32),
        BinaryOp::Shr => a.wrapping_shr((b & shift_mask) as u32),
        BinaryOp::UShr => match width {
            Width::Int => i64::from(((a as i32 as u32) >> (b & shift_mask)) as i32),
            Width::Long => ((a as u64) >> (b & shift_mask)) as i64,
        },
        _ => return None,
    };
    Some(wrap(value))
}

fn fold_boolean(op: BinaryOp, a: &ConstValue, b: &ConstValue) -> Option<ConstValue> {
    if let (Some(x), Some(y)) = (a.as_bool(), b.as_bool()) {
        let value = match op {
            BinaryOp::AndAnd | BinaryOp::BitAnd => x && y,
            BinaryOp::OrOr | BinaryOp::BitOr => x || y,
            BinaryOp::BitXor | BinaryOp::NotEq => x != y,
            BinaryOp::EqEq => x == y,
            _ => return None,
        };
        return Some(ConstValue::Boolean(value));
    }
    let (x, y) = (a.as_integral()?, b.as_integral()?);
    let value = match op {
        BinaryOp::EqEq => x == y,
        BinaryOp::NotEq => x != y,
        BinaryOp::Less => x < y,
        BinaryOp::LessEq => x <= y,
        BinaryOp::Greater => x > y,
        BinaryOp::GreaterEq => x >= y,
        _ => return None,
    };
    Some(ConstValue::Boolean(value))
}
