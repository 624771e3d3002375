use serde::{Deserialize, Serialize};

use crate::{ClassType, Type, TypeEnv};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    pub fn is_numeric(self) -> bool {
        self != PrimitiveType::Boolean
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveType::Byte
                | PrimitiveType::Short
                | PrimitiveType::Char
                | PrimitiveType::Int
                | PrimitiveType::Long
        )
    }

    /// Identity or widening primitive conversion (JLS 5.1.2).
    pub fn widens_to(self, target: PrimitiveType) -> bool {
        use PrimitiveType::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => target == Double,
            Double | Boolean => false,
        }
    }

    /// Whether the integer constant `value` is representable in this type without loss.
    pub fn can_represent(self, value: i64) -> bool {
        match self {
            PrimitiveType::Byte => i8::try_from(value).is_ok(),
            PrimitiveType::Short => i16::try_from(value).is_ok(),
            PrimitiveType::Char => u16::try_from(value).is_ok(),
            PrimitiveType::Int => i32::try_from(value).is_ok(),
            PrimitiveType::Long => true,
            PrimitiveType::Float | PrimitiveType::Double | PrimitiveType::Boolean => false,
        }
    }
}

/// Unary numeric promotion (JLS 5.6.1) on an already unboxed operand.
pub fn unary_numeric_promotion(p: PrimitiveType) -> Option<PrimitiveType> {
    match p {
        PrimitiveType::Boolean => None,
        PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Char => Some(PrimitiveType::Int),
        other => Some(other),
    }
}

/// Binary numeric promotion (JLS 5.6.2) on already unboxed operands.
pub fn binary_numeric_promotion(a: PrimitiveType, b: PrimitiveType) -> Option<PrimitiveType> {
    if !a.is_numeric() || !b.is_numeric() {
        return None;
    }
    use PrimitiveType::*;
    Some(if a == Double || b == Double {
        Double
    } else if a == Float || b == Float {
        Float
    } else if a == Long || b == Long {
        Long
    } else {
        Int
    })
}

/// The wrapper class type of a primitive.
pub fn box_primitive(env: &dyn TypeEnv, p: PrimitiveType) -> Type {
    let wk = env.well_known();
    let def = match p {
        PrimitiveType::Boolean => wk.boolean,
        PrimitiveType::Byte => wk.byte,
        PrimitiveType::Short => wk.short,
        PrimitiveType::Char => wk.character,
        PrimitiveType::Int => wk.integer,
        PrimitiveType::Long => wk.long,
        PrimitiveType::Float => wk.float,
        PrimitiveType::Double => wk.double,
    };
    Type::class(def, vec![])
}

/// The primitive a type denotes after unboxing, if any.
///
/// Primitives map to themselves. Type variables and intersections unbox through their bounds.
pub fn unbox(env: &dyn TypeEnv, ty: &Type) -> Option<PrimitiveType> {
    unbox_inner(env, ty, 8)
}

fn unbox_inner(env: &dyn TypeEnv, ty: &Type, depth: u8) -> Option<PrimitiveType> {
    if depth == 0 {
        return None;
    }
    match ty {
        Type::Primitive(p) => Some(*p),
        Type::Class(ClassType { def, .. }) => wrapper_primitive(env, *def),
        Type::TypeVar(id) => env.type_param(*id).and_then(|tp| {
            tp.upper_bounds
                .iter()
                .find_map(|b| unbox_inner(env, b, depth - 1))
        }),
        Type::Intersection(parts) => parts.iter().find_map(|t| unbox_inner(env, t, depth - 1)),
        _ => None,
    }
}

pub fn is_primitive_wrapper(env: &dyn TypeEnv, ty: &Type) -> bool {
    match ty {
        Type::Class(ClassType { def, .. }) => wrapper_primitive(env, *def).is_some(),
        _ => false,
    }
}

fn wrapper_primitive(env: &dyn TypeEnv, def: crate::ClassId) -> Option<PrimitiveType> {
    let wk = env.well_known();
    Some(if def == wk.boolean {
        PrimitiveType::Boolean
    } else if def == wk.byte {
        PrimitiveType::Byte
    } else if def == wk.short {
        PrimitiveType::Short
    } else if def == wk.character {
        PrimitiveType::Char
    } else if def == wk.integer {
        PrimitiveType::Int
    } else if def == wk.long {
        PrimitiveType::Long
    } else if def == wk.float {
        PrimitiveType::Float
    } else if def == wk.double {
        PrimitiveType::Double
    } else {
        return None;
    })
}
