//! Expression and declaration checking on top of [`genus_types`].
//!
//! Operator typing follows the boxing-aware rules of Java 5: wrapper operands are unboxed before
//! the ordinary numeric and boolean rules apply, and conditional expressions fall back to boxing
//! plus `lub` when their branches are neither identical nor numeric.
//!
//! [`Driver`] evaluates a small expression tree bottom-up through a [`PassRegistry`] and re-runs
//! checks that depend on constants not computed yet.

mod conditional;
mod constant;
mod decl;
mod driver;
mod error;
mod expr;
mod invocation;
mod iteration;
mod operators;
mod pass;

pub use conditional::{conditional_narrowing, type_conditional};
pub use constant::{ConstValue, Constness, Operand, Place};
pub use decl::{
    check_annotation_applicability, check_cycles, check_duplicate_annotations,
    check_variable_arity, element_kinds, Declaration,
};
pub use driver::{Binding, Driver, SchedulerOptions, UnitReport};
pub use error::CheckError;
pub use expr::{Expr, ExprKind};
pub use invocation::{check_arguments, ArgumentMatch};
pub use iteration::enhanced_for_element;
pub use operators::{
    check_assert_condition, field_type, type_assign, type_binary, type_unary, AssignOp, BinaryOp,
    FieldAccess, UnaryOp,
};
pub use pass::{NodeRule, PassCx, PassRegistry, Scope, Symbol};
