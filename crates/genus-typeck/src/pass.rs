//! Per-node-kind checking rules.
//!
//! Every [`ExprKind`] maps to one [`NodeRule`]. The registry walks a tree bottom-up, hands each
//! rule the already checked children and recovers from user errors by reporting them and typing
//! the node as [`Type::Error`], which every rule accepts silently.

use std::collections::HashMap;

use genus_core::{Diagnostic, DiagnosticSink};
use genus_types::{format_type, TyContext, Type, TypeError};

use crate::{
    check_assert_condition, field_type, type_assign, type_binary, type_conditional, type_unary,
    CheckError, Constness, Expr, ExprKind, Operand, Place,
};

/// A named variable visible to the expressions being checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub ty: Type,
    pub is_final: bool,
    /// Constant value of a `final` variable with a constant initializer.
    pub constant: Constness,
}

#[derive(Clone, Debug, Default)]
pub struct Scope {
    symbols: HashMap<String, Symbol>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) {
        self.symbols.insert(name.into(), symbol);
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn set_constant(&mut self, name: &str, constant: Constness) {
        if let Some(symbol) = self.symbols.get_mut(name) {
            symbol.constant = constant;
        }
    }
}

/// State shared by the rules of one checking run.
pub struct PassCx<'a, 'env> {
    pub ty: &'a mut TyContext<'env>,
    pub scope: &'a Scope,
    pub sink: &'a mut dyn DiagnosticSink,
}

pub trait NodeRule: Sync {
    /// Type `expr` given its checked children, in [`Expr::children`] order.
    fn check(
        &self,
        cx: &mut PassCx<'_, '_>,
        expr: &Expr,
        children: &[Operand],
    ) -> Result<Operand, CheckError>;
}

#[derive(Clone, Default)]
pub struct PassRegistry<'r> {
    rules: HashMap<ExprKind, &'r dyn NodeRule>,
}

impl std::fmt::Debug for PassRegistry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.rules.keys().collect();
        kinds.sort_by_key(|kind| format!("{kind:?}"));
        f.debug_struct("PassRegistry").field("kinds", &kinds).finish()
    }
}

impl<'r> PassRegistry<'r> {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register `rule` for `kind`, returning the rule it replaces.
    pub fn register(&mut self, kind: ExprKind, rule: &'r dyn NodeRule) -> Option<&'r dyn NodeRule> {
        self.rules.insert(kind, rule)
    }

    pub fn rule(&self, kind: ExprKind) -> Option<&'r dyn NodeRule> {
        self.rules.get(&kind).copied()
    }

    /// Check `expr` bottom-up.
    ///
    /// User errors are reported to `cx.sink` and do not stop the walk. Only `NotReady` is
    /// returned as an error, so the caller can retry the whole expression later.
    pub fn run(&self, cx: &mut PassCx<'_, '_>, expr: &Expr) -> Result<Operand, CheckError> {
        let mut children = Vec::new();
        for child in expr.children() {
            children.push(self.run(cx, child)?);
        }

        let Some(rule) = self.rule(expr.kind()) else {
            tracing::warn!(target: "genus.typeck", kind = ?expr.kind(), "no rule registered");
            return Ok(Operand::value(Type::Unknown, expr.span()));
        };
        match rule.check(cx, expr, &children) {
            Ok(operand) => Ok(operand),
            Err(err) if err.is_not_ready() => Err(err),
            Err(err) => {
                match err.to_diagnostic() {
                    Some(diagnostic) => cx.sink.report(diagnostic),
                    None => {
                        tracing::error!(target: "genus.typeck", error = %err, "check failed")
                    }
                }
                Ok(Operand::value(Type::Error, expr.span()))
            }
        }
    }
}

impl PassRegistry<'static> {
    /// The built-in rules for every expression kind.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(ExprKind::Literal, &LiteralRule);
        registry.register(ExprKind::Null, &LiteralRule);
        registry.register(ExprKind::Name, &NameRule);
        registry.register(ExprKind::Field, &FieldRule);
        registry.register(ExprKind::Binary, &BinaryRule);
        registry.register(ExprKind::Unary, &UnaryRule);
        registry.register(ExprKind::Assign, &AssignRule);
        registry.register(ExprKind::Conditional, &ConditionalRule);
        registry.register(ExprKind::Assert, &AssertRule);
        registry
    }
}

fn arity_defect(expr: &Expr, children: &[Operand]) -> CheckError {
    TypeError::internal(format!(
        "{:?} node checked with {} operands",
        expr.kind(),
        children.len()
    ))
    .into()
}

struct LiteralRule;

impl NodeRule for LiteralRule {
    fn check(
        &self,
        cx: &mut PassCx<'_, '_>,
        expr: &Expr,
        _children: &[Operand],
    ) -> Result<Operand, CheckError> {
        match expr {
            Expr::Literal { value, span } => Ok(Operand::literal(&*cx.ty, value.clone(), *span)),
            _ => Ok(Operand::value(Type::Null, expr.span())),
        }
    }
}

struct NameRule;

impl NodeRule for NameRule {
    fn check(
        &self,
        cx: &mut PassCx<'_, '_>,
        expr: &Expr,
        _children: &[Operand],
    ) -> Result<Operand, CheckError> {
        let Expr::Name { name, span } = expr else {
            return Err(arity_defect(expr, &[]));
        };
        let Some(symbol) = cx.scope.get(name) else {
            return Err(CheckError::UnknownName {
                name: name.clone(),
                span: *span,
            });
        };
        let (place, constant) = if symbol.is_final {
            (Place::FinalVariable, symbol.constant.clone())
        } else {
            (Place::Variable, Constness::NotConstant)
        };
        Ok(Operand::value(symbol.ty.clone(), *span)
            .with_place(place)
            .with_constant(constant))
    }
}

struct FieldRule;

impl NodeRule for FieldRule {
    fn check(
        &self,
        cx: &mut PassCx<'_, '_>,
        expr: &Expr,
        children: &[Operand],
    ) -> Result<Operand, CheckError> {
        let (Expr::Field { name, span, .. }, [receiver]) = (expr, children) else {
            return Err(arity_defect(expr, children));
        };
        let access = field_type(cx.ty, &receiver.ty, name, *span)?;
        if access.unchecked {
            cx.sink.report(Diagnostic::warning(
                "unchecked-raw-access",
                format!(
                    "unchecked access to field `{name}` of raw type `{}`",
                    format_type(&*cx.ty, &receiver.ty)
                ),
                Some(*span),
            ));
        }
        let place = if access.is_final {
            Place::FinalVariable
        } else {
            Place::Variable
        };
        Ok(Operand::value(access.ty, *span).with_place(place))
    }
}

struct BinaryRule;

impl NodeRule for BinaryRule {
    fn check(
        &self,
        cx: &mut PassCx<'_, '_>,
        expr: &Expr,
        children: &[Operand],
    ) -> Result<Operand, CheckError> {
        let (Expr::Binary { op, span, .. }, [lhs, rhs]) = (expr, children) else {
            return Err(arity_defect(expr, children));
        };
        type_binary(&*cx.ty, *op, lhs, rhs, *span)
    }
}

struct UnaryRule;

impl NodeRule for UnaryRule {
    fn check(
        &self,
        cx: &mut PassCx<'_, '_>,
        expr: &Expr,
        children: &[Operand],
    ) -> Result<Operand, CheckError> {
        let (Expr::Unary { op, span, .. }, [operand]) = (expr, children) else {
            return Err(arity_defect(expr, children));
        };
        type_unary(&*cx.ty, *op, operand, *span)
    }
}

struct AssignRule;

impl NodeRule for AssignRule {
    fn check(
        &self,
        cx: &mut PassCx<'_, '_>,
        expr: &Expr,
        children: &[Operand],
    ) -> Result<Operand, CheckError> {
        let (Expr::Assign { op, span, .. }, [target, value]) = (expr, children) else {
            return Err(arity_defect(expr, children));
        };
        // An assignment expression is never a constant.
        type_assign(&*cx.ty, *op, target, value, *span)
            .map(|operand| operand.with_constant(Constness::NotConstant))
    }
}

struct ConditionalRule;

impl NodeRule for ConditionalRule {
    fn check(
        &self,
        cx: &mut PassCx<'_, '_>,
        expr: &Expr,
        children: &[Operand],
    ) -> Result<Operand, CheckError> {
        let (Expr::Conditional { span, .. }, [cond, then_branch, else_branch]) = (expr, children)
        else {
            return Err(arity_defect(expr, children));
        };
        type_conditional(cx.ty, cond, then_branch, else_branch, *span)
    }
}

struct AssertRule;

impl NodeRule for AssertRule {
    fn check(
        &self,
        cx: &mut PassCx<'_, '_>,
        expr: &Expr,
        children: &[Operand],
    ) -> Result<Operand, CheckError> {
        let Expr::Assert { span, .. } = expr else {
            return Err(arity_defect(expr, children));
        };
        let (cond, message) = match children {
            [cond] => (cond, None),
            [cond, message] => (cond, Some(message)),
            _ => return Err(arity_defect(expr, children)),
        };
        let cond_ty = check_assert_condition(&*cx.ty, cond)?;
        if let Some(message) = message {
            if message.ty == Type::Void {
                return Err(CheckError::OperandType {
                    op: "assert",
                    expected: "non-void",
                    ty: format_type(&*cx.ty, &message.ty),
                    span: message.span,
                });
            }
        }
        tracing::trace!(target: "genus.typeck", cond = %format_type(&*cx.ty, &cond_ty), "assert");
        Ok(Operand::value(Type::Void, *span))
    }
}
