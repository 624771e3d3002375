use genus_core::Span;

use crate::{AssignOp, BinaryOp, ConstValue, UnaryOp};

/// Expression tree handed to the checker after name resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Literal {
        value: ConstValue,
        span: Span,
    },
    Null {
        span: Span,
    },
    Name {
        name: String,
        span: Span,
    },
    Field {
        receiver: Box<Expr>,
        name: String,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    Conditional {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        span: Span,
    },
    Assert {
        cond: Box<Expr>,
        message: Option<Box<Expr>>,
        span: Span,
    },
}

/// Tag selecting the rule that checks a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Literal,
    Null,
    Name,
    Field,
    Binary,
    Unary,
    Assign,
    Conditional,
    Assert,
}

impl Expr {
    pub fn kind(&self) -> ExprKind {
        match self {
            Expr::Literal { .. } => ExprKind::Literal,
            Expr::Null { .. } => ExprKind::Null,
            Expr::Name { .. } => ExprKind::Name,
            Expr::Field { .. } => ExprKind::Field,
            Expr::Binary { .. } => ExprKind::Binary,
            Expr::Unary { .. } => ExprKind::Unary,
            Expr::Assign { .. } => ExprKind::Assign,
            Expr::Conditional { .. } => ExprKind::Conditional,
            Expr::Assert { .. } => ExprKind::Assert,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Null { span }
            | Expr::Name { span, .. }
            | Expr::Field { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Assign { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Assert { span, .. } => *span,
        }
    }

    /// Direct subexpressions in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal { .. } | Expr::Null { .. } | Expr::Name { .. } => Vec::new(),
            Expr::Field { receiver, .. } => vec![&**receiver],
            Expr::Binary { lhs, rhs, .. } => vec![&**lhs, &**rhs],
            Expr::Unary { operand, .. } => vec![&**operand],
            Expr::Assign { target, value, .. } => vec![&**target, &**value],
            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
                ..
            } => vec![&**cond, &**then_branch, &**else_branch],
            Expr::Assert { cond, message, .. } => {
                let mut out: Vec<&Expr> = vec![&**cond];
                out.extend(message.as_deref());
                out
            }
        }
    }

    pub fn literal(value: ConstValue, span: Span) -> Self {
        Expr::Literal { value, span }
    }

    pub fn name(name: impl Into<String>, span: Span) -> Self {
        Expr::Name {
            name: name.into(),
            span,
        }
    }

    pub fn field(receiver: Expr, name: impl Into<String>, span: Span) -> Self {
        Expr::Field {
            receiver: Box::new(receiver),
            name: name.into(),
            span,
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        let span = lhs.span().cover(rhs.span());
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            span,
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr, span: Span) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
            span,
        }
    }

    pub fn assign(op: AssignOp, target: Expr, value: Expr) -> Self {
        let span = target.span().cover(value.span());
        Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
            span,
        }
    }

    pub fn conditional(cond: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        let span = cond.span().cover(else_branch.span());
        Expr::Conditional {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            span,
        }
    }
}
