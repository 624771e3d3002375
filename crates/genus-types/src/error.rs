use genus_core::{Diagnostic, Span};
use thiserror::Error;

/// Coarse classification of [`TypeError`]s.
///
/// `NotReady` is not a user error: the scheduler is expected to re-run the check once the
/// referenced bound has been resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed type expressions: arity, rare types, illegal bounds, static context.
    Shape,
    /// Violated or unsatisfiable bounds.
    Bound,
    NotReady,
    Internal,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("wrong number of type arguments for `{class}`: expected {expected}, found {found}")]
    ArityMismatch {
        class: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    #[error("type argument `{actual}` must be a reference type")]
    PrimitiveTypeArgument { actual: String, span: Span },
    #[error("invalid bound for type variable `{var}`: {reason}")]
    InvalidBound {
        var: String,
        reason: String,
        span: Span,
    },
    #[error("type argument `{actual}` is not within the bound `{bound}` of type variable `{var}`")]
    BoundViolation {
        var: String,
        actual: String,
        bound: String,
        span: Span,
    },
    #[error("cyclic inheritance involving type variable `{var}`")]
    CyclicBound { var: String, span: Span },
    #[error("rare type `{ty}`: {reason}")]
    RareType {
        ty: String,
        reason: &'static str,
        span: Span,
    },
    #[error("cannot capture-convert `{ty}`: `{wildcard}` and `{bound}` are unrelated classes")]
    CaptureFailed {
        ty: String,
        wildcard: String,
        bound: String,
        span: Span,
    },
    #[error("type variable `{var}` is already bound")]
    Rebind { var: String, span: Span },
    #[error("type variable `{var}` cannot be referenced from a static context")]
    StaticContext { var: String, span: Span },
    #[error("type variable `{var}` cannot be referenced from static nested class `{class}`")]
    NestedStaticContext {
        var: String,
        class: String,
        span: Span,
    },
    #[error("cannot create an array of non-reifiable type `{ty}`")]
    NotReifiable { ty: String, span: Span },
    #[error("variable-arity parameter must be an array, not `{ty}`")]
    VarargsNotArray { ty: String, span: Span },
    #[error("`{what}` is not resolved yet")]
    NotReady { what: String },
    #[error("internal error: {0}")]
    Internal(String),
}

impl TypeError {
    /// Build an internal invariant violation. Panics in debug builds.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        if cfg!(debug_assertions) {
            panic!("internal invariant violated: {message}");
        }
        tracing::error!(target: "genus.types", message = %message, "internal invariant violated");
        TypeError::Internal(message)
    }

    pub fn not_ready(what: impl Into<String>) -> Self {
        TypeError::NotReady { what: what.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TypeError::ArityMismatch { .. }
            | TypeError::PrimitiveTypeArgument { .. }
            | TypeError::InvalidBound { .. }
            | TypeError::RareType { .. }
            | TypeError::Rebind { .. }
            | TypeError::StaticContext { .. }
            | TypeError::NestedStaticContext { .. }
            | TypeError::NotReifiable { .. }
            | TypeError::VarargsNotArray { .. } => ErrorKind::Shape,
            TypeError::BoundViolation { .. }
            | TypeError::CyclicBound { .. }
            | TypeError::CaptureFailed { .. } => ErrorKind::Bound,
            TypeError::NotReady { .. } => ErrorKind::NotReady,
            TypeError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_ready(&self) -> bool {
        self.kind() == ErrorKind::NotReady
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            TypeError::ArityMismatch { span, .. }
            | TypeError::PrimitiveTypeArgument { span, .. }
            | TypeError::InvalidBound { span, .. }
            | TypeError::BoundViolation { span, .. }
            | TypeError::CyclicBound { span, .. }
            | TypeError::RareType { span, .. }
            | TypeError::CaptureFailed { span, .. }
            | TypeError::Rebind { span, .. }
            | TypeError::StaticContext { span, .. }
            | TypeError::NestedStaticContext { span, .. }
            | TypeError::NotReifiable { span, .. }
            | TypeError::VarargsNotArray { span, .. } => Some(*span),
            TypeError::NotReady { .. } | TypeError::Internal(_) => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TypeError::ArityMismatch { .. } => "type-arity-mismatch",
            TypeError::PrimitiveTypeArgument { .. } => "primitive-type-argument",
            TypeError::InvalidBound { .. } => "invalid-bound",
            TypeError::BoundViolation { .. } => "bound-violation",
            TypeError::CyclicBound { .. } => "cyclic-bound",
            TypeError::RareType { .. } => "rare-type",
            TypeError::CaptureFailed { .. } => "capture-failed",
            TypeError::Rebind { .. } => "type-var-rebind",
            TypeError::StaticContext { .. } | TypeError::NestedStaticContext { .. } => {
                "static-context"
            }
            TypeError::NotReifiable { .. } => "non-reifiable-array",
            TypeError::VarargsNotArray { .. } => "varargs-not-array",
            TypeError::NotReady { .. } => "not-ready",
            TypeError::Internal(_) => "internal",
        }
    }

    /// User-facing diagnostic; `None` for errors that must not be reported (`NotReady`).
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        if self.is_not_ready() {
            return None;
        }
        Some(Diagnostic::error(self.code(), self.to_string(), self.span()))
    }
}
