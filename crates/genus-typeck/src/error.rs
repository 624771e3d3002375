use genus_core::{Diagnostic, Span};
use genus_types::TypeError;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error("the `{op}` operator must have {expected} operands, not `{ty}`")]
    OperandType {
        op: &'static str,
        expected: &'static str,
        ty: String,
        span: Span,
    },
    #[error("operand of `{op}` must be a variable")]
    NotAVariable { op: &'static str, span: Span },
    #[error("operand of `{op}` must be a non-final variable")]
    FinalVariable { op: &'static str, span: Span },
    #[error("condition must be of type boolean, not `{ty}`")]
    ConditionNotBoolean { ty: String, span: Span },
    #[error("incomparable types `{left}` and `{right}` for `{op}`")]
    Incomparable {
        op: &'static str,
        left: String,
        right: String,
        span: Span,
    },
    #[error("cannot assign a value of type `{from}` to `{to}`")]
    Incompatible { from: String, to: String, span: Span },
    #[error("`{receiver}` has no field named `{name}`")]
    UnknownField {
        receiver: String,
        name: String,
        span: Span,
    },
    #[error("cannot find symbol `{name}`")]
    UnknownName { name: String, span: Span },
    #[error("duplicate annotation `@{name}`")]
    DuplicateAnnotation { name: String, span: Span },
    #[error("annotation `@{name}` is not applicable to this kind of declaration")]
    AnnotationNotApplicable { name: String, span: Span },
    #[error("method `{method}` does not override a method from a supertype")]
    NothingToOverride { method: String, span: Span },
    #[error("cyclic inheritance involving `{name}`")]
    CyclicInheritance { name: String, span: Span },
    #[error("can only iterate over an array or an instance of `java.lang.Iterable`, not `{ty}`")]
    NotIterable { ty: String, span: Span },
    #[error("wrong number of arguments: expected {expected}, found {found}")]
    ArgumentCount {
        expected: usize,
        found: usize,
        span: Span,
    },
}

impl CheckError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, CheckError::Type(err) if err.is_not_ready())
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CheckError::Type(TypeError::Internal(_)))
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            CheckError::Type(err) => err.span(),
            CheckError::OperandType { span, .. }
            | CheckError::NotAVariable { span, .. }
            | CheckError::FinalVariable { span, .. }
            | CheckError::ConditionNotBoolean { span, .. }
            | CheckError::Incomparable { span, .. }
            | CheckError::Incompatible { span, .. }
            | CheckError::UnknownField { span, .. }
            | CheckError::UnknownName { span, .. }
            | CheckError::DuplicateAnnotation { span, .. }
            | CheckError::AnnotationNotApplicable { span, .. }
            | CheckError::NothingToOverride { span, .. }
            | CheckError::CyclicInheritance { span, .. }
            | CheckError::NotIterable { span, .. }
            | CheckError::ArgumentCount { span, .. } => Some(*span),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CheckError::Type(err) => err.code(),
            CheckError::OperandType { .. } => "operand-type",
            CheckError::NotAVariable { .. } => "not-a-variable",
            CheckError::FinalVariable { .. } => "final-variable",
            CheckError::ConditionNotBoolean { .. } => "condition-not-boolean",
            CheckError::Incomparable { .. } => "incomparable-types",
            CheckError::Incompatible { .. } => "incompatible-types",
            CheckError::UnknownField { .. } => "unknown-field",
            CheckError::UnknownName { .. } => "unknown-name",
            CheckError::DuplicateAnnotation { .. } => "duplicate-annotation",
            CheckError::AnnotationNotApplicable { .. } => "annotation-not-applicable",
            CheckError::NothingToOverride { .. } => "nothing-to-override",
            CheckError::CyclicInheritance { .. } => "cyclic-inheritance",
            CheckError::NotIterable { .. } => "not-iterable",
            CheckError::ArgumentCount { .. } => "argument-count",
        }
    }

    /// `None` for deferred checks and engine defects, which never surface as user diagnostics.
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        if self.is_not_ready() || self.is_internal() {
            return None;
        }
        Some(Diagnostic::error(self.code(), self.to_string(), self.span()))
    }
}
