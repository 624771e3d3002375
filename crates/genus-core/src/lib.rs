//! Core shared types for genus.
//!
//! Source spans, line/column conversion and the diagnostic model shared by the type engine and
//! the checker. This crate is intentionally small.

mod diagnostic;
mod text;

pub use diagnostic::{Diagnostic, DiagnosticSink, Severity};
pub use text::{LineCol, LineIndex, Span, TextRange, TextSize};
