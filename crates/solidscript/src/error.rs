//! Pipeline-fatal errors. Most problems are reported through
//! [`crate::diagnostics`] and degraded, never thrown; `CompileError` is
//! reserved for the two cases that are genuinely unable to produce a
//! partial result: the parser returning nothing, and an internal invariant
//! violation.
//!
//! A plain enum with `strum::Display` rather than `thiserror`/`anyhow`.

use strum::{Display, IntoStaticStr};

#[derive(Debug, Display, IntoStaticStr, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[strum(to_string = "parse failed: {0}")]
    ParseFailed(String),
    #[strum(to_string = "internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl std::error::Error for CompileError {}

pub type CompileResult<T> = Result<T, CompileError>;
