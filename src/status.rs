//! Status codes for descriptor construction and queries.
//!
//! `Unimplemented` is not an exceptional condition: it is the normal answer a
//! candidate implementation gives during negotiation when a configuration is
//! outside what it supports. Callers iterate to the next candidate.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// The configuration is not supported by this implementation variant.
    /// Carries a short reason for diagnostics only.
    #[error("unimplemented: {0}")]
    Unimplemented(&'static str),
    /// The query kind is not understood by this descriptor family.
    #[error("unsupported query: {0}")]
    UnsupportedQuery(&'static str),
    /// The operator description itself is structurally malformed.
    #[error("invalid descriptor: {0}")]
    InvalidDesc(&'static str),
}

pub type PlanResult<T> = Result<T, PlanError>;

impl PlanError {
    /// True for the negotiation status, false for hard errors.
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, PlanError::Unimplemented(_))
    }
}
