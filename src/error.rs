//! Error types.
//!
//! Only two things are errors here: a misconfigured domain declaration and a
//! cancelled query. Unresolvable references, cycles and depth cut-offs are
//! ordinary negative answers.

use thiserror::Error;

use crate::program::Program;
use crate::types::SymbolId;

const BOTH_LISTS: &str = "'flags' and 'values' must not be used at the same time";

/// A domain declaration that cannot be turned into a [`Domain`][crate::domain::Domain].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DomainError {
    /// The same annotation supplies both a values list and a flags list.
    #[error("misconfigured domain on {symbol}: {}", BOTH_LISTS)]
    Misconfigured { symbol: SymbolId },
}

impl DomainError {
    /// The declaration the error belongs to.
    pub fn symbol(&self) -> SymbolId {
        match self {
            DomainError::Misconfigured { symbol } => *symbol,
        }
    }

    /// The error message with the declaration spelled by name.
    pub fn message(&self, program: &Program) -> String {
        match self {
            DomainError::Misconfigured { symbol } => {
                format!("misconfigured domain on {}: {}", program.display_name(*symbol), BOTH_LISTS)
            }
        }
    }
}

/// Failure reported by a [`Slicer`][crate::slicing::Slicer].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum SliceError {
    #[error("slicing was cancelled")]
    Cancelled,
    #[error("slicing failed: {0}")]
    Failed(String),
}

/// Failure of a verification query.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// The query was cancelled; its partial answer is meaningless.
    #[error("verification was cancelled")]
    Cancelled,
}
