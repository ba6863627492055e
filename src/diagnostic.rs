//! Problems reported by [`Verifier::check`][crate::verifier::Verifier::check].

use std::fmt;

use crate::decompose::Suggestion;
use crate::domain::Domain;
use crate::program::Program;
use crate::types::{ExprId, SymbolId};

#[derive(Debug, Clone)]
pub enum Diagnostic {
    /// `expr` does not provably belong to the domain of its target.
    NotInDomain {
        expr: ExprId,
        target: SymbolId,
        domain: Domain,
        /// Allowed members as displayed, possibly truncated.
        allowed: String,
        fix: Option<Suggestion>,
    },
    /// The domain declaration on `symbol` is unusable.
    Misconfigured { symbol: SymbolId, message: String },
}

impl Diagnostic {
    pub(crate) fn not_in_domain(
        program: &Program,
        expr: ExprId,
        target: SymbolId,
        domain: Domain,
        fix: Option<Suggestion>,
        display_limit: usize,
    ) -> Self {
        let allowed = truncate(domain.render_members(program), display_limit);
        Diagnostic::NotInDomain {
            expr,
            target,
            domain,
            allowed,
            fix,
        }
    }

    /// The expression or declaration the diagnostic is attached to.
    pub fn location(&self) -> Location {
        match self {
            Diagnostic::NotInDomain { expr, .. } => Location::Expr(*expr),
            Diagnostic::Misconfigured { symbol, .. } => Location::Symbol(*symbol),
        }
    }

    pub fn fix(&self) -> Option<&Suggestion> {
        match self {
            Diagnostic::NotInDomain { fix, .. } => fix.as_ref(),
            Diagnostic::Misconfigured { .. } => None,
        }
    }

    /// Human-readable message, e.g. `Should be one of: Font.PLAIN, Font.BOLD or their combination`.
    pub fn message(&self, program: &Program) -> String {
        match self {
            Diagnostic::NotInDomain {
                domain,
                allowed,
                fix,
                ..
            } => {
                let mut message = format!("Should be one of: {}", allowed);
                if domain.is_flags() {
                    message.push_str(" or their combination");
                }
                if let Some(fix) = fix {
                    message.push_str(&format!(" (replace with {})", fix.render(program)));
                }
                message
            }
            Diagnostic::Misconfigured { message, .. } => message.clone(),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Location {
    Expr(ExprId),
    Symbol(SymbolId),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Expr(e) => write!(f, "{}", e),
            Location::Symbol(s) => write!(f, "{}", s),
        }
    }
}

/// Cuts `text` to at most `limit` characters, marking the cut with `...`.
fn truncate(text: String, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}
