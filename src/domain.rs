//! Value domains: the declared set of values a position may hold.

use std::fmt;

use crate::equivalence::Term;
use crate::program::{Program, SymbolKind};
use crate::types::{Constant, ConstantRef};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DomainKind {
    /// Exactly one of the members.
    Enum,
    /// Any bitwise combination of the members.
    Flags,
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainKind::Enum => write!(f, "enum"),
            DomainKind::Flags => write!(f, "flags"),
        }
    }
}

/// A value domain.
///
/// # Invariants
///
/// - `members` keeps declaration order; completion relies on it.
/// - Equality and subset are taken under structural equivalence, so they
///   need the [`Program`] and are not `PartialEq`.
#[derive(Debug, Clone)]
pub struct Domain {
    kind: DomainKind,
    members: Vec<ConstantRef>,
}

impl Domain {
    pub fn new<I>(kind: DomainKind, members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ConstantRef>,
    {
        Self {
            kind,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn enumeration<I>(members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ConstantRef>,
    {
        Self::new(DomainKind::Enum, members)
    }

    pub fn flags<I>(members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ConstantRef>,
    {
        Self::new(DomainKind::Flags, members)
    }

    pub fn kind(&self) -> DomainKind {
        self.kind
    }

    pub fn is_flags(&self) -> bool {
        self.kind == DomainKind::Flags
    }

    pub fn members(&self) -> &[ConstantRef] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns true if some member structurally equals `term`.
    pub fn contains<'a>(&self, program: &Program, term: impl Into<Term<'a>>) -> bool {
        let term = term.into();
        self.members.iter().any(|m| program.same(term, m))
    }

    /// Returns true if some member's value is the integer `0`.
    ///
    /// A member counts when it is the literal `0`, or a constant field whose
    /// initializer is literally `0`. Values reached through further
    /// indirection (`A = B`, `A = 1 - 1`) do not count.
    pub fn has_zero_member(&self, program: &Program) -> bool {
        self.members.iter().any(|m| match m {
            ConstantRef::Literal(value) => value.is_zero(),
            ConstantRef::Symbol(symbol) => {
                let s = program.symbol(*symbol);
                s.kind == SymbolKind::Field
                    && s.modifiers.is_final
                    && s.initializer
                        .and_then(|init| program.literal_value(init))
                        .is_some_and(|v| v.is_zero())
            }
        })
    }

    /// `self ⊆ other`: every member of `self` equals some member of `other`.
    pub fn is_subset_of(&self, other: &Domain, program: &Program) -> bool {
        self.members.iter().all(|m| other.contains(program, m))
    }

    /// Same kind and equal member sets (order irrelevant).
    pub fn equals(&self, other: &Domain, program: &Program) -> bool {
        self.kind == other.kind
            && self.is_subset_of(other, program)
            && other.is_subset_of(self, program)
    }

    /// Members' folded values, `None` where a member has no constant value.
    pub fn member_values(&self, program: &Program) -> Vec<Option<Constant>> {
        self.members
            .iter()
            .map(|m| match m {
                ConstantRef::Literal(value) => Some(value.clone()),
                ConstantRef::Symbol(symbol) => program.symbol_constant_value(*symbol),
            })
            .collect()
    }

    /// Renders the members for messages, e.g. `Font.PLAIN, Font.BOLD`.
    pub fn render_members(&self, program: &Program) -> String {
        self.members
            .iter()
            .map(|m| program.render_member(m))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Program {
    /// Display text of a single member.
    pub fn render_member(&self, member: &ConstantRef) -> String {
        match member {
            ConstantRef::Literal(value) => value.to_string(),
            ConstantRef::Symbol(symbol) => self.display_name(*symbol),
        }
    }
}
