//! Quick-fix suggestions for non-conforming literals.
//!
//! For an enumeration domain the fix is the member with the same value. For
//! a flags domain the literal is decomposed greedily into members whose bits
//! it covers, in declaration order:
//!
//! ```text
//! {A = 1, B = 2, C = 4}:   5 -> A | C
//!                          9 -> none (bit 8 is not covered)
//! {Z = 0, A = 1}:          1 -> A    (zero members are dropped from combinations)
//!                          0 -> Z
//! ```

use log::debug;

use crate::domain::{Domain, DomainKind};
use crate::program::Program;
use crate::types::{Constant, ConstantRef, ExprId};

/// Replacement for a non-conforming literal.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Suggestion {
    /// Members to substitute, OR-ed together when `is_flag_combination`.
    pub members: Vec<ConstantRef>,
    pub is_flag_combination: bool,
}

impl Suggestion {
    /// Replacement text, e.g. `Font.BOLD | Font.ITALIC`.
    pub fn render(&self, program: &Program) -> String {
        let separator = if self.is_flag_combination { " | " } else { ", " };
        self.members
            .iter()
            .map(|m| program.render_member(m))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Decomposes `value` into members of a flags domain.
///
/// Returns `None` when some bit of `value` is covered by no member, or when
/// nothing was chosen.
pub fn decompose(program: &Program, value: i64, domain: &Domain) -> Option<Vec<ConstantRef>> {
    let mut remaining = value;
    let mut chosen: Vec<(&ConstantRef, i64)> = Vec::new();
    for (member, member_value) in domain.members().iter().zip(domain.member_values(program)) {
        let Some(v) = member_value.as_ref().and_then(Constant::as_int) else {
            continue;
        };
        if remaining & v == v {
            chosen.push((member, v));
            remaining &= !v;
        }
    }
    if remaining != 0 {
        debug!("decompose({}): bits {:#x} not covered", value, remaining);
        return None;
    }
    if chosen.len() > 1 {
        chosen.retain(|&(_, v)| v != 0);
    }
    if chosen.is_empty() {
        return None;
    }
    Some(chosen.into_iter().map(|(m, _)| m.clone()).collect())
}

/// Suggests a replacement for `expr`, which failed to conform to `domain`.
///
/// Only compile-time constant expressions get a suggestion.
pub fn suggest_fix(program: &Program, expr: ExprId, domain: &Domain) -> Option<Suggestion> {
    let value = program.constant_value(expr)?;
    match domain.kind() {
        DomainKind::Enum => {
            let values = domain.member_values(program);
            let index = values.iter().position(|v| v.as_ref() == Some(&value))?;
            Some(Suggestion {
                members: vec![domain.members()[index].clone()],
                is_flag_combination: false,
            })
        }
        DomainKind::Flags => {
            let members = decompose(program, value.as_int()?, domain)?;
            Some(Suggestion {
                members,
                is_flag_combination: true,
            })
        }
    }
}
