//! Expression nodes stored in the [`Program`][crate::program::Program] arena.
//!
//! Nodes refer to their operands through [`ExprId`] handles, so the arena is
//! a flat vector and a node is never owned by its parent.

use crate::types::{ExprId, SymbolId};

/// Literal payload.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Literal {
    Int(i64),
    Str(String),
    Null,
}

/// Prefix operators.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UnaryOp {
    /// Bitwise complement `~x`.
    Not,
    /// Arithmetic negation `-x`.
    Neg,
}

/// Operators of n-ary (left-associative) expressions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PolyOp {
    Or,
    Xor,
    And,
    Plus,
    Minus,
    Shl,
}

impl PolyOp {
    /// Operators under which a flags domain is closed.
    pub const fn combines_flags(self) -> bool {
        matches!(self, PolyOp::Or | PolyOp::Xor | PolyOp::And | PolyOp::Plus)
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            PolyOp::Or => "|",
            PolyOp::Xor => "^",
            PolyOp::And => "&",
            PolyOp::Plus => "+",
            PolyOp::Minus => "-",
            PolyOp::Shl => "<<",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Expr<I = ExprId> {
    Literal(Literal),
    /// Reference to a declaration; `None` when it does not resolve.
    Reference(Option<SymbolId>),
    /// Method call; `callee` is `None` when it does not resolve.
    Call {
        callee: Option<SymbolId>,
        args: Vec<I>,
    },
    Unary(UnaryOp, I),
    Polyadic(PolyOp, Vec<I>),
    /// `condition ? then : otherwise`
    Conditional {
        condition: I,
        then: I,
        otherwise: I,
    },
    /// Switch expression; `arms` are the values the arms yield.
    Switch {
        selector: I,
        arms: Vec<I>,
    },
    Parenthesized(I),
}

impl<I: Copy> Expr<I> {
    /// Operands that contribute to the value of this node.
    ///
    /// Conditions and selectors are excluded: they decide which branch is
    /// taken but never flow into the result.
    pub fn value_operands(&self) -> Vec<I> {
        match self {
            Expr::Literal(_) | Expr::Reference(_) | Expr::Call { .. } => Vec::new(),
            Expr::Unary(_, a) | Expr::Parenthesized(a) => vec![*a],
            Expr::Polyadic(_, xs) => xs.clone(),
            Expr::Conditional {
                then, otherwise, ..
            } => vec![*then, *otherwise],
            Expr::Switch { arms, .. } => arms.clone(),
        }
    }

    /// Returns true for the nodes that select between alternatives
    /// without computing anything themselves.
    pub fn is_selection(&self) -> bool {
        matches!(
            self,
            Expr::Parenthesized(_) | Expr::Conditional { .. } | Expr::Switch { .. }
        )
    }

    /// Resolved declaration of a reference or call.
    pub fn target(&self) -> Option<SymbolId> {
        match self {
            Expr::Reference(target) => *target,
            Expr::Call { callee, .. } => *callee,
            _ => None,
        }
    }

    pub fn is_reference_like(&self) -> bool {
        matches!(self, Expr::Reference(_) | Expr::Call { .. })
    }
}
