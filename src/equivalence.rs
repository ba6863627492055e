//! Structural equivalence: are two nodes guaranteed to denote the same value?
//!
//! The relation works over [`Term`]s, so that expressions from the program and
//! members of a [`Domain`][crate::domain::Domain] can be compared uniformly.
//! Rules, most specific first:
//!
//! 1. Two literals (including a negated integer literal) are equal iff their
//!    values are equal.
//! 2. Two prefix expressions with the same operator are equal iff their
//!    operands are.
//! 3. If either side is a reference or a call, both must resolve to the same
//!    program element.
//! 4. Otherwise the two subtrees are compared node by node.
//!
//! Nothing is ever folded through a declaration here: `0` and a field
//! `ZERO = 0` are different terms.

use crate::ast::{Expr, UnaryOp};
use crate::program::Program;
use crate::types::{Constant, ConstantRef, ExprId, SymbolId};

/// One side of an equivalence test.
#[derive(Debug, Copy, Clone)]
pub enum Term<'a> {
    Expr(ExprId),
    Member(&'a ConstantRef),
}

impl From<ExprId> for Term<'_> {
    fn from(id: ExprId) -> Self {
        Term::Expr(id)
    }
}

impl<'a> From<&'a ConstantRef> for Term<'a> {
    fn from(member: &'a ConstantRef) -> Self {
        Term::Member(member)
    }
}

enum Shape {
    Literal(Constant),
    Declaration(Option<SymbolId>),
    Unary(UnaryOp, ExprId),
    Tree(ExprId),
}

impl Program {
    fn shape(&self, term: Term<'_>) -> Shape {
        match term {
            Term::Member(ConstantRef::Literal(value)) => Shape::Literal(value.clone()),
            Term::Member(ConstantRef::Symbol(symbol)) => Shape::Declaration(Some(*symbol)),
            Term::Expr(id) => {
                if let Some(value) = self.literal_value(id) {
                    return Shape::Literal(value);
                }
                match self.expr(id) {
                    Expr::Reference(target) => Shape::Declaration(*target),
                    Expr::Call { callee, .. } => Shape::Declaration(*callee),
                    Expr::Unary(op, operand) => Shape::Unary(*op, *operand),
                    _ => Shape::Tree(id),
                }
            }
        }
    }

    /// Structural equivalence of two terms.
    pub fn same<'a, 'b>(&self, a: impl Into<Term<'a>>, b: impl Into<Term<'b>>) -> bool {
        let (a, b) = (a.into(), b.into());
        if let (Term::Expr(x), Term::Expr(y)) = (a, b) {
            if x == y {
                return true;
            }
        }
        match (self.shape(a), self.shape(b)) {
            (Shape::Literal(x), Shape::Literal(y)) => x == y,
            (Shape::Unary(op1, x), Shape::Unary(op2, y)) if op1 == op2 => self.same(x, y),
            (Shape::Declaration(x), Shape::Declaration(y)) => match (x, y) {
                (Some(x), Some(y)) => self.same_element(x, y),
                _ => false,
            },
            (Shape::Declaration(_), _) | (_, Shape::Declaration(_)) => false,
            (Shape::Tree(x), Shape::Tree(y)) => self.same_tree(x, y),
            _ => false,
        }
    }

    /// Structural equivalence of two domain members.
    pub fn same_member(&self, a: &ConstantRef, b: &ConstantRef) -> bool {
        self.same(a, b)
    }

    fn same_tree(&self, x: ExprId, y: ExprId) -> bool {
        let all_same = |xs: &[ExprId], ys: &[ExprId]| {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(&a, &b)| self.same(a, b))
        };
        match (self.expr(x), self.expr(y)) {
            (Expr::Literal(a), Expr::Literal(b)) => a == b,
            (Expr::Parenthesized(a), Expr::Parenthesized(b)) => self.same(*a, *b),
            (Expr::Polyadic(op1, xs), Expr::Polyadic(op2, ys)) => op1 == op2 && all_same(xs, ys),
            (
                Expr::Conditional {
                    condition: c1,
                    then: t1,
                    otherwise: o1,
                },
                Expr::Conditional {
                    condition: c2,
                    then: t2,
                    otherwise: o2,
                },
            ) => self.same(*c1, *c2) && self.same(*t1, *t2) && self.same(*o1, *o2),
            (
                Expr::Switch {
                    selector: s1,
                    arms: a1,
                },
                Expr::Switch {
                    selector: s2,
                    arms: a2,
                },
            ) => self.same(*s1, *s2) && all_same(a1, a2),
            _ => false,
        }
    }
}
