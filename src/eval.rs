//! Compile-time constant evaluation.
//!
//! Two views are provided:
//!
//! - [`Program::literal_value`]: the value of a literal, or of a negated
//!   integer literal (`-1`). Structural equivalence only ever looks at this.
//! - [`Program::constant_value`]: full folding through operators, parentheses
//!   and `static final` fields with constant initializers. Used wherever a
//!   member's numeric value is needed (flag decomposition, suggestions,
//!   registry fingerprints, annotation value lists).

use crate::ast::{Expr, Literal, PolyOp, UnaryOp};
use crate::program::{Program, SymbolKind};
use crate::types::{Constant, ExprId, SymbolId, Type};

impl Program {
    /// Value of a literal or of a negated integer literal, without following references.
    pub fn literal_value(&self, id: ExprId) -> Option<Constant> {
        match self.expr(id) {
            Expr::Literal(Literal::Int(v)) => Some(Constant::Int(*v)),
            Expr::Literal(Literal::Str(s)) => Some(Constant::Str(s.clone())),
            Expr::Unary(UnaryOp::Neg, inner) => match self.expr(*inner) {
                Expr::Literal(Literal::Int(v)) => Some(Constant::Int(v.wrapping_neg())),
                _ => None,
            },
            _ => None,
        }
    }

    /// Folds `id` to a constant, following constant fields.
    pub fn constant_value(&self, id: ExprId) -> Option<Constant> {
        let mut visiting = Vec::new();
        self.fold(id, &mut visiting)
    }

    /// Value of a `static final` field with a constant initializer.
    pub fn symbol_constant_value(&self, symbol: SymbolId) -> Option<Constant> {
        let mut visiting = Vec::new();
        self.fold_symbol(symbol, &mut visiting)
    }

    fn fold_symbol(&self, symbol: SymbolId, visiting: &mut Vec<SymbolId>) -> Option<Constant> {
        let s = self.symbol(symbol);
        if s.kind != SymbolKind::Field || !s.modifiers.is_static || !s.modifiers.is_final {
            return None;
        }
        let init = s.initializer?;
        // `static final int A = B; static final int B = A;`
        if visiting.contains(&symbol) {
            return None;
        }
        visiting.push(symbol);
        let value = self.fold(init, visiting);
        visiting.pop();
        value.map(|v| narrow(v, s.ty))
    }

    fn fold(&self, id: ExprId, visiting: &mut Vec<SymbolId>) -> Option<Constant> {
        let value = match self.expr(id) {
            Expr::Literal(Literal::Int(v)) => Constant::Int(*v),
            Expr::Literal(Literal::Str(s)) => Constant::Str(s.clone()),
            Expr::Literal(Literal::Null) => return None,
            Expr::Reference(target) => return self.fold_symbol((*target)?, visiting),
            Expr::Call { .. } | Expr::Conditional { .. } | Expr::Switch { .. } => return None,
            Expr::Parenthesized(inner) => return self.fold(*inner, visiting),
            Expr::Unary(op, operand) => {
                let v = self.fold(*operand, visiting)?.as_int()?;
                match op {
                    UnaryOp::Not => Constant::Int(!v),
                    UnaryOp::Neg => Constant::Int(v.wrapping_neg()),
                }
            }
            Expr::Polyadic(op, operands) => {
                let mut values = Vec::with_capacity(operands.len());
                for &operand in operands {
                    values.push(self.fold(operand, visiting)?);
                }
                let ty = self.expr_type(id);
                fold_polyadic(*op, values, ty)?
            }
        };
        Some(narrow(value, self.expr_type(id)))
    }
}

fn fold_polyadic(op: PolyOp, values: Vec<Constant>, ty: Type) -> Option<Constant> {
    let mut values = values.into_iter();
    let first = values.next()?;

    if op == PolyOp::Plus && ty.is_string() {
        let mut acc = constant_text(&first);
        for v in values {
            acc.push_str(&constant_text(&v));
        }
        return Some(Constant::Str(acc));
    }

    let shift_mask = if ty == Type::Long { 63 } else { 31 };
    let mut acc = first.as_int()?;
    for v in values {
        let v = v.as_int()?;
        acc = match op {
            PolyOp::Or => acc | v,
            PolyOp::Xor => acc ^ v,
            PolyOp::And => acc & v,
            PolyOp::Plus => acc.wrapping_add(v),
            PolyOp::Minus => acc.wrapping_sub(v),
            PolyOp::Shl => acc.wrapping_shl((v & shift_mask) as u32),
        };
        if ty != Type::Long {
            acc = acc as i32 as i64;
        }
    }
    Some(Constant::Int(acc))
}

fn constant_text(value: &Constant) -> String {
    match value {
        Constant::Int(v) => v.to_string(),
        Constant::Str(s) => s.clone(),
    }
}

/// Wraps an integral value to the width of `ty`.
fn narrow(value: Constant, ty: Type) -> Constant {
    match value {
        Constant::Int(v) => Constant::Int(match ty {
            Type::Byte => v as i8 as i64,
            Type::Short => v as i16 as i64,
            Type::Char => v as u16 as i64,
            Type::Int => v as i32 as i64,
            _ => v,
        }),
        other => other,
    }
}
