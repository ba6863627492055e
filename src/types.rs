//! Type-safe handles and value types shared by the whole crate.
//!
//! Expressions and symbols live in the [`Program`][crate::program::Program] arena
//! and are addressed by lightweight `Copy` handles, so that the verifier never
//! compares nodes by pointer identity.
use std::fmt;

/// An expression identifier (index into the program's expression arena).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ExprId(u32);

impl ExprId {
    pub const fn new(index: u32) -> Self {
        ExprId(index)
    }

    /// Returns the raw value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the expression index as a `usize` for array indexing.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl From<ExprId> for usize {
    fn from(id: ExprId) -> Self {
        id.0 as usize
    }
}

/// A symbol identifier (index into the program's symbol table).
///
/// Symbols are declaration sites: variables, parameters, fields, methods,
/// annotation attributes, annotation types and classes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    pub const fn new(index: u32) -> Self {
        SymbolId(index)
    }

    /// Returns the raw value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the symbol index as a `usize` for array indexing.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Static type of an expression or declared type of a symbol.
///
/// Only the distinctions the verifier needs are kept: integral ranks,
/// `String`, the null type and class types.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Type {
    Byte,
    Short,
    Char,
    Int,
    Long,
    String,
    /// Type of the `null` literal.
    Null,
    Class(SymbolId),
    /// Any other type (floating point, boolean, arrays, void).
    Other,
}

impl Type {
    /// Returns true for types whose rank is at most `long`.
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Type::Byte | Type::Short | Type::Char | Type::Int | Type::Long
        )
    }

    pub const fn is_string(self) -> bool {
        matches!(self, Type::String)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Byte => write!(f, "byte"),
            Type::Short => write!(f, "short"),
            Type::Char => write!(f, "char"),
            Type::Int => write!(f, "int"),
            Type::Long => write!(f, "long"),
            Type::String => write!(f, "String"),
            Type::Null => write!(f, "null"),
            Type::Class(id) => write!(f, "class{}", id),
            Type::Other => write!(f, "?"),
        }
    }
}

/// An evaluated compile-time constant.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Constant {
    Int(i64),
    Str(String),
}

impl Constant {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Constant::Int(v) => Some(*v),
            Constant::Str(_) => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Constant::Int(0))
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for Constant {
    fn from(value: i64) -> Self {
        Constant::Int(value)
    }
}

impl From<&str> for Constant {
    fn from(value: &str) -> Self {
        Constant::Str(value.to_string())
    }
}

/// A reference to a single allowed value.
///
/// Members are compared through structural equivalence
/// ([`Program::same_member`][crate::program::Program::same_member]), which
/// treats two symbols as equal when they denote the same program element.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ConstantRef {
    Literal(Constant),
    Symbol(SymbolId),
}

impl From<SymbolId> for ConstantRef {
    fn from(symbol: SymbolId) -> Self {
        ConstantRef::Symbol(symbol)
    }
}

impl From<Constant> for ConstantRef {
    fn from(value: Constant) -> Self {
        ConstantRef::Literal(value)
    }
}
