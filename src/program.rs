//! Read-only program view: the expression arena and the symbol table.
//!
//! [`Program`] is the manager that owns every node. All construction goes
//! through it, and all the analysis code receives `&Program` together with
//! [`ExprId`]/[`SymbolId`] handles. Once built, a program is immutable for
//! the duration of any verification query, which is what makes concurrent
//! queries over one program safe.

use std::collections::HashMap;
use std::fmt::Debug;

use log::trace;

use crate::ast::{Expr, Literal, PolyOp, UnaryOp};
use crate::types::{ExprId, SymbolId, Type};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SymbolKind {
    LocalVariable,
    Parameter,
    Field,
    /// A method; the symbol's type is its return type.
    Method,
    AnnotationAttribute,
    AnnotationType,
    Class,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub public: bool,
    pub is_static: bool,
    pub is_final: bool,
}

impl Modifiers {
    /// `public static final`
    pub const CONSTANT: Modifiers = Modifiers {
        public: true,
        is_static: true,
        is_final: true,
    };

    pub const fn is_constant(self) -> bool {
        self.public && self.is_static && self.is_final
    }
}

/// Value of an annotation attribute.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AttributeValue {
    /// `{a, b, c}`
    Array(Vec<ExprId>),
    /// `Foo.class`
    Class(SymbolId),
    Expr(ExprId),
}

#[derive(Debug, Clone)]
pub struct Annotation {
    annotation_type: SymbolId,
    attributes: Vec<(String, AttributeValue)>,
}

impl Annotation {
    pub fn new(annotation_type: SymbolId) -> Self {
        Self {
            annotation_type,
            attributes: Vec::new(),
        }
    }

    pub fn with(mut self, name: &str, value: AttributeValue) -> Self {
        self.attributes.push((name.to_string(), value));
        self
    }

    pub fn annotation_type(&self) -> SymbolId {
        self.annotation_type
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    /// Enclosing class (fields, methods), method (parameters, locals) or annotation type (attributes).
    pub owner: Option<SymbolId>,
    pub modifiers: Modifiers,
    pub initializer: Option<ExprId>,
    pub effectively_final: bool,
    pub annotations: Vec<Annotation>,
    /// Declaration this one overrides: a super method, or the matching parameter of one.
    pub overrides: Option<SymbolId>,
    /// Fields of a class, parameters of a method, attributes of an annotation type.
    pub members: Vec<SymbolId>,
}

impl Symbol {
    fn new(name: &str, kind: SymbolKind, ty: Type, owner: Option<SymbolId>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            ty,
            owner,
            modifiers: Modifiers::default(),
            initializer: None,
            effectively_final: false,
            annotations: Vec::new(),
            overrides: None,
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    expr: Expr,
    ty: Type,
}

#[derive(Default)]
pub struct Program {
    exprs: Vec<Node>,
    symbols: Vec<Symbol>,
    by_name: HashMap<String, SymbolId>,
}

impl Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("exprs", &self.exprs.len())
            .field("symbols", &self.symbols.len())
            .finish()
    }
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()].expr
    }

    /// Static type of an expression.
    pub fn expr_type(&self, id: ExprId) -> Type {
        self.exprs[id.index()].ty
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn num_exprs(&self) -> usize {
        self.exprs.len()
    }

    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// Resolved declaration of a reference or a call.
    pub fn target(&self, id: ExprId) -> Option<SymbolId> {
        self.expr(id).target()
    }

    /// Strips any number of enclosing parentheses.
    pub fn skip_parens(&self, mut id: ExprId) -> ExprId {
        while let Expr::Parenthesized(inner) = self.expr(id) {
            id = *inner;
        }
        id
    }
}

// Names.
impl Program {
    /// Fully qualified name, e.g. `java.util.Calendar.MONTH`.
    pub fn qualified_name(&self, id: SymbolId) -> String {
        let symbol = self.symbol(id);
        match symbol.kind {
            SymbolKind::Class | SymbolKind::AnnotationType => symbol.name.clone(),
            _ => match symbol.owner {
                Some(owner) => format!("{}.{}", self.qualified_name(owner), symbol.name),
                None => symbol.name.clone(),
            },
        }
    }

    /// Short name used in messages, e.g. `Calendar.MONTH`.
    pub fn display_name(&self, id: SymbolId) -> String {
        let symbol = self.symbol(id);
        match (symbol.kind, symbol.owner) {
            (SymbolKind::Field | SymbolKind::Method, Some(owner)) => {
                let class = &self.symbol(owner).name;
                let short = class.rsplit('.').next().unwrap_or(class);
                format!("{}.{}", short, symbol.name)
            }
            (SymbolKind::Class | SymbolKind::AnnotationType, _) => symbol
                .name
                .rsplit('.')
                .next()
                .unwrap_or(&symbol.name)
                .to_string(),
            _ => symbol.name.clone(),
        }
    }

    /// Looks up a class, annotation type, field or method by qualified name.
    ///
    /// For overloaded methods the first declared one is returned.
    pub fn find_symbol(&self, qualified_name: &str) -> Option<SymbolId> {
        self.by_name.get(qualified_name).copied()
    }

    /// Language-level "same program element" test.
    ///
    /// Besides handle equality, two members with the same qualified name and
    /// kind are the same element (e.g. a library stub and its source).
    pub fn same_element(&self, a: SymbolId, b: SymbolId) -> bool {
        if a == b {
            return true;
        }
        let (sa, sb) = (self.symbol(a), self.symbol(b));
        let global = matches!(
            sa.kind,
            SymbolKind::Field | SymbolKind::Class | SymbolKind::AnnotationType
        );
        global && sa.kind == sb.kind && self.qualified_name(a) == self.qualified_name(b)
    }

    /// Public static final fields of `class` whose type is `ty`, in declaration order.
    pub fn constant_fields(&self, class: SymbolId, ty: Type) -> Vec<SymbolId> {
        self.symbol(class)
            .members
            .iter()
            .copied()
            .filter(|&f| {
                let field = self.symbol(f);
                field.kind == SymbolKind::Field && field.modifiers.is_constant() && field.ty == ty
            })
            .collect()
    }

    pub fn parameters(&self, method: SymbolId) -> Vec<SymbolId> {
        self.symbol(method)
            .members
            .iter()
            .copied()
            .filter(|&p| self.symbol(p).kind == SymbolKind::Parameter)
            .collect()
    }
}

// Symbols.
impl Program {
    fn push_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId::new(self.symbols.len() as u32);
        if let Some(owner) = symbol.owner {
            self.symbols[owner.index()].members.push(id);
        }
        self.symbols.push(symbol);
        if matches!(
            self.symbol(id).kind,
            SymbolKind::Class | SymbolKind::AnnotationType | SymbolKind::Field | SymbolKind::Method
        ) {
            let name = self.qualified_name(id);
            self.by_name.entry(name).or_insert(id);
        }
        trace!("symbol {} = {}", id, self.qualified_name(id));
        id
    }

    pub fn add_class(&mut self, qualified_name: &str) -> SymbolId {
        let class = Symbol::new(qualified_name, SymbolKind::Class, Type::Other, None);
        let id = self.push_symbol(class);
        self.symbols[id.index()].ty = Type::Class(id);
        id
    }

    pub fn add_annotation_type(&mut self, qualified_name: &str) -> SymbolId {
        let annotation = Symbol::new(qualified_name, SymbolKind::AnnotationType, Type::Other, None);
        let id = self.push_symbol(annotation);
        self.symbols[id.index()].ty = Type::Class(id);
        id
    }

    pub fn add_field(
        &mut self,
        class: SymbolId,
        name: &str,
        ty: Type,
        modifiers: Modifiers,
        initializer: Option<ExprId>,
    ) -> SymbolId {
        let mut field = Symbol::new(name, SymbolKind::Field, ty, Some(class));
        field.modifiers = modifiers;
        field.initializer = initializer;
        field.effectively_final = modifiers.is_final;
        self.push_symbol(field)
    }

    /// Declares `public static final <ty> <name> = <value>;` in `class`.
    pub fn add_constant(&mut self, class: SymbolId, name: &str, ty: Type, value: i64) -> SymbolId {
        let init = self.int(value);
        self.add_field(class, name, ty, Modifiers::CONSTANT, Some(init))
    }

    /// Declares `public static final String <name> = "<value>";` in `class`.
    pub fn add_string_constant(&mut self, class: SymbolId, name: &str, value: &str) -> SymbolId {
        let init = self.string(value);
        self.add_field(class, name, Type::String, Modifiers::CONSTANT, Some(init))
    }

    pub fn add_method(&mut self, class: SymbolId, name: &str, return_type: Type) -> SymbolId {
        let mut method = Symbol::new(name, SymbolKind::Method, return_type, Some(class));
        method.modifiers.public = true;
        self.push_symbol(method)
    }

    pub fn add_parameter(&mut self, method: SymbolId, name: &str, ty: Type) -> SymbolId {
        let mut param = Symbol::new(name, SymbolKind::Parameter, ty, Some(method));
        param.effectively_final = true;
        self.push_symbol(param)
    }

    pub fn add_local(
        &mut self,
        method: SymbolId,
        name: &str,
        ty: Type,
        initializer: Option<ExprId>,
        effectively_final: bool,
    ) -> SymbolId {
        let mut local = Symbol::new(name, SymbolKind::LocalVariable, ty, Some(method));
        local.initializer = initializer;
        local.effectively_final = effectively_final;
        self.push_symbol(local)
    }

    pub fn add_annotation_attribute(&mut self, annotation_type: SymbolId, name: &str, ty: Type) -> SymbolId {
        let attribute = Symbol::new(name, SymbolKind::AnnotationAttribute, ty, Some(annotation_type));
        self.push_symbol(attribute)
    }

    pub fn annotate(&mut self, symbol: SymbolId, annotation: Annotation) {
        self.symbols[symbol.index()].annotations.push(annotation);
    }

    pub fn set_overrides(&mut self, symbol: SymbolId, base: SymbolId) {
        self.symbols[symbol.index()].overrides = Some(base);
    }

    pub fn set_initializer(&mut self, symbol: SymbolId, initializer: ExprId) {
        self.symbols[symbol.index()].initializer = Some(initializer);
    }
}

// Expressions.
impl Program {
    fn push_expr(&mut self, expr: Expr, ty: Type) -> ExprId {
        let id = ExprId::new(self.exprs.len() as u32);
        trace!("expr {} = {:?} : {}", id, expr, ty);
        self.exprs.push(Node { expr, ty });
        id
    }

    pub fn int(&mut self, value: i64) -> ExprId {
        self.push_expr(Expr::Literal(Literal::Int(value)), Type::Int)
    }

    pub fn long(&mut self, value: i64) -> ExprId {
        self.push_expr(Expr::Literal(Literal::Int(value)), Type::Long)
    }

    pub fn string(&mut self, value: &str) -> ExprId {
        self.push_expr(Expr::Literal(Literal::Str(value.to_string())), Type::String)
    }

    pub fn null(&mut self) -> ExprId {
        self.push_expr(Expr::Literal(Literal::Null), Type::Null)
    }

    pub fn reference(&mut self, target: SymbolId) -> ExprId {
        let ty = self.symbol(target).ty;
        self.push_expr(Expr::Reference(Some(target)), ty)
    }

    pub fn unresolved_reference(&mut self, ty: Type) -> ExprId {
        self.push_expr(Expr::Reference(None), ty)
    }

    pub fn call(&mut self, callee: SymbolId, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let ty = self.symbol(callee).ty;
        let args = args.into_iter().collect();
        self.push_expr(
            Expr::Call {
                callee: Some(callee),
                args,
            },
            ty,
        )
    }

    pub fn unresolved_call(&mut self, ty: Type, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let args = args.into_iter().collect();
        self.push_expr(Expr::Call { callee: None, args }, ty)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        let ty = self.expr_type(operand);
        self.push_expr(Expr::Unary(op, operand), ty)
    }

    pub fn not(&mut self, operand: ExprId) -> ExprId {
        self.unary(UnaryOp::Not, operand)
    }

    pub fn neg(&mut self, operand: ExprId) -> ExprId {
        self.unary(UnaryOp::Neg, operand)
    }

    pub fn polyadic(&mut self, op: PolyOp, operands: impl IntoIterator<Item = ExprId>) -> ExprId {
        let operands: Vec<ExprId> = operands.into_iter().collect();
        assert!(operands.len() >= 2, "Polyadic expression needs at least two operands");
        let types: Vec<Type> = operands.iter().map(|&e| self.expr_type(e)).collect();
        let ty = if op == PolyOp::Plus && types.iter().any(|t| t.is_string()) {
            Type::String
        } else if types.contains(&Type::Long) {
            Type::Long
        } else if types.iter().all(|t| t.is_integral()) {
            Type::Int
        } else {
            Type::Other
        };
        self.push_expr(Expr::Polyadic(op, operands), ty)
    }

    pub fn or(&mut self, operands: impl IntoIterator<Item = ExprId>) -> ExprId {
        self.polyadic(PolyOp::Or, operands)
    }

    pub fn conditional(&mut self, condition: ExprId, then: ExprId, otherwise: ExprId) -> ExprId {
        let ty = match self.expr_type(then) {
            Type::Null => self.expr_type(otherwise),
            ty => ty,
        };
        self.push_expr(
            Expr::Conditional {
                condition,
                then,
                otherwise,
            },
            ty,
        )
    }

    pub fn switch(&mut self, selector: ExprId, arms: impl IntoIterator<Item = ExprId>) -> ExprId {
        let arms: Vec<ExprId> = arms.into_iter().collect();
        let ty = arms.first().map_or(Type::Other, |&a| self.expr_type(a));
        self.push_expr(Expr::Switch { selector, arms }, ty)
    }

    pub fn paren(&mut self, inner: ExprId) -> ExprId {
        let ty = self.expr_type(inner);
        self.push_expr(Expr::Parenthesized(inner), ty)
    }
}
