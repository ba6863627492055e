//! Domain resolution: which domain does a declaration carry?
//!
//! A domain is declared by the magic annotation, either directly on the
//! declaration or on an annotation type used on it (meta-annotation), up to
//! [`VerifierConfig::max_annotation_depth`] levels deep. Annotations on an
//! overridden method or parameter are inherited. A local variable without
//! its own declaration borrows the domain of the call or reference it is
//! initialized with.
//!
//! ```text
//! @MagicConstant(flags = {A, B, C})
//! @interface Style {}
//!
//! void draw(@Style int style);      // resolve(style) = Flags{A, B, C}
//! int s = getStyle(); draw(s);      // resolve(s) = resolve(getStyle)
//! ```

use log::{debug, trace};

use crate::cache::QueryCache;
use crate::config::VerifierConfig;
use crate::domain::Domain;
use crate::error::DomainError;
use crate::program::{Annotation, AttributeValue, Program, SymbolKind};
use crate::registry;
use crate::types::{ConstantRef, ExprId, SymbolId, Type};
use crate::visited::VisitedSet;

const INT_VALUES: &str = "intValues";
const FLAGS: &str = "flags";
const STRING_VALUES: &str = "stringValues";
const VALUES_FROM_CLASS: &str = "valuesFromClass";
const FLAGS_FROM_CLASS: &str = "flagsFromClass";

/// Resolves declared domains against one program and configuration.
#[derive(Debug, Copy, Clone)]
pub struct DomainResolver<'p> {
    program: &'p Program,
    config: &'p VerifierConfig,
}

impl<'p> DomainResolver<'p> {
    pub fn new(program: &'p Program, config: &'p VerifierConfig) -> Self {
        Self { program, config }
    }

    /// Domain declared for `symbol` when it holds a value of `target_type`.
    ///
    /// `context` is the expression the question arises from; when it is a
    /// call of `symbol` matching a built-in entry, the built-in domain wins.
    /// Results are memoized in `cache`, which must not outlive the query.
    pub fn resolve(
        &self,
        symbol: SymbolId,
        target_type: Type,
        context: Option<ExprId>,
        cache: &mut QueryCache,
    ) -> Result<Option<Domain>, DomainError> {
        if let Some(call) = context {
            let calls_symbol = self
                .program
                .target(self.program.skip_parens(call))
                .is_some_and(|callee| self.program.same_element(callee, symbol));
            if calls_symbol {
                if let Some(domain) = registry::lookup(self.program, call, cache) {
                    return Ok(Some(domain));
                }
            }
        }

        let key = (symbol, target_type);
        if let Some(domain) = cache.domains.get(&key) {
            trace!("resolve({}, {}): cached", symbol, target_type);
            return Ok(domain);
        }

        let mut locals = VisitedSet::new(self.program.num_symbols());
        let domain = self.resolve_in(
            symbol,
            target_type,
            &VisitedSet::default(),
            0,
            &mut locals,
            cache,
        )?;
        debug!(
            "resolve({}, {}) -> {}",
            self.program.qualified_name(symbol),
            target_type,
            match &domain {
                Some(d) => format!("{} of {}", d.kind(), d.len()),
                None => "none".to_string(),
            }
        );
        cache.domains.insert(key, domain.clone());
        Ok(domain)
    }

    fn resolve_in(
        &self,
        symbol: SymbolId,
        target_type: Type,
        annotation_types: &VisitedSet<SymbolId>,
        depth: usize,
        locals: &mut VisitedSet<SymbolId>,
        cache: &mut QueryCache,
    ) -> Result<Option<Domain>, DomainError> {
        if depth > self.config.max_annotation_depth {
            debug!(
                "resolve: annotation chain deeper than {} at {}",
                self.config.max_annotation_depth, symbol
            );
            return Ok(None);
        }

        for (owner, annotation) in self.all_annotations(symbol) {
            if let Some(domain) = self.declared_domain(owner, annotation, target_type)? {
                return Ok(Some(domain));
            }

            let annotation_type = annotation.annotation_type();
            if annotation_types.contains(annotation_type) {
                continue;
            }
            if self.program.symbol(annotation_type).annotations.is_empty() {
                continue;
            }
            let visited = annotation_types.with(annotation_type);
            let meta = self.resolve_in(
                annotation_type,
                target_type,
                &visited,
                depth + 1,
                locals,
                cache,
            )?;
            if meta.is_some() {
                return Ok(meta);
            }
        }

        self.resolve_local(symbol, target_type, annotation_types, depth, locals, cache)
    }

    /// One hop from a local variable into the target of its initializer.
    fn resolve_local(
        &self,
        symbol: SymbolId,
        target_type: Type,
        annotation_types: &VisitedSet<SymbolId>,
        depth: usize,
        locals: &mut VisitedSet<SymbolId>,
        cache: &mut QueryCache,
    ) -> Result<Option<Domain>, DomainError> {
        let local = self.program.symbol(symbol);
        if local.kind != SymbolKind::LocalVariable || !local.effectively_final {
            return Ok(None);
        }
        let Some(init) = local.initializer.map(|e| self.program.skip_parens(e)) else {
            return Ok(None);
        };
        if !self.program.expr(init).is_reference_like() {
            return Ok(None);
        }
        let Some(target) = self.program.target(init) else {
            return Ok(None);
        };
        locals.insert(symbol);
        if locals.contains(target) {
            debug!("resolve: local variable cycle through {}", target);
            return Ok(None);
        }
        if let Some(domain) = registry::lookup(self.program, init, cache) {
            return Ok(Some(domain));
        }
        trace!("resolve: local {} -> {}", symbol, target);
        self.resolve_in(target, target_type, annotation_types, depth, locals, cache)
    }

    /// Annotations of `symbol`, then those inherited through its `overrides` chain.
    fn all_annotations(&self, symbol: SymbolId) -> Vec<(SymbolId, &'p Annotation)> {
        let mut result = Vec::new();
        let mut seen = VisitedSet::new(self.program.num_symbols());
        let mut current = Some(symbol);
        while let Some(s) = current {
            if !seen.insert(s) {
                break;
            }
            let decl = self.program.symbol(s);
            result.extend(decl.annotations.iter().map(|a| (s, a)));
            current = decl.overrides;
        }
        result
    }

    /// Domain declared directly by `annotation`, if it is the magic annotation.
    fn declared_domain(
        &self,
        owner: SymbolId,
        annotation: &Annotation,
        target_type: Type,
    ) -> Result<Option<Domain>, DomainError> {
        let annotation_type = annotation.annotation_type();
        if self.program.qualified_name(annotation_type) != self.config.magic_annotation {
            return Ok(None);
        }

        let mut values = Vec::new();
        let mut flags = Vec::new();
        if target_type.is_integral() {
            values.extend(self.listed_members(annotation, INT_VALUES));
            flags.extend(self.listed_members(annotation, FLAGS));
            flags.extend(self.class_members(annotation, FLAGS_FROM_CLASS, target_type));
        } else if target_type.is_string() {
            values.extend(self.listed_members(annotation, STRING_VALUES));
        } else {
            return Ok(None);
        }
        values.extend(self.class_members(annotation, VALUES_FROM_CLASS, target_type));

        match (values.is_empty(), flags.is_empty()) {
            (true, true) => Ok(None),
            (false, false) => {
                debug!("resolve: both values and flags declared on {}", owner);
                Err(DomainError::Misconfigured { symbol: owner })
            }
            (false, true) => Ok(Some(Domain::enumeration(values))),
            (true, false) => Ok(Some(Domain::flags(flags))),
        }
    }

    fn listed_members(&self, annotation: &Annotation, attribute: &str) -> Vec<ConstantRef> {
        let exprs: &[ExprId] = match annotation.attribute(attribute) {
            Some(AttributeValue::Array(exprs)) => exprs,
            Some(AttributeValue::Expr(expr)) => std::slice::from_ref(expr),
            Some(AttributeValue::Class(_)) | None => return Vec::new(),
        };
        exprs
            .iter()
            .filter_map(|&e| {
                let e = self.program.skip_parens(e);
                let member = match self.program.target(e) {
                    Some(symbol) if self.program.expr(e).is_reference_like() => {
                        Some(ConstantRef::Symbol(symbol))
                    }
                    _ => self.program.constant_value(e).map(ConstantRef::Literal),
                };
                if member.is_none() {
                    debug!("resolve: skipping non-constant member {} of {}", e, attribute);
                }
                member
            })
            .collect()
    }

    fn class_members(&self, annotation: &Annotation, attribute: &str, ty: Type) -> Vec<ConstantRef> {
        match annotation.attribute(attribute) {
            Some(AttributeValue::Class(class)) => self
                .program
                .constant_fields(*class, ty)
                .into_iter()
                .map(ConstantRef::Symbol)
                .collect(),
            _ => Vec::new(),
        }
    }
}
