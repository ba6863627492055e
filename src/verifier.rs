//! The verifier: does an expression provably belong to a domain?
//!
//! [`Verifier`] is the entry point. It borrows an immutable [`Program`],
//! owns a [`Slicer`] and a [`VerifierConfig`], and answers independent
//! queries. Every query runs against its own [`QueryCache`] and visited set,
//! so one verifier can serve many threads at once.
//!
//! # Membership
//!
//! [`Verifier::is_allowed`] tries the following, in order, for an expression `e`
//! and a domain `D`:
//!
//! 1. `e` already on the current path: no. A verdict reached earlier in the
//!    same query is reused.
//! 2. `e` is a parenthesis, conditional or switch: every value it can
//!    select must be allowed.
//! 3. `e` structurally equals a member of `D`: yes.
//! 4. For flags domains: `0` (unless some member is zero) and `-1` are
//!    allowed, `a | b` and friends need every operand allowed, `~a` needs
//!    `a` allowed.
//! 5. `e` references a declaration whose own domain is a subset of `D`: yes.
//! 6. `e` is `null`: yes.
//! 7. Some value `e` may originate from (per the slicer) is allowed: yes.

use std::sync::Arc;

use log::{debug, trace, warn};

use crate::ast::{Expr, UnaryOp};
use crate::cache::{MemoCache, QueryCache};
use crate::config::VerifierConfig;
use crate::decompose::{self, Suggestion};
use crate::diagnostic::Diagnostic;
use crate::domain::Domain;
use crate::error::{DomainError, SliceError, VerifyError};
use crate::program::Program;
use crate::resolver::DomainResolver;
use crate::slicing::{Progress, Slicer};
use crate::types::{Constant, ConstantRef, ExprId, SymbolId, Type};
use crate::visited::VisitedSet;

const ZERO: ConstantRef = ConstantRef::Literal(Constant::Int(0));
const MINUS_ONE: ConstantRef = ConstantRef::Literal(Constant::Int(-1));

pub struct Verifier<'p, S> {
    program: &'p Program,
    slicer: S,
    config: VerifierConfig,
    progress: Arc<Progress>,
}

impl<'p, S: Slicer> Verifier<'p, S> {
    pub fn new(program: &'p Program, slicer: S) -> Self {
        Self {
            program,
            slicer,
            config: VerifierConfig::default(),
            progress: Arc::new(Progress::new()),
        }
    }

    pub fn with_config(mut self, config: VerifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares a cancellation token with the caller.
    pub fn with_progress(mut self, progress: Arc<Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn progress(&self) -> &Arc<Progress> {
        &self.progress
    }

    fn resolver(&self) -> DomainResolver<'_> {
        DomainResolver::new(self.program, &self.config)
    }

    /// Domain declared for `symbol` when it holds a value of `target_type`.
    ///
    /// See [`DomainResolver::resolve`].
    pub fn resolve(
        &self,
        symbol: SymbolId,
        target_type: Type,
        context: Option<ExprId>,
    ) -> Result<Option<Domain>, DomainError> {
        self.resolver()
            .resolve(symbol, target_type, context, &mut QueryCache::new())
    }

    /// Domain of `symbol` at its declared type, in declaration order.
    ///
    /// Completion offers exactly these members.
    pub fn enumerate_domain(&self, symbol: SymbolId) -> Result<Option<Domain>, DomainError> {
        let ty = self.program.symbol(symbol).ty;
        self.resolve(symbol, ty, None)
    }

    /// Decides whether `expr`, evaluated in method `scope`, provably belongs to `domain`.
    ///
    /// A `false` answer means "not provably", not "provably not".
    pub fn is_allowed(&self, expr: ExprId, domain: &Domain, scope: SymbolId) -> Result<bool, VerifyError> {
        let mut query = Query::new(self);
        let allowed = query.is_allowed(expr, domain, scope);
        if query.cancelled {
            debug!("is_allowed({}): cancelled", expr);
            return Err(VerifyError::Cancelled);
        }
        Ok(allowed)
    }

    /// Suggests a replacement for a non-conforming constant expression.
    pub fn suggest_fix(&self, expr: ExprId, domain: &Domain) -> Option<Suggestion> {
        decompose::suggest_fix(self.program, expr, domain)
    }

    /// Checks `expr` flowing into `target` (a parameter, field, local or
    /// method return) and reports a diagnostic if it does not conform.
    pub fn check(&self, expr: ExprId, target: SymbolId, scope: SymbolId) -> Result<Option<Diagnostic>, VerifyError> {
        let ty = self.program.symbol(target).ty;
        let domain = match self.resolve(target, ty, None) {
            Ok(Some(domain)) => domain,
            Ok(None) => return Ok(None),
            Err(e) => return Ok(Some(misconfigured(self.program, e))),
        };
        self.check_against(expr, target, domain, scope)
    }

    /// Checks argument `index` of `call` against the callee's parameter.
    pub fn check_argument(
        &self,
        call: ExprId,
        index: usize,
        scope: SymbolId,
    ) -> Result<Option<Diagnostic>, VerifyError> {
        let Expr::Call {
            callee: Some(callee),
            args,
        } = self.program.expr(self.program.skip_parens(call))
        else {
            return Ok(None);
        };
        let (Some(&arg), Some(&param)) = (args.get(index), self.program.parameters(*callee).get(index)) else {
            return Ok(None);
        };
        self.check(arg, param, scope)
    }

    /// Checks an equality comparison `a == b`: when one side carries a
    /// domain, the other side must conform to it.
    pub fn check_comparison(&self, a: ExprId, b: ExprId, scope: SymbolId) -> Result<Option<Diagnostic>, VerifyError> {
        for (annotated, other) in [(a, b), (b, a)] {
            let annotated = self.program.skip_parens(annotated);
            let Some(target) = self.program.target(annotated) else {
                continue;
            };
            let ty = self.program.expr_type(annotated);
            match self.resolve(target, ty, Some(annotated)) {
                Ok(Some(domain)) => return self.check_against(other, target, domain, scope),
                Ok(None) => {}
                Err(e) => return Ok(Some(misconfigured(self.program, e))),
            }
        }
        Ok(None)
    }

    fn check_against(
        &self,
        expr: ExprId,
        target: SymbolId,
        domain: Domain,
        scope: SymbolId,
    ) -> Result<Option<Diagnostic>, VerifyError> {
        if self.is_allowed(expr, &domain, scope)? {
            return Ok(None);
        }
        let fix = self.suggest_fix(expr, &domain);
        Ok(Some(Diagnostic::not_in_domain(
            self.program,
            expr,
            target,
            domain,
            fix,
            self.config.display_limit,
        )))
    }
}

fn misconfigured(program: &Program, error: DomainError) -> Diagnostic {
    Diagnostic::Misconfigured {
        symbol: error.symbol(),
        message: error.message(program),
    }
}

/// State of one membership query.
struct Query<'v, 'p, S> {
    verifier: &'v Verifier<'p, S>,
    program: &'p Program,
    resolver: DomainResolver<'v>,
    cache: QueryCache,
    visited: VisitedSet<ExprId>,
    /// Completed verdicts; shared origins are checked once per query.
    verdicts: MemoCache<ExprId, bool>,
    /// Set once the slicer reported cancellation; no further slicing happens.
    cancelled: bool,
}

impl<'v, 'p, S: Slicer> Query<'v, 'p, S> {
    fn new(verifier: &'v Verifier<'p, S>) -> Self {
        Self {
            verifier,
            program: verifier.program,
            resolver: verifier.resolver(),
            cache: QueryCache::new(),
            visited: VisitedSet::new(verifier.program.num_exprs()),
            verdicts: MemoCache::default(),
            cancelled: false,
        }
    }

    fn is_allowed(&mut self, expr: ExprId, domain: &Domain, scope: SymbolId) -> bool {
        if let Some(verdict) = self.verdicts.get(&expr) {
            return verdict;
        }
        if !self.visited.insert(expr) {
            trace!("is_allowed({}): already on path", expr);
            return false;
        }
        let verdict = self.check(expr, domain, scope);
        self.visited.remove(expr);
        self.verdicts.insert(expr, verdict);
        verdict
    }

    fn check(&mut self, expr: ExprId, domain: &Domain, scope: SymbolId) -> bool {
        let program = self.program;
        let node = program.expr(expr);

        if node.is_selection() {
            for alternative in self.alternatives(expr) {
                if !self.is_allowed(alternative, domain, scope) {
                    return false;
                }
            }
            return true;
        }

        if domain.contains(program, expr) {
            return true;
        }

        if domain.is_flags() {
            if program.same(expr, &ZERO) && !domain.has_zero_member(program) {
                return true;
            }
            if program.same(expr, &MINUS_ONE) {
                return true;
            }
            match node {
                Expr::Polyadic(op, operands) if op.combines_flags() => {
                    for &operand in operands {
                        if !self.is_allowed(operand, domain, scope) {
                            return false;
                        }
                    }
                    return true;
                }
                Expr::Unary(UnaryOp::Not, operand) => {
                    return self.is_allowed(*operand, domain, scope);
                }
                _ => {}
            }
        }

        if let Some(target) = program.target(expr) {
            let ty = program.symbol(target).ty;
            match self.resolver.resolve(target, ty, Some(expr), &mut self.cache) {
                Ok(Some(declared)) if declared.is_subset_of(domain, program) => {
                    trace!("is_allowed({}): declared domain of {} fits", expr, target);
                    return true;
                }
                Ok(_) => {}
                Err(e) => {
                    let name = program.display_name(target);
                    debug!("is_allowed({}): ignoring domain of {}: {}", expr, name, e);
                }
            }
        }

        if program.expr_type(expr) == Type::Null {
            return true;
        }

        for origin in self.trace_back(expr, scope) {
            if self.is_allowed(origin, domain, scope) {
                return true;
            }
        }
        false
    }

    /// Values a selection node may yield, through nested selections.
    fn alternatives(&self, expr: ExprId) -> Vec<ExprId> {
        let mut result = Vec::new();
        let mut stack = vec![expr];
        while let Some(e) = stack.pop() {
            let node = self.program.expr(e);
            if node.is_selection() {
                stack.extend(node.value_operands().into_iter().rev());
            } else {
                result.push(e);
            }
        }
        result
    }

    fn trace_back(&mut self, expr: ExprId, scope: SymbolId) -> Vec<ExprId> {
        if self.cancelled {
            return Vec::new();
        }
        let verifier = self.verifier;
        match verifier
            .slicer
            .trace_back(expr, scope, verifier.config.on_the_fly, &verifier.progress)
        {
            Ok(origins) => origins,
            Err(SliceError::Cancelled) => {
                self.cancelled = true;
                Vec::new()
            }
            Err(SliceError::Failed(reason)) => {
                warn!("slicing {} failed: {}", expr, reason);
                Vec::new()
            }
        }
    }
}
