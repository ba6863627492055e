//! Backward slicing, as seen from the verifier.
//!
//! Slicing (tracing a use back to the expressions its value may originate
//! from) is a separate data-flow engine. The verifier only needs one
//! function from it, captured by the [`Slicer`] trait, so it stays testable
//! without a full program-analysis backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use log::trace;

use crate::error::SliceError;
use crate::types::{ExprId, SymbolId};

/// Cancellation token shared between a caller and the queries it runs.
#[derive(Debug, Default)]
pub struct Progress {
    cancelled: AtomicBool,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every query observing this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fails with [`SliceError::Cancelled`] once cancellation was requested.
    pub fn check(&self) -> Result<(), SliceError> {
        if self.is_cancelled() {
            Err(SliceError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Backward slicing capability.
pub trait Slicer {
    /// Returns the expressions `expr` may take its value from within `scope`.
    ///
    /// An empty vector means no origin could be determined. Errors are
    /// reserved for cancellation and genuine failures. With `on_the_fly`
    /// unset (batch mode) the implementation must honor `progress` instead
    /// of assuming it runs to completion.
    fn trace_back(
        &self,
        expr: ExprId,
        scope: SymbolId,
        on_the_fly: bool,
        progress: &Progress,
    ) -> Result<Vec<ExprId>, SliceError>;
}

impl<S: Slicer + ?Sized> Slicer for &S {
    fn trace_back(
        &self,
        expr: ExprId,
        scope: SymbolId,
        on_the_fly: bool,
        progress: &Progress,
    ) -> Result<Vec<ExprId>, SliceError> {
        (**self).trace_back(expr, scope, on_the_fly, progress)
    }
}

/// A slicer that never finds an origin.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoSlicer;

impl Slicer for NoSlicer {
    fn trace_back(
        &self,
        _expr: ExprId,
        _scope: SymbolId,
        _on_the_fly: bool,
        progress: &Progress,
    ) -> Result<Vec<ExprId>, SliceError> {
        progress.check()?;
        Ok(Vec::new())
    }
}

/// A slicer answering from a precomputed use → origins table.
#[derive(Debug, Default, Clone)]
pub struct OriginTable {
    origins: HashMap<ExprId, Vec<ExprId>>,
}

impl OriginTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `expr` may take its value from each of `origins`.
    pub fn add(&mut self, expr: ExprId, origins: impl IntoIterator<Item = ExprId>) {
        self.origins.entry(expr).or_default().extend(origins);
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

impl Slicer for OriginTable {
    fn trace_back(
        &self,
        expr: ExprId,
        scope: SymbolId,
        _on_the_fly: bool,
        progress: &Progress,
    ) -> Result<Vec<ExprId>, SliceError> {
        progress.check()?;
        let origins = self.origins.get(&expr).cloned().unwrap_or_default();
        trace!("trace_back({} in {}) -> {:?}", expr, scope, origins);
        Ok(origins)
    }
}
