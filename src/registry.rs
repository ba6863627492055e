//! Built-in domains for well-known library calls.
//!
//! Some library methods return values from a fixed set that depends on an
//! argument, and carry no annotation saying so. `Calendar.get(Calendar.MONTH)`
//! returns a month constant, `Calendar.get(Calendar.DAY_OF_WEEK)` a weekday.
//! The table is closed: a call site is fingerprinted by its callee and one
//! constant-foldable argument and matched against [`BuiltinDomain::ALL`].

use log::debug;

use crate::ast::Expr;
use crate::cache::QueryCache;
use crate::domain::Domain;
use crate::program::Program;
use crate::types::{ConstantRef, ExprId, SymbolId};

const CALENDAR: &str = "java.util.Calendar";
const CALENDAR_GET: &str = "java.util.Calendar.get";

/// Calendar field selectors and their values.
const CALENDAR_FIELDS: &[(&str, i64)] = &[("MONTH", 2), ("DAY_OF_WEEK", 7), ("AM_PM", 9)];

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BuiltinDomain {
    /// `Calendar.get(Calendar.MONTH)`
    CalendarMonth,
    /// `Calendar.get(Calendar.DAY_OF_WEEK)`
    CalendarDayOfWeek,
    /// `Calendar.get(Calendar.AM_PM)`
    CalendarAmPm,
}

impl BuiltinDomain {
    pub const ALL: [BuiltinDomain; 3] = [
        BuiltinDomain::CalendarMonth,
        BuiltinDomain::CalendarDayOfWeek,
        BuiltinDomain::CalendarAmPm,
    ];

    /// Qualified name of the callee.
    pub const fn callee(self) -> &'static str {
        match self {
            BuiltinDomain::CalendarMonth
            | BuiltinDomain::CalendarDayOfWeek
            | BuiltinDomain::CalendarAmPm => CALENDAR_GET,
        }
    }

    /// Value the selecting argument folds to.
    pub const fn argument(self) -> i64 {
        match self {
            BuiltinDomain::CalendarMonth => 2,
            BuiltinDomain::CalendarDayOfWeek => 7,
            BuiltinDomain::CalendarAmPm => 9,
        }
    }

    /// Names of the member constants, in declaration order.
    fn member_names(self) -> &'static [&'static str] {
        match self {
            BuiltinDomain::CalendarMonth => &[
                "JANUARY",
                "FEBRUARY",
                "MARCH",
                "APRIL",
                "MAY",
                "JUNE",
                "JULY",
                "AUGUST",
                "SEPTEMBER",
                "OCTOBER",
                "NOVEMBER",
                "DECEMBER",
                "UNDECIMBER",
            ],
            BuiltinDomain::CalendarDayOfWeek => &[
                "SUNDAY",
                "MONDAY",
                "TUESDAY",
                "WEDNESDAY",
                "THURSDAY",
                "FRIDAY",
                "SATURDAY",
            ],
            BuiltinDomain::CalendarAmPm => &["AM", "PM"],
        }
    }

    /// Finds the entry for a callee and folded argument.
    pub fn find(callee: &str, argument: i64) -> Option<BuiltinDomain> {
        Self::ALL
            .into_iter()
            .find(|b| b.callee() == callee && b.argument() == argument)
    }

    /// Materializes the domain against the program's declarations.
    ///
    /// Returns `None` if any member constant is not declared in `program`.
    pub fn domain(self, program: &Program) -> Option<Domain> {
        let mut members = Vec::with_capacity(self.member_names().len());
        for name in self.member_names() {
            match program.find_symbol(&format!("{}.{}", CALENDAR, name)) {
                Some(symbol) => members.push(ConstantRef::Symbol(symbol)),
                None => {
                    debug!("builtin {:?}: constant {} is not declared", self, name);
                    return None;
                }
            }
        }
        Some(Domain::enumeration(members))
    }
}

/// Fingerprint of a call site: the resolved callee and its single argument's value.
pub fn fingerprint(program: &Program, call: ExprId) -> Option<(SymbolId, Option<i64>)> {
    let Expr::Call {
        callee: Some(callee),
        args,
    } = program.expr(program.skip_parens(call))
    else {
        return None;
    };
    let [arg] = args.as_slice() else {
        return Some((*callee, None));
    };
    let value = program
        .constant_value(*arg)
        .and_then(|v| v.as_int())
        .or_else(|| selector_by_name(program, *arg));
    Some((*callee, value))
}

/// Recognizes `Calendar.MONTH` and friends when they have no visible initializer.
fn selector_by_name(program: &Program, arg: ExprId) -> Option<i64> {
    let target = program.target(program.skip_parens(arg))?;
    let name = program.qualified_name(target);
    let field = name.strip_prefix(CALENDAR)?.strip_prefix('.')?;
    CALENDAR_FIELDS
        .iter()
        .find(|(n, _)| *n == field)
        .map(|&(_, v)| v)
}

/// Looks up the built-in domain of a call site, memoized per query.
pub fn lookup(program: &Program, call: ExprId, cache: &mut QueryCache) -> Option<Domain> {
    let key = fingerprint(program, call)?;
    if let Some(domain) = cache.registry.get(&key) {
        return domain;
    }
    let (callee, argument) = key;
    let domain = argument
        .and_then(|arg| BuiltinDomain::find(&program.qualified_name(callee), arg))
        .and_then(|builtin| {
            debug!("builtin {:?} for call {}", builtin, call);
            builtin.domain(program)
        });
    cache.registry.insert(key, domain.clone());
    domain
}
