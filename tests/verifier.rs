//! End-to-end tests for the verifier.
//!
//! Tests cover membership, resolution, decomposition, diagnostics and
//! concurrent or cancelled queries over one shared program.

use std::sync::Arc;

use magic_rs::config::{VerifierConfig, MAGIC_CONSTANT};
use magic_rs::decompose::decompose;
use magic_rs::diagnostic::Diagnostic;
use magic_rs::domain::{Domain, DomainKind};
use magic_rs::error::{DomainError, SliceError, VerifyError};
use magic_rs::program::{Annotation, AttributeValue, Program};
use magic_rs::slicing::{NoSlicer, OriginTable, Progress, Slicer};
use magic_rs::types::{ConstantRef, ExprId, SymbolId, Type};
use magic_rs::verifier::Verifier;

fn flags_attribute(p: &mut Program, members: &[SymbolId]) -> AttributeValue {
    AttributeValue::Array(members.iter().map(|&m| p.reference(m)).collect())
}

/// Flags `{A = 1, B = 2, C = 4}` declared on the parameter of `Api.set(int mode)`.
struct Abc {
    p: Program,
    magic: SymbolId,
    api: SymbolId,
    a: SymbolId,
    b: SymbolId,
    c: SymbolId,
    set: SymbolId,
    mode: SymbolId,
}

impl Abc {
    fn new() -> Self {
        let mut p = Program::new();
        let magic = p.add_annotation_type(MAGIC_CONSTANT);
        let api = p.add_class("x.Api");
        let a = p.add_constant(api, "A", Type::Int, 1);
        let b = p.add_constant(api, "B", Type::Int, 2);
        let c = p.add_constant(api, "C", Type::Int, 4);
        let set = p.add_method(api, "set", Type::Other);
        let mode = p.add_parameter(set, "mode", Type::Int);
        let members = flags_attribute(&mut p, &[a, b, c]);
        p.annotate(mode, Annotation::new(magic).with("flags", members));
        Self {
            p,
            magic,
            api,
            a,
            b,
            c,
            set,
            mode,
        }
    }

    fn domain(&self) -> Domain {
        Domain::flags([self.a, self.b, self.c])
    }
}

// ─── Membership ────────────────────────────────────────────────────────────────

#[test]
fn members_are_allowed() {
    let mut t = Abc::new();
    let refs: Vec<ExprId> = [t.a, t.b, t.c].iter().map(|&s| t.p.reference(s)).collect();
    let enumeration = Domain::enumeration([t.a, t.b, t.c]);

    let v = Verifier::new(&t.p, NoSlicer);
    for &r in &refs {
        assert!(v.is_allowed(r, &t.domain(), t.set).unwrap());
        assert!(v.is_allowed(r, &enumeration, t.set).unwrap());
    }
}

#[test]
fn literal_members_are_allowed() {
    let mut p = Program::new();
    let one = p.int(1);
    let s = p.string("s");
    let scope = p.add_class("x.Scope");
    let domain = Domain::enumeration([ConstantRef::from(magic_rs::types::Constant::Int(1))]);
    let strings = Domain::enumeration([ConstantRef::from(magic_rs::types::Constant::from("s"))]);

    let v = Verifier::new(&p, NoSlicer);
    assert!(v.is_allowed(one, &domain, scope).unwrap());
    assert!(v.is_allowed(s, &strings, scope).unwrap());
    assert!(!v.is_allowed(s, &domain, scope).unwrap());
}

#[test]
fn flag_closure() {
    let mut t = Abc::new();
    let a = t.p.reference(t.a);
    let b = t.p.reference(t.b);
    let eight = t.p.int(8);
    let a_or_b = t.p.or([a, b]);
    let a_or_b_or_8 = t.p.or([a, b, eight]);
    let xor = t.p.polyadic(magic_rs::ast::PolyOp::Xor, [a, b]);
    let shifted = t.p.polyadic(magic_rs::ast::PolyOp::Shl, [a, b]);
    let masked = t.p.polyadic(magic_rs::ast::PolyOp::And, [a, b]);
    let sum = t.p.polyadic(magic_rs::ast::PolyOp::Plus, [a, b]);
    let sum_with_8 = t.p.polyadic(magic_rs::ast::PolyOp::Plus, [a, eight]);

    let v = Verifier::new(&t.p, NoSlicer);
    assert!(v.is_allowed(a_or_b, &t.domain(), t.set).unwrap());
    assert!(!v.is_allowed(a_or_b_or_8, &t.domain(), t.set).unwrap());
    assert!(v.is_allowed(xor, &t.domain(), t.set).unwrap());
    assert!(!v.is_allowed(shifted, &t.domain(), t.set).unwrap());
    assert!(v.is_allowed(masked, &t.domain(), t.set).unwrap());
    assert!(v.is_allowed(sum, &t.domain(), t.set).unwrap());
    assert!(!v.is_allowed(sum_with_8, &t.domain(), t.set).unwrap());

    // Combinations are not closed for enumerations.
    let enumeration = Domain::enumeration([t.a, t.b, t.c]);
    assert!(!v.is_allowed(a_or_b, &enumeration, t.set).unwrap());
}

#[test]
fn zero_handling() {
    let mut p = Program::new();
    let class = p.add_class("java.awt.Font");
    let plain = p.add_constant(class, "PLAIN", Type::Int, 0);
    let bold = p.add_constant(class, "BOLD", Type::Int, 1);
    let italic = p.add_constant(class, "ITALIC", Type::Int, 2);
    let zero = p.int(0);
    let plain_ref = p.reference(plain);

    let without_zero = Domain::flags([bold, italic]);
    let with_zero = Domain::flags([plain, bold]);

    let v = Verifier::new(&p, NoSlicer);
    assert!(v.is_allowed(zero, &without_zero, class).unwrap());
    assert!(!v.is_allowed(zero, &with_zero, class).unwrap());
    assert!(v.is_allowed(plain_ref, &with_zero, class).unwrap());
}

#[test]
fn subset_soundness() {
    let mut t = Abc::new();
    let a = t.p.reference(t.a);
    let b = t.p.reference(t.b);
    let c = t.p.reference(t.c);
    let zero = t.p.int(0);
    let three = t.p.int(3);
    let a_or_b = t.p.or([a, b]);
    let a_or_c = t.p.or([a, c]);
    let not_c = t.p.not(c);
    let null = t.p.null();
    let exprs = [a, b, c, zero, three, a_or_b, a_or_c, not_c, null];

    let small = Domain::flags([t.a, t.b]);
    let large = t.domain();
    assert!(small.is_subset_of(&large, &t.p));

    let v = Verifier::new(&t.p, NoSlicer);
    for e in exprs {
        if v.is_allowed(e, &small, t.set).unwrap() {
            assert!(v.is_allowed(e, &large, t.set).unwrap(), "{} allowed in subset only", e);
        }
    }
}

#[test]
fn values_flow_through_slicing() {
    let mut t = Abc::new();
    let body = t.p.add_method(t.api, "body", Type::Other);
    let x = t.p.add_local(body, "x", Type::Int, None, false);
    let use_site = t.p.reference(x);
    let a = t.p.reference(t.a);
    let b = t.p.reference(t.b);
    let combined = t.p.or([a, b]);
    let arg = t.p.call(t.set, [use_site]);

    let mut table = OriginTable::new();
    table.add(use_site, [combined]);
    let v = Verifier::new(&t.p, &table);
    assert!(v.is_allowed(use_site, &t.domain(), body).unwrap());
    assert!(v.check_argument(arg, 0, body).unwrap().is_none());

    let v = Verifier::new(&t.p, NoSlicer);
    assert!(v.check_argument(arg, 0, body).unwrap().is_some());
}

#[test]
fn diamond_origins_are_checked_once() {
    const LAYERS: usize = 30;

    let mut t = Abc::new();
    let body = t.p.add_method(t.api, "body", Type::Other);
    let x = t.p.add_local(body, "x", Type::Int, None, false);
    let layers: Vec<[ExprId; 2]> = (0..LAYERS)
        .map(|_| [t.p.reference(x), t.p.reference(x)])
        .collect();
    let eight = t.p.int(8);
    let a = t.p.reference(t.a);

    // x = cond ? x' : x'' at every layer, both arms reaching the next layer.
    let mut table = OriginTable::new();
    for pair in layers.windows(2) {
        for &e in &pair[0] {
            table.add(e, pair[1]);
        }
    }
    for &e in &layers[LAYERS - 1] {
        table.add(e, [eight]);
    }
    let only_a = Domain::flags([t.a]);
    let top = layers[0][0];
    assert_eq!(Verifier::new(&t.p, &table).is_allowed(top, &only_a, body), Ok(false));

    // A second origin at the bottom is found through the same graph.
    for &e in &layers[LAYERS - 1] {
        table.add(e, [a]);
    }
    assert_eq!(Verifier::new(&t.p, &table).is_allowed(top, &only_a, body), Ok(true));
}

// ─── Resolution ────────────────────────────────────────────────────────────────

#[test]
fn resolution_is_idempotent() {
    let t = Abc::new();
    let v = Verifier::new(&t.p, NoSlicer);
    let first = v.resolve(t.mode, Type::Int, None).unwrap().unwrap();
    let second = v.resolve(t.mode, Type::Int, None).unwrap().unwrap();
    assert!(first.equals(&second, &t.p));
    assert!(first.equals(&t.domain(), &t.p));
}

#[test]
fn enumerate_domain_keeps_declaration_order() {
    let t = Abc::new();
    let v = Verifier::new(&t.p, NoSlicer);
    let domain = v.enumerate_domain(t.mode).unwrap().unwrap();
    assert_eq!(domain.kind(), DomainKind::Flags);
    assert_eq!(
        domain.members(),
        &[ConstantRef::from(t.a), ConstantRef::from(t.b), ConstantRef::from(t.c)]
    );
    assert!(v.enumerate_domain(t.set).unwrap().is_none());
}

#[test]
fn meta_annotation_cycle_terminates() {
    let mut t = Abc::new();
    // T1 -> T2 -> ... -> T7 -> T1, with no domain anywhere on the cycle.
    let types: Vec<SymbolId> = (1..=7)
        .map(|i| t.p.add_annotation_type(&format!("x.T{}", i)))
        .collect();
    for i in 0..types.len() {
        let next = types[(i + 1) % types.len()];
        t.p.annotate(types[i], Annotation::new(next));
    }
    let getter = t.p.add_method(t.api, "get", Type::Int);
    t.p.annotate(getter, Annotation::new(types[0]));

    let v = Verifier::new(&t.p, NoSlicer);
    assert!(v.enumerate_domain(getter).unwrap().is_none());
}

#[test]
fn deep_meta_annotation_is_cut_off() {
    let mut t = Abc::new();
    let types: Vec<SymbolId> = (1..=6)
        .map(|i| t.p.add_annotation_type(&format!("x.T{}", i)))
        .collect();
    for pair in types.windows(2) {
        t.p.annotate(pair[0], Annotation::new(pair[1]));
    }
    let members = flags_attribute(&mut t.p, &[t.a, t.b]);
    t.p.annotate(types[5], Annotation::new(t.magic).with("flags", members));
    let getter = t.p.add_method(t.api, "get", Type::Int);
    t.p.annotate(getter, Annotation::new(types[0]));

    let v = Verifier::new(&t.p, NoSlicer);
    assert!(v.enumerate_domain(getter).unwrap().is_none());

    let deeper = VerifierConfig::default().with_max_annotation_depth(6);
    let v = Verifier::new(&t.p, NoSlicer).with_config(deeper);
    assert!(v.enumerate_domain(getter).unwrap().is_some());
}

#[test]
fn declared_domains_compose() {
    let mut t = Abc::new();
    // `@MagicConstant(flags = {A, B}) int getMode()`
    let getter = t.p.add_method(t.api, "getMode", Type::Int);
    let members = flags_attribute(&mut t.p, &[t.a, t.b]);
    t.p.annotate(getter, Annotation::new(t.magic).with("flags", members));
    let call = t.p.call(getter, []);
    let body = t.p.add_method(t.api, "body", Type::Other);
    let local = t.p.add_local(body, "m", Type::Int, Some(call), true);
    let local_ref = t.p.reference(local);
    let set_call = t.p.call(t.set, [local_ref]);

    let v = Verifier::new(&t.p, NoSlicer);
    assert!(v.check_argument(set_call, 0, body).unwrap().is_none());

    // The reverse direction does not hold: {A, B, C} is not within {A, B}.
    let mode_ref = t.p.reference(t.mode);
    let narrow = Domain::flags([t.a, t.b]);
    let v = Verifier::new(&t.p, NoSlicer);
    assert!(!v.is_allowed(mode_ref, &narrow, t.set).unwrap());
}

#[test]
fn misconfigured_declaration() {
    let mut t = Abc::new();
    let broken = t.p.add_method(t.api, "broken", Type::Other);
    let param = t.p.add_parameter(broken, "value", Type::Int);
    let values = flags_attribute(&mut t.p, &[t.a]);
    let flags = flags_attribute(&mut t.p, &[t.b]);
    t.p.annotate(
        param,
        Annotation::new(t.magic).with("intValues", values).with("flags", flags),
    );
    let one = t.p.int(1);
    let call = t.p.call(broken, [one]);

    let v = Verifier::new(&t.p, NoSlicer);
    assert_eq!(
        v.enumerate_domain(param).unwrap_err(),
        DomainError::Misconfigured { symbol: param }
    );
    match v.check_argument(call, 0, broken).unwrap() {
        Some(Diagnostic::Misconfigured { symbol, message }) => {
            assert_eq!(symbol, param);
            assert_eq!(
                message,
                "misconfigured domain on value: 'flags' and 'values' must not be used at the same time"
            );
        }
        other => panic!("unexpected {:?}", other),
    }

    // Reached while checking another value: the broken declaration counts as no domain.
    let param_ref = t.p.reference(param);
    let forward = t.p.call(t.set, [param_ref]);
    let v = Verifier::new(&t.p, NoSlicer);
    assert_eq!(v.is_allowed(param_ref, &t.domain(), broken), Ok(false));
    match v.check_argument(forward, 0, broken).unwrap() {
        Some(Diagnostic::NotInDomain { target, .. }) => assert_eq!(target, t.mode),
        other => panic!("unexpected {:?}", other),
    }

    // Its origins are still traced.
    let a = t.p.reference(t.a);
    let mut table = OriginTable::new();
    table.add(param_ref, [a]);
    let v = Verifier::new(&t.p, &table);
    assert_eq!(v.is_allowed(param_ref, &t.domain(), broken), Ok(true));
}

// ─── Decomposition and fixes ───────────────────────────────────────────────────

#[test]
fn decomposition() {
    let t = Abc::new();
    let d = t.domain();
    assert_eq!(
        decompose(&t.p, 5, &d),
        Some(vec![ConstantRef::from(t.a), ConstantRef::from(t.c)])
    );
    assert_eq!(decompose(&t.p, 9, &d), None);

    let mut p = Program::new();
    let class = p.add_class("x.Z");
    let z = p.add_constant(class, "Z", Type::Int, 0);
    let a = p.add_constant(class, "A", Type::Int, 1);
    assert_eq!(decompose(&p, 1, &Domain::flags([z, a])), Some(vec![ConstantRef::from(a)]));
}

#[test]
fn enum_suggestion() {
    let mut p = Program::new();
    let magic = p.add_annotation_type(MAGIC_CONSTANT);
    let colors = p.add_class("x.Colors");
    let red = p.add_string_constant(colors, "RED", "r");
    let green = p.add_string_constant(colors, "GREEN", "g");
    let paint = p.add_method(colors, "paint", Type::Other);
    let color = p.add_parameter(paint, "color", Type::String);
    p.annotate(
        color,
        Annotation::new(magic).with("valuesFromClass", AttributeValue::Class(colors)),
    );
    let g = p.string("g");
    let blue = p.string("blue");
    let call_g = p.call(paint, [g]);
    let call_blue = p.call(paint, [blue]);

    let v = Verifier::new(&p, NoSlicer);
    let domain = v.enumerate_domain(color).unwrap().unwrap();
    assert_eq!(domain.members(), &[ConstantRef::from(red), ConstantRef::from(green)]);

    let fix = v.suggest_fix(g, &domain).unwrap();
    assert_eq!(fix.members, vec![ConstantRef::from(green)]);
    assert_eq!(v.suggest_fix(blue, &domain), None);

    let diagnostic = v.check_argument(call_g, 0, paint).unwrap().unwrap();
    assert_eq!(diagnostic.fix().unwrap().render(&p), "Colors.GREEN");
    let diagnostic = v.check_argument(call_blue, 0, paint).unwrap().unwrap();
    assert!(diagnostic.fix().is_none());
    assert_eq!(diagnostic.message(&p), "Should be one of: Colors.RED, Colors.GREEN");
}

#[test]
fn long_member_lists_are_truncated() {
    let mut t = Abc::new();
    let sixteen = t.p.int(16);
    let call = t.p.call(t.set, [sixteen]);
    let config = VerifierConfig::default().with_display_limit(10);
    let v = Verifier::new(&t.p, NoSlicer).with_config(config);
    match v.check_argument(call, 0, t.set).unwrap() {
        Some(Diagnostic::NotInDomain { allowed, fix, .. }) => {
            assert_eq!(allowed, "Api.A, Api...");
            assert!(fix.is_none());
        }
        other => panic!("unexpected {:?}", other),
    }
}

// ─── Built-in domains ──────────────────────────────────────────────────────────

#[test]
fn calendar_month_comparison() {
    const MONTHS: [&str; 13] = [
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
    ];
    let mut p = Program::new();
    let calendar = p.add_class("java.util.Calendar");
    let month = p.add_constant(calendar, "MONTH", Type::Int, 2);
    let year = p.add_constant(calendar, "YEAR", Type::Int, 1);
    let members: Vec<SymbolId> = MONTHS
        .iter()
        .enumerate()
        .map(|(i, name)| p.add_constant(calendar, name, Type::Int, i as i64))
        .collect();
    let get = p.add_method(calendar, "get", Type::Int);
    p.add_parameter(get, "field", Type::Int);

    let month_ref = p.reference(month);
    let get_month = p.call(get, [month_ref]);
    let year_ref = p.reference(year);
    let get_year = p.call(get, [year_ref]);
    let five = p.int(5);
    let june = p.reference(members[5]);

    let v = Verifier::new(&p, NoSlicer);
    assert!(v.check_comparison(get_month, june, calendar).unwrap().is_none());
    assert!(v.check_comparison(get_year, five, calendar).unwrap().is_none());

    let diagnostic = v.check_comparison(five, get_month, calendar).unwrap().unwrap();
    assert_eq!(diagnostic.fix().unwrap().render(&p), "Calendar.JUNE");

    // The call itself carries the domain when it flows somewhere narrower.
    let months = Domain::enumeration(members.iter().copied());
    assert!(v.is_allowed(get_month, &months, calendar).unwrap());
    assert!(!v.is_allowed(get_year, &months, calendar).unwrap());
}

// ─── Queries ───────────────────────────────────────────────────────────────────

/// A slicer that cancels the shared token on its first use.
struct CancellingSlicer {
    table: OriginTable,
}

impl Slicer for CancellingSlicer {
    fn trace_back(
        &self,
        expr: ExprId,
        scope: SymbolId,
        on_the_fly: bool,
        progress: &Progress,
    ) -> Result<Vec<ExprId>, SliceError> {
        progress.cancel();
        self.table.trace_back(expr, scope, on_the_fly, progress)
    }
}

struct FailingSlicer;

impl Slicer for FailingSlicer {
    fn trace_back(&self, _: ExprId, _: SymbolId, _: bool, _: &Progress) -> Result<Vec<ExprId>, SliceError> {
        Err(SliceError::Failed("index not ready".to_string()))
    }
}

#[test]
fn cancellation() {
    let mut t = Abc::new();
    let body = t.p.add_method(t.api, "body", Type::Other);
    let x = t.p.add_local(body, "x", Type::Int, None, false);
    let use_site = t.p.reference(x);
    let a = t.p.reference(t.a);
    let mut table = OriginTable::new();
    table.add(use_site, [a]);

    let progress = Arc::new(Progress::new());
    let v = Verifier::new(&t.p, CancellingSlicer { table }).with_progress(Arc::clone(&progress));
    assert_eq!(
        v.is_allowed(use_site, &t.domain(), body),
        Err(VerifyError::Cancelled)
    );
    assert!(progress.is_cancelled());
    assert!(matches!(v.check(use_site, t.mode, body), Err(VerifyError::Cancelled)));

    // Answers that need no slicing are unaffected.
    assert_eq!(v.is_allowed(a, &t.domain(), body), Ok(true));
}

#[test]
fn slicing_failure_is_not_fatal() {
    let mut t = Abc::new();
    let body = t.p.add_method(t.api, "body", Type::Other);
    let x = t.p.add_local(body, "x", Type::Int, None, false);
    let use_site = t.p.reference(x);

    let v = Verifier::new(&t.p, FailingSlicer).with_config(VerifierConfig::default().with_on_the_fly(false));
    assert_eq!(v.is_allowed(use_site, &t.domain(), body), Ok(false));
}

#[test]
fn concurrent_queries() {
    let mut t = Abc::new();
    let a = t.p.reference(t.a);
    let b = t.p.reference(t.b);
    let c = t.p.reference(t.c);
    let eight = t.p.int(8);
    let good = t.p.or([a, b, c]);
    let bad = t.p.or([a, eight]);
    let good_call = t.p.call(t.set, [good]);
    let bad_call = t.p.call(t.set, [bad]);

    let v = Verifier::new(&t.p, NoSlicer);
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let v = &v;
                let set = t.set;
                s.spawn(move || {
                    let call = if i % 2 == 0 { good_call } else { bad_call };
                    (i, v.check_argument(call, 0, set).unwrap().is_some())
                })
            })
            .collect();
        for handle in handles {
            let (i, reported) = handle.join().unwrap();
            assert_eq!(reported, i % 2 == 1);
        }
    });
}
