//! # magic-rs: Value-Domain Conformance Checking
//!
//! **`magic-rs`** decides whether an expression provably belongs to a declared, closed set of
//! *magic constants*, and proposes a fix when it does not.
//! It is designed as the core of a static checker for annotated library APIs.
//!
//! ## What is a value domain?
//!
//! Many APIs take plain integers or strings that must come from a fixed set of named constants:
//! `Font.deriveFont(int style)` accepts `Font.PLAIN`, `Font.BOLD`, `Font.ITALIC` and their bitwise combinations,
//! `Calendar.get(Calendar.MONTH)` returns one of `Calendar.JANUARY..UNDECIMBER`.
//! Such a set is a [`Domain`][crate::domain::Domain]: either an **enumeration** (exactly one member) or
//! **flags** (any bitwise combination of members).
//!
//! Domains are declared with the `@MagicConstant` annotation on parameters, fields, methods and locals,
//! or on an annotation type that is then used as a meta-annotation.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: A [`Program`][crate::program::Program] owns every expression and declaration.
//!   Analysis code passes lightweight [`ExprId`][crate::types::ExprId]/[`SymbolId`][crate::types::SymbolId] handles.
//! - **Structural Equivalence**: Members are matched by resolved declaration and folded literal value,
//!   never by spelling.
//! - **Pluggable Slicing**: Values that flow through variables are traced with any [`Slicer`][crate::slicing::Slicer].
//! - **Quick Fixes**: Non-conforming literals are decomposed into member combinations (`5` → `A | C`).
//! - **Concurrent Queries**: Each query owns its caches; a shared [`Progress`][crate::slicing::Progress] token cancels them.
//!
//! ## Basic Usage
//!
//! ```rust
//! use magic_rs::config::MAGIC_CONSTANT;
//! use magic_rs::program::{Annotation, AttributeValue, Program};
//! use magic_rs::slicing::NoSlicer;
//! use magic_rs::types::Type;
//! use magic_rs::verifier::Verifier;
//!
//! // 1. Declare the API
//! let mut p = Program::new();
//! let magic = p.add_annotation_type(MAGIC_CONSTANT);
//! let font = p.add_class("java.awt.Font");
//! let bold = p.add_constant(font, "BOLD", Type::Int, 1);
//! let italic = p.add_constant(font, "ITALIC", Type::Int, 2);
//! let derive = p.add_method(font, "deriveFont", Type::Other);
//! let style = p.add_parameter(derive, "style", Type::Int);
//! let members = vec![p.reference(bold), p.reference(italic)];
//! p.annotate(style, Annotation::new(magic).with("flags", AttributeValue::Array(members)));
//!
//! // 2. Build the call sites
//! let (b, i) = (p.reference(bold), p.reference(italic));
//! let both = p.or([b, i]);
//! let good = p.call(derive, [both]);
//! let three = p.int(3);
//! let bad = p.call(derive, [three]);
//!
//! // 3. Check them
//! let verifier = Verifier::new(&p, NoSlicer);
//! assert!(verifier.check_argument(good, 0, derive).unwrap().is_none());
//!
//! let diagnostic = verifier.check_argument(bad, 0, derive).unwrap().unwrap();
//! assert_eq!(diagnostic.fix().unwrap().render(&p), "Font.BOLD | Font.ITALIC");
//! ```
//!
//! ## Core Components
//!
//! - **[`verifier`]**: The [`Verifier`][crate::verifier::Verifier] façade and the membership algorithm.
//! - **[`resolver`]**: Finding the domain a declaration carries.
//! - **[`decompose`]**: Flag decomposition and fix suggestions.
//! - **[`registry`]**: Built-in domains for well-known unannotated library calls.
//!
//! For the exact membership rules, check the [`verifier`] module documentation.

pub mod ast;
pub mod cache;
pub mod config;
pub mod decompose;
pub mod diagnostic;
pub mod domain;
pub mod equivalence;
pub mod error;
pub mod eval;
pub mod program;
pub mod registry;
pub mod resolver;
pub mod slicing;
pub mod types;
pub mod verifier;
pub mod visited;
