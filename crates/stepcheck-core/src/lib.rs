//! # Stepcheck Core
//!
//! Pure grading logic for step-by-step algebra solutions: a student's
//! worked steps and a reference answer go in, a per-step diagnosis and a
//! partial-credit score come out.
//!
//! This crate contains no tokio, sqlx, filesystem or network I/O. Every
//! grading call is a synchronous function of its inputs.
//!
//! # Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | normalize | [`normalize`] | canonical source line |
//! | parse | [`parser`], [`equation`] | [`equation::ParsedStep`] |
//! | resolve | [`resolve`] | principal unknown |
//! | solve | [`solve`] | [`solve::SolveOutcome`] |
//! | check | [`check`] | [`check::StepReason`] per step |
//! | score | [`score`] | `0..=100` |
//!
//! [`grader::Grader`] runs the whole pipeline and returns a
//! [`models::GradeOutcome`].
//!
//! ```rust
//! use stepcheck_core::grader::Grader;
//!
//! let grader = Grader::default();
//! let outcome = grader.grade("Solve 2x + 3 = 7", "x = 2", &["2x + 3 = 7", "2x = 4", "x = 2"]);
//! let report = outcome.report().unwrap();
//! assert_eq!(report.variable, "x");
//! assert_eq!(report.score, 100.0);
//! ```

pub mod alphabet;
pub mod check;
pub mod equation;
pub mod error;
pub mod expr;
pub mod grader;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod poly;
pub mod probe;
pub mod resolve;
pub mod score;
pub mod solve;
pub mod store;
