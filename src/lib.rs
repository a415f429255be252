//! # Stepcheck
//!
//! Checks a student's step-by-step solution of an equation: every step is
//! tested against the solutions of the correct answer, the first wrong step
//! is located and partial credit is awarded.
//!
//! The grading engine lives in the `stepcheck-core` crate. This crate wraps
//! it in a CLI, an HTTP server and SQLite report storage.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────┐   ┌──────────┐
//! │   CLI    │──▶│  stepcheck-core   │   │  SQLite   │
//! │  (grade) │   │ parse/solve/check │──▶│ reports   │
//! └──────────┘   └──────────────────┘   └──────────┘
//!      ▲                 ▲
//!      │           ┌──────────┐
//!      └───────────│   HTTP   │
//!                  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! stepcheck grade --answer "x = 2" --step "2x + 3 = 7" --step "2x = 4" --step "x = 2"
//! stepcheck solve "x^2 = 4"
//! stepcheck init                # create database
//! stepcheck serve               # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`grade`] | `grade`, `solve` and `parse` commands |
//! | [`report`] | Stored report listing and retrieval |
//! | [`server`] | HTTP server |
//! | [`sqlite_store`] | SQLite report store |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod grade;
pub mod migrate;
pub mod report;
pub mod server;
pub mod sqlite_store;
