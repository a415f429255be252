//! Grading, solving and parsing from the command line.
//!
//! Used by the `stepcheck grade`, `stepcheck solve` and `stepcheck parse`
//! commands. The request checks and the JSON shaping here are shared with
//! the HTTP server.

use anyhow::{bail, Context, Result};
use std::path::Path;

use stepcheck_core::check::RootPolicy;
use stepcheck_core::equation::ParsedStep;
use stepcheck_core::models::{GradeOutcome, GradeRequest, GradingReport};
use stepcheck_core::normalize::normalize;
use stepcheck_core::store::{ReportStore, StoredReport};

use crate::config::{Config, GradingConfig};
use crate::{db, migrate, sqlite_store::SqliteReportStore};

/// Options for `stepcheck grade`.
#[derive(Debug, Clone, Default)]
pub struct GradeArgs {
    pub question: String,
    pub answer: String,
    pub steps: Vec<String>,
    pub steps_file: Option<std::path::PathBuf>,
    pub policy: Option<RootPolicy>,
    pub json: bool,
    pub save: bool,
}

/// Reject requests larger than the configured limits.
pub fn check_limits(limits: &GradingConfig, req: &GradeRequest) -> Result<()> {
    if req.student_steps.len() > limits.max_steps {
        bail!(
            "too many steps: {} submitted, at most {} allowed",
            req.student_steps.len(),
            limits.max_steps
        );
    }
    let too_long = std::iter::once(&req.correct_answer)
        .chain(req.student_steps.iter())
        .find(|s| s.chars().count() > limits.max_step_chars);
    if let Some(line) = too_long {
        bail!(
            "line too long: {} characters, at most {} allowed",
            line.chars().count(),
            limits.max_step_chars
        );
    }
    Ok(())
}

/// Serialize an outcome, adding `report_id` when it was stored.
pub fn outcome_json(outcome: &GradeOutcome, report_id: Option<&str>) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(outcome)?;
    if let (Some(id), Some(obj)) = (report_id, value.as_object_mut()) {
        obj.insert("report_id".to_string(), serde_json::Value::String(id.to_string()));
    }
    Ok(value)
}

/// Open the configured SQLite report store, creating the schema if needed.
pub async fn open_store(config: &Config, command: &str) -> Result<SqliteReportStore> {
    let db_config = config.require_db(command)?;
    let pool = db::connect(db_config).await?;
    migrate::create_schema(&pool).await?;
    Ok(SqliteReportStore::new(pool))
}

/// Read steps from a file, one per line, skipping blank lines.
fn read_steps_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read steps file: {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// CLI entry point for `stepcheck grade`.
pub async fn run_grade(config: &Config, args: GradeArgs) -> Result<()> {
    let grader = config.grader()?;

    let mut steps = args.steps;
    if let Some(path) = &args.steps_file {
        steps.extend(read_steps_file(path)?);
    }
    let req = GradeRequest {
        question: args.question,
        correct_answer: args.answer,
        student_steps: steps,
        policy: args.policy,
    };
    check_limits(&config.grading, &req)?;

    let outcome = grader.grade_request(&req);
    tracing::info!(
        steps = req.student_steps.len(),
        success = outcome.is_success(),
        "graded submission"
    );

    let report_id = match (&outcome, args.save) {
        (GradeOutcome::Report(report), true) => {
            let store = open_store(config, "grade --save").await?;
            let record = StoredReport::new(report.clone(), &req.student_steps);
            let id = store.put(&record).await?;
            store.pool().close().await;
            Some(id)
        }
        _ => None,
    };

    if args.json {
        let value = outcome_json(&outcome, report_id.as_deref())?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        if !outcome.is_success() {
            std::process::exit(1);
        }
        return Ok(());
    }

    match outcome {
        GradeOutcome::Report(report) => {
            print_report(&report);
            if let Some(id) = report_id {
                println!("report_id:        {}", id);
            }
            Ok(())
        }
        GradeOutcome::Rejected(rejection) => bail!("{}", rejection.error),
    }
}

/// Print a report as a human-readable table.
pub fn print_report(report: &GradingReport) {
    if !report.question.is_empty() {
        println!("question:         {}", report.question);
    }
    println!("correct answer:   {}", report.correct_answer);
    println!("variable:         {}", report.variable);
    if report.solutions.is_empty() {
        println!("solutions:        (none)");
    } else {
        println!("solutions:        {}", report.solutions.join(", "));
    }
    println!();

    let width = report
        .steps
        .iter()
        .map(|s| s.step.chars().count())
        .max()
        .unwrap_or(0);
    for s in &report.steps {
        println!(
            "  [{}] {:<4} {:<width$}  {}",
            s.index,
            if s.is_valid { "ok" } else { "FAIL" },
            s.step,
            s.reason,
            width = width
        );
    }
    if !report.steps.is_empty() {
        println!();
    }

    match report.first_wrong_step_index {
        Some(i) => println!("first wrong step: {}", i),
        None => println!("first wrong step: none"),
    }
    println!(
        "final correct:    {}",
        if report.final_correct { "yes" } else { "no" }
    );
    println!("score:            {:.2}", report.score);
}

/// CLI entry point for `stepcheck solve`.
pub fn run_solve(config: &Config, equation: &str, var: Option<char>, json: bool) -> Result<()> {
    let grader = config.grader()?;
    let summary = grader.solve(equation, var)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!("variable:  {}", summary.variable);
    println!("outcome:   {}", summary.outcome);
    for (i, s) in summary.solutions.iter().enumerate() {
        println!("  {} = {}    [{}]", summary.variable, s, i);
    }
    Ok(())
}

/// CLI entry point for `stepcheck parse`.
pub fn run_parse(config: &Config, line: &str) -> Result<()> {
    let grader = config.grader()?;
    println!("normalized: {}", normalize(line));

    match grader.parse(line) {
        ParsedStep::Equation(eq) => {
            let symbols: Vec<String> = eq.free_symbols().iter().map(|s| s.to_string()).collect();
            println!("equation:   {}", eq);
            println!(
                "symbols:    {}",
                if symbols.is_empty() {
                    "(none)".to_string()
                } else {
                    symbols.join(", ")
                }
            );
            Ok(())
        }
        ParsedStep::Failure(failure) => {
            eprintln!("Error: {}", failure.reason);
            std::process::exit(1);
        }
    }
}
