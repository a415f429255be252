//! Stored report retrieval.
//!
//! Used by the `stepcheck report` CLI command. The HTTP server reads the
//! same store through [`ReportStore`] directly.

use anyhow::Result;

use stepcheck_core::store::ReportStore;

use crate::config::Config;
use crate::grade::{open_store, print_report};

/// CLI entry point for `stepcheck report <id>`.
pub async fn run_report(config: &Config, id: &str, json: bool) -> Result<()> {
    let store = open_store(config, "report").await?;
    let record = match store.get(id).await {
        Ok(Some(r)) => r,
        Ok(None) => {
            eprintln!("Error: report not found: {}", id);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    store.pool().close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("--- Report ---");
    println!("id:               {}", record.id);
    println!("created_at:       {}", format_ts_iso(record.created_at));
    println!("fingerprint:      {}", record.fingerprint);
    println!();
    print_report(&record.report);
    Ok(())
}

/// CLI entry point for `stepcheck report` without an id.
pub async fn run_recent(config: &Config, limit: usize, json: bool) -> Result<()> {
    let store = open_store(config, "report").await?;
    let recent = store.recent(limit).await?;
    store.pool().close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&recent)?);
        return Ok(());
    }
    if recent.is_empty() {
        println!("No stored reports.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<20}  {:<3}  {:>6}  FINAL",
        "ID", "CREATED", "VAR", "SCORE"
    );
    for r in &recent {
        println!(
            "{:<36}  {:<20}  {:<3}  {:>6.2}  {}",
            r.id,
            format_ts_iso(r.created_at),
            r.variable,
            r.score,
            if r.final_correct { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
