use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::DbConfig;
use crate::db;

pub async fn run_migrations(db_config: &DbConfig) -> Result<()> {
    let pool = db::connect(db_config).await?;
    create_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create every table and index. Idempotent.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // One row per stored grading report
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS grading_reports (
            id TEXT PRIMARY KEY,
            fingerprint TEXT NOT NULL,
            question TEXT NOT NULL,
            correct_answer TEXT NOT NULL,
            variable TEXT NOT NULL,
            score REAL NOT NULL,
            final_correct INTEGER NOT NULL,
            first_wrong_step_index INTEGER,
            created_at INTEGER NOT NULL,
            report_json TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Per-step verdicts of a report
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS math_steps (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            report_id TEXT NOT NULL,
            step_index INTEGER NOT NULL,
            step_text TEXT NOT NULL,
            is_valid INTEGER NOT NULL,
            reason TEXT NOT NULL,
            UNIQUE(report_id, step_index),
            FOREIGN KEY (report_id) REFERENCES grading_reports(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_math_steps_report_id ON math_steps(report_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_grading_reports_created_at ON grading_reports(created_at DESC)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_grading_reports_fingerprint ON grading_reports(fingerprint)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
