//! SQLite-backed [`ReportStore`] implementation.
//!
//! A report is stored twice: whole, as JSON in `grading_reports.report_json`,
//! and per step in `math_steps` so step verdicts can be queried directly.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use stepcheck_core::store::{ReportStore, ReportSummary, StoredReport};

/// SQLite implementation of the [`ReportStore`] trait.
pub struct SqliteReportStore {
    pool: SqlitePool,
}

impl SqliteReportStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    async fn put(&self, record: &StoredReport) -> Result<String> {
        let report = &record.report;
        let report_json =
            serde_json::to_string(report).context("Failed to serialize grading report")?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM math_steps WHERE report_id = ?")
            .bind(&record.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO grading_reports (id, fingerprint, question, correct_answer, variable,
                                         score, final_correct, first_wrong_step_index,
                                         created_at, report_json)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                fingerprint = excluded.fingerprint,
                question = excluded.question,
                correct_answer = excluded.correct_answer,
                variable = excluded.variable,
                score = excluded.score,
                final_correct = excluded.final_correct,
                first_wrong_step_index = excluded.first_wrong_step_index,
                created_at = excluded.created_at,
                report_json = excluded.report_json
            "#,
        )
        .bind(&record.id)
        .bind(&record.fingerprint)
        .bind(&report.question)
        .bind(&report.correct_answer)
        .bind(&report.variable)
        .bind(report.score)
        .bind(report.final_correct)
        .bind(report.first_wrong_step_index.map(|i| i as i64))
        .bind(record.created_at)
        .bind(&report_json)
        .execute(&mut *tx)
        .await?;

        for step in &report.steps {
            sqlx::query(
                "INSERT INTO math_steps (report_id, step_index, step_text, is_valid, reason) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&record.id)
            .bind(step.index as i64)
            .bind(&step.step)
            .bind(step.is_valid)
            .bind(&step.reason)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(record.id.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredReport>> {
        let row = sqlx::query(
            "SELECT id, fingerprint, created_at, report_json FROM grading_reports WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let report_json: String = row.get("report_json");
        let report = serde_json::from_str(&report_json)
            .with_context(|| format!("Corrupt report_json for report {}", id))?;

        Ok(Some(StoredReport {
            id: row.get("id"),
            fingerprint: row.get("fingerprint"),
            created_at: row.get("created_at"),
            report,
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM math_steps WHERE report_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM grading_reports WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ReportSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, fingerprint, created_at, variable, score, final_correct
            FROM grading_reports
            ORDER BY created_at DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| ReportSummary {
                id: row.get("id"),
                fingerprint: row.get("fingerprint"),
                created_at: row.get("created_at"),
                variable: row.get("variable"),
                score: row.get("score"),
                final_correct: row.get("final_correct"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::{db, migrate};
    use stepcheck_core::grader::Grader;

    async fn store_in(dir: &tempfile::TempDir) -> SqliteReportStore {
        let config = DbConfig {
            path: dir.path().join("data").join("stepcheck.sqlite"),
        };
        let pool = db::connect(&config).await.unwrap();
        migrate::create_schema(&pool).await.unwrap();
        SqliteReportStore::new(pool)
    }

    fn record(steps: &[&str]) -> StoredReport {
        let steps: Vec<String> = steps.iter().map(|s| s.to_string()).collect();
        let report = Grader::default()
            .grade("Solve it", "x = 2", &steps)
            .report()
            .cloned()
            .unwrap();
        StoredReport::new(report, &steps)
    }

    #[tokio::test]
    async fn test_roundtrip_and_step_rows() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let rec = record(&["2x + 3 = 7", "2x = 5", "x = 2"]);

        store.put(&rec).await.unwrap();
        let loaded = store.get(&rec.id).await.unwrap().unwrap();
        assert_eq!(loaded, rec);

        let rows = sqlx::query("SELECT step_index, is_valid FROM math_steps WHERE report_id = ? ORDER BY step_index")
            .bind(&rec.id)
            .fetch_all(store.pool())
            .await
            .unwrap();
        let valid: Vec<bool> = rows.iter().map(|r| r.get("is_valid")).collect();
        assert_eq!(valid, vec![true, false, true]);

        // Re-putting the same id replaces rather than duplicates
        store.put(&rec).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM math_steps")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_delete_and_recent() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let mut a = record(&["x = 2"]);
        a.created_at = 100;
        let mut b = record(&["x = 3"]);
        b.created_at = 200;
        store.put(&a).await.unwrap();
        store.put(&b).await.unwrap();

        let recent = store.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, b.id);
        assert!(!recent[0].final_correct);

        assert!(store.delete(&a.id).await.unwrap());
        assert!(!store.delete(&a.id).await.unwrap());
        assert!(store.get(&a.id).await.unwrap().is_none());
    }
}
