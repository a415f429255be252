//! In-memory [`ReportStore`] implementation for testing and embedding.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{ReportStore, ReportSummary, StoredReport};

/// In-memory report store.
pub struct InMemoryReportStore {
    reports: RwLock<HashMap<String, StoredReport>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self {
            reports: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.reports.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("report store lock poisoned")
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn put(&self, record: &StoredReport) -> Result<String> {
        let mut reports = self.reports.write().map_err(poisoned)?;
        reports.insert(record.id.clone(), record.clone());
        Ok(record.id.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredReport>> {
        let reports = self.reports.read().map_err(poisoned)?;
        Ok(reports.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut reports = self.reports.write().map_err(poisoned)?;
        Ok(reports.remove(id).is_some())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ReportSummary>> {
        let reports = self.reports.read().map_err(poisoned)?;
        let mut summaries: Vec<ReportSummary> = reports.values().map(StoredReport::summary).collect();
        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        summaries.truncate(limit);
        Ok(summaries)
    }
}
