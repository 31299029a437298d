//! In-process `ReportStore` used by handler and router tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{PersistedRecord, ReportStore};
use crate::errors::AppError;

#[derive(Default)]
pub struct MemoryReportStore {
    records: Mutex<Vec<PersistedRecord>>,
    fail: bool,
}

impl MemoryReportStore {
    /// A store whose every append fails, for exercising the 500 path.
    pub fn failing() -> Self {
        Self {
            records: Mutex::default(),
            fail: true,
        }
    }

    pub fn records(&self) -> Vec<PersistedRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn append(&self, record: &PersistedRecord) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::Internal(anyhow::anyhow!("store unavailable")));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
