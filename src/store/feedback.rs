//! User feedback log persisted in a [`TableStore`].

use super::convert::{from_table, RowView, TableRow};
use super::{to_table, TableStore};
use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Table that [`FeedbackBook`] writes to.
pub const FEEDBACK_TABLE: &str = "feedback";

/// One submitted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl TableRow for FeedbackRecord {
    const COLUMNS: &'static [&'static str] = &["id", "name", "email", "message", "created_at"];

    fn to_cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.email.clone(),
            self.message.clone(),
            self.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ]
    }

    fn from_row(row: &RowView<'_>) -> Result<Self> {
        let raw = row.get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(raw)
            .map_err(|e| AnalyticsError::Parse {
                row: row.row_number(),
                column: "created_at".into(),
                detail: format!("'{}': {}", raw, e),
            })?
            .with_timezone(&Utc);
        Ok(FeedbackRecord {
            id: row.u64("id")?,
            name: row.get("name")?.to_string(),
            email: row.get("email")?.to_string(),
            message: row.get("message")?.to_string(),
            created_at,
        })
    }
}

/// Append-only feedback log with sequential ids starting at 1.
pub struct FeedbackBook {
    store: Arc<dyn TableStore>,
    // read-max-then-append must not interleave between submitters
    submit_lock: Mutex<()>,
}

impl FeedbackBook {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            submit_lock: Mutex::new(()),
        }
    }

    /// Record a message stamped with the current UTC time.
    ///
    /// # Errors
    /// `InvalidArgument` if any field is blank.
    pub fn submit(&self, name: &str, email: &str, message: &str) -> Result<FeedbackRecord> {
        for (field, value) in [("name", name), ("email", email), ("message", message)] {
            if value.trim().is_empty() {
                return Err(AnalyticsError::InvalidArgument(format!(
                    "feedback {} must not be empty",
                    field
                )));
            }
        }

        let _guard = self.submit_lock.lock();
        let id = self.list()?.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let record = FeedbackRecord {
            id,
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            message: message.trim().to_string(),
            created_at: Utc::now(),
        };
        self.store
            .append(FEEDBACK_TABLE, to_table(std::slice::from_ref(&record))?)?;
        info!(id, "feedback recorded");
        Ok(record)
    }

    /// All messages in submission order; empty before the first submit.
    pub fn list(&self) -> Result<Vec<FeedbackRecord>> {
        match self.store.read(FEEDBACK_TABLE) {
            Ok(table) => from_table(&table),
            Err(AnalyticsError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}
