use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Clock, QuotaError};
use crate::models::{EntryId, FeatureCategory, UsageEntry};

/// Result of a conditional append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalRecord {
    /// Entry appended; `used` includes it
    Recorded { entry_id: EntryId, used: i64 },
    /// Nothing appended because `used` already reached the limit
    LimitReached { used: i64 },
}

/// Append-only store of usage entries.
///
/// Implementations stamp `created_at` from their own clock so a simulated clock
/// drives both recording and counting.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Append one entry stamped with the current time
    async fn record(&self, user_id: i32, category: FeatureCategory)
        -> Result<EntryId, QuotaError>;

    /// Count entries for the user/category with `created_at >= boundary`
    async fn count_since(
        &self,
        user_id: i32,
        category: FeatureCategory,
        boundary: DateTime<Utc>,
    ) -> Result<i64, QuotaError>;

    /// Count and append as one step, serialized per (user, category).
    /// Appends only when the count since `boundary` is below `limit`.
    async fn record_if_below(
        &self,
        user_id: i32,
        category: FeatureCategory,
        boundary: DateTime<Utc>,
        limit: i64,
    ) -> Result<ConditionalRecord, QuotaError>;

    /// Delete entries created before `cutoff`. Only the retention sweep calls this.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, QuotaError>;
}

/// In-process ledger. Suitable for tests and single-node development.
pub struct MemoryUsageLedger {
    entries: Mutex<Vec<UsageEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryUsageLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            clock,
        }
    }

    /// Snapshot of every stored entry, oldest first
    pub async fn entries(&self) -> Vec<UsageEntry> {
        self.entries.lock().await.clone()
    }

    fn count_in(
        entries: &[UsageEntry],
        user_id: i32,
        category: FeatureCategory,
        boundary: DateTime<Utc>,
    ) -> i64 {
        entries
            .iter()
            .filter(|e| e.user_id == user_id && e.category == category && e.created_at >= boundary)
            .count() as i64
    }

    fn new_entry(&self, user_id: i32, category: FeatureCategory) -> UsageEntry {
        UsageEntry {
            id: Uuid::new_v4(),
            user_id,
            category,
            created_at: self.clock.now(),
        }
    }
}

#[async_trait]
impl UsageLedger for MemoryUsageLedger {
    async fn record(
        &self,
        user_id: i32,
        category: FeatureCategory,
    ) -> Result<EntryId, QuotaError> {
        let entry = self.new_entry(user_id, category);
        let id = entry.id;
        self.entries.lock().await.push(entry);
        Ok(id)
    }

    async fn count_since(
        &self,
        user_id: i32,
        category: FeatureCategory,
        boundary: DateTime<Utc>,
    ) -> Result<i64, QuotaError> {
        let entries = self.entries.lock().await;
        Ok(Self::count_in(&entries, user_id, category, boundary))
    }

    async fn record_if_below(
        &self,
        user_id: i32,
        category: FeatureCategory,
        boundary: DateTime<Utc>,
        limit: i64,
    ) -> Result<ConditionalRecord, QuotaError> {
        // One guard spans the count and the push
        let mut entries = self.entries.lock().await;
        let used = Self::count_in(&entries, user_id, category, boundary);
        if used >= limit {
            return Ok(ConditionalRecord::LimitReached { used });
        }

        let entry = self.new_entry(user_id, category);
        let entry_id = entry.id;
        entries.push(entry);
        Ok(ConditionalRecord::Recorded {
            entry_id,
            used: used + 1,
        })
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, QuotaError> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| e.created_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}
