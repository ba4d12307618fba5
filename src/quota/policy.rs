use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use std::sync::Arc;

use super::{Clock, ConditionalRecord, QuotaError, UsageLedger};
use crate::config::QuotaConfig;
use crate::models::{CategoryUsage, FeatureCategory, QuotaDecision};

/// Start of the calendar day containing `now`, in the reference zone `offset`,
/// expressed as a UTC instant.
pub fn day_boundary(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local_midnight = now
        .with_timezone(&offset)
        .date_naive()
        .and_time(NaiveTime::MIN);
    local_midnight.and_utc() - Duration::seconds(offset.local_minus_utc().into())
}

/// Start of the following accounting day. Fixed offsets have no DST, so
/// every day is exactly 24 hours.
pub fn next_day_boundary(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    day_boundary(now, offset) + Duration::days(1)
}

/// Decides whether a user may invoke a metered feature again today
#[derive(Clone)]
pub struct QuotaPolicy {
    ledger: Arc<dyn UsageLedger>,
    clock: Arc<dyn Clock>,
    config: QuotaConfig,
}

impl QuotaPolicy {
    pub fn new(ledger: Arc<dyn UsageLedger>, clock: Arc<dyn Clock>, config: QuotaConfig) -> Self {
        Self {
            ledger,
            clock,
            config,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn UsageLedger> {
        &self.ledger
    }

    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn day_boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        day_boundary(now, self.config.utc_offset)
    }

    pub fn next_boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        next_day_boundary(now, self.config.utc_offset)
    }

    /// Rejects unknown categories before any storage access
    pub fn parse_category(raw: &str) -> Result<FeatureCategory, QuotaError> {
        raw.parse()
    }

    /// Configured daily limit for a category
    pub fn limit_for(&self, category: FeatureCategory) -> i64 {
        self.config.limits.for_category(category)
    }

    /// Grants and records one invocation if today's usage is below `limit`.
    ///
    /// A denial records nothing. The count and the append run as one
    /// conditional step in the ledger, so concurrent callers cannot push the
    /// day's total past `limit`.
    pub async fn check_and_consume(
        &self,
        user_id: i32,
        category: FeatureCategory,
        limit: i64,
    ) -> Result<QuotaDecision, QuotaError> {
        let now = self.clock.now();
        let boundary = self.day_boundary(now);

        let outcome = self
            .ledger
            .record_if_below(user_id, category, boundary, limit)
            .await
            .inspect_err(|e| {
                log::error!(
                    "Quota check failed for user {} ({}): {}",
                    user_id,
                    category,
                    e
                )
            })?;

        match outcome {
            ConditionalRecord::Recorded { entry_id, used } => {
                log::debug!(
                    "Quota granted for user {} ({}): {}/{}",
                    user_id,
                    category,
                    used,
                    limit
                );
                Ok(QuotaDecision::Allowed {
                    entry_id,
                    used,
                    limit,
                })
            }
            ConditionalRecord::LimitReached { used } => {
                log::info!(
                    "Quota exhausted for user {} ({}): {}/{}",
                    user_id,
                    category,
                    used,
                    limit
                );
                Ok(QuotaDecision::Denied {
                    used,
                    limit,
                    resets_at: self.next_boundary(now),
                })
            }
        }
    }

    /// [`check_and_consume`](Self::check_and_consume) with the configured limit
    pub async fn check_and_consume_category(
        &self,
        user_id: i32,
        category: FeatureCategory,
    ) -> Result<QuotaDecision, QuotaError> {
        self.check_and_consume(user_id, category, self.limit_for(category))
            .await
    }

    /// Today's usage for every category
    pub async fn usage(&self, user_id: i32) -> Result<Vec<CategoryUsage>, QuotaError> {
        let now = self.clock.now();
        let boundary = self.day_boundary(now);
        let resets_at = self.next_boundary(now);

        let mut usage = Vec::with_capacity(FeatureCategory::ALL.len());
        for category in FeatureCategory::ALL {
            let used = self.ledger.count_since(user_id, category, boundary).await?;
            let limit = self.limit_for(category);
            usage.push(CategoryUsage {
                category,
                used,
                limit,
                remaining: (limit - used).max(0),
                resets_at,
            });
        }

        Ok(usage)
    }
}
