//! Usage ledger models.
//!
//! A usage entry is one granted invocation of a metered AI feature. Entries are
//! written once and never updated; daily usage is always derived by counting them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use crate::quota::QuotaError;

/// Identifier of a recorded usage entry
pub type EntryId = Uuid;

// =============================================================================
// Feature Category Enum
// =============================================================================

/// Metered AI feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    Summary,
    Flashcards,
    Questions,
    EditContent,
    TermPaper,
}

impl FeatureCategory {
    pub const ALL: [FeatureCategory; 5] = [
        FeatureCategory::Summary,
        FeatureCategory::Flashcards,
        FeatureCategory::Questions,
        FeatureCategory::EditContent,
        FeatureCategory::TermPaper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureCategory::Summary => "summary",
            FeatureCategory::Flashcards => "flashcards",
            FeatureCategory::Questions => "questions",
            FeatureCategory::EditContent => "edit_content",
            FeatureCategory::TermPaper => "term_paper",
        }
    }

    /// Stable numeric code, used as the second advisory lock key
    pub fn code(&self) -> i32 {
        match self {
            FeatureCategory::Summary => 1,
            FeatureCategory::Flashcards => 2,
            FeatureCategory::Questions => 3,
            FeatureCategory::EditContent => 4,
            FeatureCategory::TermPaper => 5,
        }
    }
}

impl std::fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureCategory {
    type Err = QuotaError;

    /// Accepts the snake_case names plus the kebab-case forms used in frontend routes
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        FeatureCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| QuotaError::InvalidCategory(s.to_string()))
    }
}

// =============================================================================
// Usage Entry Model
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct UsageEntry {
    pub id: EntryId,
    pub user_id: i32,
    pub category: FeatureCategory,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Quota Decision
// =============================================================================

/// Outcome of a check-and-consume call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum QuotaDecision {
    Allowed {
        entry_id: EntryId,
        /// Usage today including this invocation
        used: i64,
        limit: i64,
    },
    Denied {
        used: i64,
        limit: i64,
        resets_at: DateTime<Utc>,
    },
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed { .. })
    }
}

/// Per-category usage snapshot for the quota status page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryUsage {
    pub category: FeatureCategory,
    pub used: i64,
    pub limit: i64,
    pub remaining: i64,
    pub resets_at: DateTime<Utc>,
}
