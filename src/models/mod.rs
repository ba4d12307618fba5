pub mod usage;
pub mod user;

pub use usage::{CategoryUsage, EntryId, FeatureCategory, QuotaDecision, UsageEntry};
pub use user::{Credentials, User};
