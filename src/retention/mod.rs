//! Optional purge of old usage entries.
//!
//! Disabled unless `QUOTA_RETENTION_DAYS` is set. The sweep never reaches into
//! the current accounting day, so it cannot change a quota decision.

pub mod worker;

pub use worker::{retention_cutoff, spawn_if_configured, sweep_once};
