//! Studyquota server library
//!
//! Session authentication plus per-user daily quotas for the study
//! assistant's AI features. Exposed as a library for the integration tests.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod quota;
pub mod retention;
pub mod routes;
pub mod services;
