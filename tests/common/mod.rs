//! Shared helpers for integration tests

#![allow(dead_code)]

pub mod builders;
pub mod strategies;

pub use builders::*;

/// Unique name for test entities
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
}
