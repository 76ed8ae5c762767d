//! # Migration Orchestration
//!
//! The migration-specific layer on top of the generic state machine:
//!
//! - **Commands**: one per working [`SourceStatus`](crate::models::SourceStatus),
//!   talking to hosts through the [`RemoteExecutor`](crate::remote::RemoteExecutor)
//!   and to the provider through the [`CloudAdapter`](crate::cloud::CloudAdapter)
//! - **Catalog**: the status → command table and the assembled commander
//! - **Hooks**: blueprint scripts around each command
//! - **Persistence**: transitions saved through the [`MigrationStore`](crate::store::MigrationStore)
//! - **Scheduler**: bounded-concurrency driver for every source of a run

pub mod catalog;
pub mod commands;
pub mod context;
pub mod hooks;
pub mod inventory;
pub mod persistence;
pub mod scheduler;

pub use catalog::{migration_commander, migration_commands};
pub use context::MigrationContext;
pub use hooks::BlueprintHooks;
pub use inventory::collect_system_info;
pub use persistence::StorePersistence;
pub use scheduler::{HostOutcome, HostReport, MigrationScheduler, SchedulerReport};
