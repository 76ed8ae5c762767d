#![allow(clippy::doc_markdown)] // Allow technical terms like ProfitBricks, lsblk in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Migrator Core Rust
//!
//! Orchestration engine for migrating whole servers into cloud VMs.
//!
//! ## Overview
//!
//! Each source host walks a fixed lifecycle: a target VM is provisioned, the
//! source disk layout is replicated on it, data is copied while the source keeps
//! running, and at go-live the target's boot and network configuration is
//! rewritten before it is started from the migrated disks. Every step is a
//! remote operation that can fail; a failed step keeps the host at its status
//! so the step can be retried.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Status lifecycle, commands and the commander
//! - [`mapping`] - Source-to-target device and path mapping
//! - [`cloud`] - Cloud resource lifecycle behind one adapter enum
//! - [`remote`] - Remote command execution over SSH
//! - [`orchestration`] - Migration commands, hooks and the scheduler
//! - [`models`] - Sources, targets, hosts, blueprints and runs
//! - [`store`] - Persistence of sources and runs
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use migrator_core::cloud::CloudAdapter;
//! use migrator_core::config::ConfigManager;
//! use migrator_core::models::MigrationPlan;
//! use migrator_core::orchestration::{migration_commander, MigrationContext, MigrationScheduler};
//! use migrator_core::remote::SshExecutor;
//! use std::sync::Arc;
//!
//! # async fn example(plan: MigrationPlan) -> Result<(), Box<dyn std::error::Error>> {
//! migrator_core::logging::init_structured_logging();
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//!
//! let ctx = MigrationContext::new(
//!     Arc::new(SshExecutor::new(config.ssh.clone())),
//!     Arc::new(CloudAdapter::from_config(&config.cloud)?),
//! );
//! let store = migrator_core::store::from_config(&config.store);
//! let commander = Arc::new(migration_commander(ctx, store.clone())?);
//! let scheduler = MigrationScheduler::new(commander, store, config.scheduler.clone());
//!
//! let run = scheduler.create_run(&plan).await?;
//! scheduler.execute_migration(&run).await?;
//! scheduler.run_until_go_live(&run).await?;
//! # Ok(())
//! # }
//! ```

pub mod cloud;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod models;
pub mod orchestration;
pub mod remote;
pub mod state_machine;
pub mod store;

pub use cloud::{CloudAdapter, CloudError, CloudProvider};
pub use config::{ConfigManager, MigratorConfig};
pub use error::{MigratorError, MigratorResult};
pub use mapping::{DeviceMapping, MountpointMap};
pub use models::{MigrationPlan, MigrationRun, Source, SourceStatus};
pub use orchestration::{MigrationContext, MigrationScheduler, SchedulerReport};
pub use state_machine::{Commander, ExecutionOutcome, StatusLifecycle};
