//! # Migration Scheduler
//!
//! Drives every source of a run through the commander with bounded concurrency.
//! Pending sources wait in a queue; at most `simultaneous_migrations` of them
//! run as tokio tasks at once, and each task reports back over a channel so a
//! slot is freed exactly when a host finishes.

use crate::config::SchedulerConfig;
use crate::constants::events;
use crate::error::{MigratorError, MigratorResult};
use crate::logging::{log_error, log_source_operation};
use crate::models::{MigrationPlan, MigrationRun, Source, SourceStatus};
use crate::state_machine::{Commander, ExecutionOutcome, StatefulEntity};
use crate::store::MigrationStore;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// How a single host stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOutcome {
    /// Waiting at a pausing status (normally `sync`) for an explicit resume
    Paused(SourceStatus),
    Completed,
    Failed { status: SourceStatus, report: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostReport {
    pub source_id: Uuid,
    pub name: String,
    pub outcome: HostOutcome,
}

/// Result of one scheduler pass over a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    /// One entry per source driven in this pass, ordered by name
    pub hosts: Vec<HostReport>,
    /// Highest number of hosts that were in flight at the same time
    pub max_in_flight: usize,
}

impl SchedulerReport {
    pub fn failed(&self) -> impl Iterator<Item = &HostReport> {
        self.hosts
            .iter()
            .filter(|host| matches!(host.outcome, HostOutcome::Failed { .. }))
    }

    pub fn paused_count(&self) -> usize {
        self.hosts
            .iter()
            .filter(|host| matches!(host.outcome, HostOutcome::Paused(_)))
            .count()
    }

    pub fn completed_count(&self) -> usize {
        self.hosts
            .iter()
            .filter(|host| host.outcome == HostOutcome::Completed)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    /// Run from the current status
    Execute,
    /// Step past the current status first
    Advance,
    /// Run the current status again even when paused there
    Repeat,
}

pub struct MigrationScheduler {
    commander: Arc<Commander<Source>>,
    store: Arc<dyn MigrationStore>,
    config: SchedulerConfig,
}

impl MigrationScheduler {
    pub fn new(
        commander: Arc<Commander<Source>>,
        store: Arc<dyn MigrationStore>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            commander,
            store,
            config,
        }
    }

    /// Create a run and its draft sources from a plan and persist them
    pub async fn create_run(&self, plan: &MigrationPlan) -> MigratorResult<MigrationRun> {
        let (run, sources) = MigrationRun::from_plan(plan)?;
        for source in &sources {
            self.store.save_source(source).await?;
        }
        self.store.save_run(&run).await?;
        info!(run_id = %run.id, sources = sources.len(), "📋 SCHEDULER: Migration run created");
        Ok(run)
    }

    /// Take every draft source of the run through to its first pause at `sync`
    #[instrument(skip_all, fields(run_id = %run.id))]
    pub async fn execute_migration(&self, run: &MigrationRun) -> MigratorResult<SchedulerReport> {
        let sources = self
            .sources_at(run, |source| *source.status() == SourceStatus::Draft)
            .await?;
        self.drive(run, sources, Resume::Execute).await
    }

    /// Cut over every source paused at `sync`: final sync through `live`
    #[instrument(skip_all, fields(run_id = %run.id))]
    pub async fn execute_go_live(&self, run: &MigrationRun) -> MigratorResult<SchedulerReport> {
        let sources = self.sources_at(run, Source::is_paused_at_sync).await?;
        self.drive(run, sources, Resume::Advance).await
    }

    /// Repeat the sync of every source at `sync`, including ones whose last sync
    /// failed; they pause again afterwards
    #[instrument(skip_all, fields(run_id = %run.id))]
    pub async fn execute_resync(&self, run: &MigrationRun) -> MigratorResult<SchedulerReport> {
        let sources = self.sources_at(run, Source::is_at_sync).await?;
        self.drive(run, sources, Resume::Repeat).await
    }

    /// Re-sync on the run's cadence until its go-live time, then go live
    pub async fn run_until_go_live(&self, run: &MigrationRun) -> MigratorResult<SchedulerReport> {
        let go_live_at = run.policy.go_live_at.ok_or_else(|| {
            MigratorError::Scheduler(format!("run {} has no go-live time", run.id))
        })?;
        let interval = run.policy.sync_interval();

        loop {
            let remaining = (go_live_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            if remaining.is_zero() {
                break;
            }
            match interval {
                Some(interval) if interval < remaining => {
                    tokio::time::sleep(interval).await;
                    let report = self.execute_resync(run).await?;
                    info!(
                        run_id = %run.id,
                        synced = report.paused_count(),
                        failed = report.failed().count(),
                        "🔄 SCHEDULER: Periodic sync finished"
                    );
                }
                _ => tokio::time::sleep(remaining).await,
            }
        }

        info!(run_id = %run.id, "🚀 SCHEDULER: Go-live time reached");
        self.execute_go_live(run).await
    }

    async fn sources_at(
        &self,
        run: &MigrationRun,
        selected: impl Fn(&Source) -> bool,
    ) -> MigratorResult<Vec<Source>> {
        Ok(self
            .store
            .sources_for_run(run.id)
            .await?
            .into_iter()
            .filter(|source| selected(source))
            .collect())
    }

    async fn drive(
        &self,
        run: &MigrationRun,
        sources: Vec<Source>,
        resume: Resume,
    ) -> MigratorResult<SchedulerReport> {
        let limit = self
            .config
            .effective_limit(run.policy.simultaneous_migrations);
        let mut pending: VecDeque<Source> = sources.into();
        let (completed_tx, mut completed_rx) = mpsc::unbounded_channel::<HostReport>();

        info!(
            run_id = %run.id,
            hosts = pending.len(),
            limit = limit,
            "🚀 SCHEDULER: Starting pass"
        );

        let mut report = SchedulerReport::default();
        let mut in_flight = 0usize;
        loop {
            while in_flight < limit {
                let Some(source) = pending.pop_front() else {
                    break;
                };
                self.spawn_host(source, resume, completed_tx.clone());
                in_flight += 1;
                report.max_in_flight = report.max_in_flight.max(in_flight);
            }

            if in_flight == 0 {
                break;
            }

            let Some(host) = completed_rx.recv().await else {
                return Err(MigratorError::Scheduler(
                    "completion channel closed with hosts in flight".to_string(),
                ));
            };
            in_flight -= 1;
            report.hosts.push(host);
        }

        report.hosts.sort_by(|a, b| a.name.cmp(&b.name));
        info!(
            run_id = %run.id,
            paused = report.paused_count(),
            completed = report.completed_count(),
            failed = report.failed().count(),
            "✅ SCHEDULER: Pass finished"
        );
        Ok(report)
    }

    fn spawn_host(&self, source: Source, resume: Resume, completed: mpsc::UnboundedSender<HostReport>) {
        let source_id = source.id;
        let name = source.name.clone();
        let status = *source.status();
        log_source_operation(events::SOURCE_ADMITTED, &name, status.as_str(), None);

        let task = tokio::spawn(drive_host(
            self.commander.clone(),
            self.store.clone(),
            source,
            resume,
        ));

        // A panicking host still frees its slot
        tokio::spawn(async move {
            let host = task.await.unwrap_or_else(|join_error| {
                log_error("scheduler", "drive_host", &join_error.to_string(), Some(&name));
                HostReport {
                    source_id,
                    name,
                    outcome: HostOutcome::Failed {
                        status,
                        report: format!("migration task aborted: {join_error}"),
                    },
                }
            });
            if completed.send(host).is_err() {
                warn!("Scheduler stopped listening before a host finished");
            }
        });
    }
}

async fn drive_host(
    commander: Arc<Commander<Source>>,
    store: Arc<dyn MigrationStore>,
    mut source: Source,
    resume: Resume,
) -> HostReport {
    let result = match resume {
        Resume::Execute => commander.execute(&mut source).await,
        Resume::Advance => commander.increment_status_and_execute(&mut source).await,
        Resume::Repeat => commander.repeat_status_and_execute(&mut source).await,
    };

    let outcome = match result {
        Ok(ExecutionOutcome::Paused(status)) => {
            source.last_error = None;
            log_source_operation(events::SOURCE_PAUSED, &source.name, status.as_str(), None);
            HostOutcome::Paused(status)
        }
        Ok(ExecutionOutcome::Completed(status)) => {
            source.last_error = None;
            log_source_operation(events::SOURCE_COMPLETED, &source.name, status.as_str(), None);
            HostOutcome::Completed
        }
        Err(error) => {
            let report = error.to_string();
            log_source_operation(
                events::SOURCE_FAILED,
                &source.name,
                source.status().as_str(),
                Some(&report),
            );
            source.last_error = Some(report.clone());
            HostOutcome::Failed {
                status: *source.status(),
                report,
            }
        }
    };

    if let Err(error) = store.save_source(&source).await {
        log_error("scheduler", "save_source", &error.to_string(), Some(&source.name));
    }

    HostReport {
        source_id: source.id,
        name: source.name,
        outcome,
    }
}
