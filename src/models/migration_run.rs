use super::blueprint::Blueprint;
use super::remote_host::{OsFamily, RemoteHost};
use super::source::Source;
use super::target::Target;
use crate::error::{MigratorError, MigratorResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Declarative input: which hosts to migrate and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    #[serde(default)]
    pub policy: RunPolicy,
    pub sources: Vec<SourcePlan>,
}

/// One host entry of a plan, with its blueprint already resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePlan {
    pub name: String,
    pub address: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
    pub os: OsFamily,
    #[serde(default)]
    pub os_version: String,
    pub blueprint: Blueprint,
}

fn default_ssh_port() -> u16 {
    22
}

impl SourcePlan {
    fn remote_host(&self) -> RemoteHost {
        let mut host = RemoteHost::new(self.address.clone(), self.username.clone(), self.os);
        host.port = self.port;
        host.private_key_path = self.private_key_path.clone();
        host.os_version = self.os_version.clone();
        host
    }
}

/// Run-wide scheduling policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPolicy {
    #[serde(default = "default_simultaneous_migrations")]
    pub simultaneous_migrations: usize,
    /// Cadence of periodic re-syncs while waiting for go-live
    #[serde(default)]
    pub sync_interval_seconds: Option<u64>,
    #[serde(default)]
    pub go_live_at: Option<DateTime<Utc>>,
}

fn default_simultaneous_migrations() -> usize {
    1
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            simultaneous_migrations: default_simultaneous_migrations(),
            sync_interval_seconds: None,
            go_live_at: None,
        }
    }
}

impl RunPolicy {
    pub fn sync_interval(&self) -> Option<Duration> {
        self.sync_interval_seconds.map(Duration::from_secs)
    }

    pub fn validate(&self) -> MigratorResult<()> {
        if self.simultaneous_migrations == 0 {
            return Err(MigratorError::InvalidPlan(
                "simultaneous_migrations must be at least 1".to_string(),
            ));
        }
        if self.sync_interval_seconds == Some(0) {
            return Err(MigratorError::InvalidPlan(
                "sync_interval_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A batch of sources migrated under one policy; immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRun {
    pub id: Uuid,
    pub policy: RunPolicy,
    pub source_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl MigrationRun {
    /// Create a run and one `draft` source per plan entry
    pub fn from_plan(plan: &MigrationPlan) -> MigratorResult<(Self, Vec<Source>)> {
        plan.policy.validate()?;

        let mut names = HashSet::new();
        for source in &plan.sources {
            if !names.insert(source.name.as_str()) {
                return Err(MigratorError::InvalidPlan(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
        }

        let run_id = Uuid::new_v4();
        let sources: Vec<Source> = plan
            .sources
            .iter()
            .map(|entry| {
                Source::new(
                    run_id,
                    entry.name.clone(),
                    entry.remote_host(),
                    Target::new(entry.blueprint.clone()),
                )
            })
            .collect();

        let run = Self {
            id: run_id,
            policy: plan.policy.clone(),
            source_ids: sources.iter().map(|source| source.id).collect(),
            created_at: Utc::now(),
        };
        Ok((run, sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceStatus;
    use crate::state_machine::StatefulEntity;

    const PLAN: &str = r#"
policy:
  simultaneous_migrations: 2
  sync_interval_seconds: 3600
sources:
  - name: web-1
    address: 10.0.0.11
    username: root
    os: debian
    blueprint:
      name: web
      template_image: debian-12
  - name: db-1
    address: 10.0.0.21
    port: 2222
    username: admin
    os: centos
    blueprint:
      name: db
      template_image: centos-7
"#;

    #[test]
    fn test_from_plan_creates_draft_sources() {
        let plan: MigrationPlan = serde_yaml::from_str(PLAN).unwrap();
        let (run, sources) = MigrationRun::from_plan(&plan).unwrap();

        assert_eq!(run.policy.simultaneous_migrations, 2);
        assert_eq!(run.policy.sync_interval(), Some(Duration::from_secs(3600)));
        assert_eq!(run.source_ids.len(), 2);
        assert!(sources.iter().all(|s| *s.status() == SourceStatus::Draft));
        assert!(sources.iter().all(|s| s.run_id == run.id));
        assert_eq!(sources[1].remote_host.port, 2222);
        assert_eq!(sources[1].target.blueprint.name, "db");
        assert!(sources[0].target.remote_host.is_none());
    }

    #[test]
    fn test_invalid_plans_are_rejected() {
        let mut plan: MigrationPlan = serde_yaml::from_str(PLAN).unwrap();
        plan.sources[1].name = "web-1".to_string();
        assert!(matches!(
            MigrationRun::from_plan(&plan),
            Err(MigratorError::InvalidPlan(_))
        ));

        let mut plan: MigrationPlan = serde_yaml::from_str(PLAN).unwrap();
        plan.policy.simultaneous_migrations = 0;
        assert!(MigrationRun::from_plan(&plan).is_err());
    }
}
