use super::errors::{CloudError, CloudResult};
use super::polling::PollPolicy;
use super::profitbricks::{DatacenterApi, ProfitBricksAdapter, RestDatacenterApi};
use crate::config::CloudConfig;
use crate::constants::events;
use crate::logging::log_cloud_operation;
use crate::models::CloudMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Supported cloud providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    ProfitBricks,
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProfitBricks => write!(f, "profitbricks"),
        }
    }
}

impl FromStr for CloudProvider {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Err(CloudError::InvalidCloudSettings(
                "cloud.provider is not set".to_string(),
            )),
            "profitbricks" => Ok(Self::ProfitBricks),
            other => Err(CloudError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// NIC to create on the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicSpec {
    pub name: String,
    pub lan: u32,
    pub ips: Vec<String>,
}

/// Everything needed to provision one target VM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub name: String,
    pub cores: u32,
    pub ram_mib: u64,
    pub template_image: String,
    pub ssh_keys: Vec<String>,
    pub bootstrap_nic: NicSpec,
    pub nics: Vec<NicSpec>,
    /// One empty volume is created per entry, in order
    pub disk_sizes_gib: Vec<u64>,
}

/// Provider-independent cloud lifecycle operations, dispatched to one provider
/// chosen at construction
#[derive(Debug, Clone)]
pub enum CloudAdapter {
    ProfitBricks(ProfitBricksAdapter),
}

impl CloudAdapter {
    /// Build the adapter named by `cloud.provider`, talking to the real provider API
    pub fn from_config(config: &CloudConfig) -> CloudResult<Self> {
        let provider: CloudProvider = config.provider.parse()?;
        match provider {
            CloudProvider::ProfitBricks => {
                for (setting, value) in [
                    ("cloud.endpoint", &config.endpoint),
                    ("cloud.datacenter_id", &config.datacenter_id),
                    ("cloud.username", &config.username),
                    ("cloud.password", &config.password),
                ] {
                    if value.trim().is_empty() {
                        return Err(CloudError::InvalidCloudSettings(format!(
                            "{setting} is required for provider {provider}"
                        )));
                    }
                }
                let api = Arc::new(RestDatacenterApi::new(config)?);
                Ok(Self::with_api(provider, api, poll_policy(config), config.bootstrap_volume_size_gib))
            }
        }
    }

    /// Build an adapter over an existing provider API client
    pub fn with_api(
        provider: CloudProvider,
        api: Arc<dyn DatacenterApi>,
        polling: PollPolicy,
        bootstrap_volume_size_gib: u64,
    ) -> Self {
        match provider {
            CloudProvider::ProfitBricks => {
                Self::ProfitBricks(ProfitBricksAdapter::new(api, polling, bootstrap_volume_size_gib))
            }
        }
    }

    pub fn provider(&self) -> CloudProvider {
        match self {
            Self::ProfitBricks(_) => CloudProvider::ProfitBricks,
        }
    }

    /// Provision a VM with bootstrap volume and NIC plus one empty volume per disk size.
    ///
    /// Returns the provider's view of the created server; nothing is returned on
    /// failure or timeout.
    pub async fn create_target(&self, spec: &TargetSpec) -> CloudResult<CloudMetadata> {
        let result = match self {
            Self::ProfitBricks(adapter) => adapter.create_target(spec).await,
        };
        log_cloud_operation(events::CLOUD_CREATE_TARGET, self.provider(), &spec.name, &result);
        result
    }

    pub async fn delete_target(&self, server_id: &str) -> CloudResult<()> {
        let result = match self {
            Self::ProfitBricks(adapter) => adapter.delete_target(server_id).await,
        };
        log_cloud_operation(events::CLOUD_DELETE_TARGET, self.provider(), server_id, &result);
        result
    }

    pub async fn start_target(&self, server_id: &str) -> CloudResult<()> {
        let result = match self {
            Self::ProfitBricks(adapter) => adapter.start_target(server_id).await,
        };
        log_cloud_operation(events::CLOUD_START_TARGET, self.provider(), server_id, &result);
        result
    }

    pub async fn stop_target(&self, server_id: &str) -> CloudResult<()> {
        let result = match self {
            Self::ProfitBricks(adapter) => adapter.stop_target(server_id).await,
        };
        log_cloud_operation(events::CLOUD_STOP_TARGET, self.provider(), server_id, &result);
        result
    }

    pub async fn delete_volume(&self, volume_id: &str) -> CloudResult<()> {
        let result = match self {
            Self::ProfitBricks(adapter) => adapter.delete_volume(volume_id).await,
        };
        log_cloud_operation(events::CLOUD_DELETE_VOLUME, self.provider(), volume_id, &result);
        result
    }

    pub async fn make_volume_boot(&self, server_id: &str, volume_id: &str) -> CloudResult<()> {
        let result = match self {
            Self::ProfitBricks(adapter) => adapter.make_volume_boot(server_id, volume_id).await,
        };
        log_cloud_operation(events::CLOUD_MAKE_VOLUME_BOOT, self.provider(), volume_id, &result);
        result
    }

    pub async fn delete_nic(&self, server_id: &str, nic_id: &str) -> CloudResult<()> {
        let result = match self {
            Self::ProfitBricks(adapter) => adapter.delete_nic(server_id, nic_id).await,
        };
        log_cloud_operation(events::CLOUD_DELETE_NIC, self.provider(), nic_id, &result);
        result
    }
}

fn poll_policy(config: &CloudConfig) -> PollPolicy {
    PollPolicy::new(
        Duration::from_secs(config.poll_interval_seconds),
        Duration::from_secs(config.poll_max_wait_seconds),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("profitbricks".parse::<CloudProvider>().unwrap(), CloudProvider::ProfitBricks);
        assert_eq!(" ProfitBricks ".parse::<CloudProvider>().unwrap(), CloudProvider::ProfitBricks);
        assert!(matches!(
            "".parse::<CloudProvider>(),
            Err(CloudError::InvalidCloudSettings(_))
        ));
        assert!(matches!(
            "aws".parse::<CloudProvider>(),
            Err(CloudError::UnsupportedProvider(name)) if name == "aws"
        ));
    }

    #[test]
    fn test_from_config_fails_fast() {
        let mut config = CloudConfig::default();
        config.provider = "digitalocean".to_string();
        assert!(matches!(
            CloudAdapter::from_config(&config),
            Err(CloudError::UnsupportedProvider(_))
        ));

        config.provider = "profitbricks".to_string();
        config.datacenter_id = String::new();
        assert!(matches!(
            CloudAdapter::from_config(&config),
            Err(CloudError::InvalidCloudSettings(message)) if message.contains("datacenter_id")
        ));
    }
}
