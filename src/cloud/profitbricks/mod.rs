//! # ProfitBricks
//!
//! Datacenter-scoped provider: servers, volumes and NICs live in one
//! datacenter and every mutating call returns a request whose status is
//! polled until `DONE`.

pub mod api;
pub mod rest;

pub use api::{Accepted, DatacenterApi, Nic, NicRequest, RequestStatus, ServerRequest, Volume, VolumeRequest};
pub use rest::RestDatacenterApi;

use super::adapter::TargetSpec;
use super::errors::{CloudError, CloudResult};
use super::polling::{poll, PollPolicy};
use crate::constants::provider_states::{AVAILABLE, BUSY, INACTIVE, REQUEST_DONE, REQUEST_FAILED};
use crate::models::{CloudMetadata, NicInfo, VolumeInfo};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct ProfitBricksAdapter {
    api: Arc<dyn DatacenterApi>,
    polling: PollPolicy,
    bootstrap_volume_size_gib: u64,
}

impl std::fmt::Debug for ProfitBricksAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfitBricksAdapter")
            .field("polling", &self.polling)
            .field("bootstrap_volume_size_gib", &self.bootstrap_volume_size_gib)
            .finish()
    }
}

fn bootstrap_name(target: &str) -> String {
    format!("{target}-bootstrap")
}

impl ProfitBricksAdapter {
    pub fn new(api: Arc<dyn DatacenterApi>, polling: PollPolicy, bootstrap_volume_size_gib: u64) -> Self {
        Self {
            api,
            polling,
            bootstrap_volume_size_gib,
        }
    }

    fn server_request(&self, spec: &TargetSpec) -> ServerRequest {
        let mut volumes = vec![VolumeRequest {
            name: bootstrap_name(&spec.name),
            size_gib: self.bootstrap_volume_size_gib,
            image: Some(spec.template_image.clone()),
            ssh_keys: spec.ssh_keys.clone(),
        }];
        volumes.extend(spec.disk_sizes_gib.iter().enumerate().map(|(index, size)| {
            VolumeRequest {
                name: format!("{}-disk-{}", spec.name, index + 1),
                size_gib: *size,
                image: None,
                ssh_keys: Vec::new(),
            }
        }));

        let mut nics = vec![NicRequest {
            name: bootstrap_name(&spec.name),
            lan: spec.bootstrap_nic.lan,
            ips: spec.bootstrap_nic.ips.clone(),
        }];
        nics.extend(spec.nics.iter().map(|nic| NicRequest {
            name: nic.name.clone(),
            lan: nic.lan,
            ips: nic.ips.clone(),
        }));

        ServerRequest {
            name: spec.name.clone(),
            cores: spec.cores,
            ram_mib: spec.ram_mib,
            volumes,
            nics,
        }
    }

    async fn wait_for_request(&self, operation: &str, request_id: &str) -> CloudResult<()> {
        poll(
            operation,
            &self.polling,
            || self.api.request_status(request_id),
            |status| match status.status.as_str() {
                REQUEST_DONE => Ok(true),
                REQUEST_FAILED => Err(CloudError::RequestFailed {
                    operation: operation.to_string(),
                    request_id: request_id.to_string(),
                    message: status.message.clone().unwrap_or_default(),
                }),
                _ => Ok(false),
            },
        )
        .await
        .map(|_| ())
    }

    async fn wait_for_server_state(
        &self,
        operation: &str,
        server_id: &str,
        is_satisfied: impl Fn(&str) -> bool,
    ) -> CloudResult<String> {
        poll(
            operation,
            &self.polling,
            || self.api.server_state(server_id),
            |state| Ok(is_satisfied(state)),
        )
        .await
    }

    #[instrument(skip(self, spec), fields(target = %spec.name))]
    pub async fn create_target(&self, spec: &TargetSpec) -> CloudResult<CloudMetadata> {
        let accepted = self.api.create_server(&self.server_request(spec)).await?;
        info!(server_id = %accepted.id, request_id = %accepted.request_id, "🚀 PROFITBRICKS: Server creation submitted");

        self.wait_for_request("create target", &accepted.request_id)
            .await?;

        let volumes = self.api.list_volumes(&accepted.id).await?;
        let nics = self.api.list_nics(&accepted.id).await?;
        let bootstrap = bootstrap_name(&spec.name);

        let bootstrap_volume_id = volumes
            .iter()
            .find(|volume| volume.name == bootstrap)
            .map(|volume| volume.id.clone())
            .ok_or_else(|| CloudError::invalid_response("volumes", "bootstrap volume not attached"))?;
        let bootstrap_nic_id = nics
            .iter()
            .find(|nic| nic.name == bootstrap)
            .map(|nic| nic.id.clone())
            .ok_or_else(|| CloudError::invalid_response("nics", "bootstrap NIC not attached"))?;

        info!(server_id = %accepted.id, volumes = volumes.len(), nics = nics.len(), "✅ PROFITBRICKS: Server created");

        Ok(CloudMetadata {
            server_id: accepted.id,
            bootstrap_volume_id,
            bootstrap_nic_id,
            volumes: volumes
                .into_iter()
                .map(|volume| VolumeInfo {
                    id: volume.id,
                    name: volume.name,
                    size_gib: volume.size_gib,
                    device_number: volume.device_number,
                })
                .collect(),
            nics: nics
                .into_iter()
                .map(|nic| NicInfo {
                    id: nic.id,
                    name: nic.name,
                    lan: nic.lan,
                    ips: nic.ips,
                    mac: nic.mac,
                })
                .collect(),
        })
    }

    pub async fn delete_target(&self, server_id: &str) -> CloudResult<()> {
        self.api.delete_server(server_id).await
    }

    pub async fn start_target(&self, server_id: &str) -> CloudResult<()> {
        self.api.start_server(server_id).await?;
        self.wait_for_server_state("start target", server_id, |state| state == AVAILABLE)
            .await?;
        Ok(())
    }

    pub async fn stop_target(&self, server_id: &str) -> CloudResult<()> {
        self.api.stop_server(server_id).await?;
        self.wait_for_server_state("stop target", server_id, |state| state == INACTIVE)
            .await?;
        Ok(())
    }

    pub async fn delete_volume(&self, volume_id: &str) -> CloudResult<()> {
        self.api.delete_volume(volume_id).await
    }

    pub async fn make_volume_boot(&self, server_id: &str, volume_id: &str) -> CloudResult<()> {
        self.api.set_boot_volume(server_id, volume_id).await?;
        self.wait_for_server_state("make volume boot", server_id, |state| state != BUSY)
            .await?;
        Ok(())
    }

    pub async fn delete_nic(&self, server_id: &str, nic_id: &str) -> CloudResult<()> {
        self.api.delete_nic(server_id, nic_id).await
    }
}
