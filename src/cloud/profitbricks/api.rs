use crate::cloud::errors::CloudResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Server creation request with its initial volumes and NICs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRequest {
    pub name: String,
    pub cores: u32,
    pub ram_mib: u64,
    pub volumes: Vec<VolumeRequest>,
    pub nics: Vec<NicRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRequest {
    pub name: String,
    pub size_gib: u64,
    /// Image the volume is created from; `None` creates an empty volume
    pub image: Option<String>,
    pub ssh_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicRequest {
    pub name: String,
    pub lan: u32,
    pub ips: Vec<String>,
}

/// Provider acknowledgment of an asynchronous request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// Id of the entity being created
    pub id: String,
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStatus {
    /// `QUEUED`, `RUNNING`, `DONE` or `FAILED`
    pub status: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub size_gib: u64,
    pub device_number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nic {
    pub id: String,
    pub name: String,
    pub lan: u32,
    pub ips: Vec<String>,
    pub mac: Option<String>,
}

/// Datacenter-scoped provider API
#[async_trait]
pub trait DatacenterApi: Send + Sync {
    async fn create_server(&self, request: &ServerRequest) -> CloudResult<Accepted>;

    async fn request_status(&self, request_id: &str) -> CloudResult<RequestStatus>;

    /// Provisioning state of a server: `AVAILABLE`, `BUSY`, `INACTIVE`, ...
    async fn server_state(&self, server_id: &str) -> CloudResult<String>;

    async fn list_volumes(&self, server_id: &str) -> CloudResult<Vec<Volume>>;

    async fn list_nics(&self, server_id: &str) -> CloudResult<Vec<Nic>>;

    async fn start_server(&self, server_id: &str) -> CloudResult<()>;

    async fn stop_server(&self, server_id: &str) -> CloudResult<()>;

    async fn delete_server(&self, server_id: &str) -> CloudResult<()>;

    async fn delete_volume(&self, volume_id: &str) -> CloudResult<()>;

    async fn delete_nic(&self, server_id: &str, nic_id: &str) -> CloudResult<()>;

    async fn set_boot_volume(&self, server_id: &str, volume_id: &str) -> CloudResult<()>;
}
