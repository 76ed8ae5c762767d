//! In-memory datacenter API

use async_trait::async_trait;
use migrator_core::cloud::profitbricks::{Accepted, Nic, RequestStatus, ServerRequest, Volume};
use migrator_core::cloud::{CloudError, CloudResult, DatacenterApi};
use parking_lot::Mutex;
use std::sync::Arc;

pub const SERVER_ID: &str = "srv-1";
pub const REQUEST_ID: &str = "req-1";

#[derive(Debug, Clone)]
pub struct FakeDatacenterState {
    /// Status reported for the creation request
    pub request_status: String,
    pub server_state: String,
    /// State the server settles in once `busy_polls` state reads have passed
    pub pending_state: Option<String>,
    /// State reads that report `BUSY` after each power or boot change
    pub transition_polls: usize,
    busy_polls: usize,
    /// Number of `server_state` reads
    pub state_reads: usize,
    pub created: Option<ServerRequest>,
    pub volumes: Vec<Volume>,
    pub nics: Vec<Nic>,
    /// Every mutating call, e.g. `delete_volume vol-0`
    pub calls: Vec<String>,
}

impl Default for FakeDatacenterState {
    fn default() -> Self {
        Self {
            request_status: "DONE".to_string(),
            server_state: "AVAILABLE".to_string(),
            pending_state: None,
            transition_polls: 0,
            busy_polls: 0,
            state_reads: 0,
            created: None,
            volumes: Vec::new(),
            nics: Vec::new(),
            calls: Vec::new(),
        }
    }
}

/// Volumes get ids `vol-<n>` and device numbers in request order. The bootstrap
/// NIC is addressed `10.9.0.5`, NIC `n` without fixed addresses `192.168.7.<n + 19>`
#[derive(Debug, Clone, Default)]
pub struct FakeDatacenter {
    pub state: Arc<Mutex<FakeDatacenterState>>,
}

impl FakeDatacenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creation request that never leaves `RUNNING`
    pub fn never_done() -> Self {
        let datacenter = Self::default();
        datacenter.state.lock().request_status = "RUNNING".to_string();
        datacenter
    }

    pub fn failing_request() -> Self {
        let datacenter = Self::default();
        datacenter.state.lock().request_status = "FAILED".to_string();
        datacenter
    }

    /// Power and boot changes report `BUSY` for `polls` state reads before settling
    pub fn slow(polls: usize) -> Self {
        let datacenter = Self::default();
        datacenter.state.lock().transition_polls = polls;
        datacenter
    }

    /// Power and boot changes never settle
    pub fn stuck() -> Self {
        Self::slow(usize::MAX)
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().calls.push(call);
    }

    fn begin_transition(&self, call: String, settled: Option<&str>) {
        let mut state = self.state.lock();
        state.calls.push(call);
        let settled = match settled {
            Some(settled) => settled.to_string(),
            None => match state.pending_state.take() {
                Some(pending) => pending,
                None => state.server_state.clone(),
            },
        };
        state.pending_state = Some(settled);
        state.busy_polls = state.transition_polls;
        state.server_state = "BUSY".to_string();
    }
}

fn nic_address(index: usize) -> String {
    match index {
        0 => "10.9.0.5".to_string(),
        n => format!("192.168.7.{}", n + 19),
    }
}

#[async_trait]
impl DatacenterApi for FakeDatacenter {
    async fn create_server(&self, request: &ServerRequest) -> CloudResult<Accepted> {
        let mut state = self.state.lock();
        state.volumes = request
            .volumes
            .iter()
            .enumerate()
            .map(|(index, volume)| Volume {
                id: format!("vol-{index}"),
                name: volume.name.clone(),
                size_gib: volume.size_gib,
                device_number: Some(index as u32 + 1),
            })
            .collect();
        state.nics = request
            .nics
            .iter()
            .enumerate()
            .map(|(index, nic)| Nic {
                id: format!("nic-{index}"),
                name: nic.name.clone(),
                lan: nic.lan,
                ips: if nic.ips.is_empty() {
                    vec![nic_address(index)]
                } else {
                    nic.ips.clone()
                },
                mac: Some(format!("02:01:de:ad:be:{index:02x}")),
            })
            .collect();
        state.created = Some(request.clone());
        state.calls.push(format!("create_server {}", request.name));
        Ok(Accepted {
            id: SERVER_ID.to_string(),
            request_id: REQUEST_ID.to_string(),
        })
    }

    async fn request_status(&self, _request_id: &str) -> CloudResult<RequestStatus> {
        Ok(RequestStatus {
            status: self.state.lock().request_status.clone(),
            message: Some("scripted".to_string()),
        })
    }

    async fn server_state(&self, _server_id: &str) -> CloudResult<String> {
        let mut state = self.state.lock();
        state.state_reads += 1;
        if state.busy_polls > 0 {
            state.busy_polls -= 1;
        } else if let Some(settled) = state.pending_state.take() {
            state.server_state = settled;
        }
        Ok(state.server_state.clone())
    }

    async fn list_volumes(&self, _server_id: &str) -> CloudResult<Vec<Volume>> {
        Ok(self.state.lock().volumes.clone())
    }

    async fn list_nics(&self, _server_id: &str) -> CloudResult<Vec<Nic>> {
        Ok(self.state.lock().nics.clone())
    }

    async fn start_server(&self, server_id: &str) -> CloudResult<()> {
        self.begin_transition(format!("start_server {server_id}"), Some("AVAILABLE"));
        Ok(())
    }

    async fn stop_server(&self, server_id: &str) -> CloudResult<()> {
        self.begin_transition(format!("stop_server {server_id}"), Some("INACTIVE"));
        Ok(())
    }

    async fn delete_server(&self, server_id: &str) -> CloudResult<()> {
        self.record(format!("delete_server {server_id}"));
        Ok(())
    }

    async fn delete_volume(&self, volume_id: &str) -> CloudResult<()> {
        let mut state = self.state.lock();
        if !state.volumes.iter().any(|volume| volume.id == volume_id) {
            return Err(CloudError::Api {
                status: 404,
                message: format!("volume {volume_id} not found"),
            });
        }
        state.volumes.retain(|volume| volume.id != volume_id);
        state.calls.push(format!("delete_volume {volume_id}"));
        Ok(())
    }

    async fn delete_nic(&self, server_id: &str, nic_id: &str) -> CloudResult<()> {
        let mut state = self.state.lock();
        state.nics.retain(|nic| nic.id != nic_id);
        state.calls.push(format!("delete_nic {server_id} {nic_id}"));
        Ok(())
    }

    async fn set_boot_volume(&self, server_id: &str, volume_id: &str) -> CloudResult<()> {
        self.begin_transition(format!("set_boot_volume {server_id} {volume_id}"), None);
        Ok(())
    }
}
