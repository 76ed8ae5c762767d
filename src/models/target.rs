use super::blueprint::Blueprint;
use super::remote_host::RemoteHost;
use crate::mapping::{DeviceMapping, MappingError, MappingResult};
use serde::{Deserialize, Serialize};

/// The cloud VM a source is migrated into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub blueprint: Blueprint,
    #[serde(default)]
    device_mapping: Option<DeviceMapping>,
    /// Absent until the VM is provisioned
    #[serde(default)]
    pub remote_host: Option<RemoteHost>,
}

impl Target {
    pub fn new(blueprint: Blueprint) -> Self {
        Self {
            blueprint,
            device_mapping: None,
            remote_host: None,
        }
    }

    pub fn device_mapping(&self) -> Option<&DeviceMapping> {
        self.device_mapping.as_ref()
    }

    /// Mapping computed by device identification; missing means identification has not run
    pub fn require_device_mapping(&self) -> MappingResult<&DeviceMapping> {
        self.device_mapping.as_ref().ok_or(MappingError::NotIdentified)
    }

    /// Store the device mapping. It is written once and never recomputed.
    pub fn record_device_mapping(&mut self, mapping: DeviceMapping) -> MappingResult<()> {
        if self.device_mapping.is_some() {
            return Err(MappingError::AlreadyIdentified);
        }
        self.device_mapping = Some(mapping);
        Ok(())
    }

    pub fn is_provisioned(&self) -> bool {
        self.remote_host
            .as_ref()
            .is_some_and(|host| host.cloud_metadata.is_some())
    }
}
