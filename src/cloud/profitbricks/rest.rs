//! REST implementation of [`DatacenterApi`] for the ProfitBricks cloud API (v4).

use super::api::{Accepted, DatacenterApi, Nic, NicRequest, RequestStatus, ServerRequest, Volume, VolumeRequest};
use crate::cloud::errors::{CloudError, CloudResult};
use crate::config::CloudConfig;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct RestDatacenterApi {
    client: Client,
    endpoint: String,
    datacenter_id: String,
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct Entity<P> {
    id: String,
    #[serde(default)]
    metadata: Option<Metadata>,
    properties: P,
}

#[derive(Debug, Deserialize)]
struct Collection<P> {
    #[serde(default = "Vec::new")]
    items: Vec<Entity<P>>,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeProperties {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: f64,
    #[serde(default)]
    device_number: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct NicProperties {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    lan: u32,
    #[serde(default)]
    ips: Vec<String>,
    #[serde(default)]
    mac: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerProperties {}

impl RestDatacenterApi {
    pub fn new(config: &CloudConfig) -> CloudResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(format!("migrator-core-rs/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                CloudError::InvalidCloudSettings(format!("Failed to create HTTP client: {e}"))
            })?;

        info!(
            endpoint = %config.endpoint,
            datacenter_id = %config.datacenter_id,
            "Created datacenter API client"
        );

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            datacenter_id: config.datacenter_id.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn datacenter_url(&self, path: &str) -> String {
        format!("{}/datacenters/{}{}", self.endpoint, self.datacenter_id, path)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    async fn send(&self, builder: RequestBuilder, operation: &str) -> CloudResult<Response> {
        let response = builder.send().await?;
        if response.status().is_success() {
            debug!(operation = operation, status = %response.status(), "Datacenter API request succeeded");
            return Ok(response);
        }

        let status = response.status();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!(status = %status, error = %message, "Failed operation: {}", operation);
        Err(CloudError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, url: String, operation: &str) -> CloudResult<T> {
        let response = self.send(self.request(Method::GET, url), operation).await?;
        Ok(response.json::<T>().await?)
    }
}

fn volume_body(volume: &VolumeRequest) -> Value {
    let mut properties = json!({
        "name": volume.name,
        "size": volume.size_gib,
        "type": "HDD",
    });
    match &volume.image {
        Some(image) => {
            properties["image"] = json!(image);
            if !volume.ssh_keys.is_empty() {
                properties["sshKeys"] = json!(volume.ssh_keys);
            }
        }
        None => properties["licenceType"] = json!("OTHER"),
    }
    json!({ "properties": properties })
}

fn nic_body(nic: &NicRequest) -> Value {
    let mut properties = json!({ "name": nic.name, "lan": nic.lan });
    if !nic.ips.is_empty() {
        properties["ips"] = json!(nic.ips);
    }
    json!({ "properties": properties })
}

pub(crate) fn server_body(request: &ServerRequest) -> Value {
    json!({
        "properties": {
            "name": request.name,
            "cores": request.cores,
            "ram": request.ram_mib,
        },
        "entities": {
            "volumes": { "items": request.volumes.iter().map(volume_body).collect::<Vec<_>>() },
            "nics": { "items": request.nics.iter().map(nic_body).collect::<Vec<_>>() },
        }
    })
}

/// Request id from a `Location: .../requests/<id>/status` header
pub(crate) fn request_id_from_location(location: &str) -> Option<String> {
    let mut segments = location.split('/');
    segments.find(|segment| *segment == "requests")?;
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl DatacenterApi for RestDatacenterApi {
    async fn create_server(&self, request: &ServerRequest) -> CloudResult<Accepted> {
        let builder = self
            .request(Method::POST, self.datacenter_url("/servers"))
            .json(&server_body(request));
        let response = self.send(builder, "create server").await?;

        let request_id = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(request_id_from_location)
            .ok_or_else(|| CloudError::invalid_response("Location", "missing request status link"))?;
        let server: Entity<ServerProperties> = response.json().await?;

        Ok(Accepted {
            id: server.id,
            request_id,
        })
    }

    async fn request_status(&self, request_id: &str) -> CloudResult<RequestStatus> {
        let url = format!("{}/requests/{}/status", self.endpoint, request_id);
        let response: StatusResponse = self.fetch(url, "request status").await?;
        let status = response
            .metadata
            .status
            .ok_or_else(|| CloudError::invalid_response("metadata.status", "missing"))?;
        Ok(RequestStatus {
            status,
            message: response.metadata.message,
        })
    }

    async fn server_state(&self, server_id: &str) -> CloudResult<String> {
        let url = self.datacenter_url(&format!("/servers/{server_id}"));
        let server: Entity<ServerProperties> = self.fetch(url, "server state").await?;
        server
            .metadata
            .and_then(|metadata| metadata.state)
            .ok_or_else(|| CloudError::invalid_response("metadata.state", "missing"))
    }

    async fn list_volumes(&self, server_id: &str) -> CloudResult<Vec<Volume>> {
        let url = self.datacenter_url(&format!("/servers/{server_id}/volumes?depth=1"));
        let volumes: Collection<VolumeProperties> = self.fetch(url, "list volumes").await?;
        Ok(volumes
            .items
            .into_iter()
            .map(|volume| Volume {
                id: volume.id,
                name: volume.properties.name.unwrap_or_default(),
                size_gib: volume.properties.size.ceil() as u64,
                device_number: volume.properties.device_number,
            })
            .collect())
    }

    async fn list_nics(&self, server_id: &str) -> CloudResult<Vec<Nic>> {
        let url = self.datacenter_url(&format!("/servers/{server_id}/nics?depth=1"));
        let nics: Collection<NicProperties> = self.fetch(url, "list nics").await?;
        Ok(nics
            .items
            .into_iter()
            .map(|nic| Nic {
                id: nic.id,
                name: nic.properties.name.unwrap_or_default(),
                lan: nic.properties.lan,
                ips: nic.properties.ips,
                mac: nic.properties.mac,
            })
            .collect())
    }

    async fn start_server(&self, server_id: &str) -> CloudResult<()> {
        let url = self.datacenter_url(&format!("/servers/{server_id}/start"));
        self.send(self.request(Method::POST, url), "start server").await?;
        Ok(())
    }

    async fn stop_server(&self, server_id: &str) -> CloudResult<()> {
        let url = self.datacenter_url(&format!("/servers/{server_id}/stop"));
        self.send(self.request(Method::POST, url), "stop server").await?;
        Ok(())
    }

    async fn delete_server(&self, server_id: &str) -> CloudResult<()> {
        let url = self.datacenter_url(&format!("/servers/{server_id}"));
        self.send(self.request(Method::DELETE, url), "delete server").await?;
        Ok(())
    }

    async fn delete_volume(&self, volume_id: &str) -> CloudResult<()> {
        let url = self.datacenter_url(&format!("/volumes/{volume_id}"));
        self.send(self.request(Method::DELETE, url), "delete volume").await?;
        Ok(())
    }

    async fn delete_nic(&self, server_id: &str, nic_id: &str) -> CloudResult<()> {
        let url = self.datacenter_url(&format!("/servers/{server_id}/nics/{nic_id}"));
        self.send(self.request(Method::DELETE, url), "delete nic").await?;
        Ok(())
    }

    async fn set_boot_volume(&self, server_id: &str, volume_id: &str) -> CloudResult<()> {
        let url = self.datacenter_url(&format!("/servers/{server_id}"));
        let builder = self
            .request(Method::PATCH, url)
            .json(&json!({ "bootVolume": { "id": volume_id } }));
        self.send(builder, "set boot volume").await?;
        Ok(())
    }
}
