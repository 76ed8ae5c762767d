//! Inventory collection from a live host: disks, network and sizing.

use crate::models::{BlockDevice, Hardware, NetworkInterface, RemoteHost, SystemInfo};
use crate::remote::{ExecOptions, RemoteExecutor};
use crate::state_machine::{CommandError, CommandResult, StepErrors};
use serde::Deserialize;
use std::collections::BTreeMap;

const IP_ADDR_COMMAND: &str = "ip -json addr show";
const IP_ROUTE_COMMAND: &str = "ip -json route show default";
const HARDWARE_COMMAND: &str = "nproc && awk '/^MemTotal:/ {print $2}' /proc/meminfo";

#[derive(Debug, Deserialize)]
struct IpInterface {
    ifname: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    addr_info: Vec<IpAddress>,
}

#[derive(Debug, Deserialize)]
struct IpAddress {
    family: String,
    local: String,
    prefixlen: u8,
}

#[derive(Debug, Deserialize)]
struct IpRoute {
    #[serde(default)]
    gateway: Option<String>,
    #[serde(default)]
    dev: Option<String>,
}

/// Parse `ip -json addr` and `ip -json route show default`; loopback is dropped
pub fn network_from_ip_json(
    addr_json: &str,
    route_json: &str,
) -> Result<BTreeMap<String, NetworkInterface>, serde_json::Error> {
    let interfaces: Vec<IpInterface> = serde_json::from_str(addr_json)?;
    let routes: Vec<IpRoute> = if route_json.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(route_json)?
    };

    Ok(interfaces
        .into_iter()
        .filter(|interface| interface.ifname != "lo")
        .map(|interface| {
            let gateway = routes
                .iter()
                .find(|route| route.dev.as_deref() == Some(interface.ifname.as_str()))
                .and_then(|route| route.gateway.clone());
            let ips = interface
                .addr_info
                .iter()
                .filter(|address| address.family == "inet" || address.family == "inet6")
                .map(|address| format!("{}/{}", address.local, address.prefixlen))
                .collect();
            (
                interface.ifname.clone(),
                NetworkInterface {
                    name: interface.ifname,
                    mac: interface.address,
                    ips,
                    gateway,
                },
            )
        })
        .collect())
}

/// Parse `nproc` followed by the MemTotal value in KiB
pub fn hardware_from_output(output: &str) -> Option<Hardware> {
    let mut lines = output.lines().map(str::trim).filter(|line| !line.is_empty());
    let cores = lines.next()?.parse().ok()?;
    let mem_kib: u64 = lines.next()?.parse().ok()?;
    Some(Hardware {
        cores,
        ram_mib: mem_kib / 1024,
    })
}

/// Collect a full inventory of `host`.
///
/// Disks are required; network and hardware failures are recorded in `errors`.
pub async fn collect_system_info(
    executor: &dyn RemoteExecutor,
    host: &RemoteHost,
    list_block_devices: &str,
    errors: &mut StepErrors,
) -> CommandResult<SystemInfo> {
    let lsblk = executor.run(host, list_block_devices).await?;
    let block_devices: BTreeMap<String, BlockDevice> = SystemInfo::block_devices_from_lsblk(&lsblk)
        .map_err(|e| CommandError::precondition("collect inventory", format!("unreadable lsblk output: {e}")))?;

    let mut info = SystemInfo {
        block_devices,
        ..SystemInfo::default()
    };

    let addresses = errors.capture("ip addr", executor.run(host, IP_ADDR_COMMAND).await);
    // A host without a default route exits non-zero; only transport failures count
    let routes = errors
        .capture(
            "ip route",
            executor
                .execute(host, IP_ROUTE_COMMAND, ExecOptions::lenient())
                .await,
        )
        .unwrap_or_default();
    if let Some(addresses) = addresses {
        if let Some(network) = errors.capture("parse ip addr", network_from_ip_json(&addresses, &routes)) {
            info.network = network;
        }
    }

    if let Some(output) = errors.capture("hardware", executor.run(host, HARDWARE_COMMAND).await) {
        match hardware_from_output(&output) {
            Some(hardware) => info.hardware = hardware,
            None => errors.record("parse hardware", format!("unexpected output: {output:?}")),
        }
    }

    Ok(info)
}
