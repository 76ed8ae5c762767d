//! Device identification and source path resolution

mod common;

use common::builders::{data_disk, devices, empty_disk, root_disk, DiskBuilder};
use migrator_core::mapping::{natural_cmp, DeviceMapping, MappingError, MountpointMap};
use migrator_core::models::BlockDevice;
use std::cmp::Ordering;
use std::collections::BTreeMap;

fn bootstrap_disk() -> BlockDevice {
    DiskBuilder::new("vda", 10)
        .partition("vda1", 10, "ext4", "b007-b007", Some("/"))
        .build()
}

fn source_devices() -> BTreeMap<String, BlockDevice> {
    devices(vec![root_disk("vda"), data_disk("vdc")])
}

fn target_devices() -> BTreeMap<String, BlockDevice> {
    devices(vec![
        bootstrap_disk(),
        empty_disk("vdb", 10),
        empty_disk("vdc", 10),
        empty_disk("vdd", 10),
        empty_disk("vde", 10),
    ])
}

#[test]
fn test_disks_take_the_first_free_target_in_order() {
    let mapping = DeviceMapping::identify(&source_devices(), &target_devices()).unwrap();

    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping.get("vda").unwrap().id, "vdb");
    assert_eq!(mapping.get("vdc").unwrap().id, "vdc");
    assert!(mapping.iter().all(|(_, disk)| disk.id != "vdd" && disk.id != "vde"));

    assert_eq!(
        mapping.renames(),
        vec![
            ("vda", "vdb"),
            ("vda1", "vdb1"),
            ("vda2", "vdb2"),
            ("vdc", "vdc"),
            ("vdc1", "vdc1"),
            ("vdc2", "vdc2"),
        ]
    );
}

#[test]
fn test_mounted_partitions_get_synthetic_mountpoints() {
    let mapping = DeviceMapping::identify(&source_devices(), &target_devices()).unwrap();

    let root = mapping.target_device("vda1").unwrap();
    let swap = mapping.target_device("vda2").unwrap();
    let srv = mapping.target_device("vdc1").unwrap();
    let log = mapping.target_device("vdc2").unwrap();

    assert!(root.mountpoint.starts_with("/mnt/"));
    assert!(srv.mountpoint.starts_with("/mnt/"));
    assert!(log.mountpoint.starts_with("/mnt/"));
    assert!(!swap.has_mountpoint());
    assert!(!mapping.get("vda").unwrap().has_mountpoint());

    let mut names = vec![&root.mountpoint, &srv.mountpoint, &log.mountpoint];
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 3);
}

#[test]
fn test_identification_is_deterministic() {
    let first = DeviceMapping::identify(&source_devices(), &target_devices()).unwrap();
    let second = DeviceMapping::identify(&source_devices(), &target_devices()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_too_few_targets_reports_every_unplaced_disk() {
    let targets = devices(vec![bootstrap_disk(), empty_disk("vdb", 10)]);

    let error = DeviceMapping::identify(&source_devices(), &targets).unwrap_err();

    match error {
        MappingError::Unidentified { failures } => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].starts_with("vdc:"), "{failures:?}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_size_class_must_match() {
    let targets = devices(vec![empty_disk("vdb", 20), empty_disk("vdc", 10)]);
    let sources = devices(vec![root_disk("vda")]);

    let mapping = DeviceMapping::identify(&sources, &targets).unwrap();
    assert_eq!(mapping.get("vda").unwrap().id, "vdc");

    let oversized = devices(vec![empty_disk("vdb", 20)]);
    assert!(matches!(
        DeviceMapping::identify(&sources, &oversized),
        Err(MappingError::Unidentified { .. })
    ));
}

#[test]
fn test_nvme_partitions_use_separator() {
    let sources = devices(vec![DiskBuilder::new("nvme0n1", 10)
        .partition("nvme0n1p1", 1, "vfat", "EF00-0001", Some("/boot/efi"))
        .partition("nvme0n1p2", 9, "ext4", "a1b2-root", Some("/"))
        .build()]);
    let targets = devices(vec![empty_disk("nvme1n1", 10)]);

    let mapping = DeviceMapping::identify(&sources, &targets).unwrap();

    assert_eq!(mapping.target_device("nvme0n1p1").unwrap().id, "nvme1n1p1");
    assert_eq!(mapping.target_device("nvme0n1p2").unwrap().id, "nvme1n1p2");
}

#[test]
fn test_natural_device_order() {
    assert_eq!(natural_cmp("sd2", "sd10"), Ordering::Less);
    assert_eq!(natural_cmp("vdb", "vda"), Ordering::Greater);
    assert_eq!(natural_cmp("xvd3", "xvd3"), Ordering::Equal);

    let sources = devices(vec![root_disk("sda")]);
    let targets = devices(vec![empty_disk("xvd10", 10), empty_disk("xvd2", 10)]);
    let mapping = DeviceMapping::identify(&sources, &targets).unwrap();
    assert_eq!(mapping.get("sda").unwrap().id, "xvd2");
}

#[test]
fn test_source_paths_resolve_through_longest_mountpoint() {
    let sources = source_devices();
    let mapping = DeviceMapping::identify(&sources, &target_devices()).unwrap();
    let mounts = MountpointMap::build(&sources, &mapping).unwrap();

    let root = mounts.root().unwrap();
    assert_eq!(root.target_device, "vdb1");
    assert_eq!(root.target_disk, "vdb");
    assert_eq!(mounts.boot_device(), Some(root));
    assert_eq!(mounts.entries()[0].source_mountpoint, "/");
    assert_eq!(mounts.entries().len(), 3);

    let log = mounts.device_for_mountpoint("/var/log").unwrap();
    assert_eq!(log.uuid.as_deref(), Some("77aa-log"));
    assert_eq!(
        mounts.resolve("/var/log/syslog").unwrap(),
        format!("{}/syslog", log.target_mountpoint)
    );
    assert_eq!(
        mounts.resolve("/etc/fstab").unwrap(),
        format!("{}/etc/fstab", root.target_mountpoint)
    );
    assert_eq!(
        mounts.resolve("/variable").unwrap(),
        format!("{}/variable", root.target_mountpoint)
    );
    assert!(mounts.resolve("etc/fstab").is_err());
}
