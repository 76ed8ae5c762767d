//! Proptest strategies for disk layouts

#![allow(dead_code)]

use super::builders::{devices, empty_disk, DiskBuilder};
use migrator_core::models::BlockDevice;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Source disks `vda`, `vdb`, ... with 1-3 GiB sizes and 0-2 partitions each
pub fn source_layout_strategy() -> impl Strategy<Value = BTreeMap<String, BlockDevice>> {
    prop::collection::vec((1u64..=3, 0usize..=2), 1..6).prop_map(|disks| {
        devices(
            disks
                .into_iter()
                .enumerate()
                .map(|(index, (size_gib, partitions))| {
                    let name = format!("vd{}", char::from(b'a' + index as u8));
                    (0..partitions)
                        .fold(DiskBuilder::new(&name, size_gib), |disk, partition| {
                            let partition_name = format!("{name}{}", partition + 1);
                            let mountpoint = format!("/{partition_name}");
                            disk.partition(&partition_name, 0, "ext4", &partition_name, Some(&mountpoint))
                        })
                        .build()
                })
                .collect(),
        )
    })
}

/// Unallocated target disks covering every source size, in shuffled order, plus spares
pub fn target_pool_strategy(
    sources: BTreeMap<String, BlockDevice>,
) -> impl Strategy<Value = (BTreeMap<String, BlockDevice>, BTreeMap<String, BlockDevice>)> {
    let sizes: Vec<u64> = sources.values().map(BlockDevice::size_gib).collect();
    (Just(sizes).prop_shuffle(), prop::collection::vec(1u64..=3, 0..3)).prop_map(
        move |(sizes, spares)| {
            let targets = sizes
                .into_iter()
                .chain(spares)
                .enumerate()
                .map(|(index, size_gib)| empty_disk(&format!("xvd{index}"), size_gib))
                .collect();
            (sources.clone(), devices(targets))
        },
    )
}
