//! Property-based tests for device identification, mount naming and lifecycle walking

mod common;

use async_trait::async_trait;
use common::strategies::{source_layout_strategy, target_pool_strategy};
use migrator_core::mapping::{target_mountpoint, DeviceMapping, MountpointMap};
use migrator_core::models::SourceStatus;
use migrator_core::state_machine::{
    Command, CommandResult, CommandTable, Commander, ExecutionOutcome, Signal, StatefulEntity,
    StatusLifecycle, StepErrors,
};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn identification_pairs_every_disk_with_a_distinct_same_size_target(
        (sources, targets) in source_layout_strategy().prop_flat_map(target_pool_strategy)
    ) {
        let mapping = DeviceMapping::identify(&sources, &targets).unwrap();
        prop_assert_eq!(mapping.len(), sources.len());

        let mut used = HashSet::new();
        for (source_name, mapped) in mapping.iter() {
            prop_assert!(used.insert(mapped.id.clone()), "{} assigned twice", mapped.id);
            prop_assert_eq!(sources[source_name].size_gib(), targets[&mapped.id].size_gib());
            prop_assert_eq!(mapped.children.len(), sources[source_name].children.len());
        }

        let again = DeviceMapping::identify(&sources, &targets).unwrap();
        prop_assert_eq!(again, mapping);
    }

    #[test]
    fn every_mapped_mountpoint_resolves_inside_its_target_directory(
        (sources, targets) in source_layout_strategy().prop_flat_map(target_pool_strategy),
        file in "[a-z]{1,8}",
    ) {
        let mapping = DeviceMapping::identify(&sources, &targets).unwrap();
        let mounts = MountpointMap::build(&sources, &mapping).unwrap();

        for entry in mounts.entries() {
            let resolved = mounts
                .resolve(&format!("{}/{file}", entry.source_mountpoint))
                .unwrap();
            prop_assert_eq!(resolved, format!("{}/{file}", entry.target_mountpoint));
        }
    }

    #[test]
    fn mountpoint_names_are_stable_and_distinct(
        a in "(/[a-z0-9]{1,6}){1,4}",
        b in "(/[a-z0-9]{1,6}){1,4}",
    ) {
        let name_a = target_mountpoint(Some(&a), false);
        prop_assert!(name_a.starts_with("/mnt/"));
        prop_assert_eq!(&name_a, &target_mountpoint(Some(&a), false));
        prop_assert_eq!(target_mountpoint(Some(&a), true), "");
        if a != b {
            prop_assert_ne!(name_a, target_mountpoint(Some(&b), false));
        }
    }

    #[test]
    fn offsets_agree_with_positions(from in 0usize..18, to in 0usize..18) {
        let lifecycle = SourceStatus::lifecycle().unwrap();
        let offset = to as isize - from as isize;
        let status = lifecycle
            .by_offset(&SourceStatus::ALL[from], offset)
            .unwrap();
        prop_assert_eq!(status, SourceStatus::ALL[to]);
        prop_assert_eq!(
            lifecycle.has_reached(&SourceStatus::ALL[to], &SourceStatus::ALL[from]).unwrap(),
            to >= from
        );
    }

    #[test]
    fn commander_pauses_where_asked_and_resumes_to_the_end(
        length in 2usize..10,
        pause_seed in any::<usize>(),
    ) {
        let pause_at = pause_seed % (length - 1);
        let lifecycle = StatusLifecycle::new(0..length).unwrap();
        let table = CommandTable::new().with(pause_at, Arc::new(PauseHere) as Arc<dyn Command<Counter>>);
        let commander = Commander::new(lifecycle, table).unwrap();
        let mut counter = Counter {
            status: 0,
            paused: false,
        };

        let paused = tokio_test::block_on(commander.execute(&mut counter)).unwrap();
        prop_assert_eq!(paused, ExecutionOutcome::Paused(pause_at));
        let again = tokio_test::block_on(commander.execute(&mut counter)).unwrap();
        prop_assert_eq!(again, ExecutionOutcome::Paused(pause_at));

        let completed =
            tokio_test::block_on(commander.increment_status_and_execute(&mut counter)).unwrap();
        prop_assert_eq!(completed, ExecutionOutcome::Completed(length - 1));
    }
}

#[derive(Debug)]
struct Counter {
    status: usize,
    paused: bool,
}

impl StatefulEntity for Counter {
    type Status = usize;

    fn status(&self) -> &usize {
        &self.status
    }

    fn set_status(&mut self, status: usize) {
        self.status = status;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn label(&self) -> String {
        format!("counter@{}", self.status)
    }
}

struct PauseHere;

#[async_trait]
impl Command<Counter> for PauseHere {
    fn name(&self) -> &'static str {
        "PauseHere"
    }

    async fn run(&self, _counter: &mut Counter, _errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        Ok(Some(Signal::Sleep))
    }
}
