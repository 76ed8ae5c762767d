//! Test doubles for the remote executor and the provider API

#![allow(dead_code)]

pub mod datacenter;
pub mod executor;

pub use datacenter::{FakeDatacenter, FakeDatacenterState};
pub use executor::{ExecutedCommand, ScriptedExecutor};
