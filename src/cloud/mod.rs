//! # Cloud Resource Lifecycle
//!
//! Provisioning and teardown of target VMs behind one closed [`CloudAdapter`]
//! enum. Provider operations are asynchronous on the provider side; the
//! adapter waits for them with the bounded [`poll`] primitive.

pub mod adapter;
pub mod errors;
pub mod polling;
pub mod profitbricks;

pub use adapter::{CloudAdapter, CloudProvider, NicSpec, TargetSpec};
pub use errors::{CloudError, CloudResult};
pub use polling::{poll, PollPolicy};
pub use profitbricks::{DatacenterApi, RestDatacenterApi};
