//! # Remote Execution
//!
//! Shell commands on source and target hosts, and the quoting helpers used to
//! build them.

pub mod errors;
pub mod executor;
pub mod shell;
pub mod ssh;

pub use errors::{RemoteError, RemoteResult};
pub use executor::{ExecOptions, RemoteExecutor};
pub use shell::{render_template, shell_quote, Template};
pub use ssh::SshExecutor;
