//! SSH execution module
//!
//! This module opens a single-use SSH connection authenticated with a private
//! key, runs one command, and releases the connection.

pub mod command;
pub mod config;
pub mod connection;
pub mod executor;
pub mod handler;

// Re-exports
pub use command::CommandOutput;
pub use config::{split_host_port, SshTarget};
pub use connection::{parse_private_key, SshConnection};
pub use executor::{CommandRunner, SshExecutor};
pub use handler::SshHandler;
