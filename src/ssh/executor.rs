//! Command runner seam
//!
//! The request handler talks to a [`CommandRunner`]; [`SshExecutor`] is the
//! production implementation that goes over the network.

use async_trait::async_trait;
use tracing::debug;

use super::command::CommandOutput;
use super::config::SshTarget;
use super::connection::{parse_private_key, SshConnection};
use crate::error::Result;

/// Runs one command against one target
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` on `target`, returning its output on success
    async fn run(&self, target: &SshTarget, command: &str) -> Result<CommandOutput>;
}

/// Runs commands over a fresh SSH connection per call
#[derive(Debug, Clone, Copy, Default)]
pub struct SshExecutor;

impl SshExecutor {
    /// Create a new SSH executor
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SshExecutor {
    async fn run(&self, target: &SshTarget, command: &str) -> Result<CommandOutput> {
        let key = parse_private_key(&target.private_key)?;
        debug!("Private key parsed ({})", key.algorithm().as_str());

        let connection = SshConnection::connect(target, key).await?;
        let result = connection.exec_command(command).await;
        connection.close().await;

        result
    }
}
