//! SSH client handler implementation
//!
//! Implements the `russh::client::Handler` trait to handle SSH connection events.

use russh::keys::HashAlg;
use tracing::debug;

/// SSH client handler for russh
///
/// Accepts every server host key. The function dials hosts it has never seen
/// and has no known_hosts store, so the key fingerprint is only logged.
#[derive(Debug, Clone, Default)]
pub struct SshHandler {
    host: String,
}

impl SshHandler {
    /// Create a new SSH handler for the given host
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl russh::client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!(
            "Accepting host key for {}: {} {}",
            self.host,
            server_public_key.algorithm().as_str(),
            server_public_key.fingerprint(HashAlg::Sha256)
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_creation() {
        let handler = SshHandler::new("10.0.0.1");
        assert!(format!("{:?}", handler).contains("10.0.0.1"));
    }

    #[test]
    fn test_handler_default() {
        let handler: SshHandler = Default::default();
        assert!(format!("{:?}", handler).contains("SshHandler"));
    }
}
