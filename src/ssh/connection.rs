//! SSH Connection
//!
//! A single-use SSH connection: dial, authenticate with a private key, open
//! one session channel, disconnect. Nothing is pooled or reused across calls.

use std::sync::Arc;

use russh::client::{self, Handle};
use russh::keys::{PrivateKey, PrivateKeyWithHashAlg};
use russh::{Channel, Disconnect};
use tracing::{debug, error, info, warn};

use super::config::SshTarget;
use super::handler::SshHandler;
use crate::error::{Result, SshLambdaError};

/// Parse private key material (OpenSSH, PKCS#1 or PKCS#8 PEM)
pub fn parse_private_key(key_content: &str) -> Result<PrivateKey> {
    russh::keys::decode_secret_key(key_content.trim(), None).map_err(|e| {
        error!("Failed to parse private key: {}", e);
        SshLambdaError::key_parse(e.to_string())
    })
}

/// An authenticated SSH connection to one target
pub struct SshConnection {
    /// Active SSH session handle
    session: Handle<SshHandler>,

    /// `user@host:port`, for log lines
    label: String,
}

impl SshConnection {
    /// Dial the target and authenticate with `key` as the only method
    ///
    /// Host key verification is disabled (see [`SshHandler`]).
    pub async fn connect(target: &SshTarget, key: PrivateKey) -> Result<Self> {
        let label = format!("{}@{}:{}", target.username, target.host, target.port);
        info!("Connecting to SSH server {}...", label);

        let ssh_config = Arc::new(client::Config::default());

        let session = client::connect(
            ssh_config,
            target.addr(),
            SshHandler::new(target.host.clone()),
        )
        .await
        .map_err(|e| {
            error!("SSH connection failed: {}", e);
            SshLambdaError::connection(e.to_string())
        })?;

        let mut connection = Self { session, label };

        // Release the transport if authentication does not go through
        if let Err(e) = connection.authenticate(&target.username, key).await {
            connection.close().await;
            return Err(e);
        }

        info!("Successfully connected to {}", connection.label);
        Ok(connection)
    }

    /// Authenticate with the SSH server using public key auth
    async fn authenticate(&mut self, username: &str, key: PrivateKey) -> Result<()> {
        debug!(
            "Attempting key authentication for user '{}' ({})",
            username,
            key.algorithm().as_str()
        );

        // RSA keys need the strongest SHA-2 variant the server advertises
        let hash_alg = self
            .session
            .best_supported_rsa_hash()
            .await
            .map_err(|e| SshLambdaError::connection(e.to_string()))?
            .flatten();

        let key_with_alg = PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg);

        let auth_result = self
            .session
            .authenticate_publickey(username, key_with_alg)
            .await
            .map_err(|e| SshLambdaError::connection(e.to_string()))?;

        if auth_result.success() {
            info!("Key authentication successful");
            Ok(())
        } else {
            warn!("Key authentication rejected for user '{}'", username);
            Err(SshLambdaError::connection(
                "ssh: handshake failed: unable to authenticate, attempted methods [publickey]",
            ))
        }
    }

    /// Open a new session channel
    pub async fn open_session(&self) -> Result<Channel<client::Msg>> {
        self.session.channel_open_session().await.map_err(|e| {
            error!("Failed to open session channel: {}", e);
            SshLambdaError::session(e.to_string())
        })
    }

    /// Close the SSH connection
    pub async fn close(self) {
        if let Err(e) = self
            .session
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            debug!("Disconnect from {} failed: {}", self.label, e);
        }

        info!("SSH connection to {} closed", self.label);
    }
}

impl std::fmt::Debug for SshConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConnection")
            .field("target", &self.label)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = include_str!("../../tests/fixtures/id_ed25519");

    #[test]
    fn test_parse_openssh_key() {
        let key = parse_private_key(TEST_KEY).unwrap();
        assert_eq!(key.algorithm().as_str(), "ssh-ed25519");
    }

    #[test]
    fn test_parse_key_tolerates_surrounding_whitespace() {
        let padded = format!("\n  {}\n\n", TEST_KEY);
        assert!(parse_private_key(&padded).is_ok());
    }

    #[test]
    fn test_parse_garbage_key() {
        let err = parse_private_key("not a key").unwrap_err();
        assert!(matches!(err, SshLambdaError::KeyParse(_)));
        assert!(err.to_string().starts_with("failed to parse private key: "));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let key = parse_private_key(TEST_KEY).unwrap();

        // Bind then drop a listener to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let address = format!("127.0.0.1:{}", port);
        let target = SshTarget::new(&address, "nobody", TEST_KEY);
        let err = SshConnection::connect(&target, key).await.unwrap_err();

        assert!(matches!(err, SshLambdaError::Connection(_)));
        assert_eq!(err.status_code(), 502);
    }
}
