//! SSH target types
//!
//! Connection parameters for a single command run, built from a request.

use std::net::{Ipv6Addr, SocketAddr};

use crate::config::DEFAULT_SSH_PORT;

/// SSH connection target
#[derive(Clone)]
pub struct SshTarget {
    /// Remote hostname or IP address
    pub host: String,

    /// SSH port (default: 22)
    pub port: u16,

    /// Username for authentication
    pub username: String,

    /// Private key content (not path!) for key authentication
    pub private_key: String,
}

impl SshTarget {
    /// Create a target from an `ip_address` field, a user and key material
    ///
    /// `address` may be `host`, `host:port`, `[v6]:port` or a bare IPv6 literal.
    pub fn new(
        address: &str,
        username: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        let (host, port) = split_host_port(address);
        Self {
            host,
            port,
            username: username.into(),
            private_key: private_key.into(),
        }
    }

    /// Address passed to the TCP connect call
    pub fn addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

impl std::fmt::Debug for SshTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Split an address into host and port, defaulting the port to 22
pub fn split_host_port(address: &str) -> (String, u16) {
    let address = address.trim();

    if let Ok(socket) = address.parse::<SocketAddr>() {
        return (socket.ip().to_string(), socket.port());
    }

    if let Ok(v6) = address.parse::<Ipv6Addr>() {
        return (v6.to_string(), DEFAULT_SSH_PORT);
    }

    if let Some((host, port)) = address.rsplit_once(':') {
        if let Ok(port) = port.parse::<u16>() {
            let host = host.trim_start_matches('[').trim_end_matches(']');
            return (host.to_string(), port);
        }
    }

    (
        address
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string(),
        DEFAULT_SSH_PORT,
    )
}
