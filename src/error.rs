//! Error types for the SSH Lambda function and its invoke CLI

use thiserror::Error;

/// Main error type for the SSH Lambda function
///
/// Every variant renders to the message returned to the caller in the
/// `result` field, and maps to a status code via [`SshLambdaError::status_code`].
#[derive(Debug, Error)]
pub enum SshLambdaError {
    /// Request payload could not be decoded
    #[error("failed to unmarshal request body: {0}")]
    BadRequest(String),

    /// The function has no shared secret configured
    #[error("server is missing lambda_password")]
    ServerMissingPassword,

    /// A required request field is empty or absent
    #[error("missing {0}")]
    MissingField(&'static str),

    /// Shared secret did not match
    #[error("incorrect lambda_password")]
    IncorrectPassword,

    /// SSH private key could not be decoded
    #[error("failed to parse private key: {0}")]
    KeyParse(String),

    /// TCP connect, handshake or authentication failed
    #[error("failed to connect to SSH server: {0}")]
    Connection(String),

    /// Session channel could not be opened
    #[error("failed to create SSH session: {0}")]
    Session(String),

    /// Remote command failed; carries whatever output was captured
    #[error("failed to run SSH command: output: {output} err: {reason}")]
    Command { output: String, reason: String },

    /// Configuration error (CLI flags, environment)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Lambda invocation failed (CLI side)
    #[error("Error invoking Lambda function: {0}")]
    Invoke(String),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using SshLambdaError
pub type Result<T> = std::result::Result<T, SshLambdaError>;

impl SshLambdaError {
    /// Create a bad request error from a string
    pub fn bad_request(msg: impl Into<String>) -> Self {
        SshLambdaError::BadRequest(msg.into())
    }

    /// Create a key parse error from a string
    pub fn key_parse(msg: impl Into<String>) -> Self {
        SshLambdaError::KeyParse(msg.into())
    }

    /// Create a connection error from a string
    pub fn connection(msg: impl Into<String>) -> Self {
        SshLambdaError::Connection(msg.into())
    }

    /// Create a session error from a string
    pub fn session(msg: impl Into<String>) -> Self {
        SshLambdaError::Session(msg.into())
    }

    /// Create a command error from captured output and a failure reason
    pub fn command(output: impl Into<String>, reason: impl Into<String>) -> Self {
        SshLambdaError::Command {
            output: output.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        SshLambdaError::Config(msg.into())
    }

    /// Create an invoke error from a string
    pub fn invoke(msg: impl Into<String>) -> Self {
        SshLambdaError::Invoke(msg.into())
    }

    /// Status code reported to the caller for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            SshLambdaError::BadRequest(_)
            | SshLambdaError::ServerMissingPassword
            | SshLambdaError::MissingField(_)
            | SshLambdaError::KeyParse(_) => 400,
            SshLambdaError::IncorrectPassword => 403,
            SshLambdaError::Connection(_)
            | SshLambdaError::Session(_)
            | SshLambdaError::Command { .. } => 502,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SshLambdaError::MissingField("ip_address");
        assert_eq!(err.to_string(), "missing ip_address");

        let err = SshLambdaError::connection("connection refused");
        assert_eq!(
            err.to_string(),
            "failed to connect to SSH server: connection refused"
        );
    }

    #[test]
    fn test_command_error_keeps_output() {
        let err = SshLambdaError::command("ls: cannot access 'x'\n", "exit status 2");
        assert_eq!(
            err.to_string(),
            "failed to run SSH command: output: ls: cannot access 'x'\n err: exit status 2"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(SshLambdaError::ServerMissingPassword.status_code(), 400);
        assert_eq!(SshLambdaError::MissingField("command").status_code(), 400);
        assert_eq!(SshLambdaError::IncorrectPassword.status_code(), 403);
        assert_eq!(SshLambdaError::key_parse("bad").status_code(), 400);
        assert_eq!(SshLambdaError::session("closed").status_code(), 502);
        assert_eq!(SshLambdaError::command("", "exit status 1").status_code(), 502);
        assert_eq!(SshLambdaError::config("x").status_code(), 500);
    }
}
