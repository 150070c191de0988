//! Request and response payloads
//!
//! Decoding of incoming events (direct invocation or Lambda Function URL),
//! request validation, and response encoding.

use aws_lambda_events::event::lambda_function_urls::LambdaFunctionUrlResponse;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use subtle::ConstantTimeEq;

use crate::config::ServerConfig;
use crate::error::{Result, SshLambdaError};

/// A command request
///
/// Absent keys decode as empty strings and are rejected by [`Request::validate`].
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Request {
    /// Target address, `host` or `host:port`
    pub ip_address: String,

    /// SSH user
    pub user: String,

    /// Shared secret authorizing the call
    pub lambda_password: String,

    /// PEM/OpenSSH private key material
    pub ssh_key: String,

    /// Command to run
    pub command: String,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("ip_address", &self.ip_address)
            .field("user", &self.user)
            .field("lambda_password", &redacted(&self.lambda_password))
            .field("ssh_key", &redacted(&self.ssh_key))
            .field("command", &self.command)
            .finish()
    }
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

impl Request {
    /// Validate the request against the server configuration
    ///
    /// Checks run in a fixed order and stop at the first failure. A wrong
    /// secret is reported before any other field is looked at.
    pub fn validate(&self, config: &ServerConfig) -> Result<()> {
        let expected = config
            .lambda_password
            .as_deref()
            .ok_or(SshLambdaError::ServerMissingPassword)?;

        if self.lambda_password.is_empty() {
            return Err(SshLambdaError::MissingField("lambda_password"));
        }

        if !secrets_match(&self.lambda_password, expected) {
            return Err(SshLambdaError::IncorrectPassword);
        }

        if self.ip_address.is_empty() {
            return Err(SshLambdaError::MissingField("ip_address"));
        }

        if self.ssh_key.is_empty() {
            return Err(SshLambdaError::MissingField("ssh_key"));
        }

        if self.command.is_empty() {
            return Err(SshLambdaError::MissingField("command"));
        }

        Ok(())
    }
}

/// Compare two secrets in constant time with respect to their content
///
/// Both inputs are padded to the longer length with distinct bytes so a
/// length mismatch can never compare equal.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    let max_len = provided.len().max(expected.len());

    let mut a = vec![0u8; max_len];
    let mut b = vec![0xFFu8; max_len];
    a[..provided.len()].copy_from_slice(provided.as_bytes());
    b[..expected.len()].copy_from_slice(expected.as_bytes());

    let lengths_equal = provided.len().ct_eq(&expected.len());
    let contents_equal = a.ct_eq(&b);

    (lengths_equal & contents_equal).into()
}

/// Response payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,

    pub result: String,
}

impl Response {
    /// Successful response carrying command output
    pub fn ok(result: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            result: result.into(),
        }
    }

    /// Failure response carrying the error message
    pub fn from_error(err: &SshLambdaError) -> Self {
        Self {
            status_code: err.status_code(),
            result: err.to_string(),
        }
    }
}

/// How the function was invoked, which decides the response shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// `Invoke` API with the request as the raw payload
    Direct,

    /// Lambda Function URL (HTTP) with the request in the body
    FunctionUrl,
}

impl Invocation {
    /// Detect the invocation style from the raw event
    pub fn detect(event: &Value) -> Self {
        if event.get("requestContext").is_some() && event.get("ip_address").is_none() {
            Invocation::FunctionUrl
        } else {
            Invocation::Direct
        }
    }

    /// Encode `response` in the shape this invocation style expects
    pub fn encode(self, response: &Response) -> Result<Value> {
        match self {
            Invocation::Direct => Ok(serde_json::to_value(response)?),
            Invocation::FunctionUrl => {
                let url_response = LambdaFunctionUrlResponse {
                    status_code: i64::from(response.status_code),
                    headers: aws_lambda_events::http::HeaderMap::new(),
                    body: Some(serde_json::to_string(response)?),
                    is_base64_encoded: false,
                    cookies: Vec::new(),
                };
                Ok(serde_json::to_value(url_response)?)
            }
        }
    }
}

/// Decode a raw event into a request
pub fn decode_event(invocation: Invocation, event: Value) -> Result<Request> {
    match invocation {
        Invocation::Direct => serde_json::from_value(event)
            .map_err(|e| SshLambdaError::bad_request(e.to_string())),
        Invocation::FunctionUrl => {
            let url_request: FunctionUrlEnvelope = serde_json::from_value(event)
                .map_err(|e| SshLambdaError::bad_request(e.to_string()))?;
            decode_body(url_request.body.as_deref(), url_request.is_base64_encoded)
        }
    }
}

/// The parts of a Function URL event this function reads
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FunctionUrlEnvelope {
    body: Option<String>,
    is_base64_encoded: bool,
}

/// Decode a Function URL body into a request
fn decode_body(body: Option<&str>, is_base64_encoded: bool) -> Result<Request> {
    let body = body.unwrap_or_default();

    let bytes = if is_base64_encoded {
        BASE64
            .decode(body)
            .map_err(|e| SshLambdaError::bad_request(format!("invalid base64 body: {}", e)))?
    } else {
        body.as_bytes().to_vec()
    };

    serde_json::from_slice(&bytes).map_err(|e| SshLambdaError::bad_request(e.to_string()))
}
