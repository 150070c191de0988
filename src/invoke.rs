//! Lambda invocation for the CLI companion
//!
//! Builds the request payload from CLI configuration, invokes the deployed
//! function synchronously, and pulls the `result` out of its response.

use aws_config::BehaviorVersion;
use aws_sdk_lambda::config::Region;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::Client as LambdaClient;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::InvokeConfig;
use crate::error::{Result, SshLambdaError};
use crate::request::Request;

/// Build the JSON request payload sent to the function
pub fn build_payload(config: &InvokeConfig, ssh_key: &str) -> Result<Vec<u8>> {
    let request = Request {
        ip_address: config.ip_address.clone(),
        user: config.user.clone(),
        lambda_password: config.lambda_password.clone(),
        ssh_key: ssh_key.to_string(),
        command: config.ssh_command.clone(),
    };

    Ok(serde_json::to_vec(&request)?)
}

/// Result extracted from a function response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeResult {
    /// `statusCode` reported by the function, if any
    pub status_code: Option<u16>,

    /// The `result` field
    pub result: String,
}

impl InvokeResult {
    /// Whether the function reported success (or reported no status at all)
    pub fn success(&self) -> bool {
        self.status_code.is_none_or(|code| code == 200)
    }
}

/// Extract the `result` field from a response payload
///
/// Accepts the direct response shape and a Function URL shaped response whose
/// `body` holds the JSON object. A Lambda error payload becomes an error.
pub fn extract_result(payload: &[u8]) -> Result<InvokeResult> {
    let value: Value = serde_json::from_slice(payload)?;
    extract_from_value(&value)
}

fn extract_from_value(value: &Value) -> Result<InvokeResult> {
    if let Some(result) = value.get("result") {
        let result = match result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let status_code = value
            .get("statusCode")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok());
        return Ok(InvokeResult {
            status_code,
            result,
        });
    }

    if let Some(body) = value.get("body").and_then(Value::as_str) {
        let inner: Value = serde_json::from_str(body)?;
        return extract_from_value(&inner);
    }

    if let Some(message) = value.get("errorMessage").and_then(Value::as_str) {
        return Err(SshLambdaError::invoke(message.to_string()));
    }

    Err(SshLambdaError::invoke(format!(
        "response has no result field: {}",
        value
    )))
}

/// Raw outcome of a Lambda invocation
#[derive(Debug, Clone)]
pub struct InvokeOutcome {
    /// Response payload bytes
    pub payload: Vec<u8>,

    /// Set when the function itself failed (`Handled`/`Unhandled`)
    pub function_error: Option<String>,
}

/// Thin wrapper around the AWS Lambda client
#[derive(Clone, Debug)]
pub struct LambdaInvoker {
    client: LambdaClient,
}

impl LambdaInvoker {
    /// Create an invoker using the default credential chain and `region`
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: LambdaClient::new(&config),
        }
    }

    /// Invoke `function_name` synchronously with `payload`
    pub async fn invoke(&self, function_name: &str, payload: Vec<u8>) -> Result<InvokeOutcome> {
        info!("Invoking Lambda function {}", function_name);

        let output = self
            .client
            .invoke()
            .function_name(function_name)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| SshLambdaError::invoke(DisplayErrorContext(&e).to_string()))?;

        debug!(
            "Invoke returned status {} (executed version {:?})",
            output.status_code(),
            output.executed_version()
        );

        Ok(InvokeOutcome {
            payload: output
                .payload()
                .map(|blob| blob.as_ref().to_vec())
                .unwrap_or_default(),
            function_error: output.function_error().map(str::to_string),
        })
    }
}
