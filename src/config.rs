//! Configuration for the Lambda function and CLI argument parsing for the invoker

use clap::Parser;
use std::path::PathBuf;

use crate::error::{Result, SshLambdaError};

/// Environment variable holding the shared secret
pub const LAMBDA_PASSWORD_ENV: &str = "LAMBDA_PASSWORD";

/// Default AWS region for the invoker
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default SSH port when `ip_address` carries none
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Server-side configuration of the Lambda function
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Expected shared secret (None when unset or empty)
    pub lambda_password: Option<String>,
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::new(std::env::var(LAMBDA_PASSWORD_ENV).ok())
    }

    /// Build configuration from an optional secret
    pub fn new(lambda_password: Option<String>) -> Self {
        Self {
            lambda_password: sanitize_secret(lambda_password),
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field(
                "lambda_password",
                &self.lambda_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// SSH Lambda invoker CLI Arguments
///
/// Flag names follow the request payload keys.
#[derive(Parser, Debug, Clone)]
#[command(name = "ssh-lambda-invoke")]
#[command(version)]
#[command(about = "Invoke the SSH Lambda function and print the command output")]
pub struct InvokeArgs {
    /// SSH command to be executed
    #[arg(long = "ssh_command")]
    pub ssh_command: Option<String>,

    /// Path to the SSH key file
    #[arg(long = "ssh_key_file")]
    pub ssh_key_file: Option<PathBuf>,

    /// Lambda function name or ARN
    #[arg(long = "function_name")]
    pub function_name: Option<String>,

    /// Lambda password
    #[arg(long = "lambda_password", env = LAMBDA_PASSWORD_ENV, hide_env_values = true)]
    pub lambda_password: Option<String>,

    /// Address of the SSH server (host or host:port)
    #[arg(long = "ip_address")]
    pub ip_address: Option<String>,

    /// SSH user
    #[arg(long)]
    pub user: Option<String>,

    /// AWS region
    #[arg(long, default_value = DEFAULT_REGION)]
    pub region: String,

    /// Also write the raw response payload to this file
    #[arg(long = "response_file")]
    pub response_file: Option<PathBuf>,
}

/// Parsed and validated invoker configuration
#[derive(Clone)]
pub struct InvokeConfig {
    pub ssh_command: String,
    pub ssh_key_file: PathBuf,
    pub function_name: String,
    pub lambda_password: String,
    pub ip_address: String,
    pub user: String,
    pub region: String,
    pub response_file: Option<PathBuf>,
}

impl InvokeConfig {
    /// Create InvokeConfig from CLI Args
    pub fn from_args(args: InvokeArgs) -> Result<Self> {
        validate_args(&args)?;

        // validate_args guarantees every required flag is present and non-empty
        Ok(InvokeConfig {
            ssh_command: args.ssh_command.unwrap_or_default(),
            ssh_key_file: args.ssh_key_file.unwrap_or_default(),
            function_name: args.function_name.unwrap_or_default(),
            lambda_password: args.lambda_password.unwrap_or_default(),
            ip_address: args.ip_address.unwrap_or_default(),
            user: args.user.unwrap_or_default(),
            region: args.region,
            response_file: args.response_file,
        })
    }
}

impl std::fmt::Debug for InvokeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvokeConfig")
            .field("ssh_command", &self.ssh_command)
            .field("ssh_key_file", &self.ssh_key_file)
            .field("function_name", &self.function_name)
            .field("lambda_password", &"<redacted>")
            .field("ip_address", &self.ip_address)
            .field("user", &self.user)
            .field("region", &self.region)
            .field("response_file", &self.response_file)
            .finish()
    }
}

/// Validate CLI arguments, reporting every missing flag at once
fn validate_args(args: &InvokeArgs) -> Result<()> {
    let mut errors = Vec::new();

    if is_blank(args.ssh_command.as_deref()) {
        errors.push("Missing SSH command (--ssh_command)".to_string());
    }

    match args.ssh_key_file {
        None => errors.push("Missing SSH key file (--ssh_key_file)".to_string()),
        Some(ref path) if path.as_os_str().is_empty() => {
            errors.push("Missing SSH key file (--ssh_key_file)".to_string())
        }
        Some(ref path) if !path.exists() => {
            errors.push(format!("SSH key file not found: {}", path.display()))
        }
        Some(_) => {}
    }

    if is_blank(args.function_name.as_deref()) {
        errors.push("Missing function name (--function_name)".to_string());
    }

    if is_blank(args.lambda_password.as_deref()) {
        errors.push("Missing Lambda password (--lambda_password)".to_string());
    }

    if is_blank(args.ip_address.as_deref()) {
        errors.push("Missing IP address (--ip_address)".to_string());
    }

    if is_blank(args.user.as_deref()) {
        errors.push("Missing SSH user (--user)".to_string());
    }

    if !errors.is_empty() {
        return Err(SshLambdaError::Config(errors.join("\n")));
    }

    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

/// Sanitize secret: return None if empty
fn sanitize_secret(secret: Option<String>) -> Option<String> {
    secret.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_args() -> InvokeArgs {
        InvokeArgs {
            ssh_command: Some("ls -a".to_string()),
            ssh_key_file: Some(PathBuf::from(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/tests/fixtures/id_ed25519"
            ))),
            function_name: Some("ssh-runner".to_string()),
            lambda_password: Some("s3cret".to_string()),
            ip_address: Some("10.0.0.5".to_string()),
            user: Some("ubuntu".to_string()),
            region: DEFAULT_REGION.to_string(),
            response_file: None,
        }
    }

    #[test]
    fn test_server_config_empty_secret_is_none() {
        assert!(ServerConfig::new(Some(String::new())).lambda_password.is_none());
        assert!(ServerConfig::new(None).lambda_password.is_none());
        assert_eq!(
            ServerConfig::new(Some("pw".to_string())).lambda_password,
            Some("pw".to_string())
        );
    }

    #[test]
    fn test_server_config_debug_redacts_secret() {
        let config = ServerConfig::new(Some("hunter2".to_string()));
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_invoke_config_from_full_args() {
        let config = InvokeConfig::from_args(full_args()).unwrap();
        assert_eq!(config.ssh_command, "ls -a");
        assert_eq!(config.function_name, "ssh-runner");
        assert_eq!(config.region, "us-east-1");
        assert!(!format!("{:?}", config).contains("s3cret"));
    }

    #[test]
    fn test_invoke_config_reports_all_missing_flags() {
        let args = InvokeArgs {
            ssh_command: None,
            function_name: Some(String::new()),
            user: None,
            ..full_args()
        };

        let err = InvokeConfig::from_args(args).unwrap_err().to_string();
        assert!(err.contains("Missing SSH command"));
        assert!(err.contains("Missing function name"));
        assert!(err.contains("Missing SSH user"));
        assert!(!err.contains("Missing IP address"));
    }

    #[test]
    fn test_invoke_config_missing_key_file() {
        let args = InvokeArgs {
            ssh_key_file: Some(PathBuf::from("/nonexistent/id_rsa")),
            ..full_args()
        };

        let err = InvokeConfig::from_args(args).unwrap_err().to_string();
        assert!(err.contains("SSH key file not found: /nonexistent/id_rsa"));
    }

    #[test]
    fn test_args_parse_underscore_flags() {
        let args = InvokeArgs::try_parse_from([
            "ssh-lambda-invoke",
            "--ssh_command=uptime",
            "--function_name=runner",
            "--ip_address=1.2.3.4",
            "--user=admin",
        ])
        .unwrap();

        assert_eq!(args.ssh_command.as_deref(), Some("uptime"));
        assert_eq!(args.function_name.as_deref(), Some("runner"));
        assert_eq!(args.ip_address.as_deref(), Some("1.2.3.4"));
        assert_eq!(args.region, "us-east-1");
    }
}
