//! SSH Lambda invoker - CLI companion
//!
//! Reads the SSH key file, invokes the deployed function and prints the
//! `result` field of its response.
//!
//! ```bash
//! ssh-lambda-invoke --ssh_command="ls -a" --ssh_key_file="/home/user/.ssh/key.pem" \
//!   --lambda_password="your_very_secret_and_long_password" \
//!   --function_name=your_lambda_function_name --ip_address=ssh.server.ip.address \
//!   --user=ssh_user --region=optional-region
//! ```

use anyhow::{bail, Context};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ssh_lambda::config::{InvokeArgs, InvokeConfig};
use ssh_lambda::invoke::{build_payload, extract_result, LambdaInvoker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the command output
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = InvokeArgs::parse();
    let config = InvokeConfig::from_args(args)?;
    debug!("Invoke configuration: {:?}", config);

    let ssh_key = tokio::fs::read_to_string(&config.ssh_key_file)
        .await
        .with_context(|| {
            format!(
                "Error reading SSH key file {}",
                config.ssh_key_file.display()
            )
        })?;

    let payload = build_payload(&config, &ssh_key).context("Error constructing payload")?;

    let invoker = LambdaInvoker::new(&config.region).await;
    let outcome = invoker.invoke(&config.function_name, payload).await?;

    if let Some(ref path) = config.response_file {
        tokio::fs::write(path, &outcome.payload)
            .await
            .with_context(|| format!("Error writing response to {}", path.display()))?;
    }

    if let Some(ref function_error) = outcome.function_error {
        bail!(
            "Lambda function error ({}): {}",
            function_error,
            String::from_utf8_lossy(&outcome.payload)
        );
    }

    let result = extract_result(&outcome.payload).context("Error reading response payload")?;
    println!("{}", result.result);

    if !result.success() {
        std::process::exit(1);
    }

    Ok(())
}
