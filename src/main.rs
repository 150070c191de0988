//! SSH Lambda - function entry point
//!
//! Initializes logging, loads the shared secret from the environment and
//! hands every event to [`SshLambdaFunction`].

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ssh_lambda::config::{ServerConfig, LAMBDA_PASSWORD_ENV};
use ssh_lambda::function::SshLambdaFunction;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // CloudWatch timestamps every line and renders no colors
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .init();

    let config = ServerConfig::from_env();

    info!("SSH Lambda v{} starting...", env!("CARGO_PKG_VERSION"));
    if config.lambda_password.is_none() {
        warn!(
            "{} is not set; every request will be rejected",
            LAMBDA_PASSWORD_ENV
        );
    }

    let function = SshLambdaFunction::new(config);
    let function = &function;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        info!("Handling request {}", event.context.request_id);
        function
            .handle_event(event.payload)
            .await
            .map_err(Error::from)
    }))
    .await
}
