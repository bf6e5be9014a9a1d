//! Fleet robot daemon.
//!
//! Validates the startup configuration, then keeps the robot up until
//! interrupted. Exits non-zero when the configuration is rejected.

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use robot_config::loader::{self, DEFAULT_SECRETS_DIR, SECRETS_DIR_ENV};
use robot_config::{ConfigValidationPipeline, ProcessEnv, RetryPolicy};
use robot_kernel::RobotKernel;
use robot_telemetry::{RuntimeCounters, init_tracing};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "robotd")]
#[command(about = "Validate robot configuration and run the robot")]
struct Args {
    /// Configuration document; defaults to ROBOT_CONFIG, then /app/config.json
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mounted secret store directory
    #[arg(long, env = SECRETS_DIR_ENV, default_value = DEFAULT_SECRETS_DIR)]
    secrets_dir: PathBuf,

    /// Attempts per asset check before giving up
    #[arg(long, env = "ROBOT_ASSET_ATTEMPTS", default_value = "3")]
    asset_attempts: NonZeroU32,

    /// First asset backoff in milliseconds; doubles per retry
    #[arg(long, env = "ROBOT_ASSET_BASE_DELAY_MS", default_value = "1000")]
    asset_base_delay_ms: u64,

    /// Attempts per secret lookup before giving up
    #[arg(long, env = "ROBOT_SECRET_ATTEMPTS", default_value = "3")]
    secret_attempts: NonZeroU32,

    /// First secret backoff in milliseconds; doubles per retry
    #[arg(long, env = "ROBOT_SECRET_BASE_DELAY_MS", default_value = "1000")]
    secret_base_delay_ms: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_filter: String,
}

impl Args {
    fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| loader::config_path(&ProcessEnv))
    }

    fn pipeline(&self) -> ConfigValidationPipeline {
        ConfigValidationPipeline::from_host(&self.secrets_dir)
            .with_asset_policy(RetryPolicy::new(
                self.asset_attempts,
                Duration::from_millis(self.asset_base_delay_ms),
            ))
            .with_secret_policy(RetryPolicy::new(
                self.secret_attempts,
                Duration::from_millis(self.secret_base_delay_ms),
            ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_filter)?;

    info!(
        config = %args.config_path().display(),
        secrets_dir = %args.secrets_dir.display(),
        "starting robot"
    );

    let counters = Arc::new(RuntimeCounters::new());
    let startup_counters = Arc::clone(&counters);
    let kernel = tokio::task::spawn_blocking(move || start(&args, startup_counters))
        .await
        .context("startup task panicked")?;
    let kernel = match kernel {
        Ok(kernel) => kernel,
        Err(err) => {
            error!(error = %err, "robot startup aborted");
            return Err(err);
        }
    };

    let status = kernel.status()?;
    for sensor in &status.sensors {
        info!(robot_id = %status.robot_id, %sensor, "sensor ready");
    }
    info!(root = %serde_json::to_string(&kernel.root())?, "robot running");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!(
        counters = %serde_json::to_string(&counters.snapshot())?,
        "robot shutting down"
    );
    Ok(())
}

/// Loads the configuration and bootstraps the kernel. Blocks during retries.
fn start(args: &Args, counters: Arc<RuntimeCounters>) -> Result<RobotKernel> {
    let raw = loader::load_raw(&args.config_path())?;
    let mut kernel = RobotKernel::new(counters);
    kernel.bootstrap(&args.pipeline(), &raw)?;
    Ok(kernel)
}
