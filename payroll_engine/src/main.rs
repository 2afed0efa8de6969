//! Entry point for the Payroll Engine binary.
//!
//! Running this binary starts an HTTP server exposing the attendance
//! and payroll calculators.  See [`payroll_engine::config::Config`] for
//! the environment variables it reads; `RUST_LOG` controls log output.

use payroll_engine::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("payroll_engine=info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    if let Err(err) = payroll_engine::api::serve(config).await {
        tracing::error!(error = ?err, "server exited");
        return Err(err);
    }
    Ok(())
}
