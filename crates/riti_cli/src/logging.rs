use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "RITI_LOG";

/// Installs the stderr subscriber. `RITI_LOG` wins over the configured filter.
pub fn init(configured_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(configured_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
