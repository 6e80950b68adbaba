use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const ENV_VAR: &str = "AUTOCOMMITTER_LOG";

/// Install a stderr `fmt` subscriber. `default_level` applies when
/// `AUTOCOMMITTER_LOG` is unset or invalid. Repeated calls are ignored.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_env(ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(format!("autocommitter={default_level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
