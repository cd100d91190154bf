use pmoconfig::Config;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber
///
/// The level comes from `host.logger.min_level`, `RUST_LOG` wins when set.
/// Logs go to stderr, stdout carries the JSON results.
pub fn init_logging(config: &Config) {
    let enable_console = config.get_log_enable_console().unwrap_or(true);
    if !enable_console {
        return;
    }

    let level = config
        .get_log_min_level()
        .unwrap_or_else(|_| "INFO".to_string())
        .to_lowercase();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}
