use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter, e.g. `TIDYDIR_LOG=debug`.
pub const LOG_ENV: &str = "TIDYDIR_LOG";

/// Installs a stderr `tracing` subscriber.
///
/// `TIDYDIR_LOG` wins when set; otherwise `verbosity` picks the level
/// (0 = warn, 1 = info, 2+ = debug). Calling this twice is harmless.
pub fn init_logger(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
