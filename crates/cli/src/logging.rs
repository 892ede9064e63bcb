use quotecraft_core::config::{LogFormat, LoggingConfig};
use tracing::Level;

/// Installs the global subscriber on stderr so stdout carries only command output.
pub fn init(config: Option<&LoggingConfig>) {
    let log_level = config
        .and_then(|config| config.level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    let format = config.map(|config| config.format).unwrap_or(LogFormat::Compact);

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // a subscriber may already be installed when embedded in tests
    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
