use tracing::Level;

use crate::config::{LogFormat, LoggingConfig};

/// Installs the global tracing subscriber in the configured format.
///
/// Call once at startup, before any other work. Calling again (or from a
/// test harness that already installed one) is a no-op.
pub fn init_logging(config: &LoggingConfig) {
    let log_level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt().with_target(false).with_max_level(log_level);

    let result = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber was already installed; keeping the existing one");
    }
}

#[cfg(test)]
mod tests {
    use super::init_logging;
    use crate::config::{LogFormat, LoggingConfig};

    #[test]
    fn init_is_idempotent() {
        let config = LoggingConfig { level: "debug".to_owned(), format: LogFormat::Compact };
        init_logging(&config);
        init_logging(&config);
    }

    #[test]
    fn bad_level_falls_back_without_panicking() {
        let config =
            LoggingConfig { level: "shouting".to_owned(), format: LogFormat::Json };
        init_logging(&config);
    }
}
