//! Utilities for logging.

use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Output format for the global subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy()
}

/// Configure the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Only the first call has
/// any effect, later calls leave the installed subscriber in place.
pub fn configure_global_logger(default_level: Level, format: LogFormat) {
    let builder = FmtSubscriber::builder()
        .with_env_filter(env_filter(default_level))
        .with_thread_names(true);

    let result = match format {
        LogFormat::Pretty => {
            tracing::subscriber::set_global_default(builder.pretty().finish())
        }
        LogFormat::Compact => {
            tracing::subscriber::set_global_default(builder.compact().finish())
        }
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    };

    // Already set, e.g. by a test harness or the embedding application.
    let _ = result;
}

/// Install a subscriber writing through the test harness' captured output.
pub fn init_test() {
    let subscriber = FmtSubscriber::builder()
        .with_test_writer()
        .with_env_filter(env_filter(Level::DEBUG))
        .with_file(true)
        .with_line_number(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_noop() {
        init_test();
        init_test();
        configure_global_logger(Level::INFO, LogFormat::Json);
        tracing::debug!("still logging");
    }
}
