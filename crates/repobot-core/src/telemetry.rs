//! Tracing initialisation for the repobot binary.
//!
//! Bots run inside CI jobs, so output goes to stderr and stdout stays free
//! for command results. Call [`init_tracing`] once at program start.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding a filter directive for repobot only.
pub const LOG_ENV: &str = "REPOBOT_LOG";

/// Build the filter: `REPOBOT_LOG`, then `RUST_LOG`, then `level`.
pub fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber with either a plain or a JSON formatter.
///
/// `level` applies when neither `REPOBOT_LOG` nor `RUST_LOG` is set.
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let plain = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });
    let structured = json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(false)
    });

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(plain)
        .with(structured)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        init_tracing(false, Level::INFO);
        assert!(!init_tracing(true, Level::DEBUG));
    }
}
