//! Diagnostic tracing for the research assistant.
//!
//! Diagnostics go to stderr. Everything the user is meant to read (prompts,
//! answers, startup notices) is written to stdout by the caller and is unaffected
//! by the filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
///
/// Dependencies stay at `warn`; `-v` raises this crate to `info` (agent steps,
/// tool calls), `-vv` to `debug` (payload sizes, search hits).
pub fn default_filter(verbosity: u8) -> String {
    let own = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    format!("warn,{}={own}", env!("CARGO_CRATE_NAME"))
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over `verbosity` when set.
///
/// # Example
/// ```bash
/// RUST_LOG=research::io::fetch=trace cheap-research
/// ```
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_only_this_crate() {
        assert_eq!(default_filter(0), "warn,research=warn");
        assert_eq!(default_filter(1), "warn,research=info");
        assert_eq!(default_filter(2), "warn,research=debug");
        assert_eq!(default_filter(7), "warn,research=debug");
    }

    #[test]
    fn default_filters_parse() {
        for verbosity in 0..3 {
            assert!(EnvFilter::try_new(default_filter(verbosity)).is_ok());
        }
    }
}
