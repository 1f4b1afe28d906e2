//! Logging bootstrap
//!
//! Diagnostics go to stderr through `tracing`, so command output on stdout
//! stays machine-readable. `JOTTER_LOG` takes an `EnvFilter` directive and
//! overrides the configured level.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive, e.g. `jotter=debug`
pub const LOG_ENV: &str = "JOTTER_LOG";

/// Install the global subscriber. Calling it again is a no-op.
pub fn init_logging(default_level: &str) {
    let level = normalize_level(default_level).unwrap_or("warn");
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Map a user-supplied level name to the canonical one
pub fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error|off"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level(" INFO ").unwrap(), "info");
        assert_eq!(normalize_level("warning").unwrap(), "warn");
        assert!(normalize_level("verbose").is_err());
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging("debug");
        init_logging("bogus");
    }
}
