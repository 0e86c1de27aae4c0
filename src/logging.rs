//! Logger setup for the command-line front end.
//!
//! The library itself only emits through the `log` facade. Binaries pick the
//! backend; `RUST_LOG` takes precedence over the configured level.

use env_logger::{Builder, Env};

use crate::config::LogLevel;

/// Install the global logger at the given level.
///
/// Returns `false` if a logger was already installed.
pub fn init(level: LogLevel) -> bool {
    builder(level).try_init().is_ok()
}

/// Logger for unit tests, capturing output per test.
#[cfg(test)]
pub fn init_test() {
    let _ = builder(LogLevel::Trace).is_test(true).try_init();
}

fn builder(level: LogLevel) -> Builder {
    let mut builder = Builder::new();
    builder
        .filter_level(level.to_level_filter())
        .format_target(false)
        .parse_env(Env::default());
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_test();
        assert!(!init(LogLevel::Info));
        log::debug!("logger installed");
    }
}
