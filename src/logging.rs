//! Diagnostics on stderr
//!
//! Stdout belongs to the status line that the monitoring system parses, so
//! everything else goes through `log` to stderr. Quiet by default, each `-v`
//! raises the level; `NETPROBE_LOG` takes `env_logger` filter syntax and wins
//! over the flags.

use env_logger::{Builder, Target};
use log::LevelFilter;

pub const ENV_VAR: &str = "NETPROBE_LOG";

pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Set up the global logger, `verbosity` is the number of `-v` flags
pub fn init(verbosity: u8) {
    let mut builder = Builder::new();
    builder
        .filter_level(level_for(verbosity))
        .target(Target::Stderr)
        .format_timestamp(None)
        .parse_env(ENV_VAR);
    // a logger may already be installed when running under the test harness
    let _ = builder.try_init();
}

#[cfg(test)]
mod test {
    use log::LevelFilter;

    use super::level_for;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(7), LevelFilter::Trace);
    }
}
