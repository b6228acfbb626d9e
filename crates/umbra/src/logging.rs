//! Logger setup.
//!
//! Everything logs through the `log` facade; this module only installs the
//! `env_logger` backend. wgpu's internals are chatty at `info`, so they are
//! capped at `warn` unless the filter names them explicitly.

use std::sync::Once;

static INIT: Once = Once::new();

/// Crates whose `info` output is noise for this demo.
const QUIET_CRATES: &[&str] = &["wgpu_core", "wgpu_hal", "naga"];

/// Install the global logger. Idempotent.
///
/// `filter` uses `env_logger` syntax (`"debug"`, `"umbra=trace,wgpu=warn"`).
/// Without one, `RUST_LOG` is used, then `info`.
pub fn init_logging(filter: Option<&str>) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        for name in QUIET_CRATES {
            builder.filter_module(name, log::LevelFilter::Warn);
        }

        match filter
            .map(str::to_owned)
            .or_else(|| std::env::var("RUST_LOG").ok())
        {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(log::LevelFilter::Info);
            }
        }

        builder.init();
        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_ignored() {
        init_logging(Some("warn"));
        init_logging(Some("trace"));
        assert_eq!(log::max_level(), log::LevelFilter::Warn, "first filter wins");
    }
}
