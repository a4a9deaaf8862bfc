//! Diagnostics setup for extensions
//!
//! The bridge emits `tracing` events (registration at debug, dispatch at
//! trace, failures at warn/error). Nothing is printed unless the extension
//! installs a subscriber; [`init`] does that when `CLASSBRIDGE_LOG` is set.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Filter directives, e.g. `CLASSBRIDGE_LOG=classbridge=debug`
pub const LOG_ENV: &str = "CLASSBRIDGE_LOG";

/// `full` adds span open/close events to the output
pub const LOG_STYLE_ENV: &str = "CLASSBRIDGE_LOG_STYLE";

/// Install a stderr subscriber if `CLASSBRIDGE_LOG` is set.
///
/// Returns `true` when this call installed the subscriber. The host process
/// may already own a global subscriber, in which case nothing changes.
pub fn init() -> bool {
    let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return false;
    };
    let span_events = match std::env::var(LOG_STYLE_ENV).as_deref() {
        Ok("full") => FmtSpan::NEW | FmtSpan::CLOSE,
        _ => FmtSpan::NONE,
    };
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_span_events(span_events)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("tracing initialized");
    }
    installed
}
