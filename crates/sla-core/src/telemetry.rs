//! Global tracing subscriber setup for SLA binaries.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Noisy dependencies capped at `warn` unless `RUST_LOG` says otherwise
const QUIET_TARGETS: [&str; 4] = ["lapin", "hyper", "reqwest", "h2"];

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` applies to everything but
/// the transport crates. Returns `false` if a subscriber was already
/// installed, in which case nothing changes.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init()
    };
    installed.is_ok()
}

fn default_filter(level: Level) -> EnvFilter {
    EnvFilter::new(filter_directives(level))
}

fn filter_directives(level: Level) -> String {
    let mut directives = vec![level.as_str().to_ascii_lowercase()];
    directives.extend(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")));
    directives.join(",")
}
