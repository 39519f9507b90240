//! Log subscriber setup shared by the `kpi` binary and library callers.
//!
//! Only the first successful install takes effect; a host application that
//! already owns the global subscriber keeps it.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: pipeline crates at `level`,
/// everything else at `warn`.
fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("warn,kpi_core={level},kpi={level}")
}

/// Install a stderr subscriber, plain text or one JSON object per line.
/// `RUST_LOG` overrides `level` when present.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let registry = tracing_subscriber::registry().with(filter);
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let installed = if json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
    // a subscriber installed by the host wins
    installed.ok();
}
