//! Logging setup for the library and the CLI.
//!
//! Compact timestamped output with per-module levels taken from
//! [`LoggingConfig`]. `RUST_LOG` wins over the configuration:
//!
//! ```bash
//! RUST_LOG=adaptable_notify=debug adaptable-notify watch ./apps
//! ```
//!
//! ```toml
//! [logging]
//! default = "warn"
//!
//! [logging.modules]
//! "adaptable_notify::interpreted" = "trace"
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Build the filter directive string for a logging config.
pub fn filter_directives(config: &LoggingConfig) -> String {
    let mut modules: Vec<_> = config.modules.iter().collect();
    modules.sort();

    let mut filter = config.default.clone();
    for (module, level) in modules {
        filter.push_str(&format!(",{module}={level}"));
    }
    filter
}

/// Initialize logging. Only the first call takes effect.
///
/// Output goes to stderr so that JSON printed by the CLI stays clean.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directives(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Initialize logging with `LoggingConfig::default()` (warn and above).
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

/// Log an event tagged with the emitting component.
///
/// ```ignore
/// log_event!("registry", "created", "notifier for {root}");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

/// Debug-level variant of [`log_event!`].
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}
