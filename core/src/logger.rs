use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::{
    fmt::format::{Format, Writer},
    EnvFilter,
};

struct LocalTimer;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, writer: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        write!(writer, "{} - {}", now.format("%d %B"), now.format("%H:%M:%S%.6f"))
    }
}

/// `log_level` applies to this crate only, everything else logs warnings and up.
fn default_directives(log_level: LevelFilter) -> String {
    format!("warn,{}={}", env!("CARGO_CRATE_NAME"), log_level)
}

/// Installs the global `tracing` subscriber and returns whether it was installed.
///
/// `RUST_LOG` replaces the default directives when set. Only the first call installs
/// a subscriber, later calls keep it and return `false`.
pub fn setup_logger(log_level: LevelFilter) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    let format = Format::default().with_timer(LocalTimer).with_level(true).with_target(true);

    let subscriber =
        tracing_subscriber::fmt().with_env_filter(filter).event_format(format).finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("Logger has already been set up, continuing...");
        return false;
    }

    true
}

pub fn setup_info_logger() -> bool {
    setup_logger(LevelFilter::INFO)
}
