use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sends tracing output to a file. Nothing is logged unless a path is
/// configured, since stdout belongs to the TUI.
///
/// The file name gets a timestamp and pid suffix so concurrent sessions
/// don't clobber each other: `{path}.{timestamp}.{pid}`.
pub fn init_tracing(log_path: Option<&str>) {
    let Some(log_path) = log_path else {
        return;
    };

    let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let unique_path = format!("{}.{}.{}", log_path, timestamp, std::process::id());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Ok(file) = std::fs::File::create(&unique_path) else {
        eprintln!("Warning: Failed to create log file: {}", unique_path);
        return;
    };

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
}
