use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system with both console and file output.
///
/// Buffered file lines are flushed when the returned guard is dropped, so
/// hold it until the program exits.
pub fn init_logging() -> WorkerGuard {
    init_logging_in(Path::new("logs"))
}

/// Same as [`init_logging`], with the rolling log file under `dir`.
pub fn init_logging_in(dir: &Path) -> WorkerGuard {
    let _ = fs::create_dir_all(dir);

    // Daily rotated JSON log file
    let file_appender = tracing_appender::rolling::daily(dir, "survey.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    // RUST_LOG wins when set
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("survey_pipeline=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
