use anyhow::Result;

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber: stdout plus a daily-rotated file in `logs/`.
///
/// `RUST_LOG` sets the filter (default `info,rag_chat_server=debug`),
/// `LOG_FORMAT=json` switches both outputs to JSON lines.
/// The returned guard must stay alive for the file writer to flush.
pub fn init_logger() -> Result<WorkerGuard> {
    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,rag_chat_server=debug,tower_http=debug".to_string());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("rag-chat-server")
        .filename_suffix("log")
        .build("logs")?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(&log_level)?;

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stdout)
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(file_writer)
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .pretty()
                        .with_writer(std::io::stdout)
                        .with_target(true),
                )
                .with(
                    fmt::layer()
                        .with_writer(file_writer)
                        .with_target(true)
                        .with_ansi(false),
                )
                .try_init()?;
        }
    }

    Ok(guard)
}
