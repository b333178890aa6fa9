//! Logging utilities for the application
//!
//! Logging goes through `tracing_subscriber` with an `EnvFilter`. `RUST_LOG`
//! wins over `LOG_LEVEL`, which wins over the `info` default.
//!
//! `LOG_MODE=file` routes output to daily rolling files under `LOG_DATA_DIR`
//! (default `logs/`) through `tracing_appender`; anything else logs to stdout.
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default directory for file logging
pub const DEFAULT_LOG_DIR: &str = "logs";

/// File name prefix of rolled log files
const LOG_FILE_PREFIX: &str = "dlc-observer.log";

type SetupResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync + 'static>>;

fn build_filter() -> EnvFilter {
	EnvFilter::try_from_default_env()
		.or_else(|_| {
			std::env::var("LOG_LEVEL")
				.map_err(|e| e.to_string())
				.and_then(|level| EnvFilter::try_new(level).map_err(|e| e.to_string()))
		})
		.unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Setup logging according to `LOG_MODE`
///
/// # Returns
/// * `Option<WorkerGuard>` - Present in file mode; must be held until exit so
///   buffered lines are flushed
pub fn setup_logging() -> SetupResult<Option<WorkerGuard>> {
	let file_mode = std::env::var("LOG_MODE")
		.map(|mode| mode.eq_ignore_ascii_case("file"))
		.unwrap_or(false);

	if file_mode {
		let dir = std::env::var("LOG_DATA_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
		let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
		let (writer, guard) = tracing_appender::non_blocking(appender);
		setup_logging_with_writer(writer, false)?;
		Ok(Some(guard))
	} else {
		setup_logging_with_writer(std::io::stdout, true)?;
		Ok(None)
	}
}

/// Setup logging for the application with a custom writer
///
/// # Arguments
/// * `writer` - Destination of formatted lines
/// * `ansi` - Whether to emit color codes
pub fn setup_logging_with_writer<W>(writer: W, ansi: bool) -> SetupResult<()>
where
	W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
	tracing_subscriber::registry()
		.with(build_filter())
		.with(
			fmt::layer()
				.with_writer(writer)
				.event_format(
					fmt::format()
						.with_level(true)
						.with_target(true)
						.with_thread_ids(false)
						.with_thread_names(false)
						.with_ansi(ansi)
						.compact(),
				)
				.fmt_fields(fmt::format::PrettyFields::new()),
		)
		.try_init()?;
	Ok(())
}
