//! Tracing subscriber setup.
//!
//! `json` output prints one object per event with timestamp, level, target,
//! source file and line, the event fields flattened next to the message, the
//! current span and the list of all entered spans. The outermost span of a
//! request is `request{correlation_id}`, so every event emitted while serving
//! it carries the id, however deeply nested. `pretty` output is meant for
//! local development.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::LogFormat;

/// Install the global subscriber.
///
/// `filter` is an `EnvFilter` directive such as `info` or
/// `image_analysis_api=debug,tower_http=info`. An unparseable directive
/// falls back to `info`.
pub fn init_logging(filter: &str, format: LogFormat) {
    init_logging_with_writer(filter, format, std::io::stdout);
}

/// Install the global subscriber writing to `writer`.
///
/// Only the first call in a process installs anything; later calls are
/// ignored, which lets tests share one subscriber.
pub fn init_logging_with_writer<W>(filter: &str, format: LogFormat, writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_env_filter(env_filter)
            .with_writer(writer)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_target(true)
            .with_thread_ids(true)
            .with_env_filter(env_filter)
            .with_writer(writer)
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Global subscriber already installed");
    }
}
