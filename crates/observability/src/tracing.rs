//! Tracing/logging initialization.
//!
//! Log lines go to stderr so that binaries can keep stdout for their own output.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

use crate::LogFormat;

type BoxedSubscriber = Box<dyn ::tracing::Subscriber + Send + Sync + 'static>;

/// Initialize tracing/logging for the process.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Safe to call multiple
/// times (subsequent calls are no-ops).
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = subscriber(format, filter, std::io::stderr).try_init();
}

fn subscriber<W>(format: LogFormat, filter: EnvFilter, writer: W) -> BoxedSubscriber
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_writer(writer);

    match format {
        LogFormat::Json => Box::new(builder.json().with_target(false).finish()),
        LogFormat::Pretty => Box::new(builder.pretty().finish()),
    }
}
