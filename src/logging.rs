// 📝 Logging - one `LEVEL: message` line per event, console + append-only file
//
// INFO goes to stdout, WARN/ERROR to stderr, everything to the log file.
// The file writer sits behind a Mutex so concurrent lookups never
// interleave half-lines.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// `INFO: message` formatter. Prefix is coloured when the writer allows ANSI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinePrefixFormat;

pub fn level_prefix(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR:",
        Level::WARN => "WARN:",
        Level::INFO => "INFO:",
        Level::DEBUG => "DEBUG:",
        Level::TRACE => "TRACE:",
    }
}

impl<S, N> FormatEvent<S, N> for LinePrefixFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = event.metadata().level();
        let prefix = level_prefix(level);

        if writer.has_ansi_escapes() {
            let painted = match *level {
                Level::ERROR => prefix.red(),
                Level::WARN => prefix.yellow(),
                _ => prefix.green(),
            };
            write!(writer, "{} ", painted)?;
        } else {
            write!(writer, "{} ", prefix)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Console + file subscriber. WARN/ERROR go to `stderr`, the rest to
/// `stdout`; every event is appended to `file` without ANSI escapes.
pub fn build_subscriber<O, E>(
    file: File,
    stdout: O,
    stderr: E,
    console_ansi: bool,
    filter: EnvFilter,
) -> impl Subscriber + Send + Sync + 'static
where
    O: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    E: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let console = tracing_subscriber::fmt::layer()
        .with_ansi(console_ansi)
        .event_format(LinePrefixFormat)
        .with_writer(stderr.with_max_level(Level::WARN).or_else(stdout));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(LinePrefixFormat)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
}

/// Install the global subscriber: console plus append-only `log_file`.
/// `RUST_LOG` narrows the default `info` filter.
pub fn init_logging(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file: {:?}", log_file))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    build_subscriber(file, std::io::stdout, std::io::stderr, true, filter)
        .try_init()
        .context("Logging already initialized")?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
