//! Structured logging setup.
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - A configured log file goes through [`RotateWriter`]; otherwise stderr
//! - Access records share the subscriber under the `access` target

use std::io;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;
use crate::observability::rotate::RotateWriter;

/// Install the global tracing subscriber.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (writer, ansi) = if config.quiet {
        (BoxMakeWriter::new(io::sink), false)
    } else if !config.file.is_empty() {
        let rotate = RotateWriter::open(&config.file, config.lines)?;
        (BoxMakeWriter::new(rotate), false)
    } else {
        (BoxMakeWriter::new(io::stderr), true)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi),
        )
        .init();

    Ok(())
}
