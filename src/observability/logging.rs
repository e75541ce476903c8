//! Structured logging initialization.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber exactly once, at process start
//! - Route output to `stdout.log` under the configured log directory, or to
//!   stdout when no directory is set
//! - Honor `RUST_LOG` over the configured filter

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// File handle clonable per log line; fmt writers are constructed per event.
struct SharedFile(Arc<fs::File>);

impl io::Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut &*self.0, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(&mut &*self.0)
    }
}

/// Initialize the global tracing subscriber.
pub fn init(config: &LogConfig) -> io::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    match &config.dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(Path::new(dir).join("stdout.log"))?;
            let file = Arc::new(file);
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(move || SharedFile(Arc::clone(&file))),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}
