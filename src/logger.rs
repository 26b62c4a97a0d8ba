use std::io::Write;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

struct QsLogger {
    filter: LevelFilter,
    start: Instant,
}

impl Log for QsLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.start.elapsed().as_secs_f64();
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{elapsed:.3}s] [{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Pick the log level: `RUST_LOG` if it parses, else `Info` when verbose, else `Warn`.
#[must_use]
pub fn level_filter(rust_log: Option<&str>, verbose: bool) -> LevelFilter {
    rust_log
        .and_then(|s| s.parse().ok())
        .unwrap_or(if verbose {
            LevelFilter::Info
        } else {
            LevelFilter::Warn
        })
}

/// Install the stderr logger. Call once, before any logging.
///
/// # Errors
///
/// Returns `SetLoggerError` if a logger is already installed.
pub fn init(verbose: bool) -> Result<(), SetLoggerError> {
    let filter = level_filter(std::env::var("RUST_LOG").ok().as_deref(), verbose);
    let logger = QsLogger {
        filter,
        start: Instant::now(),
    };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(filter);
    Ok(())
}
