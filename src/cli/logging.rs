//! Module implementing logging for the application.
//!
//! This includes setting up log filtering given a verbosity value,
//! as well as defining how the logs are being formatted to stderr.

use std::env;

use log::SetLoggerError;
use slog::{o, Drain, FilterLevel, Logger};
use slog_envlogger::LogBuilder;
use slog_scope::GlobalLoggerGuard;


/// Environment variable with additional filtering directives, e.g. `memecap=trace`.
const LOG_ENV_VAR: &str = "RUST_LOG";

// Default logging level, i.e. the one used when no -v/-q is given.
const DEFAULT_LEVEL: FilterLevel = FilterLevel::Info;

/// All the logging levels, from the least to the most verbose.
const LEVELS: &[FilterLevel] = &[
    FilterLevel::Off,
    FilterLevel::Critical,
    FilterLevel::Error,
    FilterLevel::Warning,
    FilterLevel::Info,
    FilterLevel::Debug,
    FilterLevel::Trace,
];


/// Initialize logging with given verbosity.
/// The verbosity value has the same meaning as in args::Options::verbosity.
///
/// Returned guard must be kept alive for as long as the logging should work.
pub fn init(verbosity: isize) -> Result<GlobalLoggerGuard, SetLoggerError> {
    let level = level_for(verbosity);

    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();

    let mut builder = LogBuilder::new(drain).filter(None, level);
    if let Ok(directives) = env::var(LOG_ENV_VAR) {
        builder = builder.parse(&directives);
    }
    let drain = slog_async::Async::new(builder.build().fuse()).build().fuse();

    let logger = Logger::root(drain, o!());
    let guard = slog_scope::set_global_logger(logger);
    slog_stdlog::init()?;
    Ok(guard)
}

/// Translate the verbosity count into a logging level.
fn level_for(verbosity: isize) -> FilterLevel {
    let default = LEVELS.iter().position(|&l| l == DEFAULT_LEVEL).unwrap_or(0) as isize;
    let index = (default + verbosity).clamp(0, LEVELS.len() as isize - 1);
    LEVELS[index as usize]
}
