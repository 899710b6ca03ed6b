//! Module implementing logging for the server.

use std::env;

use log::SetLoggerError;
use slog::{o, Drain, FilterLevel, Logger};
use slog_envlogger::LogBuilder;
use slog_scope::GlobalLoggerGuard;


const LOG_ENV_VAR: &str = "RUST_LOG";

/// Logging levels ordered by verbosity, with index of the default one.
const LEVELS: &[FilterLevel] = &[
    FilterLevel::Off,
    FilterLevel::Critical,
    FilterLevel::Error,
    FilterLevel::Warning,
    FilterLevel::Info,
    FilterLevel::Debug,
    FilterLevel::Trace,
];
const DEFAULT_LEVEL_INDEX: isize = 4;


/// Initialize logging with given verbosity
/// (positive for each -v flag, negative for each -q).
///
/// Log lines carry timestamps & the server's revision.
pub fn init(verbosity: isize, revision: &'static str) -> Result<GlobalLoggerGuard, SetLoggerError> {
    let index = (DEFAULT_LEVEL_INDEX + verbosity).clamp(0, LEVELS.len() as isize - 1);
    let level = LEVELS[index as usize];

    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();

    let mut builder = LogBuilder::new(drain).filter(None, level);
    if let Ok(directives) = env::var(LOG_ENV_VAR) {
        builder = builder.parse(&directives);
    }
    let drain = slog_async::Async::new(builder.build().fuse())
        .thread_name("logger".into())
        .build().fuse();

    let logger = Logger::root(drain, o!("rev" => revision));
    let guard = slog_scope::set_global_logger(logger);
    slog_stdlog::init()?;
    Ok(guard)
}
