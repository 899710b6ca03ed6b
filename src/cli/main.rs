//!
//! memecapsh  -- Captioned memes in the shell
//!

             extern crate clap;
             extern crate exitcode;
#[macro_use] extern crate lazy_static;
             extern crate memecap;
             extern crate slog;
             extern crate slog_async;
             extern crate slog_envlogger;
             extern crate slog_scope;
             extern crate slog_stdlog;
             extern crate slog_term;
             extern crate thiserror;
#[macro_use] extern crate log;

#[cfg(test)] #[macro_use] extern crate spectral;


mod args;
mod logging;


use std::env;
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

use memecap::{AcquireError, CaptionError, CaptionOutput, Engine, EngineBuildError,
              EngineBuilder, FontError, ImageSource, DEFAULT_FONT_PATH};

use crate::args::{ArgsError, ImageArg, Options};


lazy_static! {
    /// Application / package name, as filled out by Cargo.
    static ref NAME: &'static str = option_env!("CARGO_PKG_NAME").unwrap_or("memecapsh");

    /// Application version, as filled out by Cargo.
    static ref VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
}


fn main() {
    let opts = args::parse().unwrap_or_else(|e| {
        exit(print_args_error(e));
    });

    let code = {
        let _guard = match logging::init(opts.verbosity) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Failed to initialize logging: {}", e);
                exit(exitcode::SOFTWARE);
            }
        };
        if cfg!(debug_assertions) {
            warn!("Debug mode! The program will likely be much slower.");
        }
        for (i, arg) in env::args().enumerate() {
            debug!("argv[{}] = {:?}", i, arg);
        }
        trace!("Options parsed from argv:\n{:#?}", opts);

        run(opts)
    };
    exit(code);
}

/// Print an error that may occur while parsing arguments.
/// Returns the exit code to terminate with.
fn print_args_error(e: ArgsError) -> exitcode::ExitCode {
    match e {
        // Usage string, --help and --version are all delivered as clap "errors".
        ArgsError::Parse(ref e) => {
            let _ = e.print();
            if e.use_stderr() { exitcode::USAGE } else { exitcode::OK }
        }
        e => {
            let _ = writeln!(&mut io::stderr(), "Failed to parse arguments: {}", e);
            exitcode::USAGE
        }
    }
}


/// Caption the image according to the options and write it to the output.
fn run(opts: Options) -> exitcode::ExitCode {
    let engine = match create_engine(&opts) {
        Ok(e) => e,
        Err(e) => {
            error!("Cannot set up the captioning engine: {}", e);
            return match e {
                EngineBuildError::Font(FontError::NotFound(_)) => exitcode::NOINPUT,
                _ => exitcode::CONFIG,
            };
        }
    };

    let source = match read_source(&opts.image) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let output = match engine.caption(source, &opts.text) {
        Ok(out) => out,
        Err(e) => {
            error!("Error while captioning the image: {}", e);
            return exit_code_for(&e);
        }
    };
    info!("Captioned image: {} bytes of {:?}", output.len(), output.format());

    match write_output(&output, opts.output_path.as_ref()) {
        Ok(()) => exitcode::OK,
        Err(code) => code,
    }
}

fn create_engine(opts: &Options) -> Result<Engine, EngineBuildError> {
    let font_path = opts.font_path.clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FONT_PATH));
    debug!("Using caption font from {}", font_path.display());

    let mut builder = EngineBuilder::new().font_path(font_path);
    if let Some(q) = opts.jpeg_quality {
        builder = builder.jpeg_quality(q);
    }
    if let Some(q) = opts.gif_quality {
        builder = builder.gif_quality(q);
    }
    builder.build()
}

/// Figure out where the image comes from, reading it from stdin if necessary.
fn read_source(image: &ImageArg) -> Result<ImageSource, exitcode::ExitCode> {
    match *image {
        ImageArg::Stdin => {
            trace!("Reading image from standard input...");
            let mut bytes = vec![];
            io::stdin().lock().read_to_end(&mut bytes).map_err(|e| {
                error!("Failed to read image from standard input: {}", e);
                exitcode::IOERR
            })?;
            debug!("Read {} bytes from standard input", bytes.len());
            Ok(ImageSource::Bytes(bytes))
        }
        ImageArg::Locator(ref locator) => ImageSource::from_locator(locator).map_err(|e| {
            error!("{}", e);
            exitcode::NOINPUT
        }),
    }
}

/// Write the final image to given path, or to standard output.
fn write_output(output: &CaptionOutput, path: Option<&PathBuf>) -> Result<(), exitcode::ExitCode> {
    match path {
        Some(path) => {
            let path = output_file_path(path, output);
            trace!("Opening output file {}...", path.display());
            let mut file = fs::OpenOptions::new()
                .create(true).write(true).truncate(true)
                .open(&path).map_err(|e| {
                    error!("Failed to open output file {} for writing: {}", path.display(), e);
                    exitcode::CANTCREAT
                })?;
            debug!("File {} opened successfully", path.display());
            file.write_all(output.bytes()).map_err(|e| {
                error!("Failed to write {}: {}", path.display(), e);
                exitcode::IOERR
            })
        }
        None => {
            trace!("No --output given, using standard output");
            let stdout = io::stdout();
            if stdout.is_terminal() {
                warn!("Standard output is a terminal.");
            }
            let mut stdout = stdout.lock();
            stdout.write_all(output.bytes()).and_then(|()| stdout.flush()).map_err(|e| {
                error!("Failed to write to standard output: {}", e);
                exitcode::IOERR
            })
        }
    }
}

/// Resolve the final output path, using the result's filename if `path` is a directory.
fn output_file_path(path: &Path, output: &CaptionOutput) -> PathBuf {
    if path.is_dir() {
        path.join(output.filename())
    } else {
        path.to_owned()
    }
}

/// Determine the exit code that best corresponds to a captioning error.
fn exit_code_for(e: &CaptionError) -> exitcode::ExitCode {
    match *e {
        CaptionError::EmptyText => exitcode::USAGE,
        CaptionError::Unsupported(..) => exitcode::NOINPUT,
        CaptionError::Acquire(AcquireError::NotFound(..)) => exitcode::NOINPUT,
        CaptionError::Acquire(AcquireError::Io(..)) => exitcode::IOERR,
        CaptionError::Acquire(AcquireError::Scheme(..)) |
        CaptionError::Acquire(AcquireError::InvalidUrl(..)) => exitcode::USAGE,
        CaptionError::Acquire(..) => exitcode::UNAVAILABLE,
        CaptionError::Decode(..) => exitcode::DATAERR,
        CaptionError::Encode(..) => exitcode::SOFTWARE,
    }
}
