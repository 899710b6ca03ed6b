//!
//! memecapd  -- Captioned memes & rock-paper-scissors over HTTP
//!

             extern crate axum;
             extern crate clap;
#[macro_use] extern crate lazy_static;
             extern crate memecap;
             extern crate serde;
#[macro_use] extern crate serde_json;
             extern crate slog;
             extern crate slog_async;
             extern crate slog_envlogger;
             extern crate slog_scope;
             extern crate slog_stdlog;
             extern crate slog_term;
             extern crate thiserror;
             extern crate tokio;
#[macro_use] extern crate log;

#[cfg(test)]              extern crate http_body_util;
#[cfg(test)]              extern crate image;
#[cfg(test)] #[macro_use] extern crate spectral;
#[cfg(test)]              extern crate tower;
#[cfg(test)]              extern crate url;


mod args;
mod handlers;
mod logging;
mod service;


use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;

use memecap::{EngineBuilder, DEFAULT_FONT_PATH};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tokio::time::timeout;

use crate::args::{ArgsError, Options};
use crate::handlers::Captioner;
use crate::service::{create_router, AppState};


lazy_static! {
    /// Application / package name, as filled out by Cargo.
    static ref NAME: &'static str = option_env!("CARGO_PKG_NAME").unwrap_or("memecapd");

    /// Application version, as filled out by Cargo.
    static ref VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

    /// Application revision, such as Git SHA.
    /// This is generated by a build script and written to an output file.
    static ref REVISION: Option<&'static str> = Some(
        include_str!(concat!(env!("OUT_DIR"), "/revision")).trim()
    ).filter(|r| !r.is_empty());
}


fn main() {
    let opts = args::parse().unwrap_or_else(|e| {
        exit(print_args_error(e));
    });

    let _guard = logging::init(opts.verbosity, (*REVISION).unwrap_or("unknown"))
        .unwrap_or_else(|e| {
            eprintln!("Failed to initialize logging: {}", e);
            exit(1);
        });
    info!("{} {}{}", *NAME,
        (*VERSION).map(|v| format!("v{}", v)).unwrap_or_else(|| "<UNKNOWN VERSION>".into()),
        (*REVISION).map(|r| format!(" (rev. {})", r)).unwrap_or_default());
    if cfg!(debug_assertions) {
        warn!("Debug mode! The server will likely be much slower.");
    }
    trace!("Options parsed from argv:\n{:#?}", opts);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start the async runtime: {}", e);
            return;
        }
    };
    if let Err(e) = runtime.block_on(start_server(opts)) {
        error!("Server stopped with an error: {}", e);
    }
}

/// Print an error that may occur while parsing arguments.
/// Returns the exit code to terminate with.
fn print_args_error(e: ArgsError) -> i32 {
    match e {
        // Usage string, --help and --version are all delivered as clap "errors".
        ArgsError::Parse(ref e) => {
            let _ = e.print();
            e.exit_code()
        }
        e => {
            let _ = writeln!(&mut io::stderr(), "Failed to parse arguments: {}", e);
            2
        }
    }
}


/// Start the server with given options.
/// This function only terminates when the server finishes.
async fn start_server(opts: Options) -> Result<(), Box<dyn Error>> {
    let captioner = create_captioner(&opts)?;
    let state = AppState::new(captioner, opts.match_timeout);
    let app = create_router(state);

    info!("Starting server to listen on {}...", opts.address);
    let listener = TcpListener::bind(opts.address).await?;

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { let _ = stop_rx.await; })
            .await
    });

    debug!("Entering event loop...");
    tokio::select! {
        result = &mut server => return Ok(result??),
        result = signal::ctrl_c() => {
            result?;
            info!("Interrupt received, shutting down...");
        }
    }
    let _ = stop_tx.send(());

    if opts.shutdown_timeout == Duration::from_secs(0) {
        debug!("Not waiting for remaining connections");
        return Ok(());
    }
    match timeout(opts.shutdown_timeout, server).await {
        Ok(result) => {
            result??;
            info!("Server shut down gracefully");
        }
        Err(_) => warn!("Pending connections didn't finish in {} secs, forcing shutdown",
            opts.shutdown_timeout.as_secs()),
    }
    Ok(())
}

fn create_captioner(opts: &Options) -> Result<Captioner, Box<dyn Error>> {
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
    let engine = builder.build()?;

    Ok(Captioner::new(engine, opts.render_threads.unwrap_or(0), opts.request_timeout))
}
