//! Module for handling command line arguments.

use std::borrow::Cow;
use std::env;
use std::ffi::OsString;
use std::net::{AddrParseError, SocketAddr};
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use thiserror::Error;

use super::{NAME, VERSION};


/// Parse command line arguments and return `Options` object.
#[inline]
pub fn parse() -> Result<Options, ArgsError> {
    parse_from_argv(env::args_os())
}

/// Parse application options from given array of arguments
/// (*all* arguments, including binary name).
#[inline]
pub fn parse_from_argv<I, T>(argv: I) -> Result<Options, ArgsError>
    where I: IntoIterator<Item=T>, T: Clone + Into<OsString>
{
    let parser = create_parser();
    let matches = parser.try_get_matches_from(argv)?;
    Options::try_from(matches)
}


/// Structure to hold options received from the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Verbosity of the logging output.
    ///
    /// Corresponds to the number of times the -v flag has been passed.
    /// If -q has been used instead, this will be negative.
    pub verbosity: isize,

    /// Address where the server should listen on.
    pub address: SocketAddr,

    /// Font file to draw captions with.
    pub font_path: Option<PathBuf>,
    /// Number of threads to use for image captioning.
    /// If omitted, the actual count will be based on the number of CPUs.
    pub render_threads: Option<usize>,
    /// Quality of GIF animations rendered by the server.
    pub gif_quality: Option<u8>,
    /// Quality of JPEG images produced.
    pub jpeg_quality: Option<u8>,

    /// Maximum time allowed for a single caption request.
    pub request_timeout: Duration,
    /// How long players have to finish a rock-paper-scissors match.
    pub match_timeout: Duration,
    /// Maximum time the server will wait for pending connections to terminate.
    pub shutdown_timeout: Duration,
}

#[allow(dead_code)]
impl Options {
    #[inline]
    pub fn verbose(&self) -> bool { self.verbosity > 0 }
    #[inline]
    pub fn quiet(&self) -> bool { self.verbosity < 0 }
}

impl TryFrom<ArgMatches> for Options {
    type Error = ArgsError;

    fn try_from(matches: ArgMatches) -> Result<Self, Self::Error> {
        let verbose_count = matches.get_count(OPT_VERBOSE) as isize;
        let quiet_count = matches.get_count(OPT_QUIET) as isize;
        let verbosity = verbose_count - quiet_count;

        let address = parse_address(
            matches.get_one::<String>(ARG_ADDR).map(String::as_str).unwrap_or(DEFAULT_ADDRESS))?;

        let font_path = matches.get_one::<PathBuf>(OPT_FONT).cloned();
        let render_threads = match matches.get_one::<String>(OPT_RENDER_THREADS) {
            Some(rt) => Some(rt.parse::<usize>().map_err(ArgsError::RenderThreads)?),
            None => None,
        };
        let gif_quality = match matches.get_one::<String>(OPT_GIF_QUALITY) {
            Some(q) => Some(parse_quality(q).map_err(ArgsError::GifQuality)?),
            None => None,
        };
        let jpeg_quality = match matches.get_one::<String>(OPT_JPEG_QUALITY) {
            Some(q) => Some(parse_quality(q).map_err(ArgsError::JpegQuality)?),
            None => None,
        };

        let request_timeout = parse_secs(&matches, OPT_REQUEST_TIMEOUT)
            .map_err(ArgsError::RequestTimeout)?;
        let match_timeout = parse_secs(&matches, OPT_MATCH_TIMEOUT)
            .map_err(ArgsError::MatchTimeout)?;
        let shutdown_timeout = parse_secs(&matches, OPT_SHUTDOWN_TIMEOUT)
            .map_err(ArgsError::ShutdownTimeout)?;

        Ok(Options{
            verbosity, address,
            font_path, render_threads, gif_quality, jpeg_quality,
            request_timeout, match_timeout, shutdown_timeout,
        })
    }
}

/// Parse the server address, filling in the default host or port if omitted.
fn parse_address(addr: &str) -> Result<SocketAddr, AddrParseError> {
    let mut addr: Cow<str> = addr.trim().into();

    // If the address is just a port (e.g. ":4242"),
    // then we will prepend it with the default host.
    if addr.starts_with(':') && addr.chars().skip(1).all(|c| c.is_ascii_digit()) {
        addr = format!("{}{}", DEFAULT_HOST, addr).into();
    }

    // Alternatively, it can be just an interface address, without a port,
    // in which case we'll add the default port.
    let is_just_ipv4 = addr.contains('.') && !addr.contains(':');
    let is_just_ipv6 = addr.starts_with('[') && addr.ends_with(']');
    if is_just_ipv4 || is_just_ipv6 {
        addr = format!("{}:{}", addr, DEFAULT_PORT).into();
    }

    addr.parse()
}

/// Parse a string into an image quality percentage.
fn parse_quality(s: &str) -> Result<u8, QualityError> {
    match s.trim().parse()? {
        0 => Err(QualityError::Range(0)),
        q if q > 100 => Err(QualityError::Range(q)),
        q => Ok(q),
    }
}

fn parse_secs(matches: &ArgMatches, name: &str) -> Result<Duration, ParseIntError> {
    let secs = matches.get_one::<String>(name).map(String::as_str).unwrap_or("0");
    secs.trim().parse::<u64>().map(Duration::from_secs)
}


/// Error that can occur while parsing of command line arguments.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// General when parsing the arguments.
    #[error("invalid arguments: {0}")]
    Parse(#[from] clap::Error),
    /// Error while parsing the server address.
    #[error("invalid server address: {0}")]
    Address(#[from] AddrParseError),
    #[error("invalid --render-threads: {0}")]
    RenderThreads(#[source] ParseIntError),
    #[error("invalid --gif-quality: {0}")]
    GifQuality(#[source] QualityError),
    #[error("invalid --jpeg-quality: {0}")]
    JpegQuality(#[source] QualityError),
    #[error("invalid --request-timeout: {0}")]
    RequestTimeout(#[source] ParseIntError),
    #[error("invalid --match-timeout: {0}")]
    MatchTimeout(#[source] ParseIntError),
    #[error("invalid --shutdown-timeout: {0}")]
    ShutdownTimeout(#[source] ParseIntError),
}

/// Error that can occur while parsing an --X-quality flag.
#[derive(Debug, Error)]
pub enum QualityError {
    /// Error while parsing the value as number.
    #[error("{0}")]
    Parse(#[from] ParseIntError),
    /// Error for when the quality value is out of range.
    #[error("quality must be between 1 and 100, got {0}")]
    Range(u8),
}


// Parser configuration

lazy_static! {
    static ref ABOUT: &'static str = option_env!("CARGO_PKG_DESCRIPTION").unwrap_or("");
}

const ARG_ADDR: &str = "address";
const OPT_FONT: &str = "font";
const OPT_RENDER_THREADS: &str = "render-threads";
const OPT_GIF_QUALITY: &str = "gif-quality";
const OPT_JPEG_QUALITY: &str = "jpeg-quality";
const OPT_REQUEST_TIMEOUT: &str = "request-timeout";
const OPT_MATCH_TIMEOUT: &str = "match-timeout";
const OPT_SHUTDOWN_TIMEOUT: &str = "shutdown-timeout";
const OPT_VERBOSE: &str = "verbose";
const OPT_QUIET: &str = "quiet";

const FONT_ENV_VAR: &str = "MEMECAP_FONT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 1337;
const DEFAULT_ADDRESS: &str = "0.0.0.0:1337";
// Request & shutdown timeouts are disabled in debug mode unless specifically requested.
const DEFAULT_REQUEST_TIMEOUT: &str = if cfg!(debug_assertions) { "0" } else { "10" };
const DEFAULT_SHUTDOWN_TIMEOUT: &str = if cfg!(debug_assertions) { "0" } else { "30" };
const DEFAULT_MATCH_TIMEOUT: &str = "300";


/// Create the parser for application's command line.
fn create_parser() -> Command {
    let mut parser = Command::new(*NAME);
    if let Some(version) = *VERSION {
        parser = parser.version(version);
    }
    parser
        .about(*ABOUT)
        .dont_collapse_args_in_usage(true)
        .color(clap::ColorChoice::Never)

        .arg(Arg::new(ARG_ADDR)
            .value_name("ADDRESS:PORT")
            .required(false)
            .default_value(DEFAULT_ADDRESS)
            .help("Binds the server to given address")
            .long_help(concat!(
                "The address and/or port for the server to listen on.\n\n",
                "This argument can be an IP address of a network interface, ",
                "optionally followed by colon and a port number. ",
                "Alternatively, a colon and port alone is also allowed, ",
                "in which case the server will listen on all network interfaces.")))

        // Rendering options.
        .arg(Arg::new(OPT_FONT)
            .long("font").short('f')
            .value_name("FONT")
            .env(FONT_ENV_VAR)
            .value_parser(value_parser!(PathBuf))
            .required(false)
            .help("TrueType font file to draw captions with"))
        .arg(Arg::new(OPT_RENDER_THREADS)
            .long("render-threads")
            .value_name("N")
            .required(false)
            .help("Number of render threads to use")
            .long_help(concat!(
                "Maximum number of images captioned at the same time.\n\n",
                "If omitted (or zero), one thread per each CPU core will be used.")))
        .arg(Arg::new(OPT_GIF_QUALITY)
            .long("gif-quality")
            .value_name("PERCENT")
            .required(false)
            .help("Quality of GIF animations produced")
            .long_help(concat!(
                "Quality percentage of GIF animations rendered by the server.\n\n",
                "Note that anything higher than 70 is likely to be *very* slow.")))
        .arg(Arg::new(OPT_JPEG_QUALITY)
            .long("jpeg-quality")
            .value_name("PERCENT")
            .required(false)
            .help("Quality of JPEG images rendered"))

        // Timeout flags.
        .arg(Arg::new(OPT_REQUEST_TIMEOUT)
            .long("request-timeout")
            .value_name("SECS")
            .required(false)
            .default_value(DEFAULT_REQUEST_TIMEOUT)
            .help("Maximum time allowed for a single caption request (secs)"))
        .arg(Arg::new(OPT_MATCH_TIMEOUT)
            .long("match-timeout")
            .value_name("SECS")
            .required(false)
            .default_value(DEFAULT_MATCH_TIMEOUT)
            .help("Time players have to finish a rock-paper-scissors match (secs)"))
        .arg(Arg::new(OPT_SHUTDOWN_TIMEOUT)
            .long("shutdown-timeout")
            .value_name("SECS")
            .required(false)
            .default_value(DEFAULT_SHUTDOWN_TIMEOUT)
            .help("Time to wait for remaining connections during shutdown (secs)"))

        // Verbosity flags.
        .arg(Arg::new(OPT_VERBOSE)
            .long("verbose").short('v')
            .action(ArgAction::Count)
            .conflicts_with(OPT_QUIET)
            .help("Increase logging verbosity"))
        .arg(Arg::new(OPT_QUIET)
            .long("quiet").short('q')
            .action(ArgAction::Count)
            .conflicts_with(OPT_VERBOSE)
            .help("Decrease logging verbosity"))
}


#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use spectral::prelude::*;

    use crate::NAME;
    use super::parse_from_argv;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn no_args() {
        assert_that!(parse_from_argv(Vec::<&str>::new())).is_ok();
        let opts = parse_from_argv(vec![*NAME]).unwrap();
        assert_eq!(addr("0.0.0.0:1337"), opts.address);
        assert_eq!(Duration::from_secs(300), opts.match_timeout);
    }

    #[test]
    fn verbosity_args() {
        assert_that!(parse_from_argv(vec![*NAME, "-v"])).is_ok();
        assert_that!(parse_from_argv(vec![*NAME, "-v", "-v"])).is_ok();
        assert_eq!(2, parse_from_argv(vec![*NAME, "-vv"]).unwrap().verbosity);
        assert_eq!(-1, parse_from_argv(vec![*NAME, "-q"]).unwrap().verbosity);
        // -v & -q are contradictory
        assert_that!(parse_from_argv(vec![*NAME, "-q", "-v"])).is_err();
    }

    #[test]
    fn address_arg() {
        assert_that!(parse_from_argv(vec![*NAME, ":"])).is_err();
        // IP addresses alone are fine.
        assert_that!(parse_from_argv(vec![*NAME, "127.0.0.1"])).is_ok();
        assert_that!(parse_from_argv(vec![*NAME, "[0::1]"])).is_ok();
        // Port alone is fine, with colon.
        assert_that!(parse_from_argv(vec![*NAME, ":1234"])).is_ok();
        assert_that!(parse_from_argv(vec![*NAME, ":31337"])).is_ok();
        // Both are fine.
        assert_that!(parse_from_argv(vec![*NAME, "127.0.0.1:2345"])).is_ok();
        assert_that!(parse_from_argv(vec![*NAME, "[0::1]:2345"])).is_ok();
        assert_that!(parse_from_argv(vec![*NAME, "[::1]:2345"])).is_ok();
        // Invalid address.
        assert_that!(parse_from_argv(vec![*NAME, "0.0.1"])).is_err();
        assert_that!(parse_from_argv(vec![*NAME, "[::1"])).is_err();
        assert_that!(parse_from_argv(vec![*NAME, "127.0.0.1:"])).is_err();
        // Invalid port.
        assert_that!(parse_from_argv(vec![*NAME, "4242"])).is_err();  // need colon
        assert_that!(parse_from_argv(vec![*NAME, ":123456789"])).is_err();  // >65536
    }

    #[test]
    fn port_alone_uses_default_host() {
        let opts = parse_from_argv(vec![*NAME, ":4242"]).unwrap();
        assert_eq!(addr("0.0.0.0:4242"), opts.address);
        let opts = parse_from_argv(vec![*NAME, "127.0.0.1"]).unwrap();
        assert_eq!(addr("127.0.0.1:1337"), opts.address);
    }

    #[test]
    fn render_threads_arg() {
        // Needs a value.
        assert_that!(parse_from_argv(vec![*NAME, "--render-threads"])).is_err();
        // Value must be a number.
        assert_that!(parse_from_argv(vec![*NAME, "--render-threads", "foo"])).is_err();
        // A positive number.
        assert_that!(parse_from_argv(vec![*NAME, "--render-threads", "-42"])).is_err();
        // This is fine.
        assert_eq!(Some(16),
            parse_from_argv(vec![*NAME, "--render-threads", "16"]).unwrap().render_threads);
    }

    #[test]
    fn gif_quality_arg() {
        // Needs a value.
        assert_that!(parse_from_argv(vec![*NAME, "--gif-quality"])).is_err();
        // Value must be a number.
        assert_that!(parse_from_argv(vec![*NAME, "--gif-quality", "foo"])).is_err();
        // A positive number.
        assert_that!(parse_from_argv(vec![*NAME, "--gif-quality", "-42"])).is_err();
        assert_that!(parse_from_argv(vec![*NAME, "--gif-quality", "0"])).is_err();
        // Within range.
        assert_that!(parse_from_argv(vec![*NAME, "--gif-quality", "169"])).is_err();
        // This is fine.
        assert_that!(parse_from_argv(vec![*NAME, "--gif-quality", "65"])).is_ok();
    }

    #[test]
    fn jpeg_quality_arg() {
        assert_that!(parse_from_argv(vec![*NAME, "--jpeg-quality"])).is_err();
        assert_that!(parse_from_argv(vec![*NAME, "--jpeg-quality", "foo"])).is_err();
        assert_that!(parse_from_argv(vec![*NAME, "--jpeg-quality", "169"])).is_err();
        assert_eq!(Some(65),
            parse_from_argv(vec![*NAME, "--jpeg-quality", "65"]).unwrap().jpeg_quality);
    }

    #[test]
    fn timeout_args() {
        let opts = parse_from_argv(vec![
            *NAME, "--request-timeout", "5", "--match-timeout", "60"]).unwrap();
        assert_eq!(Duration::from_secs(5), opts.request_timeout);
        assert_eq!(Duration::from_secs(60), opts.match_timeout);
        assert_that!(parse_from_argv(vec![*NAME, "--match-timeout", "soon"])).is_err();
    }
}
