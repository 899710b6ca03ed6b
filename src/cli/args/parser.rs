//! Module defining the command line argument parser.

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::{NAME, VERSION};
use super::model::{ArgsError, ImageArg, Options};


impl TryFrom<ArgMatches> for Options {
    type Error = ArgsError;

    fn try_from(matches: ArgMatches) -> Result<Self, Self::Error> {
        let verbose_count = matches.get_count(OPT_VERBOSE) as isize;
        let quiet_count = matches.get_count(OPT_QUIET) as isize;
        let verbosity = verbose_count - quiet_count;

        let image = match matches.get_one::<String>(ARG_IMAGE).map(|s| s.trim()) {
            Some("-") | None => ImageArg::Stdin,
            Some(locator) => ImageArg::Locator(locator.to_owned()),
        };
        let text = matches.get_many::<String>(ARG_TEXT)
            .map(|words| words.map(String::as_str).collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ArgsError::EmptyText);
        }

        // Output path can be set explicit to stdout via `-`.
        let output_path = matches.get_one::<String>(OPT_OUTPUT)
            .map(|p| p.trim())
            .filter(|&p| p != "-")
            .map(PathBuf::from);

        let font_path = matches.get_one::<PathBuf>(OPT_FONT).cloned();
        let jpeg_quality = matches.get_one::<u8>(OPT_JPEG_QUALITY).copied();
        let gif_quality = matches.get_one::<u8>(OPT_GIF_QUALITY).copied();

        Ok(Options{verbosity, image, text, output_path, font_path, jpeg_quality, gif_quality})
    }
}


// Parser definition

lazy_static! {
    static ref ABOUT: &'static str = option_env!("CARGO_PKG_DESCRIPTION").unwrap_or("");
}

const ARG_IMAGE: &str = "image";
const ARG_TEXT: &str = "text";
const OPT_OUTPUT: &str = "output";
const OPT_FONT: &str = "font";
const OPT_JPEG_QUALITY: &str = "jpeg-quality";
const OPT_GIF_QUALITY: &str = "gif-quality";
const OPT_VERBOSE: &str = "verbose";
const OPT_QUIET: &str = "quiet";

/// Environment variable that can provide the --font path.
const FONT_ENV_VAR: &str = "MEMECAP_FONT";


/// Create the parser for application's command line.
pub fn create_parser() -> Command {
    let mut parser = Command::new(*NAME);
    if let Some(version) = *VERSION {
        parser = parser.version(version);
    }
    parser
        .about(*ABOUT)
        .dont_collapse_args_in_usage(true)

        // Image & caption.
        .arg(Arg::new(ARG_IMAGE)
            .value_name("IMAGE")
            .required(true)
            .help("Image to caption")
            .long_help(concat!(
                "The image to put the caption on.\n\n",
                "This can be an HTTP(S) URL, a path to a local file, ",
                "or `-` (single dash) to read the image from standard input.")))
        .arg(Arg::new(ARG_TEXT)
            .value_name("TEXT")
            .required(true)
            .num_args(1..)
            .help("Caption text")
            .long_help(concat!(
                "Text of the caption.\n\n",
                "Multiple arguments are joined with spaces. ",
                "The text is drawn in uppercase at the bottom of the image, ",
                "wrapped into at most two lines.")))

        // Output flags.
        .arg(Arg::new(OPT_OUTPUT)
            .long("output").short('o')
            .value_name("PATH")
            .required(false)
            .help("File to write the captioned image to")
            .long_help(concat!(
                "What file should the final image be written to.\n\n",
                "By default, or when this flag is set to `-` (single dash), the image is written ",
                "to standard output so it can be e.g. piped to the ImageMagick `display` program. ",
                "If PATH is a directory, the image is written there as `result.<ext>`.")))

        // Rendering options.
        .arg(Arg::new(OPT_FONT)
            .long("font").short('f')
            .value_name("FONT")
            .env(FONT_ENV_VAR)
            .value_parser(value_parser!(PathBuf))
            .required(false)
            .help("TrueType font file to draw the caption with"))
        .arg(Arg::new(OPT_JPEG_QUALITY)
            .long("jpeg-quality")
            .value_name("PERCENT")
            .value_parser(value_parser!(u8).range(1..=100))
            .required(false)
            .help("Quality of JPEG images produced"))
        .arg(Arg::new(OPT_GIF_QUALITY)
            .long("gif-quality")
            .value_name("PERCENT")
            .value_parser(value_parser!(u8).range(1..=100))
            .required(false)
            .help("Quality of GIF animations produced")
            .long_help(concat!(
                "Quality percentage of GIF images & animations.\n\n",
                "Note that anything higher than 70 is likely to be *very* slow.")))

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
