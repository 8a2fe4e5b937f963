//! pdf-recolor binary
//!
//! Converts PDFs to a reading color scheme from the command line.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use recolor::{Config, Mode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pdf-recolor")]
#[command(version, about = "Convert PDFs to eye-friendly color schemes")]
struct Cli {
    /// Configuration file (defaults to $PDF_RECOLOR_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a PDF to a color scheme
    Convert(ConvertArgs),
    /// List the available color schemes
    Schemes {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render one page to PNG
    Preview(PreviewArgs),
    /// Check that a file is a readable PDF and show its page count
    Info {
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ConvertArgs {
    input: PathBuf,

    /// Output path (default: <input>_converted.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Color scheme name
    #[arg(short, long)]
    scheme: Option<String>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Leave page-sized white fills alone
    #[arg(long)]
    keep_page_fills: bool,

    /// Write rewritten streams uncompressed
    #[arg(long)]
    no_compress: bool,

    /// Also write a PNG preview of the converted document
    #[arg(long, value_name = "PNG")]
    preview: Option<PathBuf>,

    /// Print the conversion report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    input: PathBuf,

    /// Output path (default: <input>_page<N>.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Page index, starting at 0
    #[arg(long)]
    page: Option<usize>,

    #[arg(long)]
    dpi: Option<u32>,

    /// Preview the page as it looks after converting to this scheme
    #[arg(short, long)]
    scheme: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    /// Recolor text in place, keeping images and vector art
    Remap,
    /// Redraw text only on fresh pages
    Rebuild,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Remap => Mode::Remap,
            ModeArg::Rebuild => Mode::Rebuild,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // stdout carries reports and JSON, logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Convert(args) => commands::convert(args, config).await,
        Command::Schemes { json } => commands::schemes(&config, json),
        Command::Preview(args) => commands::preview(args, &config),
        Command::Info { input } => commands::info(&input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_convert_with_overrides() {
        let cli = Cli::try_parse_from([
            "pdf-recolor",
            "convert",
            "paper.pdf",
            "-o",
            "dark.pdf",
            "-s",
            "dark-mode",
            "--mode",
            "rebuild",
            "--keep-page-fills",
        ])
        .unwrap();

        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.input, PathBuf::from("paper.pdf"));
        assert_eq!(args.output, Some(PathBuf::from("dark.pdf")));
        assert_eq!(args.scheme.as_deref(), Some("dark-mode"));
        assert_eq!(args.mode, Some(ModeArg::Rebuild));
        assert!(args.keep_page_fills);
        assert!(!args.no_compress);
        assert!(!args.json);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pdf-recolor", "schemes", "--json", "-v", "--config", "c.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(matches!(cli.command, Command::Schemes { json: true }));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["pdf-recolor", "convert", "a.pdf", "--mode", "invert"]).is_err());
    }

    #[test]
    fn preview_defaults_come_from_config() {
        let cli = Cli::try_parse_from(["pdf-recolor", "preview", "a.pdf"]).unwrap();
        let Command::Preview(args) = cli.command else {
            panic!("expected preview");
        };
        assert_eq!(args.page, None);
        assert_eq!(args.dpi, None);
    }

    #[test]
    fn mode_arg_maps_to_mode() {
        assert_eq!(Mode::from(ModeArg::Remap), Mode::Remap);
        assert_eq!(Mode::from(ModeArg::Rebuild), Mode::Rebuild);
    }
}
