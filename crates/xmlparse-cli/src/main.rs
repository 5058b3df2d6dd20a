use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use xmlparse::{DumpFormat, DumpOptions, Identifiers, ParserMode, Value, XmlParser};

#[derive(Debug, Parser)]
#[command(
    name = "xmlparse",
    version,
    about = "Extract configured tables from XML documents and write dictionaries back as XML"
)]
struct Args {
    /// Log progress (info level)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse an XML document and print it as JSON
    Parse {
        /// XML file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
        /// JSON configuration with the table tree and paths
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Parser mode
        #[arg(short, long, value_enum, default_value_t = ModeArg::Custom)]
        mode: ModeArg,
        /// JSON file overriding the reserved keys
        #[arg(long, value_name = "FILE")]
        identifiers: Option<PathBuf>,
        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,
    },
    /// Write a JSON dictionary as XML
    Dump {
        /// JSON file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
        /// Shape of the input dictionary
        #[arg(short, long, value_enum, default_value_t = FormatArg::Raw)]
        format: FormatArg,
        /// Root element name for custom dictionaries
        #[arg(long, default_value = xmlparse::DEFAULT_ROOT)]
        root: String,
        /// Header written before the root for custom dictionaries
        #[arg(long, default_value = xmlparse::DEFAULT_HEADER)]
        header: String,
        /// Write XML without indentation
        #[arg(long)]
        compact: bool,
        /// Do not wrap row data in CDATA sections
        #[arg(long)]
        no_cdata: bool,
        /// JSON file overriding the reserved keys
        #[arg(long, value_name = "FILE")]
        identifiers: Option<PathBuf>,
        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Raw,
    Custom,
}

impl From<ModeArg> for ParserMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Raw => ParserMode::Raw,
            ModeArg::Custom => ParserMode::Custom,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Raw,
    Custom,
}

impl From<FormatArg> for DumpFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Raw => DumpFormat::Raw,
            FormatArg::Custom => DumpFormat::Custom,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    match args.command {
        Command::Parse {
            input,
            config,
            mode,
            identifiers,
            output,
            compact,
        } => {
            let mut parser = XmlParser::new(mode.into()).with_identifiers(load_identifiers(&identifiers)?);
            if let Some(config) = config {
                parser = parser.with_config_file(config);
            }
            info!("parsing in {} mode", parser.mode());

            let report = match &input {
                Some(path) => parser.parse_with_report(path),
                None => parser.parse_str_with_report(&read_input(&None)?),
            };
            let json = if compact {
                serde_json::to_string(&report.data)
            } else {
                serde_json::to_string_pretty(&report.data)
            }
            .context("failed to encode result as JSON")?;
            write_output(&output, format!("{json}\n").as_bytes())?;
        }
        Command::Dump {
            input,
            format,
            root,
            header,
            compact,
            no_cdata,
            identifiers,
            output,
        } => {
            let text = read_input(&input)?;
            let data: Value = serde_json::from_str(&text).context("input is not valid JSON")?;
            let parser = XmlParser::default().with_identifiers(load_identifiers(&identifiers)?);
            let options = DumpOptions {
                format: format.into(),
                pretty: !compact,
                cdata: !no_cdata,
                root,
                header,
            };
            let xml = parser
                .dumps(&data, &options)
                .context("failed to render XML")?;
            write_output(&output, xml.as_bytes())?;
        }
    }

    Ok(())
}

fn init_tracing(args: &Args) {
    let default_level = if args.quiet {
        "error"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

fn load_identifiers(path: &Option<PathBuf>) -> Result<Identifiers> {
    let Some(path) = path else {
        return Ok(Identifiers::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read identifiers file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid identifiers file {}", path.display()))
}

fn read_input(path: &Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.trim().is_empty() {
                bail!("no input provided on stdin");
            }
            Ok(buffer)
        }
    }
}

fn write_output(path: &Option<PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
