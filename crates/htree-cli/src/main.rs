//! History tree command-line interface
//!
//! Inspects and exercises history tree files.
//!
//! # Usage
//!
//! ```bash
//! # Build a synthetic tree of 10 000 intervals
//! htree generate trace.ht --count 10000 --seed 7
//!
//! # Show the header and summary
//! htree info trace.ht
//!
//! # List every node as JSON
//! htree -o json nodes trace.ht
//!
//! # Intervals intersecting [1000, 2000] with attribute 3
//! htree query trace.ht --start 1000 --end 2000 --attribute 3
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod formatter;

use config::CliConfig;
use formatter::OutputFormat;

/// History tree command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "htree",
    version,
    about = "Inspect and generate history tree files",
    long_about = "Inspect, query and generate history tree files.\n\n\
                  A history tree stores time intervals in fixed-size blocks and\n\
                  answers range queries without loading the whole file."
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output format
    #[arg(short = 'o', long, value_enum, global = true)]
    output: Option<OutputFormatArg>,

    /// Expected provider version of opened files, and version of new ones
    #[arg(long, global = true, env = "HTREE_PROVIDER_VERSION")]
    provider_version: Option<i32>,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the header and summary of a history file
    Info {
        /// History file
        file: PathBuf,
    },
    /// List every node of a history file
    Nodes {
        /// History file
        file: PathBuf,
    },
    /// Print the intervals intersecting a time range
    Query {
        /// History file
        file: PathBuf,
        /// Start of the range, inclusive
        #[arg(long)]
        start: i64,
        /// End of the range, inclusive
        #[arg(long)]
        end: i64,
        /// Only intervals with this attribute
        #[arg(long)]
        attribute: Option<i32>,
    },
    /// Build a synthetic history file
    Generate {
        /// History file to create (overwritten)
        file: PathBuf,
        /// Number of intervals
        #[arg(short = 'n', long, default_value_t = 10_000)]
        count: usize,
        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
        /// Block size in bytes
        #[arg(long)]
        block_size: Option<usize>,
        /// Maximum children per core node
        #[arg(long)]
        max_children: Option<usize>,
    },
}

/// Output format argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Display results in a formatted table
    Table,
    /// Display results as JSON
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let mut config = load_config(&args)?;
    let format = match args.output {
        Some(arg) => arg.into(),
        None => match OutputFormat::from_name(&config.output_format) {
            Some(format) => format,
            None => bail!("unknown output format '{}'", config.output_format),
        },
    };

    let output = match args.command {
        Command::Info { file } => commands::info(&file, &config, format)?,
        Command::Nodes { file } => commands::nodes(&file, &config, format)?,
        Command::Query {
            file,
            start,
            end,
            attribute,
        } => commands::query(&file, &config, start, end, attribute, format)?,
        Command::Generate {
            file,
            count,
            seed,
            block_size,
            max_children,
        } => {
            if let Some(block_size) = block_size {
                config.block_size = block_size;
            }
            if let Some(max_children) = max_children {
                config.max_children = max_children;
            }
            let seed = seed.unwrap_or(config.seed);
            commands::generate(&file, &config, count, seed)?
        }
    };

    println!("{output}");
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("htree=debug,htree_cli=debug,htree_storage=debug")
    } else {
        EnvFilter::new("htree=warn,htree_cli=warn,htree_storage=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<CliConfig> {
    let mut config = if let Some(path) = &args.config {
        CliConfig::from_file(path)?
    } else {
        CliConfig::load_default()?
    };

    if let Some(version) = args.provider_version {
        config.provider_version = version;
    }

    Ok(config)
}
