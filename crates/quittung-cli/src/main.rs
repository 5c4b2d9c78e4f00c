mod commands;
mod output;

use clap::{Parser, Subcommand};
use quittung_core::config::Settings;
use quittung_core::error::QuittungError;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "quittung",
    version,
    about = "Extract line items from PDF receipts into spreadsheets"
)]
struct Cli {
    /// Increase log detail (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every PDF in the input directory
    Run {
        /// Directory with the receipts to process
        #[arg(long, value_name = "DIR")]
        input_dir: Option<PathBuf>,

        /// Directory receiving the spreadsheets
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
    /// Print an exported report spreadsheet
    Inspect {
        /// Path to an xlsx report
        file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Print the extraction template used at a given offset
    Template {
        /// Points removed from the bottom of the region
        #[arg(long, default_value_t = 0)]
        offset: u32,

        /// Full-page template file (default: built-in A4 template)
        #[arg(long, value_name = "FILE")]
        baseline: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || execute(cli));

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<(), QuittungError> {
    match cli.command {
        Commands::Run {
            input_dir,
            output_dir,
        } => {
            let mut settings = load_settings(cli.config)?;
            if let Some(dir) = input_dir {
                settings.paths.input_dir = dir;
            }
            if let Some(dir) = output_dir {
                settings.paths.output_dir = dir;
            }
            commands::run::run(&settings)
        }
        Commands::Inspect { file, output } => commands::inspect::run(&file, &output),
        Commands::Template { offset, baseline } => commands::template::run(offset, baseline),
    }
}

fn load_settings(path: Option<PathBuf>) -> Result<Settings, QuittungError> {
    match path {
        Some(p) => Settings::from_file(&p),
        None => Ok(Settings::default()),
    }
}
