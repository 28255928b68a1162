use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod report;
use report::{convert, info, read_input, test_roundtrip};

/// xgm command line tools
#[derive(Parser)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show summary info for a VGM or XGM file (accepts .vgm/.vgz/.xgm; use '-' for stdin)
    Info {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Compile a VGM chip log into an XGM container
    Convert {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Output path (defaults to the input path with an .xgm extension)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
    /// Run serialize -> re-parse roundtrip test and compare results
    Test {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print detailed diagnostics on mismatch
        #[arg(long = "diag")]
        diag: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file } => {
            let bytes = read_input(&file)?;
            info(&file, bytes)?;
        }
        Commands::Convert { file, output } => {
            let bytes = read_input(&file)?;
            convert(&file, output, bytes)?;
        }
        Commands::Test { file, diag } => {
            let bytes = read_input(&file)?;
            test_roundtrip(&file, bytes, diag)?;
        }
    }

    Ok(())
}
