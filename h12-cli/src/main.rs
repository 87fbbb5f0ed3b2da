use anyhow::Result;
use clap::{Parser, Subcommand};
use h12_cli::{build_cmd, check_cmd};
use h12_transform::TransformOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "h12", version, about = "h12 template transform")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite template regions in a file or directory of Rust sources.
    Build {
        /// A .rs file or a directory searched for .rs files
        input: PathBuf,
        /// Output directory (default: target/h12-gen)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Bound on nested template regions
        #[arg(long, default_value_t = 16)]
        max_depth: usize,
    },
    /// Transform and validate without writing anything.
    Check {
        input: PathBuf,
        #[arg(long, default_value_t = 16)]
        max_depth: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build {
            input,
            out_dir,
            max_depth,
        } => {
            let options = TransformOptions::default().max_depth(max_depth);
            let written = build_cmd(&input, out_dir.as_deref(), options)?;
            println!("Generated {} file(s)", written.len());
        }
        Commands::Check { input, max_depth } => {
            let options = TransformOptions::default().max_depth(max_depth);
            let checked = check_cmd(&input, options)?;
            println!("Checked {checked} file(s)");
        }
    }
    Ok(())
}
