//! playground: build previews of a project directory from the command line.
//!
//! ```bash
//! # Write the preview document for ./my-app
//! playground build ./my-app --out preview.html
//!
//! # Print the file tree as JSON
//! playground tree ./my-app
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use playground_native::{build_preview, build_tree, import_directory, PreviewOptions};

#[derive(Parser)]
#[command(name = "playground", author, version, about = "Bundle and preview a project directory")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle a directory and write the generated preview document
    Build {
        dir: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,

        /// JSON file with preview options
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the tree view of a directory as JSON
    Tree { dir: PathBuf },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_options(config: Option<&PathBuf>) -> Result<PreviewOptions> {
    let Some(path) = config else {
        return Ok(PreviewOptions::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    PreviewOptions::from_json_str(&raw)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { dir, out, config } => {
            let options = load_options(config.as_ref())?;
            let snapshot = import_directory(&dir)
                .with_context(|| format!("failed to import {}", dir.display()))?;
            let build = build_preview(&snapshot, &options)?;
            tracing::info!(entry = ?build.document.entry, modules = build.bundle.modules.len(), "preview built");

            match out {
                Some(path) => fs::write(&path, &build.document.html)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{}", build.document.html),
            }
        }
        Commands::Tree { dir } => {
            let snapshot = import_directory(&dir)
                .with_context(|| format!("failed to import {}", dir.display()))?;
            let tree = build_tree(snapshot.paths());
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
    }

    Ok(())
}
