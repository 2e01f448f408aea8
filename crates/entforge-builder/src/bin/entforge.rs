/// Entity package builder CLI

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use entforge_builder::{BuildRequest, Builder, ConsoleReporter, TransformerFactory};

#[derive(Parser, Debug)]
#[command(name = "entforge")]
#[command(about = "Builds declarative entity sources into deployable extension packages")]
#[command(version)]
struct Args {
    /// Repository root (defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile every project and assemble the extension packages
    Build {
        /// Merge all sub-projects into a single package
        #[arg(long)]
        merged: bool,

        /// Build each sub-project as its own package (the default)
        #[arg(long)]
        separate: bool,

        /// Enable the debug notifier entity and debug metadata
        #[arg(long)]
        debug: bool,
    },

    /// Generate the exported-API declarations file
    Api,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    match args.command {
        Command::Build {
            merged,
            separate,
            debug,
        } => {
            let request = BuildRequest::new(root)
                .merged(merged)
                .separate(separate)
                .debug(debug);
            let builder = Builder::new(request, Box::new(TransformerFactory))
                .reporter(Box::new(ConsoleReporter));

            let endpoints = builder.build()?;
            if !endpoints.is_empty() {
                println!("Deployment endpoints:");
                for endpoint in &endpoints {
                    println!("  {}", endpoint);
                }
            }
        }
        Command::Api => {
            let builder = Builder::new(BuildRequest::new(root), Box::new(TransformerFactory));
            let path = builder.generate_api()?;
            println!("Wrote API declarations to {}", path.display());
        }
    }

    Ok(())
}
