mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "code_graph=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Cli::parse();

    match args.command {
        Commands::Analyze { path, output } => {
            let Some(path) = path else {
                eprintln!("usage: code-graph analyze <path> [--output FILE]");
                std::process::exit(1);
            };
            cli::analyze(&path, output)?;
        }
        Commands::Serve { path, host, port } => {
            cli::serve(&path, &host, port).await?;
        }
        Commands::Trace {
            target,
            chdir,
            args,
        } => {
            cli::trace_program(&target, chdir, &args)?;
        }
    }

    Ok(())
}
