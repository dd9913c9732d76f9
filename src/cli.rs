use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use code_graph::analyzer::CodeAnalyzer;
use code_graph::graph::GraphWriter;
use code_graph::{server, trace};

#[derive(Parser)]
#[command(name = "code-graph")]
#[command(about = "Static knowledge-graph builder for Python codebases")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a source tree and write the knowledge graph
    Analyze {
        /// Root of the Python source tree
        path: Option<PathBuf>,

        /// Output file (default: knowledge_graph.json next to the executable)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Analyze a source tree, then serve the result over HTTP
    Serve {
        /// Root of the Python source tree
        path: PathBuf,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value = "8000")]
        port: u16,
    },

    /// Run a Python program under the call tracer
    Trace {
        /// Script path, directory, or importable module name
        target: String,

        /// Run the program from its own directory
        #[arg(long)]
        chdir: bool,

        /// Arguments forwarded to the traced program
        #[arg(last = true)]
        args: Vec<String>,
    },
}

pub fn analyze(path: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("path does not exist: {}", path.display());
    }
    let graph = CodeAnalyzer::new().analyse(path)?;
    let writer = output
        .map(GraphWriter::new)
        .unwrap_or_else(GraphWriter::default_location);
    writer.save(&graph)?;
    println!("{}", serde_json::to_string_pretty(&graph)?);
    Ok(())
}

pub async fn serve(path: &Path, host: &str, port: u16) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("path does not exist: {}", path.display());
    }
    let graph = CodeAnalyzer::new().analyse(path)?;
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    server::serve(graph.elements, addr).await?;
    Ok(())
}

pub fn trace_program(target: &str, chdir: bool, args: &[String]) -> anyhow::Result<()> {
    let written = trace::run_trace(target, chdir, args)?;
    println!("runtime calls written to {}", written.display());
    Ok(())
}
