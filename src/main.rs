use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use kgenrich::config::Config;
use kgenrich::extractor::{EntityAnalyzer, EntityKind, EntityParser, collect_source_files};
use kgenrich::graph::{GraphEnricher, SqliteGraph, index_repository};
use kgenrich::logging::init_logging;
use kgenrich::ollama::{LanguageModel, OllamaClient};

const FIBONACCI_SNIPPET: &str = r#"
def calculate_fibonacci(n):
    """Calculate the nth Fibonacci number."""
    if n <= 1:
        return n
    return calculate_fibonacci(n-1) + calculate_fibonacci(n-2)
"#;

#[derive(Parser)]
#[command(name = "kgenrich")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file; environment variables still override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a Python file or directory and print the entities as JSON
    Analyze { path: PathBuf },

    /// Seed a SQLite graph with class, function and method nodes
    Index {
        repo: PathBuf,

        #[arg(short, long)]
        graph: PathBuf,
    },

    /// Annotate existing graph nodes with model output
    Enrich {
        repo: PathBuf,

        #[arg(short, long)]
        graph: PathBuf,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env(),
    };
    config.validate().context("invalid configuration")?;

    match cli.command {
        None => run_check(&config),
        Some(Commands::Analyze { path }) => run_analyze(&config, &path),
        Some(Commands::Index { repo, graph }) => run_index(&repo, &graph),
        Some(Commands::Enrich { repo, graph }) => run_enrich(&config, &repo, &graph),
    }
}

/// Confirm the model is installed and analyze a known snippet.
fn run_check(config: &Config) -> Result<()> {
    let client = OllamaClient::new(&config.ollama)?;

    if !client.is_available() {
        println!("Ollama model {} not available", client.model_name());
        println!("Install with: ollama pull {}", client.model_name());
        return Ok(());
    }
    println!("Ollama model {} is available", client.model_name());

    let analyzer = EntityAnalyzer::new(&client)?.with_temperature(config.ollama.temperature);
    let purpose = analyzer.extract_code_purpose(
        FIBONACCI_SNIPPET,
        "calculate_fibonacci",
        EntityKind::Function,
    );
    let complexity = analyzer.assess_complexity(FIBONACCI_SNIPPET);

    println!("Purpose: {purpose}");
    println!("Complexity: {complexity}");
    Ok(())
}

fn run_analyze(config: &Config, path: &Path) -> Result<()> {
    let client = OllamaClient::new(&config.ollama)?;
    let analyzer = EntityAnalyzer::new(&client)?.with_temperature(config.ollama.temperature);

    let files = if path.is_dir() {
        collect_source_files(path)
    } else {
        vec![path.to_path_buf()]
    };

    let entities = analyzer.analyze_files(&files);
    println!("{}", serde_json::to_string_pretty(&entities)?);
    Ok(())
}

fn run_index(repo: &Path, graph_path: &Path) -> Result<()> {
    let graph = SqliteGraph::open(graph_path)
        .with_context(|| format!("failed to open graph {}", graph_path.display()))?;
    let parser = EntityParser::new()?;

    let summary = index_repository(&graph, &parser, repo)?;
    println!(
        "Indexed {} files ({} failed): {} classes, {} functions, {} methods",
        summary.files, summary.failed, summary.classes, summary.functions, summary.methods
    );
    Ok(())
}

fn run_enrich(config: &Config, repo: &Path, graph_path: &Path) -> Result<()> {
    let mut graph = SqliteGraph::open(graph_path)
        .with_context(|| format!("failed to open graph {}", graph_path.display()))?;
    let client = OllamaClient::new(&config.ollama)?;
    let analyzer = EntityAnalyzer::new(&client)?.with_temperature(config.ollama.temperature);

    info!("Enriching {} from {}", graph_path.display(), repo.display());
    let report = GraphEnricher::from_analyzer(analyzer).enhance_knowledge_graph(repo, &mut graph);

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
