//! Fabula CLI - Command-line interface
//!
//! Usage:
//!   fabula extract <doc.json> [--config fabula.toml] [--format json|dot|triples]
//!   fabula entities <doc.json>
//!   fabula stats <doc.json>
//!
//! The input document is the annotation engine's JSON output; see the
//! `AnnotatedDocument` contract in fabula-core.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use fabula_core::{AnnotatedDocument, ExtractionConfig};
use fabula_extractor::{ExtractionOutcome, Pipeline};
use fabula_graph::{export, GraphAssembler, GraphExport, NarrativeGraph};

#[derive(Parser)]
#[command(name = "fabula")]
#[command(about = "Narrative relation-extraction-to-graph pipeline")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a graph from an annotated document
    Extract {
        /// Annotated document (JSON)
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the entities the filter admits
    Entities {
        /// Annotated document (JSON)
        input: PathBuf,
    },
    /// Print extraction statistics
    Stats {
        /// Annotated document (JSON)
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Node/edge listing as JSON
    Json,
    /// Graphviz DOT
    Dot,
    /// Flat (subject, relation, object) rows as JSON
    Triples,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            input,
            format,
            output,
        } => {
            let (outcome, graph) = run_pipeline(&config, &input)?;
            tracing::info!(
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                misses = outcome.stats.misses,
                "graph assembled"
            );

            let rendered = match format {
                OutputFormat::Json => GraphExport::from_graph(&graph).to_json()?,
                OutputFormat::Dot => export::to_dot(&graph),
                OutputFormat::Triples => {
                    serde_json::to_string_pretty(&GraphExport::from_graph(&graph).triples())?
                }
            };

            match output {
                Some(path) => fs::write(&path, rendered)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{rendered}"),
            }
        }
        Commands::Entities { input } => {
            let (outcome, _) = run_pipeline(&config, &input)?;
            for entity in &outcome.entities {
                println!("{}\t{}", entity.key, entity.label);
            }
        }
        Commands::Stats { input } => {
            let (outcome, graph) = run_pipeline(&config, &input)?;
            println!("sentences:  {}", outcome.stats.sentences);
            println!("triples:    {}", outcome.stats.triples_emitted);
            println!("misses:     {}", outcome.stats.misses);
            println!("seeded:     {}", outcome.stats.seeded_entities);
            println!("nodes:      {}", graph.node_count());
            println!("edges:      {}", graph.edge_count());
        }
    }

    Ok(())
}

/// Load and validate configuration; environment variables override the file
fn load_config(path: Option<&Path>) -> Result<ExtractionConfig> {
    let config = match path {
        Some(path) => ExtractionConfig::from_file(path)?,
        None => ExtractionConfig::default(),
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

/// Read a document, run extraction, and assemble the graph
fn run_pipeline(
    config: &ExtractionConfig,
    input: &Path,
) -> Result<(ExtractionOutcome, NarrativeGraph)> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let doc = AnnotatedDocument::from_json(&raw)?;

    let pipeline = Pipeline::from_config(config)?;
    tracing::debug!(
        strategy = pipeline.strategy_name(),
        sentences = doc.sentences.len(),
        "running extraction"
    );

    let outcome = pipeline.run(&doc);
    let graph = GraphAssembler::new(config.graph.clone())
        .assemble(&outcome.entities, &outcome.triples)?;

    Ok((outcome, graph))
}
