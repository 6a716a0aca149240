use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use docql::config::Config;
use docql::meta::{compile_with, AnnotationSet, MetaIndex};
use docql::query::explain;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Compile document schema annotations and inspect the queries they produce
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Config file (defaults to <config dir>/docql/config.toml)
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the compiled meta schema as JSON
    Meta {
        /// Annotation file (.toml or .json)
        annotations: PathBuf,
    },
    /// Print the select and count queries for a type
    Explain {
        /// Annotation file (.toml or .json)
        annotations: PathBuf,
        /// Type to query
        #[arg(long = "type")]
        typename: String,
        /// Filter input as JSON, e.g. '{"name_eq": "Alice"}'
        #[arg(long = "where")]
        filter: Option<String>,
        /// Sort input as JSON, e.g. '{"name_ASC": 1}'
        #[arg(long)]
        sort: Option<String>,
        /// Extra columns to project, comma separated
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    match cli.command {
        Command::Meta { annotations } => {
            let set = load_annotations(&annotations)?;
            let schema = compile_with(&set.types, &config.schema.compile_options())?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Command::Explain {
            annotations,
            typename,
            filter,
            sort,
            columns,
        } => {
            let set = load_annotations(&annotations)?;
            let schema = compile_with(&set.types, &config.schema.compile_options())?;
            let index = MetaIndex::new(schema);
            let filter = parse_json_arg("--where", filter.as_deref())?;
            let sort = parse_json_arg("--sort", sort.as_deref())?;
            let explained = explain(&index, &typename, &columns, &filter, &sort)?;
            println!("{}", serde_json::to_string_pretty(&explained)?);
        }
    }
    Ok(())
}

fn load_annotations(path: &Path) -> Result<AnnotationSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read annotations: {}", path.display()))?;
    let set = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON annotations: {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML annotations: {}", path.display()))?,
        _ => bail!(
            "Unsupported annotation file {} (expected .toml or .json)",
            path.display()
        ),
    };
    Ok(set)
}

fn parse_json_arg(name: &str, raw: Option<&str>) -> Result<Value> {
    match raw {
        Some(text) => serde_json::from_str(text).with_context(|| format!("{name} is not valid JSON")),
        None => Ok(Value::Null),
    }
}
