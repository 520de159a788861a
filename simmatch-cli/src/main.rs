mod bundle;
mod config;

use chrono::Local;
use clap::{Parser, Subcommand};
use config::Config;
use serde::{Deserialize, Serialize};
use simmatch::collection::stage_upload;
use simmatch::{DirCollection, FailureKind, SearchResult, SimilaritySearch};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "SimMatch CLI (JSON config driven)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    /// Print the JSON schema of the search config and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example search config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long, global = true)]
    trace: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search a directory collection for images similar to a query.
    Search {
        /// Path to the JSON configuration file.
        #[arg(short, long, value_name = "FILE", default_value = "config.json")]
        config: PathBuf,
    },
    /// Stage an image into a directory collection under a timestamped name.
    Ingest {
        /// Collection directory.
        #[arg(short, long, value_name = "DIR")]
        dir: PathBuf,
        /// Image to stage.
        file: PathBuf,
        /// Name to stage under instead of the file's own name.
        #[arg(long)]
        name: Option<String>,
    },
    /// Pack images into a .tar.gz archive.
    Bundle {
        /// Archive to create.
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        /// Search output whose matches should be bundled.
        #[arg(long, value_name = "FILE")]
        results: Option<PathBuf>,
        /// Only bundle matches with these ids.
        #[arg(long = "select", value_name = "ID")]
        select: Vec<String>,
        /// Additional files to bundle.
        files: Vec<PathBuf>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct MatchRecord {
    id: String,
    location: String,
    score: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct FailureRecord {
    id: String,
    location: String,
    kind: String,
    reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StatsRecord {
    listed: usize,
    visited: usize,
    excluded: usize,
    unvisited: usize,
    truncated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct Output {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    staged: Option<String>,
    matches: Vec<MatchRecord>,
    failure_count: usize,
    failures: Vec<FailureRecord>,
    stats: StatsRecord,
}

impl Output {
    fn from_result(result: SearchResult, staged: Option<String>) -> Self {
        let failures = result
            .failures
            .iter()
            .map(|f| FailureRecord {
                id: f.id.clone(),
                location: f.location.clone(),
                kind: match f.kind {
                    FailureKind::Read => "read",
                    FailureKind::Decode => "decode",
                }
                .to_string(),
                reason: f.reason.clone(),
            })
            .collect();
        Self {
            staged,
            matches: result
                .matches
                .into_iter()
                .map(|m| MatchRecord {
                    id: m.id,
                    location: m.location,
                    score: m.score,
                })
                .collect(),
            failure_count: result.failures.count(),
            failures,
            stats: StatsRecord {
                listed: result.stats.listed,
                visited: result.stats.visited,
                excluded: result.stats.excluded,
                unvisited: result.stats.unvisited,
                truncated: result.stats.truncated,
            },
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn display_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("upload")
}

fn run_search(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config_text = fs::read_to_string(config_path)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.collection_dir.as_os_str().is_empty() || config.query_path.as_os_str().is_empty() {
        return Err("collection_dir and query_path must be set in the config".into());
    }
    if config.stage_query && config.exclude.is_some() {
        return Err("exclude cannot be combined with stage_query".into());
    }
    // Before any decode or staging: a rejected query must leave no trace.
    let threshold = simmatch::Threshold::new(config.threshold)?;

    let search = SimilaritySearch::new(config.search_config())?;
    let query = fs::read(&config.query_path)?;
    // Decode up front so an unusable query is never staged.
    let normalized = search.normalizer().normalize(&query)?;

    let staged = if config.stage_query {
        let record = stage_upload(
            &config.collection_dir,
            display_name(&config.query_path),
            &query,
            &timestamp(),
        )?;
        tracing::info!(id = %record.id, "staged query");
        Some(record.id)
    } else {
        None
    };
    let exclude = staged.as_deref().or(config.exclude.as_deref());

    let collection = DirCollection::open(&config.collection_dir)?;
    let result = search.find_similar_normalized(&normalized, threshold, &collection, exclude)?;
    for failure in result.failures.iter() {
        tracing::warn!(id = %failure.id, reason = %failure.reason, "skipped candidate");
    }

    if let Some(bundle_path) = &config.bundle_path {
        let files: Vec<PathBuf> = result
            .matches
            .iter()
            .map(|m| PathBuf::from(&m.location))
            .collect();
        if files.is_empty() {
            tracing::warn!("no matches, bundle not written");
        } else {
            bundle::write_bundle(bundle_path, &files)?;
        }
    }

    let output = Output::from_result(result, staged);
    let json = serde_json::to_string_pretty(&output)?;
    match &config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn run_ingest(
    dir: &Path,
    file: &Path,
    name: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(file)?;
    // Reject files the search could never read.
    simmatch::io::decode(&bytes)?;
    let name = name.unwrap_or_else(|| display_name(file));
    let record = stage_upload(dir, name, &bytes, &timestamp())?;
    println!("{}", serde_json::json!({ "id": record.id, "location": record.location }));
    Ok(())
}

/// Locations of the matches named in `select`, or of all matches when
/// `select` is empty. Repeated ids count once.
fn select_locations(
    matches: Vec<MatchRecord>,
    select: &[String],
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let wanted: BTreeSet<&str> = select.iter().map(String::as_str).collect();
    let mut files = Vec::new();
    for m in matches {
        if wanted.is_empty() || wanted.contains(m.id.as_str()) {
            files.push(PathBuf::from(m.location));
        }
    }
    if files.len() != wanted.len() && !wanted.is_empty() {
        return Err("some selected ids are not among the results".into());
    }
    Ok(files)
}

fn run_bundle(
    output: &Path,
    results: Option<&Path>,
    select: &[String],
    extra: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    if let Some(results) = results {
        let parsed: Output = serde_json::from_str(&fs::read_to_string(results)?)?;
        files = select_locations(parsed.matches, select)?;
    } else if !select.is_empty() {
        return Err("--select requires --results".into());
    }
    files.extend(extra.iter().cloned());
    let count = bundle::write_bundle(output, &files)?;
    println!("{}", serde_json::json!({ "output": output.display().to_string(), "entries": count }));
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive("simmatch=info".parse()?)
                    .add_directive("simmatch_cli=info".parse()?),
            )
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    match cli.command {
        Some(Command::Search { config }) => run_search(&config),
        Some(Command::Ingest { dir, file, name }) => run_ingest(&dir, &file, name.as_deref()),
        Some(Command::Bundle {
            output,
            results,
            select,
            files,
        }) => run_bundle(&output, results.as_deref(), &select, &files),
        None => Err("no command given; see --help".into()),
    }
}
