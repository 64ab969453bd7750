//! Command-line front end.
//!
//! ```bash
//! scholar-rank build --csv papers.csv --snapshot model.cbor
//! scholar-rank search --csv papers.csv --snapshot model.cbor "graph neural networks"
//! scholar-rank search --csv papers.csv            # interactive `Query>` loop
//! scholar-rank related --csv papers.csv --doc 42 -k 5
//! ```

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use scholar_rank::{
    model::snapshot,
    snippet::{make_snippet, preview, query_terms, PREVIEW_LEN, SNIPPET_LEN},
    Corpus, DocId, EngineConfig, Model, RankError, RecommendationStats, Recommendations, TextAnalyzer,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "scholar-rank", version, about = "Rank academic papers by query relevance and document similarity")]
struct Cli {
    /// JSON file with weights and ranking options
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info", value_name = "LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the model from a CSV file and save a snapshot
    Build {
        #[command(flatten)]
        source: Source,
    },
    /// Query the model, interactively when no query is given
    Search {
        #[command(flatten)]
        source: Source,

        /// Number of principal results
        #[arg(long, value_name = "N")]
        top_k: Option<usize>,

        /// Additional results per principal
        #[arg(long, value_name = "N")]
        additional: Option<usize>,

        /// Minimum similarity of an additional result to its principal
        #[arg(long, value_name = "X")]
        min_similarity: Option<f64>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        query: Option<String>,
    },
    /// List the papers most similar to one paper
    Related {
        #[command(flatten)]
        source: Source,

        /// Paper id (0-based CSV row)
        #[arg(long, value_name = "ID")]
        doc: DocId,

        #[arg(short, default_value = "5", value_name = "N")]
        k: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct Source {
    /// Corpus CSV with title, keywords and abstract columns
    #[arg(long, value_name = "PATH")]
    csv: PathBuf,

    /// Model snapshot, reused when it matches the corpus
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,
}

fn setup_logging(level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

/// Snapshot when it fits the corpus and the configured weights, full build
/// otherwise. A fresh build is written back to `snapshot_path`.
fn load_model(source: &Source, config: &EngineConfig, analyzer: &TextAnalyzer, force_build: bool) -> Result<Model> {
    let corpus = Corpus::from_csv(&source.csv, analyzer)
        .with_context(|| format!("failed to load corpus from {}", source.csv.display()))?;
    info!(docs = corpus.len(), "corpus loaded");

    if let (Some(path), false) = (&source.snapshot, force_build) {
        if let Some(model) = snapshot::load(path, corpus.fingerprint()) {
            if model.weights() == &config.weights {
                return Ok(model);
            }
            warn!("snapshot was built with other similarity weights, rebuilding");
        }
    }

    let model = Model::build(corpus, &config.weights).context("failed to build model")?;
    if let Some(path) = &source.snapshot {
        snapshot::save(path, &model).with_context(|| format!("failed to write snapshot {}", path.display()))?;
    }
    Ok(model)
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            EngineConfig::from_json_file(path).with_context(|| format!("failed to read config {}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

#[derive(Serialize)]
struct AdditionalView<'a> {
    doc: DocId,
    similarity: f64,
    title: &'a str,
    preview: String,
}

#[derive(Serialize)]
struct PrincipalView<'a> {
    rank: usize,
    doc: DocId,
    score: f64,
    title: &'a str,
    keywords: &'a str,
    snippet: String,
    additional: Vec<AdditionalView<'a>>,
}

#[derive(Serialize)]
struct SearchView<'a> {
    query: &'a str,
    reason: Option<&'a RankError>,
    stats: RecommendationStats,
    principals: Vec<PrincipalView<'a>>,
}

fn search_view<'a>(model: &'a Model, query: &'a str, rec: &'a Recommendations, highlight: &[String]) -> SearchView<'a> {
    let principals = rec
        .principals
        .iter()
        .filter_map(|p| {
            let doc = model.document(p.doc)?;
            let additional = p
                .additional
                .iter()
                .filter_map(|a| {
                    let extra = model.document(a.doc)?;
                    Some(AdditionalView {
                        doc: a.doc,
                        similarity: a.similarity,
                        title: &extra.title,
                        preview: preview(&extra.abstract_text, PREVIEW_LEN),
                    })
                })
                .collect();
            Some(PrincipalView {
                rank: p.rank,
                doc: p.doc,
                score: p.score,
                title: &doc.title,
                keywords: &doc.keywords,
                snippet: make_snippet(&doc.abstract_text, highlight, SNIPPET_LEN),
                additional,
            })
        })
        .collect();
    SearchView {
        query,
        reason: rec.reason.as_ref(),
        stats: rec.stats(),
        principals,
    }
}

fn print_search(view: &SearchView<'_>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view).context("failed to serialize results")?);
        return Ok(());
    }
    if let Some(reason) = view.reason {
        println!("No results: {reason}");
        return Ok(());
    }
    for p in &view.principals {
        println!("[{}] {:.6}\t{}\t{}", p.rank, p.score, p.doc, p.title);
        println!("    {}", p.snippet);
        for a in &p.additional {
            println!("    + {:.6}\t{}\t{}", a.similarity, a.doc, a.title);
        }
    }
    eprintln!(
        "[stats] principals={} additionals={} total_unique={}",
        view.stats.principals, view.stats.additionals, view.stats.total_unique
    );
    Ok(())
}

fn run_query(model: &Model, analyzer: &TextAnalyzer, config: &EngineConfig, query: &str, json: bool) -> Result<()> {
    let start = Instant::now();
    let rec = model.search_text(query, analyzer, &config.ranking);
    let highlight = query_terms(query);
    print_search(&search_view(model, query, &rec, &highlight), json)?;
    debug!(elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "query answered");
    Ok(())
}

fn interactive(model: &Model, analyzer: &TextAnalyzer, config: &EngineConfig, json: bool) -> Result<()> {
    eprintln!("Type a query, or `exit` to quit.");
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("Query> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() || query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }
        run_query(model, analyzer, config, query, json)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct RelatedView<'a> {
    doc: DocId,
    similarity: f64,
    title: &'a str,
}

fn main() -> Result<()> {
    let program_start = Instant::now();
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let mut config = load_config(cli.config.as_deref())?;
    let analyzer = TextAnalyzer::new();

    match cli.command {
        Command::Build { source } => {
            if source.snapshot.is_none() {
                bail!("build needs --snapshot");
            }
            let model = load_model(&source, &config, &analyzer, true)?;
            info!(docs = model.len(), vocab = model.vectorizer().vocab_size(), "snapshot written");
        }
        Command::Search {
            source,
            top_k,
            additional,
            min_similarity,
            json,
            query,
        } => {
            if let Some(n) = top_k {
                config.ranking.principal = n;
            }
            if let Some(n) = additional {
                config.ranking.additional = n;
            }
            if let Some(x) = min_similarity {
                config.ranking.min_similarity = x;
            }
            let model = load_model(&source, &config, &analyzer, false)?;
            match query {
                Some(query) => run_query(&model, &analyzer, &config, &query, json)?,
                None => interactive(&model, &analyzer, &config, json)?,
            }
        }
        Command::Related { source, doc, k, json } => {
            let model = load_model(&source, &config, &analyzer, false)?;
            if model.document(doc).is_none() {
                bail!("unknown document id {doc} (corpus has {} documents)", model.len());
            }
            let related: Vec<RelatedView<'_>> = model
                .related(doc, k, &[])
                .into_iter()
                .filter_map(|(id, similarity)| {
                    model.document(id).map(|d| RelatedView { doc: id, similarity, title: &d.title })
                })
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&related).context("failed to serialize results")?);
            } else {
                for r in &related {
                    println!("{:.6}\t{}\t{}", r.similarity, r.doc, r.title);
                }
            }
        }
    }

    debug!(elapsed_ms = program_start.elapsed().as_secs_f64() * 1000.0, "program finished");
    Ok(())
}
