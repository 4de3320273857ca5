//! Thin CLI adapter over `semcode`'s six external operations (spec §6). No
//! independent business logic lives here — every subcommand is a direct
//! call into the library.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use semcode::chunk::{Language, SymbolType};
use semcode::config::{load_config, Config};
use semcode::context::Context;
use semcode::duplicates::{detect_duplicates, DuplicateParams};
use semcode::embedder::{Embedder, Model2VecEmbedder};
use semcode::indexer::{self, IndexOptions};
use semcode::search::{search, SearchParams};
use semcode::vector_store::{JsonVectorStore, VectorStore};
use semcode::watcher::IndexWatcher;

#[derive(Debug, Parser)]
#[command(name = "semcode")]
#[command(version)]
#[command(about = "Semantic + structural code search engine for source repositories")]
struct Cli {
    /// Repository root (defaults to the current directory).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Restrict languages, comma-separated (e.g. rust,typescript). Empty = all.
    #[arg(long, global = true, value_delimiter = ',')]
    languages: Vec<String>,

    /// Emit machine-readable JSON instead of a human summary.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a fresh full index.
    Index,
    /// Reindex only what changed since the last run.
    Reindex,
    /// Recompute file hashes and report drift without touching the index.
    Verify,
    /// Print index metadata and chunk counts.
    Stats,
    /// Delete the index for this repository.
    DeleteIndex,
    /// Run a hybrid semantic + structural query.
    Search(SearchArgs),
    /// Find logical duplicate chunks.
    Duplicates(DuplicatesArgs),
    /// Watch the repository and reindex incrementally on changes.
    Watch {
        #[arg(long, default_value_t = 60_000)]
        interval_ms: u64,
    },
}

#[derive(Debug, clap::Args)]
struct SearchArgs {
    query: String,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    pattern: Option<String>,
    #[arg(long)]
    include: Option<String>,
    #[arg(long = "symbol-type")]
    symbol_type: Option<String>,
    #[arg(long)]
    variant: Option<String>,
    #[arg(long)]
    decorator: Option<String>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long = "exported")]
    is_exported: Option<bool>,
    #[arg(long = "async")]
    is_async: Option<bool>,
    #[arg(long = "static")]
    is_static: Option<bool>,
    #[arg(long = "abstract")]
    is_abstract: Option<bool>,
    #[arg(long = "min-complexity")]
    min_complexity: Option<u32>,
    #[arg(long = "max-complexity")]
    max_complexity: Option<u32>,
    #[arg(long = "has-documentation")]
    has_documentation: Option<bool>,
    #[arg(long = "parent-scope")]
    parent_scope: Option<String>,
    #[arg(long)]
    imports: Option<String>,
    #[arg(long = "symbol-name")]
    symbol_name: Option<String>,
    #[arg(long = "min-score")]
    min_score: Option<f32>,
    #[arg(long = "max-per-file")]
    max_per_file: Option<usize>,
    #[arg(long = "max-per-symbol")]
    max_per_symbol: Option<usize>,
    #[arg(long)]
    rerank: bool,
}

#[derive(Debug, clap::Args)]
struct DuplicatesArgs {
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long = "cross-file-only")]
    cross_file_only: bool,
    #[arg(long = "only-exported")]
    only_exported: bool,
    #[arg(long = "ignore-tests")]
    ignore_tests: bool,
    #[arg(long = "exclude-pattern")]
    exclude_pattern: Option<String>,
    #[arg(long = "min-lines")]
    min_lines: Option<usize>,
    #[arg(long = "min-complexity")]
    min_complexity: Option<u32>,
    #[arg(long = "no-normalize")]
    no_normalize: bool,
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

fn build_context(root: &std::path::Path, cfg: Config) -> Result<Context> {
    let index_dir = root.join(&cfg.index_dir);
    let model_spinner = spinner("loading embedding model...");
    let embedder: Arc<dyn Embedder> = Arc::new(Model2VecEmbedder::load(&cfg.embedder.model)?);
    model_spinner.finish_and_clear();
    let store: Arc<dyn VectorStore> = Arc::new(JsonVectorStore::open(&index_dir)?);
    Ok(Context::build(root, cfg, embedder, store)?)
}

fn parse_symbol_type(s: &str) -> Result<SymbolType> {
    SymbolType::from_str_loose(s).with_context(|| format!("unknown symbol type `{s}`"))
}

fn parse_language(s: &str) -> Result<Language> {
    Language::from_extension(s)
        .or_else(|| Language::all().iter().copied().find(|l| l.as_str().eq_ignore_ascii_case(s)))
        .with_context(|| format!("unknown language `{s}`"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| std::env::current_dir().expect("current directory"));
    let cfg = load_config(&root);

    match cli.cmd {
        Command::Index => {
            let ctx = build_context(&root, cfg)?;
            let pb = spinner("indexing...");
            let summary = indexer::index_full(&ctx, &IndexOptions { languages: cli.languages })?;
            pb.finish_and_clear();
            print_json_or(cli.json, &summary, || {
                println!(
                    "indexed {} files, {} chunks in {}ms ({} errors)",
                    summary.files, summary.chunks, summary.duration_ms, summary.errors
                );
            });
        }
        Command::Reindex => {
            let ctx = build_context(&root, cfg)?;
            let pb = spinner("reindexing...");
            let summary = indexer::index_incremental(&ctx, &IndexOptions { languages: cli.languages })?;
            pb.finish_and_clear();
            print_json_or(cli.json, &summary, || {
                println!(
                    "{} files, {} chunks, {} skipped, {} removed in {}ms",
                    summary.files, summary.chunks, summary.skipped, summary.removed, summary.duration_ms
                );
            });
        }
        Command::Verify => {
            let ctx = build_context(&root, cfg)?;
            let report = indexer::verify_index(&ctx)?;
            print_json_or(cli.json, &report, || {
                println!(
                    "indexed={} changed={} missing={} removed={}",
                    report.indexed, report.changed, report.missing, report.removed
                );
            });
        }
        Command::Stats => {
            let ctx = build_context(&root, cfg)?;
            let stats = indexer::stats(&ctx)?;
            print_json_or(cli.json, &stats, || {
                println!(
                    "{} files, {} chunks, model={} (dim {}), schema v{}",
                    stats.file_count, stats.chunk_count, stats.embed_model_id, stats.embed_dim, stats.schema_version
                );
            });
        }
        Command::DeleteIndex => {
            let ctx = build_context(&root, cfg)?;
            indexer::delete_index(&ctx)?;
            println!("index deleted");
        }
        Command::Search(args) => {
            let ctx = build_context(&root, cfg)?;
            let mut params = SearchParams {
                query: args.query,
                ..SearchParams::default()
            };
            if let Some(v) = args.limit {
                params.limit = v;
            }
            params.pattern = args.pattern;
            params.include = args.include;
            if let Some(s) = args.symbol_type.as_deref() {
                params.symbol_type = Some(parse_symbol_type(s)?);
            }
            params.variant = args.variant;
            params.decorator = args.decorator;
            if let Some(s) = args.language.as_deref() {
                params.language = Some(parse_language(s)?);
            }
            params.is_exported = args.is_exported;
            params.is_async = args.is_async;
            params.is_static = args.is_static;
            params.is_abstract = args.is_abstract;
            params.min_complexity = args.min_complexity;
            params.max_complexity = args.max_complexity;
            params.has_documentation = args.has_documentation;
            params.parent_scope = args.parent_scope;
            params.imports = args.imports;
            params.symbol_name = args.symbol_name;
            if let Some(v) = args.min_score {
                params.min_score = v;
            }
            if let Some(v) = args.max_per_file {
                params.max_per_file = v;
            }
            if let Some(v) = args.max_per_symbol {
                params.max_per_symbol = v;
            }
            params.rerank = args.rerank;

            let output = search(&ctx, &params)?;
            print_json_or(cli.json, &output, || {
                if output.matches == 0 {
                    println!("no matches");
                }
                for r in &output.results {
                    println!(
                        "{}:{}-{} {} [{}] score={:.3}",
                        r.file,
                        r.start_line,
                        r.end_line,
                        r.symbol_name.as_deref().unwrap_or("<anonymous>"),
                        r.symbol_type,
                        r.semantic_score
                    );
                }
            });
        }
        Command::Duplicates(args) => {
            let ctx = build_context(&root, cfg)?;
            let mut params = DuplicateParams::from_config(&ctx.config.duplicates.clone());
            if let Some(v) = args.limit {
                params.limit = v;
            }
            params.cross_file_only = args.cross_file_only;
            params.only_exported = args.only_exported;
            params.ignore_tests = args.ignore_tests;
            params.exclude_pattern = args.exclude_pattern;
            if let Some(v) = args.min_lines {
                params.min_lines = v;
            }
            if let Some(v) = args.min_complexity {
                params.min_complexity = v;
            }
            if args.no_normalize {
                params.normalize_identifiers = false;
            }

            let output = detect_duplicates(&ctx, &params)?;
            print_json_or(cli.json, &output, || {
                println!(
                    "{} duplicate groups across {} files (~{} lines saveable)",
                    output.summary.total_duplicates, output.summary.files_affected, output.summary.total_savings
                );
                for group in &output.duplicates {
                    println!(
                        "  [{:?}] similarity={:.2} score={:.1} instances={}",
                        group.level,
                        group.similarity,
                        group.score,
                        group.instances.len()
                    );
                    for inst in &group.instances {
                        println!(
                            "    {}:{}-{} {}",
                            inst.file,
                            inst.start_line,
                            inst.end_line,
                            inst.symbol_name.as_deref().unwrap_or("<anonymous>")
                        );
                    }
                }
            });
        }
        Command::Watch { interval_ms } => {
            let ctx = Arc::new(build_context(&root, cfg)?);
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async move {
                let watcher = IndexWatcher::start(
                    ctx,
                    interval_ms,
                    |summary| {
                        eprintln!(
                            "reindexed: {} files, {} chunks, {} removed",
                            summary.files, summary.chunks, summary.removed
                        );
                    },
                    |err| eprintln!("watch error: {err}"),
                )?;
                eprintln!("watching {} (interval {interval_ms}ms); ctrl-c to stop", root.display());
                tokio::signal::ctrl_c().await.ok();
                watcher.stop().await;
                Ok::<(), anyhow::Error>(())
            })?;
        }
    }

    Ok(())
}

fn print_json_or<T: serde::Serialize>(json: bool, value: &T, human: impl FnOnce()) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("failed to serialize output: {e}"),
        }
    } else {
        human();
    }
}
