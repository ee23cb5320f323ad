use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use lyrics_reconcile::catalog::{CatalogLayout, SqliteCatalog};
use lyrics_reconcile::corpus::load_corpus;
use lyrics_reconcile::progress::{create_spinner, format_duration, init_tracing, set_log_only};
use lyrics_reconcile::{build_report, MatchConfig};

#[derive(Parser)]
#[command(name = "lyrics-match")]
#[command(about = "Match a scraped lyrics corpus against catalog titles and write a tiered report")]
struct Args {
    /// Corpus JSON: {title: {url, lyrics, ...}}
    corpus: PathBuf,

    /// SQLite catalog database
    db: PathBuf,

    /// Report output path
    #[arg(long, default_value = "database/analysis/lyrics_match_report.json")]
    report: PathBuf,

    #[arg(long, default_value = "items")]
    table: String,

    #[arg(long, default_value = "id")]
    id_column: String,

    #[arg(long, default_value = "title")]
    title_column: String,

    /// Field the importer will fill (validated here so a bad layout fails early)
    #[arg(long, default_value = "lyrics")]
    field: String,

    /// Marker preceding the slug in corpus URLs
    #[arg(long, default_value = "/songs/")]
    slug_marker: String,

    /// Comma-separated stopwords, replacing the built-in Greek list
    #[arg(long)]
    stopwords: Option<String>,

    /// Matcher threads (0 = rayon default)
    #[arg(long, default_value = "0")]
    workers: usize,

    /// Log-only mode: no progress bars, just tracing lines
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let start = Instant::now();

    let mut config = MatchConfig::default().with_slug_marker(args.slug_marker.as_str());
    if let Some(list) = args.stopwords.as_deref() {
        config = config.with_stopwords(list);
        info!("Using {} custom stopwords", config.stopwords.len());
    }

    let spinner = create_spinner("Loading corpus...");
    let corpus = load_corpus(&args.corpus)
        .with_context(|| format!("Failed to load corpus {:?}", args.corpus))?;
    spinner.finish_and_clear();
    info!("Loaded {} corpus entries from {:?}", corpus.entries.len(), args.corpus);
    if !corpus.malformed.is_empty() {
        warn!("Dropped {} malformed corpus entries", corpus.malformed.len());
    }

    let layout = CatalogLayout {
        table: args.table,
        id_column: args.id_column,
        title_column: args.title_column,
        field: args.field,
    };
    let catalog = SqliteCatalog::open(&args.db, layout)
        .with_context(|| format!("Failed to open catalog {:?}", args.db))?;

    let report = build_report(&corpus, &catalog, &config).context("Matching failed")?;

    report
        .write_to_file(&args.report)
        .with_context(|| format!("Failed to write report {:?}", args.report))?;

    let meta = &report.metadata;
    println!("\n{:=<60}", "");
    println!("MATCH REPORT");
    println!("{:=<60}", "");
    println!("  Total lyrics:   {}", meta.total_lyrics);
    println!("  Certain:        {}", meta.certain);
    println!("  Uncertain:      {}", meta.uncertain);
    println!("  Likely wrong:   {}", meta.likely_wrong);
    if meta.duplicate_titles > 0 {
        println!("  Duplicate catalog titles: {}", meta.duplicate_titles);
    }
    if !report.needs_review.is_empty() {
        println!("  Titles needing review:    {}", report.needs_review.len());
    }
    println!("  Report: {:?}", args.report);
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    Ok(())
}
