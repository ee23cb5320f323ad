//! Import lyrics from a match report into the catalog.
//!
//! Certain matches are written unprompted; uncertain ones need an answer
//! (terminal, decisions file, or `--auto`). Populated fields are never
//! overwritten.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

use lyrics_reconcile::catalog::{CatalogLayout, SqliteCatalog};
use lyrics_reconcile::confirm::{AutoAccept, Confirm, DecisionFile, TerminalPrompt};
use lyrics_reconcile::corpus::load_corpus;
use lyrics_reconcile::progress::{create_spinner, format_duration, init_tracing, set_log_only};
use lyrics_reconcile::reconcile::apply;
use lyrics_reconcile::safety::create_backup;
use lyrics_reconcile::{ReconciliationStats, Report};

#[derive(Parser)]
#[command(name = "lyrics-import")]
#[command(about = "Write matched lyrics from a match report into the catalog")]
struct Args {
    /// SQLite catalog database
    db: PathBuf,

    /// Corpus JSON the report was built from
    corpus: PathBuf,

    /// Report written by lyrics-match
    #[arg(long, default_value = "database/analysis/lyrics_match_report.json")]
    report: PathBuf,

    #[arg(long, default_value = "items")]
    table: String,

    #[arg(long, default_value = "id")]
    id_column: String,

    #[arg(long, default_value = "title")]
    title_column: String,

    #[arg(long, default_value = "lyrics")]
    field: String,

    /// Accept every uncertain match without prompting
    #[arg(long, conflicts_with = "decisions")]
    auto: bool,

    /// JSON file of pre-recorded answers: {corpus_title: "y" | "n" | "s"}
    #[arg(long)]
    decisions: Option<PathBuf>,

    /// Do not copy the database to <stem>_backup before writing
    #[arg(long)]
    no_backup: bool,

    /// Write final stats as JSON to this path
    #[arg(long)]
    stats_json: Option<PathBuf>,

    /// Log-only mode: no progress bars, just tracing lines
    #[arg(long)]
    log_only: bool,
}

fn print_summary(stats: &ReconciliationStats) {
    println!("\n{:=<60}", "");
    println!("IMPORT SUMMARY");
    println!("{:=<60}", "");
    println!("  Imported:     {}", stats.imported);
    println!("  Skipped:      {}", stats.skipped);
    println!("  Rejected:     {}", stats.rejected);
    println!("  Already had:  {}", stats.already_had);
    println!("  Total:        {}", stats.total());
    println!("{:=<60}", "");
}

fn confirmer(args: &Args) -> Result<Box<dyn Confirm>> {
    if args.auto {
        info!("Auto mode: accepting every uncertain match");
        return Ok(Box::new(AutoAccept));
    }
    if let Some(path) = &args.decisions {
        let file = DecisionFile::load(path)
            .with_context(|| format!("Failed to load decisions {:?}", path))?;
        info!("Loaded {} decisions from {:?}", file.len(), path);
        return Ok(Box::new(file));
    }
    Ok(Box::new(TerminalPrompt::stdio()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();
    set_log_only(args.log_only);

    let start = Instant::now();

    if args.no_backup {
        warn!("Skipping backup of {:?}", args.db);
    } else {
        let backup = create_backup(&args.db)?;
        info!("Backup written to {:?}", backup);
    }

    let report = Report::read_from_file(&args.report)
        .with_context(|| format!("Failed to read report {:?}", args.report))?;

    let spinner = create_spinner("Loading corpus...");
    let corpus = load_corpus(&args.corpus)
        .with_context(|| format!("Failed to load corpus {:?}", args.corpus))?;
    spinner.finish_and_clear();
    let payloads = corpus.payloads();
    info!("Loaded {} lyrics payloads", payloads.len());

    let layout = CatalogLayout {
        table: args.table.clone(),
        id_column: args.id_column.clone(),
        title_column: args.title_column.clone(),
        field: args.field.clone(),
    };
    let mut catalog = SqliteCatalog::open(&args.db, layout)
        .with_context(|| format!("Failed to open catalog {:?}", args.db))?;

    let mut confirm = confirmer(&args)?;

    let stats = match apply(&report, &payloads, &mut catalog, &mut confirm) {
        Ok(stats) => stats,
        Err(e) => {
            error!("Import aborted; writes so far are kept");
            print_summary(&e.stats);
            e.stats.log_phase("aborted");
            return Err(e).context("Import pass failed");
        }
    };

    stats.log_phase("import");
    print_summary(&stats);
    info!("Elapsed: {}", format_duration(start.elapsed()));

    if let Some(path) = &args.stats_json {
        stats
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats {:?}", path))?;
    }

    Ok(())
}
