// PayHub CLI - consolidate per-restaurant payout workbooks and commission
// invoice PDFs into one master workbook.

mod exit_codes;
mod pdftotext;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use payhub_io::Book;
use payhub_pipeline::invoice::{run_invoices, InvoiceOutput};
use payhub_pipeline::layout::SUMMARY_TAB;
use payhub_pipeline::{
    breakup::run_breakup, orders::run_orders, summary::run_summary, PipelineError, StageReport,
    SummaryIndex,
};

use exit_codes::{EXIT_IO_ERROR, EXIT_PARSE_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "payhub")]
#[command(about = "Consolidate restaurant payout files into one master workbook")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage 1: extract fixed summary cells, one row per payout file
    #[command(after_help = "\
Overwrites the Summary tab in full on every run.

Examples:
  payhub summary --payouts ./payout-files --out consolidated.xlsx")]
    Summary {
        /// Folder of per-restaurant payout workbooks (.xlsx, .xls)
        #[arg(long)]
        payouts: PathBuf,

        /// Consolidated output workbook (created if absent)
        #[arg(long)]
        out: PathBuf,

        /// Suppress progress and banners (warnings still print)
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Stage 2: append payout breakup blocks with running serial numbers
    #[command(after_help = "\
Requires the Summary tab (run `payhub summary` first). Appends rows; re-running
duplicates them. Serial numbers continue from the tab's existing maximum.

Examples:
  payhub breakup --payouts ./payout-files --out consolidated.xlsx")]
    Breakup {
        /// Folder of per-restaurant payout workbooks (.xlsx, .xls)
        #[arg(long)]
        payouts: PathBuf,

        /// Consolidated output workbook (must already exist)
        #[arg(long)]
        out: PathBuf,

        /// Suppress progress and banners (warnings still print)
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Stage 3: append order-level rows with brand metadata prefix
    #[command(after_help = "\
Requires the Summary tab (run `payhub summary` first). Appends rows; re-running
duplicates them.

Examples:
  payhub orders --payouts ./payout-files --out consolidated.xlsx")]
    Orders {
        /// Folder of per-restaurant payout workbooks (.xlsx, .xls)
        #[arg(long)]
        payouts: PathBuf,

        /// Consolidated output workbook (must already exist)
        #[arg(long)]
        out: PathBuf,

        /// Suppress progress and banners (warnings still print)
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Stage 4: parse commission invoice PDFs into the Commission Invoice tab
    #[command(after_help = "\
Text is extracted with pdftotext (poppler-utils). Pre-existing tab rows are
kept; the tab is rebuilt with this run's rows appended after them.

Examples:
  payhub invoices --invoices ./commission-invoices --out consolidated.xlsx
  payhub invoices --invoices ./commission-invoices --out consolidated.xlsx --save-raw /tmp/raw")]
    Invoices {
        /// Folder of commission invoice PDFs
        #[arg(long)]
        invoices: PathBuf,

        /// Consolidated output workbook (created if absent)
        #[arg(long)]
        out: PathBuf,

        /// Directory to save extracted text per PDF + run_meta.json
        #[arg(long)]
        save_raw: Option<PathBuf>,

        /// Suppress progress and banners (warnings still print)
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Run all four stages in order, sharing the summary index in memory
    #[command(after_help = "\
Examples:
  payhub run --payouts ./payout-files --invoices ./commission-invoices --out consolidated.xlsx")]
    Run {
        /// Folder of per-restaurant payout workbooks (.xlsx, .xls)
        #[arg(long)]
        payouts: PathBuf,

        /// Folder of commission invoice PDFs
        #[arg(long)]
        invoices: PathBuf,

        /// Consolidated output workbook (created if absent)
        #[arg(long)]
        out: PathBuf,

        /// Directory to save extracted text per PDF + run_meta.json
        #[arg(long)]
        save_raw: Option<PathBuf>,

        /// Suppress progress and banners (warnings still print)
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help/--version go to stdout and exit clean; real usage
            // errors go to stderr with the usage exit code.
            let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let result = match cli.command {
        Commands::Summary { payouts, out, quiet } => cmd_summary(&payouts, &out, quiet),
        Commands::Breakup { payouts, out, quiet } => cmd_breakup(&payouts, &out, quiet),
        Commands::Orders { payouts, out, quiet } => cmd_orders(&payouts, &out, quiet),
        Commands::Invoices { invoices, out, save_raw, quiet } => {
            cmd_invoices(&invoices, &out, save_raw.as_deref(), quiet)
        }
        Commands::Run { payouts, invoices, out, save_raw, quiet } => {
            cmd_run(&payouts, &invoices, &out, save_raw.as_deref(), quiet)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO_ERROR, message: msg.into(), hint: None }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> CliError {
        let code = match &e {
            PipelineError::InputDir { .. } => EXIT_IO_ERROR,
            PipelineError::MissingSummaryTab | PipelineError::MissingColumn { .. } => {
                EXIT_PARSE_ERROR
            }
        };
        let hint = match &e {
            PipelineError::MissingSummaryTab => {
                Some("run `payhub summary` first to build the Summary tab".to_string())
            }
            _ => None,
        };
        CliError { code, message: e.to_string(), hint }
    }
}

// ── Stage commands ──────────────────────────────────────────────────

fn cmd_summary(payouts: &Path, out: &Path, quiet: bool) -> Result<(), CliError> {
    let mut book = Book::load_or_new(out).map_err(CliError::io)?;
    let result = run_summary(payouts, &mut book)?;
    print_notes(&result.report);
    save_book(&book, out)?;
    if !quiet {
        println!(
            "Summary: {} file(s) consolidated into '{}' tab of {}",
            result.report.files_processed,
            SUMMARY_TAB,
            out.display()
        );
    }
    Ok(())
}

fn cmd_breakup(payouts: &Path, out: &Path, quiet: bool) -> Result<(), CliError> {
    let mut book = load_existing(out)?;
    let index = index_from_book(&book)?;
    let report = run_breakup(payouts, &mut book, &index)?;
    print_notes(&report);
    save_book(&book, out)?;
    if !quiet {
        println!(
            "Payout breakup: {} row(s) appended from {} file(s)",
            report.rows_written, report.files_processed
        );
    }
    Ok(())
}

fn cmd_orders(payouts: &Path, out: &Path, quiet: bool) -> Result<(), CliError> {
    let mut book = load_existing(out)?;
    let index = index_from_book(&book)?;
    let report = run_orders(payouts, &mut book, &index)?;
    print_notes(&report);
    save_book(&book, out)?;
    if !quiet {
        println!(
            "Order level: {} row(s) appended from {} file(s)",
            report.rows_written, report.files_processed
        );
    }
    Ok(())
}

fn cmd_invoices(
    invoices: &Path,
    out: &Path,
    save_raw: Option<&Path>,
    quiet: bool,
) -> Result<(), CliError> {
    pdftotext::check_available()?;
    let mut book = Book::load_or_new(out).map_err(CliError::io)?;
    let result = run_invoice_stage(invoices, &mut book, save_raw, quiet)?;
    save_book(&book, out)?;
    if !quiet {
        println!(
            "Commission invoices: {} row(s) from {} document(s)",
            result.report.rows_written, result.report.files_processed
        );
    }
    Ok(())
}

fn cmd_run(
    payouts: &Path,
    invoices: &Path,
    out: &Path,
    save_raw: Option<&Path>,
    quiet: bool,
) -> Result<(), CliError> {
    // Fail before touching the workbook if stage 4 can't run at all
    pdftotext::check_available()?;

    let mut book = Book::load_or_new(out).map_err(CliError::io)?;

    // Stage 1 builds the join index the later stages share in memory;
    // the workbook is saved after each stage so the on-disk artifact
    // progresses the same way the stages do.
    let summary = run_summary(payouts, &mut book)?;
    print_notes(&summary.report);
    save_book(&book, out)?;
    if !quiet {
        println!("Stage 1: {} summary row(s) written", summary.report.rows_written);
    }

    let report = run_breakup(payouts, &mut book, &summary.index)?;
    print_notes(&report);
    save_book(&book, out)?;
    if !quiet {
        println!("Stage 2: {} payout breakup row(s) appended", report.rows_written);
    }

    let report = run_orders(payouts, &mut book, &summary.index)?;
    print_notes(&report);
    save_book(&book, out)?;
    if !quiet {
        println!("Stage 3: {} order level row(s) appended", report.rows_written);
    }

    let result = run_invoice_stage(invoices, &mut book, save_raw, quiet)?;
    save_book(&book, out)?;
    if !quiet {
        println!("Stage 4: {} commission invoice row(s) appended", result.report.rows_written);
        println!("Done: {}", out.display());
    }
    Ok(())
}

// ── Shared helpers ──────────────────────────────────────────────────

fn load_existing(out: &Path) -> Result<Book, CliError> {
    if !out.exists() {
        return Err(CliError::io(format!("workbook not found: {}", out.display()))
            .with_hint("run `payhub summary` first to create it"));
    }
    Book::load(out).map_err(CliError::io)
}

fn save_book(book: &Book, out: &Path) -> Result<(), CliError> {
    book.save(out).map_err(CliError::io)
}

fn index_from_book(book: &Book) -> Result<SummaryIndex, CliError> {
    let tab = book.tab(SUMMARY_TAB).ok_or(PipelineError::MissingSummaryTab)?;
    let index = SummaryIndex::from_tab(tab).map_err(PipelineError::from)?;
    Ok(index)
}

fn print_notes(report: &StageReport) {
    for note in &report.notes {
        eprintln!("{}", note);
    }
}

/// Stage 4 with the pdftotext extractor, plus optional raw-artifact dumps.
/// Callers check pdftotext availability first; `run` does it before stage 1
/// so a missing binary fails the run before any tab is touched.
fn run_invoice_stage(
    invoices: &Path,
    book: &mut Book,
    save_raw: Option<&Path>,
    quiet: bool,
) -> Result<InvoiceOutput, CliError> {
    if let Some(raw_dir) = save_raw {
        fs::create_dir_all(raw_dir)
            .map_err(|e| CliError::io(format!("cannot create {}: {}", raw_dir.display(), e)))?;
    }

    // Tee the extracted text into the raw directory as we go
    let extract = |path: &Path| -> Result<String, String> {
        let text = pdftotext::extract_text(path)?;
        if let Some(raw_dir) = save_raw {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "invoice".to_string());
            let txt_path = raw_dir.join(format!("{}.txt", stem));
            fs::write(&txt_path, &text)
                .map_err(|e| format!("cannot write {}: {}", txt_path.display(), e))?;
        }
        Ok(text)
    };

    let result = run_invoices(invoices, book, &extract)?;
    print_notes(&result.report);
    if !quiet {
        for doc in &result.documents {
            eprintln!("Parsed: {} ({} row(s))", doc.file_name, doc.records.len());
        }
    }

    if let Some(raw_dir) = save_raw {
        write_run_meta(raw_dir, &result)?;
        if !quiet {
            eprintln!("Saved raw artifacts to {}", raw_dir.display());
        }
    }

    Ok(result)
}

/// Dump the run's parse results: per-document line items (the full parsed
/// records, serialized) plus counters and notes.
fn write_run_meta(raw_dir: &Path, result: &InvoiceOutput) -> Result<(), CliError> {
    let meta = serde_json::json!({
        "template": "commission_invoice_v1",
        "documents": result.documents.iter().map(|d| {
            serde_json::json!({
                "file": d.file_name,
                "rows": d.records.len(),
                "line_items": &d.records,
            })
        }).collect::<Vec<_>>(),
        "documents_parsed": result.report.files_processed,
        "rows_appended": result.report.rows_written,
        "notes": result.report.notes,
        "payhub_version": env!("CARGO_PKG_VERSION"),
    });
    let meta_path = raw_dir.join("run_meta.json");
    let meta_str =
        serde_json::to_string_pretty(&meta).map_err(|e| CliError::io(e.to_string()))?;
    fs::write(&meta_path, &meta_str)
        .map_err(|e| CliError::io(format!("cannot write {}: {}", meta_path.display(), e)))
}
