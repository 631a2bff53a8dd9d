use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::ProgressBar;

mod output;

use output::{ColorMode, SearchMatch};
use pdfsmith_convert::{ConvertOptions, OutputFormat};
use pdfsmith_core::config_file::{self, ConfigFile};
use pdfsmith_core::{
    BackendRegistry, ExtractOptions, ExtractionOutcome, Extractor, PageSelection, PdfBackend,
};
use pdfsmith_generate::{GenerationOptions, Margins};
use pdfsmith_pdf_extract::PdfExtractBackend;
use pdfsmith_pdf_lopdf::LopdfBackend;
use pdfsmith_pdf_mupdf::MupdfBackend;
use pdfsmith_safety::BackupManager;

/// PDF toolkit: extract, convert, edit and generate PDF documents
#[derive(Parser, Debug)]
#[command(name = "pdfsmith", version, about, long_about = None)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from a PDF
    Extract {
        /// Path to the PDF file
        input: PathBuf,

        /// Pages to extract, e.g. "1,3,5-7" (default: all)
        #[arg(short, long)]
        pages: Option<String>,

        /// Extraction backend to prefer (mupdf, pdf-extract, lopdf)
        #[arg(short, long)]
        backend: Option<String>,

        /// Quality score below which the fallback backend is tried
        #[arg(long)]
        threshold: Option<f64>,

        /// Prepend a metadata header to the text
        #[arg(long)]
        metadata: bool,

        /// Emit the full structured result as JSON
        #[arg(long)]
        json: bool,

        /// Write text to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show document metadata and extraction statistics
    Info {
        /// Path to the PDF file
        input: PathBuf,

        /// Include per-page statistics
        #[arg(short, long)]
        verbose: bool,

        /// Emit metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search extracted text with a regular expression
    Search {
        /// Path to the PDF file
        input: PathBuf,

        /// Regex pattern to search for
        pattern: String,

        /// Case-insensitive matching
        #[arg(short, long)]
        ignore_case: bool,
    },

    /// Convert a PDF to text, markdown, JSON, YAML or HTML
    Convert {
        /// Path to the PDF file
        input: PathBuf,

        /// Output file; the format is detected from its extension
        output: PathBuf,

        /// Output format override (text, markdown, json, yaml, html)
        #[arg(short, long)]
        format: Option<String>,

        /// Extraction backend to prefer
        #[arg(short, long)]
        backend: Option<String>,
    },

    /// Split a PDF into one file per page (or per selected page)
    Split {
        /// Path to the PDF file
        input: PathBuf,

        /// Pages to keep, e.g. "1-3" "7" (default: every page)
        #[arg(short, long, num_args = 1..)]
        pages: Vec<String>,

        /// Output name pattern with {stem}, {index} and {page} placeholders
        #[arg(long, default_value = "{stem}_page_{page}.pdf")]
        output_pattern: String,
    },

    /// Merge two or more PDFs into one
    Merge {
        /// Input PDFs, merged in argument order
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract a page range into a new PDF
    Pages {
        /// Path to the PDF file
        input: PathBuf,

        /// Page ranges to keep, e.g. "1-3" "7"
        #[arg(required = true, num_args = 1..)]
        ranges: Vec<String>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate a PDF from a markdown or text file
    Generate {
        /// Path to the markdown or text source
        input: PathBuf,

        /// Output PDF path (default: source name with .pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Typesetting engine (typst, xelatex, pdflatex, lualatex)
        #[arg(short, long)]
        engine: Option<String>,

        /// Base font size in points
        #[arg(long)]
        font_size: Option<u32>,

        /// Page margins (narrow, normal, wide)
        #[arg(long)]
        margins: Option<String>,

        /// Include a table of contents
        #[arg(long)]
        toc: bool,

        /// Number section headings
        #[arg(long)]
        number_sections: bool,
    },

    /// List PDF generation engines and their availability
    Engines,

    /// List extraction backends and their availability
    Backends,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config_file::load_config();
    let color = ColorMode(!cli.no_color);

    match cli.command {
        Command::Extract {
            input,
            pages,
            backend,
            threshold,
            metadata,
            json,
            output,
        } => extract(
            &input, pages, backend, threshold, metadata, json, output, &config, color,
        ),
        Command::Info {
            input,
            verbose,
            json,
        } => info(&input, verbose, json, &config, color),
        Command::Search {
            input,
            pattern,
            ignore_case,
        } => search(&input, &pattern, ignore_case, &config, color),
        Command::Convert {
            input,
            output,
            format,
            backend,
        } => convert(&input, &output, format, backend, &config),
        Command::Split {
            input,
            pages,
            output_pattern,
        } => split(&input, &pages, &output_pattern),
        Command::Merge { inputs, output } => merge(&inputs, &output, &config),
        Command::Pages {
            input,
            ranges,
            output,
        } => pages_command(&input, &ranges, &output, &config),
        Command::Generate {
            input,
            output,
            engine,
            font_size,
            margins,
            toc,
            number_sections,
        } => generate(
            &input,
            output,
            engine,
            font_size,
            margins,
            toc,
            number_sections,
            &config,
        ),
        Command::Engines => engines(color),
        Command::Backends => backends(color),
    }
}

#[allow(clippy::too_many_arguments)]
fn extract(
    input: &Path,
    pages: Option<String>,
    backend: Option<String>,
    threshold: Option<f64>,
    metadata: bool,
    json: bool,
    output: Option<PathBuf>,
    config: &ConfigFile,
    color: ColorMode,
) -> anyhow::Result<()> {
    let selection = match pages {
        Some(spec) => PageSelection::explicit(parse_page_spec(&spec)?),
        None => PageSelection::All,
    };

    let outcome = run_extraction(input, &selection, backend, threshold, config, !json)?;

    if json {
        let rendered = pdfsmith_convert::render(
            &outcome,
            OutputFormat::Json,
            &ConvertOptions::default(),
        )?;
        println!("{}", rendered);
        return Ok(());
    }

    let options = ConvertOptions {
        include_metadata: metadata,
        ..ConvertOptions::default()
    };
    let text = pdfsmith_convert::render(&outcome, OutputFormat::Text, &options)?;

    let mut stdout = std::io::stdout();
    if let Some(ref path) = output {
        pdfsmith_safety::safe_write_check(input, path, &backup_manager(config))?;
        std::fs::write(path, &text)?;
        writeln!(stdout, "Wrote {}", path.display())?;
    } else {
        writeln!(stdout, "{}", text)?;
    }
    output::print_extraction_summary(&mut stdout, &outcome, color)?;
    Ok(())
}

fn info(
    input: &Path,
    verbose: bool,
    json: bool,
    config: &ConfigFile,
    color: ColorMode,
) -> anyhow::Result<()> {
    let outcome = run_extraction(input, &PageSelection::All, None, None, config, !json)?;

    if json {
        let pages: Vec<serde_json::Value> = outcome
            .pages
            .iter()
            .map(|p| {
                serde_json::json!({
                    "page_number": p.page_number,
                    "word_count": p.word_count,
                    "char_count": p.char_count,
                    "has_images": p.has_images,
                    "has_tables": p.has_tables,
                    "quality_score": p.quality_score,
                })
            })
            .collect();
        let doc = serde_json::json!({
            "metadata": outcome.metadata,
            "backend_used": outcome.backend_used,
            "quality_score": outcome.quality_score,
            "pages": pages,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    output::print_info(&mut std::io::stdout(), &outcome, verbose, color)?;
    Ok(())
}

fn search(
    input: &Path,
    pattern: &str,
    ignore_case: bool,
    config: &ConfigFile,
    color: ColorMode,
) -> anyhow::Result<()> {
    let regex = regex::RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()?;

    let outcome = run_extraction(input, &PageSelection::All, None, None, config, true)?;

    let mut matches = Vec::new();
    for page in &outcome.pages {
        for (index, line) in page.text.lines().enumerate() {
            if regex.is_match(line) {
                matches.push(SearchMatch {
                    page: page.page_number,
                    line: index + 1,
                    text: line.trim().to_string(),
                });
            }
        }
    }

    output::print_search_results(&mut std::io::stdout(), pattern, &matches, color)?;
    Ok(())
}

fn convert(
    input: &Path,
    output: &Path,
    format: Option<String>,
    backend: Option<String>,
    config: &ConfigFile,
) -> anyhow::Result<()> {
    let format = match format {
        Some(name) => OutputFormat::parse(&name)?,
        None => OutputFormat::from_extension(output),
    };

    let outcome = run_extraction(input, &PageSelection::All, backend, None, config, true)?;
    let rendered = pdfsmith_convert::render(&outcome, format, &ConvertOptions::default())?;

    pdfsmith_safety::safe_write_check(input, output, &backup_manager(config))?;
    std::fs::write(output, rendered)?;
    println!("Converted to {}: {}", format.label(), output.display());
    Ok(())
}

fn split(input: &Path, pages: &[String], output_pattern: &str) -> anyhow::Result<()> {
    let selected = if pages.is_empty() {
        None
    } else {
        Some(pdfsmith_edit::parse_ranges(pages)?)
    };

    let outputs = pdfsmith_edit::split(input, output_pattern, selected.as_deref())?;
    for path in &outputs {
        println!("{}", path.display());
    }
    println!("Split into {} files", outputs.len());
    Ok(())
}

fn merge(inputs: &[PathBuf], output: &Path, config: &ConfigFile) -> anyhow::Result<()> {
    if let Some(first) = inputs.first() {
        pdfsmith_safety::safe_write_check(first, output, &backup_manager(config))?;
    }

    let bar = progress_bar("Merging documents...");
    let result = pdfsmith_edit::merge(inputs, output);
    bar.finish_and_clear();
    result?;

    let pages = pdfsmith_edit::page_count(output)?;
    println!(
        "Merged {} files into {} ({} pages)",
        inputs.len(),
        output.display(),
        pages
    );
    Ok(())
}

fn pages_command(
    input: &Path,
    ranges: &[String],
    output: &Path,
    config: &ConfigFile,
) -> anyhow::Result<()> {
    let pages = pdfsmith_edit::parse_ranges(ranges)?;
    pdfsmith_safety::safe_write_check(input, output, &backup_manager(config))?;

    let written = pdfsmith_edit::extract_pages(input, output, &pages)?;
    println!("Wrote {} pages to {}", written, output.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn generate(
    input: &Path,
    output: Option<PathBuf>,
    engine: Option<String>,
    font_size: Option<u32>,
    margins: Option<String>,
    toc: bool,
    number_sections: bool,
    config: &ConfigFile,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| input.with_extension("pdf"));
    let generation = config.generation.clone().unwrap_or_default();

    let mut options = GenerationOptions {
        engine: engine.or(generation.engine),
        include_toc: toc,
        number_sections,
        ..GenerationOptions::default()
    };
    if let Some(size) = font_size.or_else(|| generation.font_size.as_deref()?.parse().ok()) {
        options.font_size = size;
    }
    if let Some(named) = margins.or(generation.margin) {
        options.margins = parse_margins(&named)?;
    }

    if output.exists() {
        backup_manager(config).backup(&output)?;
    }

    let bar = progress_bar("Generating PDF...");
    let result = pdfsmith_generate::generate(input, &output, &options);
    bar.finish_and_clear();
    let summary = result?;

    println!(
        "Generated {} with {} in {:.2}s",
        summary.output.display(),
        summary.engine.name(),
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}

fn engines(color: ColorMode) -> anyhow::Result<()> {
    let statuses = pdfsmith_generate::engine_statuses();
    output::print_engine_statuses(&mut std::io::stdout(), &statuses, color)?;
    Ok(())
}

fn backends(color: ColorMode) -> anyhow::Result<()> {
    let registry = build_registry();
    output::print_backend_statuses(&mut std::io::stdout(), &registry.statuses(), color)?;
    Ok(())
}

fn build_registry() -> BackendRegistry {
    let backends: Vec<Arc<dyn PdfBackend>> = vec![
        Arc::new(MupdfBackend::new()),
        Arc::new(PdfExtractBackend::new()),
        Arc::new(LopdfBackend::new()),
    ];
    BackendRegistry::new(backends)
}

/// Run one extraction with defaults resolved as CLI flags > config file >
/// built-in. A failed outcome becomes the process error (exit code 1).
fn run_extraction(
    input: &Path,
    selection: &PageSelection,
    backend: Option<String>,
    threshold: Option<f64>,
    config: &ConfigFile,
    show_progress: bool,
) -> anyhow::Result<ExtractionOutcome> {
    let extraction = config.extraction.clone().unwrap_or_default();
    let options = ExtractOptions {
        backend: backend.or(extraction.backend),
        quality_threshold: threshold
            .or(extraction.quality_threshold)
            .unwrap_or(pdfsmith_core::DEFAULT_QUALITY_THRESHOLD),
    };

    let extractor = Extractor::new(build_registry(), options)?;

    let bar = if show_progress {
        Some(progress_bar("Extracting text..."))
    } else {
        None
    };
    let outcome = extractor.extract(input, selection);
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    if !outcome.success {
        let reason = outcome
            .error_message
            .clone()
            .unwrap_or_else(|| "extraction failed".to_string());
        anyhow::bail!("{}: {}", input.display(), reason);
    }
    Ok(outcome)
}

/// Comma-separated page spec ("1,3,5-7") to a page list.
fn parse_page_spec(spec: &str) -> anyhow::Result<Vec<usize>> {
    let parts: Vec<String> = spec
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    Ok(pdfsmith_edit::parse_ranges(&parts)?)
}

fn parse_margins(name: &str) -> anyhow::Result<Margins> {
    match name.to_ascii_lowercase().as_str() {
        "narrow" => Ok(Margins::Narrow),
        "normal" => Ok(Margins::Normal),
        "wide" => Ok(Margins::Wide),
        other => anyhow::bail!("unknown margin preset: {}", other),
    }
}

fn backup_manager(config: &ConfigFile) -> BackupManager {
    let safety = config.safety.clone().unwrap_or_default();
    BackupManager::new(
        safety.backups.unwrap_or(true),
        safety.backup_retention.unwrap_or(5),
    )
}

fn progress_bar(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
