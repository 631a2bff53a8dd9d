//! PDF generation from markdown or plain-text sources.
//!
//! Shells out to external typesetting engines rather than rendering PDF
//! itself: typst is compiled directly, the LaTeX engines are driven
//! through pandoc. Engine discovery is PATH-based.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),
    #[error("unknown engine: {0}")]
    UnknownEngine(String),
    #[error("no PDF generation engine found on PATH")]
    NoEngineAvailable,
    #[error("{engine} failed: {stderr}")]
    EngineFailed { engine: &'static str, stderr: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A typesetting engine reachable from PATH.
///
/// The variant order is the automatic selection preference: typst first
/// for speed, then the LaTeX engines by typographic quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Typst,
    Xelatex,
    Pdflatex,
    Lualatex,
}

impl Engine {
    pub const ALL: [Engine; 4] = [
        Engine::Typst,
        Engine::Xelatex,
        Engine::Pdflatex,
        Engine::Lualatex,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Engine::Typst => "typst",
            Engine::Xelatex => "xelatex",
            Engine::Pdflatex => "pdflatex",
            Engine::Lualatex => "lualatex",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Engine::Typst => "modern typesetting system, fast compilation and clean syntax",
            Engine::Xelatex => "modern LaTeX engine with excellent Unicode and font support",
            Engine::Pdflatex => "traditional LaTeX engine, fast and reliable for basic documents",
            Engine::Lualatex => "Lua-powered LaTeX engine with advanced scripting capabilities",
        }
    }

    pub fn parse(name: &str) -> Result<Self, GenerateError> {
        Self::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| GenerateError::UnknownEngine(name.to_string()))
    }

    /// PATH lookup; the LaTeX engines additionally need pandoc as the
    /// driver.
    pub fn is_available(&self) -> bool {
        match self {
            Engine::Typst => which::which("typst").is_ok(),
            latex => {
                which::which("pandoc").is_ok() && which::which(latex.name()).is_ok()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Margins {
    Narrow,
    #[default]
    Normal,
    Wide,
}

impl Margins {
    fn geometry(&self) -> &'static str {
        match self {
            Margins::Narrow => "geometry:margin=0.5in",
            Margins::Normal => "geometry:margin=1in",
            Margins::Wide => "geometry:margin=1.25in",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Named engine override; automatic selection when `None`.
    pub engine: Option<String>,
    pub font_main: String,
    pub font_code: String,
    pub font_size: u32,
    pub margins: Margins,
    pub include_toc: bool,
    pub number_sections: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            engine: None,
            font_main: "Liberation Serif".to_string(),
            font_code: "Liberation Mono".to_string(),
            font_size: 11,
            margins: Margins::Normal,
            include_toc: false,
            number_sections: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub output: PathBuf,
    pub engine: Engine,
    pub elapsed: Duration,
}

/// Availability of every known engine, in preference order.
pub fn engine_statuses() -> Vec<(Engine, bool)> {
    Engine::ALL.into_iter().map(|e| (e, e.is_available())).collect()
}

/// Pick an engine: honor an available named request, otherwise take the
/// first available engine in preference order.
fn select_engine(requested: Option<&str>) -> Result<Engine, GenerateError> {
    if let Some(name) = requested {
        let engine = Engine::parse(name)?;
        if engine.is_available() {
            return Ok(engine);
        }
        warn!(
            requested = name,
            "requested engine not available, falling back to auto selection"
        );
    }
    Engine::ALL
        .into_iter()
        .find(Engine::is_available)
        .ok_or(GenerateError::NoEngineAvailable)
}

/// Generate a PDF from a markdown or plain-text file.
pub fn generate(
    input: &Path,
    output: &Path,
    options: &GenerationOptions,
) -> Result<GenerationSummary, GenerateError> {
    let started = Instant::now();

    if !input.is_file() {
        return Err(GenerateError::InputNotFound(input.to_path_buf()));
    }

    let engine = select_engine(options.engine.as_deref())?;

    match engine {
        Engine::Typst => generate_with_typst(input, output, options)?,
        latex => generate_with_pandoc(input, output, options, latex)?,
    }

    let elapsed = started.elapsed();
    info!(
        engine = engine.name(),
        output = %output.display(),
        elapsed_ms = elapsed.as_millis() as u64,
        "PDF generated"
    );
    Ok(GenerationSummary {
        output: output.to_path_buf(),
        engine,
        elapsed,
    })
}

fn generate_with_typst(
    input: &Path,
    output: &Path,
    options: &GenerationOptions,
) -> Result<(), GenerateError> {
    let content = std::fs::read_to_string(input)?;
    let typst_source = markdown_to_typst(&content, options);

    let dir = tempfile::tempdir()?;
    let typst_path = dir.path().join("document.typ");
    std::fs::write(&typst_path, typst_source)?;

    let result = Command::new("typst")
        .arg("compile")
        .arg(&typst_path)
        .arg(output)
        .output()?;

    if result.status.success() {
        Ok(())
    } else {
        Err(GenerateError::EngineFailed {
            engine: "typst",
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        })
    }
}

fn generate_with_pandoc(
    input: &Path,
    output: &Path,
    options: &GenerationOptions,
    engine: Engine,
) -> Result<(), GenerateError> {
    let mut cmd = Command::new("pandoc");
    cmd.arg(input)
        .arg("-o")
        .arg(output)
        .arg(format!("--pdf-engine={}", engine.name()))
        .args(["--variable", &format!("fontsize={}pt", options.font_size)])
        .args(["--variable", &format!("mainfont={}", options.font_main)])
        .args(["--variable", &format!("monofont={}", options.font_code)])
        .args(["--variable", options.margins.geometry()]);

    if options.include_toc {
        cmd.arg("--toc");
    }
    if options.number_sections {
        cmd.arg("--number-sections");
    }

    debug!(?cmd, "running pandoc");
    let result = cmd.output()?;

    if result.status.success() {
        Ok(())
    } else {
        Err(GenerateError::EngineFailed {
            engine: "pandoc",
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        })
    }
}

/// Line-based markdown-to-typst conversion: ATX headings map to typst
/// heading markers, fenced code blocks pass through, everything else is
/// copied as-is.
fn markdown_to_typst(content: &str, options: &GenerationOptions) -> String {
    let mut doc = format!(
        "#set text(font: \"{}\", size: {}pt)\n#set raw(font: \"{}\")\n#set page(margin: 1in)\n\n",
        options.font_main, options.font_size, options.font_code
    );

    if options.include_toc {
        doc.push_str("#outline()\n\n");
    }

    let mut in_code_block = false;
    for line in content.lines() {
        if line.trim_start().starts_with("```") {
            doc.push_str("```\n");
            in_code_block = !in_code_block;
        } else if in_code_block {
            doc.push_str(line);
            doc.push('\n');
        } else if let Some(rest) = line.strip_prefix("### ") {
            doc.push_str(&format!("=== {rest}\n"));
        } else if let Some(rest) = line.strip_prefix("## ") {
            doc.push_str(&format!("== {rest}\n"));
        } else if let Some(rest) = line.strip_prefix("# ") {
            doc.push_str(&format!("= {rest}\n"));
        } else {
            doc.push_str(line);
            doc.push('\n');
        }
    }

    doc
}
