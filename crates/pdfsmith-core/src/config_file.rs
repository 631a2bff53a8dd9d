use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub extraction: Option<ExtractionConfig>,
    pub generation: Option<GenerationConfig>,
    pub safety: Option<SafetyConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Preferred backend name; automatic selection when unset.
    pub backend: Option<String>,
    /// Aggregate score below which the fallback backend is tried.
    pub quality_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Preferred PDF generation engine (`typst` or `pandoc`).
    pub engine: Option<String>,
    pub paper_size: Option<String>,
    pub font_size: Option<String>,
    pub margin: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Back up files before destructive edits.
    pub backups: Option<bool>,
    /// How many backups to keep per original file.
    pub backup_retention: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub color: Option<String>,
    pub progress: Option<bool>,
}

/// Platform config directory path: `<config_dir>/pdfsmith/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pdfsmith").join("config.toml"))
}

/// Load config by cascading CWD `.pdfsmith.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".pdfsmith.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        extraction: Some(ExtractionConfig {
            backend: overlay
                .extraction
                .as_ref()
                .and_then(|e| e.backend.clone())
                .or_else(|| base.extraction.as_ref().and_then(|e| e.backend.clone())),
            quality_threshold: overlay
                .extraction
                .as_ref()
                .and_then(|e| e.quality_threshold)
                .or_else(|| base.extraction.as_ref().and_then(|e| e.quality_threshold)),
        }),
        generation: Some(GenerationConfig {
            engine: overlay
                .generation
                .as_ref()
                .and_then(|g| g.engine.clone())
                .or_else(|| base.generation.as_ref().and_then(|g| g.engine.clone())),
            paper_size: overlay
                .generation
                .as_ref()
                .and_then(|g| g.paper_size.clone())
                .or_else(|| base.generation.as_ref().and_then(|g| g.paper_size.clone())),
            font_size: overlay
                .generation
                .as_ref()
                .and_then(|g| g.font_size.clone())
                .or_else(|| base.generation.as_ref().and_then(|g| g.font_size.clone())),
            margin: overlay
                .generation
                .as_ref()
                .and_then(|g| g.margin.clone())
                .or_else(|| base.generation.as_ref().and_then(|g| g.margin.clone())),
        }),
        safety: Some(SafetyConfig {
            backups: overlay
                .safety
                .as_ref()
                .and_then(|s| s.backups)
                .or_else(|| base.safety.as_ref().and_then(|s| s.backups)),
            backup_retention: overlay
                .safety
                .as_ref()
                .and_then(|s| s.backup_retention)
                .or_else(|| base.safety.as_ref().and_then(|s| s.backup_retention)),
        }),
        display: Some(DisplayConfig {
            color: overlay
                .display
                .as_ref()
                .and_then(|d| d.color.clone())
                .or_else(|| base.display.as_ref().and_then(|d| d.color.clone())),
            progress: overlay
                .display
                .as_ref()
                .and_then(|d| d.progress)
                .or_else(|| base.display.as_ref().and_then(|d| d.progress)),
        }),
    }
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(&path, content).map_err(|e| format!("Failed to write config: {}", e))?;
    Ok(path)
}
