//! Application Configuration
//!
//! Scanner settings stored in TOML format.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::detector::DetectionConfig;
use crate::matching::Matcher;
use crate::vision::{OcrBackend, SidecarRecognizer};

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Detection parameters
    pub detection: DetectionConfig,
    /// Similarity scoring
    pub matching: Matcher,
    /// Name list
    pub vocabulary: VocabularySettings,
    /// OCR backend
    pub ocr: OcrSettings,
}

impl AppConfig {
    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        self.detection
            .validate()
            .map_err(|e| anyhow!("invalid [detection] settings: {e}"))?;

        if self.ocr.backend == OcrBackend::Bridge && self.ocr.bridge_program.is_none() {
            return Err(anyhow!("[ocr] backend = \"bridge\" requires bridge_program"));
        }

        Ok(())
    }
}

/// Vocabulary source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularySettings {
    /// Name list file (plain text or JSON array); built-in list when unset
    pub path: Option<PathBuf>,
}

/// OCR backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Which backend runs recognition
    pub backend: OcrBackend,
    /// Program started by the bridge backend
    pub bridge_program: Option<PathBuf>,
    /// Leading arguments for the bridge program (e.g. a script path)
    pub bridge_args: Vec<String>,
    /// Suffix appended to the image path to find sidecar JSON
    pub sidecar_suffix: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            backend: OcrBackend::Sidecar,
            bridge_program: None,
            bridge_args: Vec::new(),
            sidecar_suffix: SidecarRecognizer::DEFAULT_SUFFIX.to_string(),
        }
    }
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "pokemoncardscanner", "PokemonCardScanner")
        .ok_or_else(|| anyhow!("Could not determine config directory"))?;

    Ok(proj_dirs.config_dir().to_path_buf())
}

/// Default location of the configuration file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {:?}", path))?;
    let config: AppConfig =
        toml::from_str(&content).with_context(|| format!("failed to parse config {:?}", path))?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
