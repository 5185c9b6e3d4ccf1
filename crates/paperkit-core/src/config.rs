// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PaperkitError, Result};
use crate::types::{
    CompressionPresets, ImageCompressionOptions, RasterOptions, WatermarkOptions,
};

/// Where to find native engines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the PDFium shared library. When unset the working
    /// directory and then the system library path are tried.
    pub pdfium_library_dir: Option<PathBuf>,
}

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Render scale / quality used when unlocking.
    pub unlock: RasterOptions,
    /// Render scale / quality for each compression level.
    pub compression: CompressionPresets,
    /// Render scale / quality for PDF → JPG page export.
    pub page_export: RasterOptions,
    /// Defaults for the image compressor.
    pub image: ImageCompressionOptions,
    /// Defaults for the watermark tool.
    pub watermark: WatermarkOptions,
    pub engine: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            unlock: RasterOptions::UNLOCK,
            compression: CompressionPresets::default(),
            page_export: RasterOptions::PAGE_EXPORT,
            image: ImageCompressionOptions::default(),
            watermark: WatermarkOptions::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Check every option value.
    pub fn validate(&self) -> Result<()> {
        self.unlock.validate()?;
        self.compression.validate()?;
        self.page_export.validate()?;
        self.image.validate()?;
        self.watermark.validate()
    }

    /// Load from a JSON file. Missing keys fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw).map_err(|err| {
            PaperkitError::Config(format!("{} is not valid: {}", path.display(), err))
        })?;
        config
            .validate()
            .map_err(|err| PaperkitError::Config(format!("{}: {}", path.display(), err)))?;
        debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load from `path`, or return the defaults when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompressionLevel;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.unlock, RasterOptions::UNLOCK);
        assert_eq!(
            config.compression.preset(CompressionLevel::Low),
            RasterOptions { scale: 0.8, quality: 0.3 }
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn save_then_load_preserves_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.compression.low = RasterOptions { scale: 0.5, quality: 0.2 };
        config.engine.pdfium_library_dir = Some(PathBuf::from("/opt/pdfium/lib"));
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "unlock": { "scale": 3.0, "quality": 0.9 } }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.unlock, RasterOptions { scale: 3.0, quality: 0.9 });
        assert_eq!(config.watermark, WatermarkOptions::default());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "unlock": { "scale": 2.0, "quality": 4.0 } }"#).unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, PaperkitError::Config(_)));
    }

    #[test]
    fn oversized_scale_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "unlock": { "scale": 5000.0, "quality": 0.9 } }"#).unwrap();

        assert!(matches!(AppConfig::load(&path), Err(PaperkitError::Config(_))));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(AppConfig::load(&path), Err(PaperkitError::Config(_))));
    }
}
