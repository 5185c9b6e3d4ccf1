// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — resolves the configuration file and hands commands
// their configuration and rasterizing pipeline.

use std::path::{Path, PathBuf};

use paperkit_core::AppConfig;
use paperkit_core::error::Result;
use paperkit_document::RasterPipeline;
use paperkit_engine::Engines;
use tracing::info;

use super::data_dir;

/// Configuration plus lazily built engines for one CLI invocation.
pub struct AppServices {
    config: AppConfig,
    config_path: PathBuf,
}

impl AppServices {
    /// Load configuration from `config_override`, or from `config.json` in the
    /// data directory. A missing file means defaults; a broken one is an error.
    pub fn init(config_override: Option<&Path>) -> Result<Self> {
        let config_path = config_override
            .map(Path::to_path_buf)
            .unwrap_or_else(data_dir::config_path);
        let config = AppConfig::load_or_default(&config_path)?;
        info!(path = %config_path.display(), "app services initialised");
        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Bind the render engines and build the pipeline. Only the rasterizing
    /// commands call this, so the page tools never try to load PDFium.
    pub fn pipeline(&self) -> RasterPipeline {
        let engines = Engines::initialize(&self.config.engine);
        RasterPipeline::from_config(engines, &self.config)
    }

    /// Persist the current configuration to its resolved path.
    pub fn save_config(&self) -> Result<()> {
        self.config.save(&self.config_path)
    }
}
