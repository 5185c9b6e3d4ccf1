// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub renderer for builds or hosts where no PDF render engine could be bound.
//
// It reports itself as not ready, and every call returns `Unavailable`, which
// the pipeline surfaces as `EngineNotReady`.

use paperkit_core::error::EngineError;

use crate::traits::*;

/// Placeholder installed when no real render engine is available.
#[derive(Debug, Clone)]
pub struct UnavailableRenderer {
    reason: String,
}

impl UnavailableRenderer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Why the real engine could not be loaded.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl RenderEngine for UnavailableRenderer {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn is_ready(&self) -> bool {
        false
    }

    fn open<'a>(
        &'a self,
        _bytes: &'a [u8],
        _password: Option<&'a str>,
    ) -> EngineResult<Box<dyn SourceDocument + 'a>> {
        tracing::warn!(reason = %self.reason, "RenderEngine::open called on stub renderer");
        Err(EngineError::Unavailable(self.reason.clone()))
    }
}
