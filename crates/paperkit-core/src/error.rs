// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Paperkit.

use thiserror::Error;

/// Top-level error type for all Paperkit operations.
#[derive(Debug, Error)]
pub enum PaperkitError {
    // -- Rasterizing pipeline --
    /// A required engine (renderer or PDF author) was never initialised.
    #[error("engine not ready: {0}")]
    EngineNotReady(String),

    /// The render engine rejected the supplied password (or none was given
    /// for an encrypted document).
    #[error("incorrect password")]
    IncorrectPassword,

    #[error("could not process PDF: {0}")]
    ProcessingFailed(String),

    // -- Document errors --
    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    /// The page tools only work on unencrypted documents.
    #[error("document is encrypted")]
    Encrypted,

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("could not build archive: {0}")]
    Archive(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Typed failure reported by an engine implementation.
///
/// Engines classify their own failures so callers never have to sniff error
/// messages to recognise a password problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The document is encrypted and the password was missing or wrong.
    #[error("authentication failed")]
    Authentication,

    /// The engine (or its native library) is not available.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Failed(String),
}

impl From<EngineError> for PaperkitError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Authentication => PaperkitError::IncorrectPassword,
            EngineError::Unavailable(detail) => PaperkitError::EngineNotReady(detail),
            EngineError::Failed(detail) => PaperkitError::ProcessingFailed(detail),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PaperkitError>;
