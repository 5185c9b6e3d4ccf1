// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the calling layer.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The caller shows the message and lets the user resubmit; nothing here
// retries on its own.

use crate::error::PaperkitError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth trying again as-is (e.g. an engine that failed to load).
    Transient,
    /// User must change something (password, page range, settings).
    ActionRequired,
    /// Cannot be fixed by retrying: damaged file, unsupported format.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether resubmitting the same input could succeed.
    pub retriable: bool,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `PaperkitError` into a `HumanError`.
pub fn humanize_error(err: &PaperkitError) -> HumanError {
    match err {
        // -- Pipeline --
        PaperkitError::EngineNotReady(detail) => HumanError {
            message: "The PDF engine isn't loaded.".into(),
            suggestion: format!(
                "Make sure the PDFium library is installed or configured, then try again. ({detail})"
            ),
            retriable: true,
            severity: Severity::Transient,
        },

        PaperkitError::IncorrectPassword => HumanError {
            message: "Incorrect password.".into(),
            suggestion: "Please check the Name and Year of Birth, or the password you typed.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PaperkitError::ProcessingFailed(detail) => HumanError {
            message: "We couldn't process this PDF.".into(),
            suggestion: format!("The file may be damaged or use features we can't render. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Document errors --
        PaperkitError::UnsupportedDocument(detail) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!("Try a PDF, JPEG, PNG, or WebP file instead. (File type: {detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        PaperkitError::Encrypted => HumanError {
            message: "This PDF is password-protected.".into(),
            suggestion: "Unlock it first, then run this tool on the unlocked copy.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PaperkitError::Pdf(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try opening it in a PDF viewer first to check it works, or try a different file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PaperkitError::Image(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PaperkitError::InvalidInput(detail) => HumanError {
            message: "Some of the settings aren't valid.".into(),
            suggestion: format!("Check the values and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PaperkitError::Archive(_) => HumanError {
            message: "The page images couldn't be packaged.".into(),
            suggestion: "Try again, or export the pages to a folder instead.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Configuration / storage --
        PaperkitError::Config(detail) => HumanError {
            message: "The configuration file couldn't be used.".into(),
            suggestion: format!("Fix or delete the configuration file to restore the defaults. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PaperkitError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Permission denied.".into(),
                    suggestion: "Check the file permissions, or choose a different output location.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        PaperkitError::Serialization(_) => HumanError {
            message: "Some stored data couldn't be read.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}
