// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paperkit — Core types, passwords, configuration, and error definitions
// shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod password;
pub mod types;

pub use config::{AppConfig, EngineConfig};
pub use error::{EngineError, PaperkitError};
pub use password::{Password, derive_password};
pub use types::*;
