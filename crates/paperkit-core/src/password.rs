// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document passwords, including the identity-derived e-Aadhaar scheme.

use std::fmt;

use crate::error::{PaperkitError, Result};

/// A document password.
///
/// Deliberately has no `Display` impl and a redacted `Debug` so it cannot end
/// up in a log line by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The secret itself, for handing to a render engine.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Number of name characters that go into a derived password.
const NAME_PREFIX_LEN: usize = 4;

/// Derive the e-Aadhaar password: the first four letters of the name in
/// capitals, followed by the year of birth.
///
/// All whitespace is removed from `full_name` before it is uppercased and
/// truncated. Names shorter than four characters are used as-is; nothing is
/// padded. `year_of_birth` is appended verbatim.
///
/// ```
/// use paperkit_core::password::derive_password;
///
/// assert_eq!(derive_password("Anish Kumar", "1990").expose(), "ANIS1990");
/// ```
pub fn derive_password(full_name: &str, year_of_birth: &str) -> Password {
    let compact: String = full_name.chars().filter(|c| !c.is_whitespace()).collect();
    let prefix: String = compact
        .to_uppercase()
        .chars()
        .take(NAME_PREFIX_LEN)
        .collect();
    Password(format!("{prefix}{year_of_birth}"))
}

/// Check that a year of birth is exactly four ASCII digits.
pub fn validate_year_of_birth(year: &str) -> Result<()> {
    if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(PaperkitError::InvalidInput(format!(
            "year of birth must be four digits, got '{year}'"
        )))
    }
}
