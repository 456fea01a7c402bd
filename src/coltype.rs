//! Column types - canonical, storage-engine-agnostic column classification
//!
//! Raw SQL type text ("VARCHAR(255)", "UNSIGNED BIG INT", "DOUBLE PRECISION")
//! is normalized into one of eight canonical types. Normalization never
//! fails: anything unrecognized is treated as text.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Canonical column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Long,
    Short,
    Float,
    Double,
    String,
    Varchar,
    Blob,
}

/// Type-name aliases that normalize to text.
const TEXT_TYPES: &[&str] = &["CHARACTER", "VARCHAR", "NCHAR", "NVARCHAR", "TEXT", "CLOB"];

/// Type-name aliases that normalize to integers.
const INT_TYPES: &[&str] = &[
    "INT", "INTEGER", "TINYINT", "SMALLINT", "MEDIUMINT", "BIGINT", "INT2", "INT8",
];

const BLOB_TYPES: &[&str] = &["BLOB"];

/// Floating-point family; resolved per exact token.
const REAL_TYPES: &[&str] = &["REAL", "DOUBLE", "FLOAT"];

/// Numeric-ish declarations with no dedicated representation; they are
/// carried as text.
const NUMERIC_TYPES: &[&str] = &["NUMERIC", "DECIMAL", "BOOLEAN", "DATE", "DATETIME"];

/// Qualifier words that never stand alone as a type name; the word after
/// them is the actual type ("UNSIGNED BIG INT", "CHARACTER VARYING").
const QUALIFIERS: &[&str] = &["VARYING", "UNSIGNED", "BIG", "NATIVE"];

impl ColumnType {
    /// Get the string representation of the column type
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Long => "LONG",
            ColumnType::Short => "SHORT",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::String => "STRING",
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Blob => "BLOB",
        }
    }

    /// Get all column types
    pub fn all() -> &'static [ColumnType] {
        &[
            ColumnType::Integer,
            ColumnType::Long,
            ColumnType::Short,
            ColumnType::Float,
            ColumnType::Double,
            ColumnType::String,
            ColumnType::Varchar,
            ColumnType::Blob,
        ]
    }

    /// Map a declared type name to its column type by exact (case-insensitive)
    /// match. Used for structured introspection results, where the declared
    /// name is already a single token. Unrecognized names are `String`.
    pub fn from_decl(decl: &str) -> ColumnType {
        let decl = decl.trim();
        for ct in ColumnType::all() {
            if decl.eq_ignore_ascii_case(ct.as_str()) {
                return *ct;
            }
        }
        ColumnType::String
    }

    /// Normalize raw SQL type text into a column type.
    ///
    /// The first non-qualifier word is uppercased with only letters retained
    /// ("VARCHAR(255)" becomes "VARCHAR"), then resolved through the alias
    /// families. Unmatched tokens fall back to [`ColumnType::from_decl`],
    /// so the safe default is `String`. Never fails.
    pub fn normalize(raw: &str) -> ColumnType {
        let token = match type_token(raw) {
            Some(t) => t,
            None => return ColumnType::String,
        };
        let token = token.as_str();

        if TEXT_TYPES.contains(&token) {
            ColumnType::String
        } else if INT_TYPES.contains(&token) {
            ColumnType::Integer
        } else if BLOB_TYPES.contains(&token) {
            ColumnType::Blob
        } else if REAL_TYPES.contains(&token) {
            if token == "FLOAT" {
                ColumnType::Float
            } else {
                ColumnType::Double
            }
        } else if NUMERIC_TYPES.contains(&token) {
            ColumnType::String
        } else {
            ColumnType::from_decl(token)
        }
    }
}

/// Extract the significant type token from raw SQL type text: uppercase,
/// letters only, skipping leading qualifier words.
fn type_token(raw: &str) -> Option<String> {
    for word in raw.split_whitespace() {
        let cleaned: String = word
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if cleaned.is_empty() || QUALIFIERS.contains(&cleaned.as_str()) {
            continue;
        }
        return Some(cleaned);
    }
    None
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Normalization is total, so parsing cannot fail; the FromStr impl
        // exists for symmetry with Display.
        Ok(ColumnType::normalize(s))
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
