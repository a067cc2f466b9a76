use std::{fmt, sync::LazyLock};

use regex::Regex;

use crate::errors::TableNameError;

/// Longest accepted destination table name. Leaves room for the `_signature_key`
/// suffix of the uniqueness index within PostgreSQL's 63 byte identifier limit.
pub const MAX_TABLE_NAME_LEN: usize = 49;

static TABLE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap_or_else(|_| unreachable!("static pattern"))
});

/// Tables the writer owns inside every tenant database.
const RESERVED: &[&str] = &[
    "normalized_webhook_payloads",
    "normalized_account_data",
    "normalized_token_balance_changes",
    "normalized_native_transfers",
    "normalized_token_transfers",
];

/// A destination table name that has passed the identifier allow-list.
///
/// This is the only form in which a subscriber-controlled name reaches DDL or DML.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn parse(raw: &str) -> Result<Self, TableNameError> {
        if raw.is_empty() {
            return Err(TableNameError::Empty);
        }
        if raw.len() > MAX_TABLE_NAME_LEN {
            return Err(TableNameError::TooLong(raw.to_string()));
        }
        if !TABLE_NAME_RE.is_match(raw) {
            return Err(TableNameError::InvalidCharacters(raw.to_string()));
        }
        if RESERVED.contains(&raw) || raw.starts_with("pg_") {
            return Err(TableNameError::Reserved(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Turn a free-form label (a token name, usually) into a valid table name.
    ///
    /// Runs of anything outside `[a-z0-9]` collapse into one underscore, a leading digit
    /// gets a `t_` prefix and the result is truncated to [`MAX_TABLE_NAME_LEN`]. An empty
    /// result falls back to `fallback`, which is sanitized the same way.
    pub fn sanitize(label: &str, fallback: &str) -> Result<Self, TableNameError> {
        let candidate = Self::slug(label);
        let candidate = if candidate.is_empty() { Self::slug(fallback) } else { candidate };
        Self::parse(&candidate)
    }

    fn slug(label: &str) -> String {
        let mut out = String::with_capacity(label.len());
        let mut pending_sep = false;
        for c in label.chars().flat_map(char::to_lowercase) {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                if pending_sep && !out.is_empty() {
                    out.push('_');
                }
                pending_sep = false;
                out.push(c);
            } else {
                pending_sep = true;
            }
        }
        if out.starts_with(|c: char| c.is_ascii_digit()) {
            out.insert_str(0, "t_");
        }
        if RESERVED.contains(&out.as_str()) || out.starts_with("pg_") {
            out.insert_str(0, "t_");
        }
        out.truncate(MAX_TABLE_NAME_LEN);
        while out.ends_with('_') {
            out.pop();
        }
        out
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted identifier, safe to splice into SQL text.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }

    /// Name of the unique index guarding the signature of rows in this table.
    pub fn signature_index(&self) -> String {
        format!("\"{}_signature_key\"", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
