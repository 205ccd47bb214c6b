//! Error types produced while loading projects, rule tables and engine options.
//!
//! The engine itself never fails: every domain ambiguity is reported as a flag in
//! the [`EvaluationResult`](crate::EvaluationResult). The errors below describe
//! inputs that are rejected at the boundary, before an evaluation starts.

use thiserror::Error;

/// Error returned when a project input document is malformed.
#[derive(Debug, Error)]
pub enum InputError {
    /// Returned when the document is not valid JSON or has the wrong shape.
    #[error("project input is not valid: {source}")]
    Json {
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },
    /// Returned when two members share an identifier.
    #[error("member id {0:?} appears more than once")]
    DuplicateMember(String),
    /// Returned when two joints share an identifier.
    #[error("joint id {0:?} appears more than once")]
    DuplicateJoint(String),
    /// Returned when a joint does not list any connected member.
    #[error("joint {0:?} has no connected members")]
    EmptyConnection(String),
}

impl PartialEq for InputError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Json { source: a }, Self::Json { source: b }) => a.to_string() == b.to_string(),
            (Self::DuplicateMember(a), Self::DuplicateMember(b))
            | (Self::DuplicateJoint(a), Self::DuplicateJoint(b))
            | (Self::EmptyConnection(a), Self::EmptyConnection(b)) => a == b,
            _ => false,
        }
    }
}

/// Error returned when a rule table revision fails validation.
///
/// Loaded revisions are checked before they are handed to the engine so that an
/// inconsistent table is caught as an explicit, auditable failure rather than a
/// silent mismatch during lookup.
///
/// # Examples
///
/// ```
/// use coamingx::{RuleTable, RuleTableError};
///
/// let error = RuleTable::from_json(r#"{"revision": "draft", "table_821": [], "table_822": []}"#)
///     .expect_err("empty table rejected");
/// assert_eq!(error, RuleTableError::Empty { table: "8.2.1" });
/// ```
#[derive(Debug, Error)]
pub enum RuleTableError {
    /// Returned when the revision document cannot be parsed.
    #[error("rule table is not valid: {source}")]
    Json {
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },
    /// Returned when one of the two tables has no rows.
    #[error("table {table} has no rows")]
    Empty {
        /// Name of the empty table.
        table: &'static str,
    },
    /// Returned when a thickness range is empty or inverted.
    #[error("row {yield_strength}/{min}<t<={max} has an invalid thickness range")]
    InvalidRange {
        /// Yield band of the offending row in N/mm².
        yield_strength: u32,
        /// Exclusive lower bound in millimetres.
        min: f64,
        /// Inclusive upper bound in millimetres.
        max: f64,
    },
    /// Returned when two rows of the same yield band overlap.
    #[error("rows of yield band {yield_strength} overlap near t={at} mm")]
    OverlappingRange {
        /// Yield band that holds the overlapping rows in N/mm².
        yield_strength: u32,
        /// Thickness at which the overlap starts in millimetres.
        at: f64,
    },
}

impl PartialEq for RuleTableError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Json { source: a }, Self::Json { source: b }) => a.to_string() == b.to_string(),
            (Self::Empty { table: a }, Self::Empty { table: b }) => a == b,
            (
                Self::InvalidRange {
                    yield_strength: ya,
                    min: mina,
                    max: maxa,
                },
                Self::InvalidRange {
                    yield_strength: yb,
                    min: minb,
                    max: maxb,
                },
            ) => ya == yb && mina == minb && maxa == maxb,
            (
                Self::OverlappingRange {
                    yield_strength: ya,
                    at: ata,
                },
                Self::OverlappingRange {
                    yield_strength: yb,
                    at: atb,
                },
            ) => ya == yb && ata == atb,
            _ => false,
        }
    }
}

/// Error returned when engine options cannot be loaded.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// Returned when the options document cannot be parsed.
    #[error("engine options are not valid: {source}")]
    Json {
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },
    /// Returned when a threshold is zero, negative or not finite.
    #[error("option {name} must be a positive number (received {value})")]
    NonPositive {
        /// Name of the rejected option.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
}
