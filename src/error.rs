use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::account::{CategoryType, NormalBalance};
use crate::domain::ids::{CooperativeId, JournalEntryId};

/// Result type used across the crate.
pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

/// Ledger failure taxonomy.
///
/// Validation variants are raised before any persistence side effect, so a
/// caller that receives one can correct its input and retry safely.
/// `Conflict` is transient and only retried internally by the sequence
/// issuer; every other operation surfaces it unchanged rather than silently
/// replaying a financially significant mutation.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("journal entry is not balanced: total debit {debit} != total kredit {kredit}")]
    UnbalancedEntry { debit: Decimal, kredit: Decimal },

    #[error("journal entry needs at least two lines, got {0}")]
    InsufficientLines(usize),

    #[error("unknown account: {0}")]
    UnknownAccount(String),

    #[error("account code {code} already exists in cooperative {cooperative_id}")]
    DuplicateCode {
        cooperative_id: CooperativeId,
        code: String,
    },

    #[error("normal balance {declared} contradicts the {category} convention ({expected})")]
    InvalidCategory {
        category: CategoryType,
        declared: NormalBalance,
        expected: NormalBalance,
    },

    #[error("journal entry {0} is not a draft")]
    NotDraft(JournalEntryId),

    #[error("{0} not found")]
    NotFound(String),

    #[error("amount must not be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("sequence {key} could not be advanced after {attempts} attempts")]
    SequenceConflict { key: String, attempts: u32 },

    #[error("storage conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(source))
    }
}
