//! Journal entries, their lines, and the posting state machine.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{AccountId, CooperativeId, JournalEntryId, JournalLineId, TenantId, UserId};
use crate::domain::money::Amount;
use crate::error::{LedgerError, Result};

/// Lifecycle of a journal entry.
///
/// `Draft -> Posted` and `Draft -> Cancelled` are the only transitions; both
/// targets are terminal. Correcting a posted entry takes a new, independent
/// reversing entry, never a mutation of history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Draft,
    Posted,
    Cancelled,
}

impl core::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Posted => "posted",
            EntryStatus::Cancelled => "cancelled",
        })
    }
}

/// A state-machine step applied to a draft entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryTransition {
    Post { by: UserId, at: DateTime<Utc> },
    Cancel,
}

/// Journal entry header. Lines are owned and stored alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    pub tenant_id: TenantId,
    pub cooperative_id: CooperativeId,
    /// Minted, human-readable number, unique per cooperative.
    pub number: String,
    /// Transaction date; all report cutoffs key on this, not on `posted_at`.
    pub date: NaiveDate,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub total_debit: Amount,
    pub total_kredit: Amount,
    pub status: EntryStatus,
    pub created_by: UserId,
    pub posted_by: Option<UserId>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl JournalEntry {
    /// Runs the posting state machine.
    ///
    /// Any transition from a non-draft state fails with `NotDraft`, which
    /// makes a retried `post` after a dropped response fail loudly instead
    /// of double-posting. Storage adapters call this inside their row-level
    /// atomic section so concurrent callers lose deterministically.
    pub fn apply_transition(&mut self, transition: &EntryTransition) -> Result<()> {
        if self.status != EntryStatus::Draft {
            return Err(LedgerError::NotDraft(self.id));
        }
        match transition {
            EntryTransition::Post { by, at } => {
                self.status = EntryStatus::Posted;
                self.posted_by = Some(*by);
                self.posted_at = Some(*at);
            }
            EntryTransition::Cancel => {
                self.status = EntryStatus::Cancelled;
            }
        }
        Ok(())
    }
}

/// One account-level component of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub id: JournalLineId,
    pub entry_id: JournalEntryId,
    pub account_id: AccountId,
    pub description: Option<String>,
    pub debit: Amount,
    pub kredit: Amount,
}

impl JournalLine {
    /// Net contribution in the debit-positive convention.
    pub fn net(&self) -> Decimal {
        self.debit.value() - self.kredit.value()
    }
}

/// How a calling module names an account in a posting request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountRef {
    Id(AccountId),
    Code(String),
}

impl core::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AccountRef::Id(id) => write!(f, "id {id}"),
            AccountRef::Code(code) => write!(f, "code {code}"),
        }
    }
}

/// One requested line of a posting request.
#[derive(Debug, Clone)]
pub struct NewJournalLine {
    pub account: AccountRef,
    pub debit: Amount,
    pub kredit: Amount,
    pub description: Option<String>,
}

impl NewJournalLine {
    pub fn debit(account: AccountRef, amount: Amount) -> Self {
        Self {
            account,
            debit: amount,
            kredit: Amount::ZERO,
            description: None,
        }
    }

    pub fn kredit(account: AccountRef, amount: Amount) -> Self {
        Self {
            account,
            debit: Amount::ZERO,
            kredit: amount,
            description: None,
        }
    }
}

/// A balanced-journal posting request, as submitted by a calling module
/// (sales, loan disbursement, settlement, registration fees, ...). The
/// caller decides which accounts its business event affects; the engine
/// only validates and records.
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub tenant_id: TenantId,
    pub cooperative_id: CooperativeId,
    pub date: NaiveDate,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub lines: Vec<NewJournalLine>,
    pub created_by: UserId,
}
