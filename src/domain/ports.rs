//! Storage ports.
//!
//! The persistent engine is an external collaborator; these traits are the
//! whole of what the ledger consumes from it. Adapters live under
//! `infrastructure`.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::account::{Account, AccountCategory};
use crate::domain::ids::{AccountId, CategoryId, CooperativeId, JournalEntryId};
use crate::domain::journal::{EntryTransition, JournalEntry, JournalLine};
use crate::domain::reports::{AccountTotals, DateRange};
use crate::domain::sequence::{CounterConfig, SequenceKey};
use crate::error::Result;

pub type AccountStoreBox = Box<dyn AccountStore>;
pub type JournalStoreBox = Box<dyn JournalStore>;
pub type SequenceStoreBox = Box<dyn SequenceStore>;

/// Chart-of-accounts table plus the shared category reference data.
///
/// Accounts are stored flat by id; the parent/child tree is resolved through
/// `children_of` rather than in-row back-pointers.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert_category(&self, category: AccountCategory) -> Result<()>;
    async fn get_category(&self, id: CategoryId) -> Result<Option<AccountCategory>>;
    async fn list_categories(&self) -> Result<Vec<AccountCategory>>;

    /// Inserts a new account. The (cooperative, code) uniqueness constraint
    /// is enforced here, atomically with the insert, and violations surface
    /// as `DuplicateCode`.
    async fn insert_account(&self, account: Account) -> Result<()>;

    /// Replaces the stored row. Only name, description, and active flag may
    /// differ from the stored version; the account must already exist.
    async fn update_account(&self, account: Account) -> Result<()>;

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>>;
    async fn get_by_code(
        &self,
        cooperative_id: CooperativeId,
        code: &str,
    ) -> Result<Option<Account>>;
    async fn list_accounts(&self, cooperative_id: CooperativeId) -> Result<Vec<Account>>;
    async fn children_of(&self, id: AccountId) -> Result<Vec<Account>>;
}

/// Journal entry headers and their owned lines.
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Persists a header plus all of its lines as one atomic unit: readers
    /// never observe a header without its lines.
    async fn insert_entry(&self, entry: JournalEntry, lines: Vec<JournalLine>) -> Result<()>;

    async fn get_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>>;
    async fn get_by_number(
        &self,
        cooperative_id: CooperativeId,
        number: &str,
    ) -> Result<Option<JournalEntry>>;
    async fn entry_lines(&self, id: JournalEntryId) -> Result<Vec<JournalLine>>;

    /// Applies [`JournalEntry::apply_transition`] under a row-level atomic
    /// section and returns the updated header. Concurrent transitions on the
    /// same entry serialize; the loser observes `NotDraft`.
    async fn transition_entry(
        &self,
        id: JournalEntryId,
        transition: EntryTransition,
    ) -> Result<JournalEntry>;

    /// Debit/kredit sums per account over lines of `posted` entries whose
    /// transaction date falls in `range`. Draft and cancelled entries are
    /// invisible here by contract.
    async fn sum_posted_by_account(
        &self,
        cooperative_id: CooperativeId,
        range: DateRange,
    ) -> Result<Vec<AccountTotals>>;

    /// Same aggregate, restricted to a single account.
    async fn sum_posted_for_account(
        &self,
        account_id: AccountId,
        range: DateRange,
    ) -> Result<AccountTotals>;
}

/// Sequence counter rows.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// One atomic read-modify-write cycle on the counter row for `key`:
    /// load (or create from `config` at value 1), run
    /// [`crate::domain::sequence::SequenceCounter::advance`], store, and
    /// return the issued value. All-or-nothing: on failure the stored value
    /// is unchanged and no number was reserved. Adapters report
    /// commit/contention failures as `Conflict` for the issuer to retry.
    async fn advance(
        &self,
        key: &SequenceKey,
        config: &CounterConfig,
        today: NaiveDate,
    ) -> Result<u64>;
}
