//! Persistent adapter backed by RocksDB pessimistic transactions.
//!
//! Each logical table maps to a column family; rows are JSON. The atomic
//! cycles (counter bump, status transition, header+lines insert, code
//! uniqueness check) run inside a `TransactionDB` transaction with
//! `get_for_update` row locks, so concurrent writers on the same row
//! serialize and commit conflicts surface as `Conflict` for the caller.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, ErrorKind, IteratorMode, Options, TransactionDB,
    TransactionDBOptions,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::account::{Account, AccountCategory};
use crate::domain::ids::{AccountId, CategoryId, CooperativeId, JournalEntryId};
use crate::domain::journal::{EntryStatus, EntryTransition, JournalEntry, JournalLine};
use crate::domain::ports::{AccountStore, JournalStore, SequenceStore};
use crate::domain::reports::{AccountTotals, DateRange};
use crate::domain::sequence::{CounterConfig, SequenceCounter, SequenceKey};
use crate::error::{LedgerError, Result};

pub const CF_CATEGORIES: &str = "categories";
pub const CF_ACCOUNTS: &str = "accounts";
/// Uniqueness index: "cooperative/code" -> account id.
pub const CF_ACCOUNT_CODES: &str = "account_codes";
pub const CF_JOURNAL_ENTRIES: &str = "journal_entries";
/// Lines are stored per owning entry under the entry id, so the header and
/// its lines live or die together.
pub const CF_JOURNAL_LINES: &str = "journal_lines";
/// Uniqueness index: "cooperative/number" -> entry id.
pub const CF_JOURNAL_NUMBERS: &str = "journal_numbers";
pub const CF_SEQUENCE_COUNTERS: &str = "sequence_counters";

const ALL_CFS: [&str; 7] = [
    CF_CATEGORIES,
    CF_ACCOUNTS,
    CF_ACCOUNT_CODES,
    CF_JOURNAL_ENTRIES,
    CF_JOURNAL_LINES,
    CF_JOURNAL_NUMBERS,
    CF_SEQUENCE_COUNTERS,
];

/// RocksDB-backed store implementing all three ports.
///
/// `Clone` shares the underlying `Arc<TransactionDB>`.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<TransactionDB>,
}

impl RocksDbStore {
    /// Opens or creates the database, ensuring every column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = TransactionDB::open_cf_descriptors(
            &opts,
            &TransactionDBOptions::default(),
            path,
            cfs,
        )
        .map_err(map_rocks_err)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::storage(std::io::Error::other(format!(
                "{name} column family not found"
            )))
        })
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key).map_err(map_rocks_err)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn lines_of(&self, id: JournalEntryId) -> Result<Vec<JournalLine>> {
        Ok(self
            .get_json::<Vec<JournalLine>>(CF_JOURNAL_LINES, id.as_uuid().as_bytes())?
            .unwrap_or_default())
    }
}

fn map_rocks_err(e: rocksdb::Error) -> LedgerError {
    match e.kind() {
        ErrorKind::Busy | ErrorKind::TimedOut | ErrorKind::TryAgain => {
            LedgerError::Conflict(e.to_string())
        }
        _ => LedgerError::storage(e),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(LedgerError::storage)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(LedgerError::storage)
}

fn code_key(cooperative_id: CooperativeId, code: &str) -> Vec<u8> {
    format!("{cooperative_id}/{code}").into_bytes()
}

fn number_key(cooperative_id: CooperativeId, number: &str) -> Vec<u8> {
    format!("{cooperative_id}/{number}").into_bytes()
}

#[async_trait]
impl AccountStore for RocksDbStore {
    async fn insert_category(&self, category: AccountCategory) -> Result<()> {
        let cf = self.cf(CF_CATEGORIES)?;
        self.db
            .put_cf(cf, category.id.as_uuid().as_bytes(), encode(&category)?)
            .map_err(map_rocks_err)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<AccountCategory>> {
        self.get_json(CF_CATEGORIES, id.as_uuid().as_bytes())
    }

    async fn list_categories(&self) -> Result<Vec<AccountCategory>> {
        let cf = self.cf(CF_CATEGORIES)?;
        let mut categories = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(map_rocks_err)?;
            categories.push(decode::<AccountCategory>(&value)?);
        }
        categories.sort_by_key(|c| c.display_order);
        Ok(categories)
    }

    async fn insert_account(&self, account: Account) -> Result<()> {
        let accounts_cf = self.cf(CF_ACCOUNTS)?;
        let codes_cf = self.cf(CF_ACCOUNT_CODES)?;
        let code = code_key(account.cooperative_id, &account.code);

        let txn = self.db.transaction();
        if txn
            .get_for_update_cf(codes_cf, &code, true)
            .map_err(map_rocks_err)?
            .is_some()
        {
            return Err(LedgerError::DuplicateCode {
                cooperative_id: account.cooperative_id,
                code: account.code,
            });
        }
        txn.put_cf(codes_cf, &code, account.id.as_uuid().as_bytes())
            .map_err(map_rocks_err)?;
        txn.put_cf(accounts_cf, account.id.as_uuid().as_bytes(), encode(&account)?)
            .map_err(map_rocks_err)?;
        txn.commit().map_err(map_rocks_err)
    }

    async fn update_account(&self, account: Account) -> Result<()> {
        let accounts_cf = self.cf(CF_ACCOUNTS)?;
        let id_key = *account.id.as_uuid().as_bytes();

        let txn = self.db.transaction();
        let stored: Account = match txn
            .get_for_update_cf(accounts_cf, id_key, true)
            .map_err(map_rocks_err)?
        {
            Some(bytes) => decode(&bytes)?,
            None => {
                return Err(LedgerError::not_found(format!("account {}", account.id)));
            }
        };
        if stored.code != account.code {
            return Err(LedgerError::Conflict(
                "account code is immutable".to_string(),
            ));
        }
        txn.put_cf(accounts_cf, id_key, encode(&account)?)
            .map_err(map_rocks_err)?;
        txn.commit().map_err(map_rocks_err)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        self.get_json(CF_ACCOUNTS, id.as_uuid().as_bytes())
    }

    async fn get_by_code(
        &self,
        cooperative_id: CooperativeId,
        code: &str,
    ) -> Result<Option<Account>> {
        let codes_cf = self.cf(CF_ACCOUNT_CODES)?;
        let id_bytes = match self
            .db
            .get_cf(codes_cf, code_key(cooperative_id, code))
            .map_err(map_rocks_err)?
        {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        self.get_json(CF_ACCOUNTS, &id_bytes)
    }

    async fn list_accounts(&self, cooperative_id: CooperativeId) -> Result<Vec<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let mut accounts = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(map_rocks_err)?;
            let account: Account = decode(&value)?;
            if account.cooperative_id == cooperative_id {
                accounts.push(account);
            }
        }
        Ok(accounts)
    }

    async fn children_of(&self, id: AccountId) -> Result<Vec<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let mut children = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(map_rocks_err)?;
            let account: Account = decode(&value)?;
            if account.parent_id == Some(id) {
                children.push(account);
            }
        }
        Ok(children)
    }
}

#[async_trait]
impl JournalStore for RocksDbStore {
    async fn insert_entry(&self, entry: JournalEntry, lines: Vec<JournalLine>) -> Result<()> {
        let entries_cf = self.cf(CF_JOURNAL_ENTRIES)?;
        let lines_cf = self.cf(CF_JOURNAL_LINES)?;
        let numbers_cf = self.cf(CF_JOURNAL_NUMBERS)?;
        let number = number_key(entry.cooperative_id, &entry.number);

        let txn = self.db.transaction();
        if txn
            .get_for_update_cf(numbers_cf, &number, true)
            .map_err(map_rocks_err)?
            .is_some()
        {
            return Err(LedgerError::Conflict(format!(
                "journal number {} already exists",
                entry.number
            )));
        }
        txn.put_cf(numbers_cf, &number, entry.id.as_uuid().as_bytes())
            .map_err(map_rocks_err)?;
        txn.put_cf(entries_cf, entry.id.as_uuid().as_bytes(), encode(&entry)?)
            .map_err(map_rocks_err)?;
        txn.put_cf(lines_cf, entry.id.as_uuid().as_bytes(), encode(&lines)?)
            .map_err(map_rocks_err)?;
        txn.commit().map_err(map_rocks_err)
    }

    async fn get_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>> {
        self.get_json(CF_JOURNAL_ENTRIES, id.as_uuid().as_bytes())
    }

    async fn get_by_number(
        &self,
        cooperative_id: CooperativeId,
        number: &str,
    ) -> Result<Option<JournalEntry>> {
        let numbers_cf = self.cf(CF_JOURNAL_NUMBERS)?;
        let id_bytes = match self
            .db
            .get_cf(numbers_cf, number_key(cooperative_id, number))
            .map_err(map_rocks_err)?
        {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        self.get_json(CF_JOURNAL_ENTRIES, &id_bytes)
    }

    async fn entry_lines(&self, id: JournalEntryId) -> Result<Vec<JournalLine>> {
        self.lines_of(id)
    }

    async fn transition_entry(
        &self,
        id: JournalEntryId,
        transition: EntryTransition,
    ) -> Result<JournalEntry> {
        let entries_cf = self.cf(CF_JOURNAL_ENTRIES)?;
        let id_key = *id.as_uuid().as_bytes();

        let txn = self.db.transaction();
        let mut entry: JournalEntry = match txn
            .get_for_update_cf(entries_cf, id_key, true)
            .map_err(map_rocks_err)?
        {
            Some(bytes) => decode(&bytes)?,
            None => return Err(LedgerError::not_found(format!("journal entry {id}"))),
        };
        entry.apply_transition(&transition)?;
        txn.put_cf(entries_cf, id_key, encode(&entry)?)
            .map_err(map_rocks_err)?;
        txn.commit().map_err(map_rocks_err)?;
        Ok(entry)
    }

    async fn sum_posted_by_account(
        &self,
        cooperative_id: CooperativeId,
        range: DateRange,
    ) -> Result<Vec<AccountTotals>> {
        let entries_cf = self.cf(CF_JOURNAL_ENTRIES)?;
        let mut by_account: std::collections::HashMap<AccountId, AccountTotals> =
            std::collections::HashMap::new();
        for item in self.db.iterator_cf(entries_cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(map_rocks_err)?;
            let entry: JournalEntry = decode(&value)?;
            if entry.cooperative_id != cooperative_id
                || entry.status != EntryStatus::Posted
                || !range.contains(entry.date)
            {
                continue;
            }
            for line in self.lines_of(entry.id)? {
                let totals = by_account
                    .entry(line.account_id)
                    .or_insert_with(|| AccountTotals::zero(line.account_id));
                totals.total_debit += line.debit.value();
                totals.total_kredit += line.kredit.value();
            }
        }
        Ok(by_account.into_values().collect())
    }

    async fn sum_posted_for_account(
        &self,
        account_id: AccountId,
        range: DateRange,
    ) -> Result<AccountTotals> {
        let entries_cf = self.cf(CF_JOURNAL_ENTRIES)?;
        let mut totals = AccountTotals::zero(account_id);
        for item in self.db.iterator_cf(entries_cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(map_rocks_err)?;
            let entry: JournalEntry = decode(&value)?;
            if entry.status != EntryStatus::Posted || !range.contains(entry.date) {
                continue;
            }
            for line in self.lines_of(entry.id)? {
                if line.account_id == account_id {
                    totals.total_debit += line.debit.value();
                    totals.total_kredit += line.kredit.value();
                }
            }
        }
        Ok(totals)
    }
}

#[async_trait]
impl SequenceStore for RocksDbStore {
    async fn advance(
        &self,
        key: &SequenceKey,
        config: &CounterConfig,
        today: NaiveDate,
    ) -> Result<u64> {
        let cf = self.cf(CF_SEQUENCE_COUNTERS)?;
        let row_key = key.to_string().into_bytes();

        let txn = self.db.transaction();
        let (counter, value) = match txn
            .get_for_update_cf(cf, &row_key, true)
            .map_err(map_rocks_err)?
        {
            Some(bytes) => {
                let mut counter: SequenceCounter = decode(&bytes)?;
                let value = counter.advance(today);
                (counter, value)
            }
            None => {
                let counter = SequenceCounter::open(config, today);
                let value = counter.value;
                (counter, value)
            }
        };
        txn.put_cf(cf, &row_key, encode(&counter)?)
            .map_err(map_rocks_err)?;
        txn.commit().map_err(map_rocks_err)?;
        Ok(value)
    }
}
