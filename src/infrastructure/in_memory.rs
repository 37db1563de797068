//! Thread-safe in-memory adapter for all three storage ports.
//!
//! Each logical table sits behind its own `tokio::sync::RwLock`; the journal
//! keeps headers and lines under one lock so the header+lines insert and the
//! status transition are atomic to readers. Sequence counters get a mutex
//! per row, so unrelated (tenant, cooperative, name) keys never contend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, RwLock};

use crate::domain::account::{Account, AccountCategory};
use crate::domain::ids::{AccountId, CategoryId, CooperativeId, JournalEntryId};
use crate::domain::journal::{EntryStatus, EntryTransition, JournalEntry, JournalLine};
use crate::domain::ports::{AccountStore, JournalStore, SequenceStore};
use crate::domain::reports::{AccountTotals, DateRange};
use crate::domain::sequence::{CounterConfig, SequenceCounter, SequenceKey};
use crate::error::{LedgerError, Result};

#[derive(Default)]
struct AccountTable {
    rows: HashMap<AccountId, Account>,
    by_code: HashMap<(CooperativeId, String), AccountId>,
    children: HashMap<AccountId, Vec<AccountId>>,
}

#[derive(Default)]
struct JournalTable {
    entries: HashMap<JournalEntryId, JournalEntry>,
    lines: HashMap<JournalEntryId, Vec<JournalLine>>,
    by_number: HashMap<(CooperativeId, String), JournalEntryId>,
}

/// In-memory store backing tests and single-process deployments.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    categories: Arc<RwLock<HashMap<CategoryId, AccountCategory>>>,
    accounts: Arc<RwLock<AccountTable>>,
    journal: Arc<RwLock<JournalTable>>,
    counters: Arc<RwLock<HashMap<SequenceKey, Arc<Mutex<SequenceCounter>>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn insert_category(&self, category: AccountCategory) -> Result<()> {
        let mut categories = self.categories.write().await;
        categories.insert(category.id, category);
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<AccountCategory>> {
        let categories = self.categories.read().await;
        Ok(categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<AccountCategory>> {
        let categories = self.categories.read().await;
        let mut all: Vec<AccountCategory> = categories.values().cloned().collect();
        all.sort_by_key(|c| c.display_order);
        Ok(all)
    }

    async fn insert_account(&self, account: Account) -> Result<()> {
        let mut table = self.accounts.write().await;
        let code_key = (account.cooperative_id, account.code.clone());
        if table.by_code.contains_key(&code_key) {
            return Err(LedgerError::DuplicateCode {
                cooperative_id: account.cooperative_id,
                code: account.code,
            });
        }
        if let Some(parent_id) = account.parent_id {
            table.children.entry(parent_id).or_default().push(account.id);
        }
        table.by_code.insert(code_key, account.id);
        table.rows.insert(account.id, account);
        Ok(())
    }

    async fn update_account(&self, account: Account) -> Result<()> {
        let mut table = self.accounts.write().await;
        let stored = table
            .rows
            .get_mut(&account.id)
            .ok_or_else(|| LedgerError::not_found(format!("account {}", account.id)))?;
        // Code, parent, and category are frozen at creation; the code check
        // also keeps the by_code index consistent.
        if stored.code != account.code {
            return Err(LedgerError::Conflict(
                "account code is immutable".to_string(),
            ));
        }
        *stored = account;
        Ok(())
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let table = self.accounts.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn get_by_code(
        &self,
        cooperative_id: CooperativeId,
        code: &str,
    ) -> Result<Option<Account>> {
        let table = self.accounts.read().await;
        Ok(table
            .by_code
            .get(&(cooperative_id, code.to_string()))
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn list_accounts(&self, cooperative_id: CooperativeId) -> Result<Vec<Account>> {
        let table = self.accounts.read().await;
        Ok(table
            .rows
            .values()
            .filter(|a| a.cooperative_id == cooperative_id)
            .cloned()
            .collect())
    }

    async fn children_of(&self, id: AccountId) -> Result<Vec<Account>> {
        let table = self.accounts.read().await;
        Ok(table
            .children
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|child| table.rows.get(child))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl JournalStore for InMemoryStore {
    async fn insert_entry(&self, entry: JournalEntry, lines: Vec<JournalLine>) -> Result<()> {
        let mut table = self.journal.write().await;
        let number_key = (entry.cooperative_id, entry.number.clone());
        if table.by_number.contains_key(&number_key) {
            return Err(LedgerError::Conflict(format!(
                "journal number {} already exists",
                entry.number
            )));
        }
        table.by_number.insert(number_key, entry.id);
        table.lines.insert(entry.id, lines);
        table.entries.insert(entry.id, entry);
        Ok(())
    }

    async fn get_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>> {
        let table = self.journal.read().await;
        Ok(table.entries.get(&id).cloned())
    }

    async fn get_by_number(
        &self,
        cooperative_id: CooperativeId,
        number: &str,
    ) -> Result<Option<JournalEntry>> {
        let table = self.journal.read().await;
        Ok(table
            .by_number
            .get(&(cooperative_id, number.to_string()))
            .and_then(|id| table.entries.get(id))
            .cloned())
    }

    async fn entry_lines(&self, id: JournalEntryId) -> Result<Vec<JournalLine>> {
        let table = self.journal.read().await;
        Ok(table.lines.get(&id).cloned().unwrap_or_default())
    }

    async fn transition_entry(
        &self,
        id: JournalEntryId,
        transition: EntryTransition,
    ) -> Result<JournalEntry> {
        let mut table = self.journal.write().await;
        let entry = table
            .entries
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found(format!("journal entry {id}")))?;
        entry.apply_transition(&transition)?;
        Ok(entry.clone())
    }

    async fn sum_posted_by_account(
        &self,
        cooperative_id: CooperativeId,
        range: DateRange,
    ) -> Result<Vec<AccountTotals>> {
        let table = self.journal.read().await;
        let mut by_account: HashMap<AccountId, AccountTotals> = HashMap::new();
        for entry in table.entries.values() {
            if entry.cooperative_id != cooperative_id
                || entry.status != EntryStatus::Posted
                || !range.contains(entry.date)
            {
                continue;
            }
            for line in table.lines.get(&entry.id).into_iter().flatten() {
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
        let table = self.journal.read().await;
        let mut totals = AccountTotals::zero(account_id);
        for entry in table.entries.values() {
            if entry.status != EntryStatus::Posted || !range.contains(entry.date) {
                continue;
            }
            for line in table.lines.get(&entry.id).into_iter().flatten() {
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
impl SequenceStore for InMemoryStore {
    async fn advance(
        &self,
        key: &SequenceKey,
        config: &CounterConfig,
        today: NaiveDate,
    ) -> Result<u64> {
        // Row-level lock: the map lock is only held to fetch or create the
        // cell, then dropped before the per-counter critical section.
        let cell = {
            let mut counters = self.counters.write().await;
            match counters.get(key) {
                Some(cell) => Arc::clone(cell),
                None => {
                    let counter = SequenceCounter::open(config, today);
                    let cell = Arc::new(Mutex::new(counter));
                    counters.insert(key.clone(), Arc::clone(&cell));
                    return Ok(1);
                }
            }
        };
        let mut counter = cell.lock().await;
        Ok(counter.advance(today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{CategoryType, NormalBalance};
    use crate::domain::ids::{JournalLineId, TenantId, UserId};
    use crate::domain::money::Amount;
    use crate::domain::sequence::ResetPeriod;
    use rust_decimal_macros::dec;

    fn account(cooperative_id: CooperativeId, code: &str) -> Account {
        Account {
            id: AccountId::new(),
            cooperative_id,
            code: code.to_string(),
            name: format!("Account {code}"),
            description: None,
            category_id: CategoryId::new(),
            parent_id: None,
            level: 0,
            normal_balance: NormalBalance::Debit,
            is_cash: false,
            is_active: true,
        }
    }

    fn draft(cooperative_id: CooperativeId, number: &str, date: NaiveDate) -> JournalEntry {
        JournalEntry {
            id: JournalEntryId::new(),
            tenant_id: TenantId::new(),
            cooperative_id,
            number: number.to_string(),
            date,
            reference: None,
            description: None,
            total_debit: Amount::new(dec!(100)).unwrap(),
            total_kredit: Amount::new(dec!(100)).unwrap(),
            status: EntryStatus::Draft,
            created_by: UserId::new(),
            posted_by: None,
            posted_at: None,
        }
    }

    fn line(entry: &JournalEntry, account_id: AccountId, debit: Amount, kredit: Amount) -> JournalLine {
        JournalLine {
            id: JournalLineId::new(),
            entry_id: entry.id,
            account_id,
            description: None,
            debit,
            kredit,
        }
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected_per_cooperative() {
        let store = InMemoryStore::new();
        let coop = CooperativeId::new();
        store.insert_account(account(coop, "1000")).await.unwrap();

        let err = store.insert_account(account(coop, "1000")).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateCode { .. }));

        // Same code in another cooperative is fine.
        store
            .insert_account(account(CooperativeId::new(), "1000"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn children_index_tracks_parent_edges() {
        let store = InMemoryStore::new();
        let coop = CooperativeId::new();
        let parent = account(coop, "1000");
        let mut child = account(coop, "1100");
        child.parent_id = Some(parent.id);
        child.level = 1;

        store.insert_account(parent.clone()).await.unwrap();
        store.insert_account(child.clone()).await.unwrap();

        let children = store.children_of(parent.id).await.unwrap();
        assert_eq!(children, vec![child]);
    }

    #[tokio::test]
    async fn update_preserves_code_index() {
        let store = InMemoryStore::new();
        let coop = CooperativeId::new();
        let mut stored = account(coop, "1000");
        store.insert_account(stored.clone()).await.unwrap();

        stored.code = "9999".to_string();
        assert!(matches!(
            store.update_account(stored).await,
            Err(LedgerError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn entry_insert_is_atomic_with_lines() {
        let store = InMemoryStore::new();
        let coop = CooperativeId::new();
        let acct = account(coop, "1000");
        let date = NaiveDate::from_ymd_opt(2026, 8, 8).unwrap();
        let entry = draft(coop, "JRN/202608/0001", date);
        let lines = vec![
            line(&entry, acct.id, Amount::new(dec!(100)).unwrap(), Amount::ZERO),
            line(&entry, acct.id, Amount::ZERO, Amount::new(dec!(100)).unwrap()),
        ];

        store.insert_entry(entry.clone(), lines).await.unwrap();
        assert_eq!(store.entry_lines(entry.id).await.unwrap().len(), 2);
        assert_eq!(
            store
                .get_by_number(coop, "JRN/202608/0001")
                .await
                .unwrap()
                .unwrap()
                .id,
            entry.id
        );
    }

    #[tokio::test]
    async fn sums_ignore_unposted_entries() {
        let store = InMemoryStore::new();
        let coop = CooperativeId::new();
        let acct = account(coop, "1000");
        let date = NaiveDate::from_ymd_opt(2026, 8, 8).unwrap();

        let entry = draft(coop, "JRN/202608/0001", date);
        let lines = vec![
            line(&entry, acct.id, Amount::new(dec!(100)).unwrap(), Amount::ZERO),
            line(&entry, acct.id, Amount::ZERO, Amount::new(dec!(100)).unwrap()),
        ];
        store.insert_entry(entry.clone(), lines).await.unwrap();

        let totals = store
            .sum_posted_for_account(acct.id, DateRange::through(date))
            .await
            .unwrap();
        assert_eq!(totals.total_debit, dec!(0));

        store
            .transition_entry(
                entry.id,
                EntryTransition::Post {
                    by: UserId::new(),
                    at: chrono::Utc::now(),
                },
            )
            .await
            .unwrap();

        let totals = store
            .sum_posted_for_account(acct.id, DateRange::through(date))
            .await
            .unwrap();
        assert_eq!(totals.total_debit, dec!(100));
        assert_eq!(totals.total_kredit, dec!(100));
    }

    #[tokio::test]
    async fn counter_rows_are_independent() {
        let store = InMemoryStore::new();
        let today = NaiveDate::from_ymd_opt(2026, 8, 8).unwrap();
        let config = CounterConfig {
            step: 1,
            reset: ResetPeriod::Never,
        };
        let tenant = TenantId::new();
        let key_a = SequenceKey::new(tenant, CooperativeId::new(), "journal");
        let key_b = SequenceKey::new(tenant, CooperativeId::new(), "journal");

        assert_eq!(store.advance(&key_a, &config, today).await.unwrap(), 1);
        assert_eq!(store.advance(&key_a, &config, today).await.unwrap(), 2);
        assert_eq!(store.advance(&key_b, &config, today).await.unwrap(), 1);
    }
}
