#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;

use coop_ledger::application::chart::ChartOfAccounts;
use coop_ledger::application::engine::LedgerEngine;
use coop_ledger::application::reports::BalanceCalculator;
use coop_ledger::application::sequence::SequenceIssuer;
use coop_ledger::domain::account::{Account, AccountCategory, CategoryType, NewAccount};
use coop_ledger::domain::ids::{CooperativeId, TenantId, UserId};
use coop_ledger::domain::journal::{AccountRef, NewJournalEntry, NewJournalLine};
use coop_ledger::domain::money::Amount;
use coop_ledger::infrastructure::in_memory::InMemoryStore;

/// One cooperative's ledger wired against a shared in-memory store, with the
/// standard categories seeded.
pub struct Fixture {
    pub store: InMemoryStore,
    pub chart: ChartOfAccounts,
    pub engine: LedgerEngine,
    pub reports: BalanceCalculator,
    pub categories: Vec<AccountCategory>,
    pub tenant: TenantId,
    pub cooperative: CooperativeId,
    pub actor: UserId,
}

pub async fn fixture() -> Fixture {
    init_tracing();
    let store = InMemoryStore::new();
    let chart = ChartOfAccounts::new(Box::new(store.clone()));
    let engine = LedgerEngine::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
        SequenceIssuer::new(Box::new(store.clone())),
    );
    let reports = BalanceCalculator::new(Box::new(store.clone()), Box::new(store.clone()));
    let categories = chart.seed_standard_categories().await.unwrap();

    Fixture {
        store,
        chart,
        engine,
        reports,
        categories,
        tenant: TenantId::new(),
        cooperative: CooperativeId::new(),
        actor: UserId::new(),
    }
}

impl Fixture {
    pub fn category(&self, category_type: CategoryType) -> &AccountCategory {
        self.categories
            .iter()
            .find(|c| c.category_type == category_type)
            .expect("standard set covers every category")
    }

    pub fn new_account(&self, code: &str, name: &str, category_type: CategoryType) -> NewAccount {
        let category = self.category(category_type);
        NewAccount {
            cooperative_id: self.cooperative,
            code: code.to_string(),
            name: name.to_string(),
            description: None,
            category_id: category.id,
            parent_id: None,
            normal_balance: category_type.normal_side(),
            is_cash: false,
        }
    }

    /// Seeds the account set the posting and report suites share:
    /// 1000 Cash, 1200 Member Receivables, 2000 Payables, 3000 Member
    /// Capital, 4000 Service Revenue, 5000 Operating Expenses.
    pub async fn standard_accounts(&self) -> Vec<Account> {
        let mut cash = self.new_account("1000", "Cash", CategoryType::Asset);
        cash.is_cash = true;
        let specs = vec![
            cash,
            self.new_account("1200", "Member Receivables", CategoryType::Asset),
            self.new_account("2000", "Payables", CategoryType::Liability),
            self.new_account("3000", "Member Capital", CategoryType::Equity),
            self.new_account("4000", "Service Revenue", CategoryType::Revenue),
            self.new_account("5000", "Operating Expenses", CategoryType::Expense),
        ];
        let mut accounts = Vec::with_capacity(specs.len());
        for spec in specs {
            accounts.push(self.chart.create_account(spec).await.unwrap());
        }
        accounts
    }

    pub fn entry(&self, date: NaiveDate, lines: Vec<NewJournalLine>) -> NewJournalEntry {
        NewJournalEntry {
            tenant_id: self.tenant,
            cooperative_id: self.cooperative,
            date,
            reference: None,
            description: None,
            lines,
            created_by: self.actor,
        }
    }
}

pub fn line(code: &str, debit: Decimal, kredit: Decimal) -> NewJournalLine {
    NewJournalLine {
        account: AccountRef::Code(code.to_string()),
        debit: Amount::new(debit).unwrap(),
        kredit: Amount::new(kredit).unwrap(),
        description: None,
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
