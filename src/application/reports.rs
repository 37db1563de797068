//! Balance calculator: every figure is derived from posted lines on demand.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::account::{Account, CategoryType};
use crate::domain::ids::{AccountId, CategoryId, CooperativeId};
use crate::domain::ports::{AccountStoreBox, JournalStoreBox};
use crate::domain::reports::{
    AccountTotals, BalanceSheet, DateRange, ProfitAndLoss, TrialBalance, TrialBalanceRow,
};
use crate::error::{LedgerError, Result};

/// Read side of the ledger.
///
/// Only lines of `posted` entries count, filtered by transaction date with
/// inclusive bounds; drafts and cancelled entries are invisible to every
/// report. There is no stored running balance anywhere to reconcile
/// against: the aggregates below are the balances.
pub struct BalanceCalculator {
    accounts: AccountStoreBox,
    journal: JournalStoreBox,
}

impl BalanceCalculator {
    pub fn new(accounts: AccountStoreBox, journal: JournalStoreBox) -> Self {
        Self { accounts, journal }
    }

    /// Signed balance of one account as of a cutoff date, positive on the
    /// account's normal side.
    pub async fn account_balance(&self, account_id: AccountId, as_of: NaiveDate) -> Result<Decimal> {
        let account = self
            .accounts
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("account {account_id}")))?;
        let totals = self
            .journal
            .sum_posted_for_account(account_id, DateRange::through(as_of))
            .await?;
        Ok(account
            .normal_balance
            .balance(totals.total_debit, totals.total_kredit))
    }

    /// Trial balance over every active account, ordered by code.
    pub async fn trial_balance(
        &self,
        cooperative_id: CooperativeId,
        as_of: NaiveDate,
    ) -> Result<TrialBalance> {
        let accounts = self.cooperative_accounts(cooperative_id).await?;
        let totals = self
            .journal
            .sum_posted_by_account(cooperative_id, DateRange::through(as_of))
            .await?;
        let by_account: HashMap<AccountId, AccountTotals> =
            totals.into_iter().map(|t| (t.account_id, t)).collect();

        let mut rows: Vec<TrialBalanceRow> = accounts
            .into_iter()
            .filter(|account| account.is_active)
            .map(|account| {
                let totals = by_account
                    .get(&account.id)
                    .copied()
                    .unwrap_or_else(|| AccountTotals::zero(account.id));
                TrialBalanceRow {
                    account_id: account.id,
                    code: account.code,
                    name: account.name,
                    normal_balance: account.normal_balance,
                    total_debit: totals.total_debit,
                    total_kredit: totals.total_kredit,
                    balance: account
                        .normal_balance
                        .balance(totals.total_debit, totals.total_kredit),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));

        let report = TrialBalance { as_of, rows };
        debug!(
            cooperative = %cooperative_id,
            %as_of,
            rows = report.rows.len(),
            imbalance = %report.imbalance(),
            "trial balance computed"
        );
        Ok(report)
    }

    /// Income statement over an inclusive transaction-date range.
    pub async fn profit_and_loss(
        &self,
        cooperative_id: CooperativeId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ProfitAndLoss> {
        let category_of = self.account_categories(cooperative_id).await?;
        let totals = self
            .journal
            .sum_posted_by_account(cooperative_id, DateRange::between(from, to))
            .await?;

        let mut total_revenue = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;
        for t in totals {
            match category_of.get(&t.account_id) {
                Some(CategoryType::Revenue) => total_revenue += t.total_kredit - t.total_debit,
                Some(CategoryType::Expense) => total_expense += t.total_debit - t.total_kredit,
                _ => {}
            }
        }

        let report = ProfitAndLoss {
            from,
            to,
            total_revenue,
            total_expense,
        };
        debug!(cooperative = %cooperative_id, net = %report.net(), "profit and loss computed");
        Ok(report)
    }

    /// Cumulative position from ledger inception through `as_of`.
    pub async fn balance_sheet(
        &self,
        cooperative_id: CooperativeId,
        as_of: NaiveDate,
    ) -> Result<BalanceSheet> {
        let category_of = self.account_categories(cooperative_id).await?;
        let totals = self
            .journal
            .sum_posted_by_account(cooperative_id, DateRange::through(as_of))
            .await?;

        let mut total_asset = Decimal::ZERO;
        let mut total_liability = Decimal::ZERO;
        let mut total_equity = Decimal::ZERO;
        for t in totals {
            match category_of.get(&t.account_id) {
                Some(CategoryType::Asset) => total_asset += t.total_debit - t.total_kredit,
                Some(CategoryType::Liability) => {
                    total_liability += t.total_kredit - t.total_debit
                }
                Some(CategoryType::Equity) => total_equity += t.total_kredit - t.total_debit,
                _ => {}
            }
        }

        Ok(BalanceSheet {
            as_of,
            total_asset,
            total_liability,
            total_equity,
        })
    }

    /// All accounts of the cooperative, or `NotFound` when the id resolves
    /// to nothing at all. Zero posted entries is not an error; zero accounts
    /// means the cooperative does not exist as far as the ledger knows.
    async fn cooperative_accounts(&self, cooperative_id: CooperativeId) -> Result<Vec<Account>> {
        let accounts = self.accounts.list_accounts(cooperative_id).await?;
        if accounts.is_empty() {
            return Err(LedgerError::not_found(format!(
                "cooperative {cooperative_id}"
            )));
        }
        Ok(accounts)
    }

    /// Category type per account id, including deactivated accounts: their
    /// posted history still counts.
    async fn account_categories(
        &self,
        cooperative_id: CooperativeId,
    ) -> Result<HashMap<AccountId, CategoryType>> {
        let accounts = self.cooperative_accounts(cooperative_id).await?;
        let categories: HashMap<CategoryId, CategoryType> = self
            .accounts
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.category_type))
            .collect();
        Ok(accounts
            .into_iter()
            .filter_map(|account| {
                categories
                    .get(&account.category_id)
                    .map(|t| (account.id, *t))
            })
            .collect())
    }
}
