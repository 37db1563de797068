//! Derived-report value objects: trial balance, profit & loss, balance sheet.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::account::NormalBalance;
use crate::domain::ids::AccountId;

/// Inclusive transaction-date filter for aggregate queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Everything from ledger inception through `to`.
    pub fn through(to: NaiveDate) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// Bounded on both ends, both inclusive.
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(from) = self.from
            && date < from
        {
            return false;
        }
        if let Some(to) = self.to
            && date > to
        {
            return false;
        }
        true
    }
}

/// Raw per-account aggregate over posted lines, as returned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountTotals {
    pub account_id: AccountId,
    pub total_debit: Decimal,
    pub total_kredit: Decimal,
}

impl AccountTotals {
    pub fn zero(account_id: AccountId) -> Self {
        Self {
            account_id,
            total_debit: Decimal::ZERO,
            total_kredit: Decimal::ZERO,
        }
    }
}

/// One trial-balance row: raw sums plus the signed balance on the account's
/// normal side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceRow {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub normal_balance: NormalBalance,
    pub total_debit: Decimal,
    pub total_kredit: Decimal,
    pub balance: Decimal,
}

/// Trial balance as of a cutoff date, rows ordered by account code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalance {
    pub as_of: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
}

impl TrialBalance {
    /// Integrity diagnostic: every row re-expressed debit-positive and
    /// summed. Zero for any internally consistent ledger.
    pub fn imbalance(&self) -> Decimal {
        self.rows
            .iter()
            .map(|row| row.total_debit - row.total_kredit)
            .sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.imbalance().is_zero()
    }
}

/// Period-bounded income statement aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitAndLoss {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_revenue: Decimal,
    pub total_expense: Decimal,
}

impl ProfitAndLoss {
    pub fn net(&self) -> Decimal {
        self.total_revenue - self.total_expense
    }
}

/// Point-in-time cumulative position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub total_asset: Decimal,
    pub total_liability: Decimal,
    pub total_equity: Decimal,
}
