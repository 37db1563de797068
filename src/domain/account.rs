//! Chart-of-accounts model: categories, normal balance sides, and accounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{AccountId, CategoryId, CooperativeId};
use crate::error::{LedgerError, Result};

/// High-level account category. Determines the conventional normal side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl CategoryType {
    /// The side on which accounts of this category conventionally carry a
    /// positive balance.
    pub fn normal_side(self) -> NormalBalance {
        match self {
            CategoryType::Asset | CategoryType::Expense => NormalBalance::Debit,
            CategoryType::Liability | CategoryType::Equity | CategoryType::Revenue => {
                NormalBalance::Kredit
            }
        }
    }

    /// Rejects a declared normal side that contradicts the category
    /// convention. Violations are a data-integrity error, caught at account
    /// creation rather than silently accepted.
    pub fn check_side(self, declared: NormalBalance) -> Result<()> {
        let expected = self.normal_side();
        if declared != expected {
            return Err(LedgerError::InvalidCategory {
                category: self,
                declared,
                expected,
            });
        }
        Ok(())
    }
}

impl core::fmt::Display for CategoryType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            CategoryType::Asset => "asset",
            CategoryType::Liability => "liability",
            CategoryType::Equity => "equity",
            CategoryType::Revenue => "revenue",
            CategoryType::Expense => "expense",
        };
        f.write_str(s)
    }
}

/// The side of a double-entry posting on which an account's balance is
/// conventionally positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    Debit,
    Kredit,
}

impl NormalBalance {
    /// Signed balance of aggregated sums, positive on the normal side.
    ///
    /// A kredit-normal account (liability/equity/revenue) reports a positive
    /// number when kredits exceed debits; a debit-normal account (asset/
    /// expense) when debits exceed kredits.
    pub fn balance(self, total_debit: Decimal, total_kredit: Decimal) -> Decimal {
        match self {
            NormalBalance::Debit => total_debit - total_kredit,
            NormalBalance::Kredit => total_kredit - total_debit,
        }
    }
}

impl core::fmt::Display for NormalBalance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            NormalBalance::Debit => "debit",
            NormalBalance::Kredit => "kredit",
        })
    }
}

/// Shared reference data: one category row per `CategoryType`, global to the
/// platform rather than per-cooperative. Immutable once accounts reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCategory {
    pub id: CategoryId,
    pub code: String,
    pub name: String,
    pub category_type: CategoryType,
    pub display_order: u32,
}

impl AccountCategory {
    /// The standard five-category set seeded once per deployment.
    pub fn standard_set() -> Vec<AccountCategory> {
        let spec: [(&str, &str, CategoryType); 5] = [
            ("1", "Assets", CategoryType::Asset),
            ("2", "Liabilities", CategoryType::Liability),
            ("3", "Equity", CategoryType::Equity),
            ("4", "Revenue", CategoryType::Revenue),
            ("5", "Expenses", CategoryType::Expense),
        ];
        spec.into_iter()
            .enumerate()
            .map(|(i, (code, name, category_type))| AccountCategory {
                id: CategoryId::new(),
                code: code.to_string(),
                name: name.to_string(),
                category_type,
                display_order: i as u32 + 1,
            })
            .collect()
    }
}

/// One node of a cooperative's chart of accounts.
///
/// Accounts form a tree through `parent_id`; rows are stored flat and
/// children are resolved through the store's secondary index rather than
/// in-memory back-pointers. Category, parent, and normal side are immutable
/// after creation so historical reports stay valid; an account referenced by
/// a posted line is only ever soft-deactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub cooperative_id: CooperativeId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: CategoryId,
    pub parent_id: Option<AccountId>,
    /// Depth in the tree; roots are level 0.
    pub level: u32,
    pub normal_balance: NormalBalance,
    pub is_cash: bool,
    pub is_active: bool,
}

/// Input for `ChartOfAccounts::create_account`.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub cooperative_id: CooperativeId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: CategoryId,
    pub parent_id: Option<AccountId>,
    pub normal_balance: NormalBalance,
    pub is_cash: bool,
}

/// Mutable account fields. Everything else is fixed at creation.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn categories_map_to_conventional_sides() {
        assert_eq!(CategoryType::Asset.normal_side(), NormalBalance::Debit);
        assert_eq!(CategoryType::Expense.normal_side(), NormalBalance::Debit);
        assert_eq!(CategoryType::Liability.normal_side(), NormalBalance::Kredit);
        assert_eq!(CategoryType::Equity.normal_side(), NormalBalance::Kredit);
        assert_eq!(CategoryType::Revenue.normal_side(), NormalBalance::Kredit);
    }

    #[test]
    fn check_side_rejects_contradiction() {
        let err = CategoryType::Revenue
            .check_side(NormalBalance::Debit)
            .unwrap_err();
        match err {
            LedgerError::InvalidCategory {
                category,
                declared,
                expected,
            } => {
                assert_eq!(category, CategoryType::Revenue);
                assert_eq!(declared, NormalBalance::Debit);
                assert_eq!(expected, NormalBalance::Kredit);
            }
            other => panic!("expected InvalidCategory, got {other:?}"),
        }
        assert!(CategoryType::Asset.check_side(NormalBalance::Debit).is_ok());
    }

    #[test]
    fn signed_balance_flips_with_normal_side() {
        // 100 kredit against 0 debit: positive for kredit-normal accounts,
        // negative for debit-normal ones.
        assert_eq!(
            NormalBalance::Kredit.balance(dec!(0), dec!(100)),
            dec!(100)
        );
        assert_eq!(
            NormalBalance::Debit.balance(dec!(0), dec!(100)),
            dec!(-100)
        );
        assert_eq!(NormalBalance::Debit.balance(dec!(250), dec!(100)), dec!(150));
    }

    #[test]
    fn standard_set_covers_every_category_once() {
        let set = AccountCategory::standard_set();
        assert_eq!(set.len(), 5);
        for t in [
            CategoryType::Asset,
            CategoryType::Liability,
            CategoryType::Equity,
            CategoryType::Revenue,
            CategoryType::Expense,
        ] {
            assert_eq!(set.iter().filter(|c| c.category_type == t).count(), 1);
        }
    }
}
