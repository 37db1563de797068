//! Chart-of-accounts administration and lookup.

use tracing::info;

use crate::domain::account::{Account, AccountCategory, AccountUpdate, NewAccount};
use crate::domain::ids::{AccountId, CooperativeId};
use crate::domain::ports::AccountStoreBox;
use crate::error::{LedgerError, Result};

/// Administers the hierarchical chart of accounts.
///
/// Creation enforces the category/normal-side convention and per-cooperative
/// code uniqueness. After creation only name, description, and active flag
/// change; category, parent, and normal side are frozen so historical
/// reports keep their meaning.
pub struct ChartOfAccounts {
    store: AccountStoreBox,
}

impl ChartOfAccounts {
    pub fn new(store: AccountStoreBox) -> Self {
        Self { store }
    }

    /// Seeds the standard five-category set once. Subsequent calls return
    /// the already-seeded categories untouched.
    pub async fn seed_standard_categories(&self) -> Result<Vec<AccountCategory>> {
        let existing = self.store.list_categories().await?;
        if !existing.is_empty() {
            return Ok(existing);
        }
        let categories = AccountCategory::standard_set();
        for category in &categories {
            self.store.insert_category(category.clone()).await?;
        }
        info!(count = categories.len(), "seeded standard account categories");
        Ok(categories)
    }

    pub async fn create_account(&self, spec: NewAccount) -> Result<Account> {
        let category = self
            .store
            .get_category(spec.category_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("category {}", spec.category_id)))?;
        category.category_type.check_side(spec.normal_balance)?;

        if self
            .store
            .get_by_code(spec.cooperative_id, &spec.code)
            .await?
            .is_some()
        {
            return Err(LedgerError::DuplicateCode {
                cooperative_id: spec.cooperative_id,
                code: spec.code,
            });
        }

        // A freshly minted id cannot equal an existing parent's, so the
        // lookup below is also the parent != self check.
        let level = match spec.parent_id {
            None => 0,
            Some(parent_id) => {
                let parent = self
                    .store
                    .get_account(parent_id)
                    .await?
                    .ok_or_else(|| LedgerError::UnknownAccount(format!("parent {parent_id}")))?;
                if parent.cooperative_id != spec.cooperative_id {
                    return Err(LedgerError::UnknownAccount(format!(
                        "parent {parent_id} belongs to another cooperative"
                    )));
                }
                parent.level + 1
            }
        };

        let account = Account {
            id: AccountId::new(),
            cooperative_id: spec.cooperative_id,
            code: spec.code,
            name: spec.name,
            description: spec.description,
            category_id: spec.category_id,
            parent_id: spec.parent_id,
            level,
            normal_balance: spec.normal_balance,
            is_cash: spec.is_cash,
            is_active: true,
        };
        self.store.insert_account(account.clone()).await?;
        info!(
            account = %account.id,
            cooperative = %account.cooperative_id,
            code = %account.code,
            "account created"
        );
        Ok(account)
    }

    /// Applies the mutable subset of account fields.
    pub async fn update_account(&self, id: AccountId, update: AccountUpdate) -> Result<Account> {
        let mut account = self.get_by_id(id).await?;
        if let Some(name) = update.name {
            account.name = name;
        }
        if let Some(description) = update.description {
            account.description = Some(description);
        }
        if let Some(is_active) = update.is_active {
            account.is_active = is_active;
        }
        self.store.update_account(account.clone()).await?;
        Ok(account)
    }

    /// Soft-deactivates an account. Referenced accounts are never deleted.
    pub async fn deactivate(&self, id: AccountId) -> Result<Account> {
        let account = self
            .update_account(
                id,
                AccountUpdate {
                    is_active: Some(false),
                    ..AccountUpdate::default()
                },
            )
            .await?;
        info!(account = %id, "account deactivated");
        Ok(account)
    }

    pub async fn get_by_id(&self, id: AccountId) -> Result<Account> {
        self.store
            .get_account(id)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("account {id}")))
    }

    pub async fn get_by_code(&self, cooperative_id: CooperativeId, code: &str) -> Result<Account> {
        self.store
            .get_by_code(cooperative_id, code)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("account code {code}")))
    }

    /// Active accounts of a cooperative, ordered by code.
    pub async fn list_active(&self, cooperative_id: CooperativeId) -> Result<Vec<Account>> {
        let mut accounts: Vec<Account> = self
            .store
            .list_accounts(cooperative_id)
            .await?
            .into_iter()
            .filter(|a| a.is_active)
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    pub async fn children(&self, id: AccountId) -> Result<Vec<Account>> {
        self.store.children_of(id).await
    }

    pub async fn list_categories(&self) -> Result<Vec<AccountCategory>> {
        self.store.list_categories().await
    }
}
