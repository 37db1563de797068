//! Double-entry general-ledger core for a multi-tenant cooperative platform.
//!
//! Calling modules submit balanced journal-posting requests to the
//! [`application::engine::LedgerEngine`]; drafts are posted irreversibly,
//! and every balance, trial balance, profit & loss, and balance sheet is
//! derived on demand by [`application::reports::BalanceCalculator`] from
//! posted lines. No balance is ever stored.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{LedgerError, Result};
