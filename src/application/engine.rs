//! Ledger engine: validates and records balanced journal entries.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::application::sequence::SequenceIssuer;
use crate::domain::ids::{AccountId, CooperativeId, JournalEntryId, JournalLineId, TenantId, UserId};
use crate::domain::journal::{
    AccountRef, EntryStatus, EntryTransition, JournalEntry, JournalLine, NewJournalEntry,
};
use crate::domain::money::Amount;
use crate::domain::ports::{AccountStoreBox, JournalStoreBox};
use crate::domain::sequence::CounterConfig;
use crate::error::{LedgerError, Result};

/// Counter name backing journal numbers.
pub const JOURNAL_COUNTER: &str = "journal";

/// The single synchronous operation exposed to calling modules is
/// [`LedgerEngine::create_entry`]; posting and cancelling finalize or abort
/// the draft. The engine never touches account balances: every balance is
/// derived from posted lines by the balance calculator, so there is no
/// cached total to drift out of sync.
pub struct LedgerEngine {
    accounts: AccountStoreBox,
    journal: JournalStoreBox,
    sequences: SequenceIssuer,
}

impl LedgerEngine {
    pub fn new(
        accounts: AccountStoreBox,
        journal: JournalStoreBox,
        sequences: SequenceIssuer,
    ) -> Self {
        Self {
            accounts,
            journal,
            sequences,
        }
    }

    /// Validates a posting request and persists it as a draft entry.
    ///
    /// Validation happens strictly before any side effect, in the order:
    /// line count, balance equality (exact, no epsilon), account
    /// resolution. Only then is a journal number minted and the header plus
    /// lines stored as one atomic unit. A number minted for an insert that
    /// subsequently fails is permanently consumed; sequence numbers are
    /// unique and increasing, not gap-free.
    pub async fn create_entry(&self, new: NewJournalEntry) -> Result<JournalEntry> {
        if new.lines.len() < 2 {
            return Err(LedgerError::InsufficientLines(new.lines.len()));
        }

        let total_debit: Amount = new.lines.iter().map(|line| line.debit).sum();
        let total_kredit: Amount = new.lines.iter().map(|line| line.kredit).sum();
        if total_debit != total_kredit {
            return Err(LedgerError::UnbalancedEntry {
                debit: total_debit.value(),
                kredit: total_kredit.value(),
            });
        }

        let mut account_ids: Vec<AccountId> = Vec::with_capacity(new.lines.len());
        for line in &new.lines {
            account_ids
                .push(self.resolve_account(new.cooperative_id, &line.account).await?);
        }

        let number = self
            .mint_number(new.tenant_id, new.cooperative_id, new.date)
            .await?;

        let entry = JournalEntry {
            id: JournalEntryId::new(),
            tenant_id: new.tenant_id,
            cooperative_id: new.cooperative_id,
            number,
            date: new.date,
            reference: new.reference,
            description: new.description,
            total_debit,
            total_kredit,
            status: EntryStatus::Draft,
            created_by: new.created_by,
            posted_by: None,
            posted_at: None,
        };
        let lines: Vec<JournalLine> = new
            .lines
            .into_iter()
            .zip(account_ids)
            .map(|(line, account_id)| JournalLine {
                id: JournalLineId::new(),
                entry_id: entry.id,
                account_id,
                description: line.description,
                debit: line.debit,
                kredit: line.kredit,
            })
            .collect();

        self.journal.insert_entry(entry.clone(), lines).await?;
        info!(
            entry = %entry.id,
            number = %entry.number,
            cooperative = %entry.cooperative_id,
            total = %entry.total_debit,
            "journal entry drafted"
        );
        Ok(entry)
    }

    /// Finalizes a draft. Irreversible; a second call fails with `NotDraft`
    /// so a retry after a dropped response cannot double-post.
    pub async fn post(&self, id: JournalEntryId, actor: UserId) -> Result<JournalEntry> {
        let entry = self
            .journal
            .transition_entry(
                id,
                EntryTransition::Post {
                    by: actor,
                    at: Utc::now(),
                },
            )
            .await?;
        info!(entry = %id, number = %entry.number, poster = %actor, "journal entry posted");
        Ok(entry)
    }

    /// Aborts a draft. Posted entries are never cancellable; reversing a
    /// posted fact takes a new balanced entry through `create_entry`.
    pub async fn cancel(&self, id: JournalEntryId, actor: UserId) -> Result<JournalEntry> {
        let entry = self
            .journal
            .transition_entry(id, EntryTransition::Cancel)
            .await?;
        info!(entry = %id, number = %entry.number, actor = %actor, "journal entry cancelled");
        Ok(entry)
    }

    pub async fn entry(&self, id: JournalEntryId) -> Result<JournalEntry> {
        self.journal
            .get_entry(id)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("journal entry {id}")))
    }

    pub async fn entry_lines(&self, id: JournalEntryId) -> Result<Vec<JournalLine>> {
        self.journal.entry_lines(id).await
    }

    /// Lookup by journal number. A caller whose `create_entry` timed out
    /// re-queries here before retrying, instead of blindly minting a second
    /// economic event.
    pub async fn find_by_number(
        &self,
        cooperative_id: CooperativeId,
        number: &str,
    ) -> Result<Option<JournalEntry>> {
        self.journal.get_by_number(cooperative_id, number).await
    }

    async fn resolve_account(
        &self,
        cooperative_id: CooperativeId,
        account: &AccountRef,
    ) -> Result<AccountId> {
        let resolved = match account {
            AccountRef::Id(id) => self.accounts.get_account(*id).await?,
            AccountRef::Code(code) => self.accounts.get_by_code(cooperative_id, code).await?,
        };
        match resolved {
            Some(found) if found.cooperative_id == cooperative_id => Ok(found.id),
            _ => Err(LedgerError::UnknownAccount(account.to_string())),
        }
    }

    async fn mint_number(
        &self,
        tenant_id: TenantId,
        cooperative_id: CooperativeId,
        date: NaiveDate,
    ) -> Result<String> {
        let seq = self
            .sequences
            .next_on(
                tenant_id,
                cooperative_id,
                JOURNAL_COUNTER,
                &CounterConfig::monthly(),
                date,
            )
            .await?;
        // The year-month segment keeps monthly-reset numbers unique across
        // periods; the format itself is presentation, not an invariant.
        Ok(format!("JRN/{}/{:04}", date.format("%Y%m"), seq))
    }
}

/// Re-derives entry totals from lines; diagnostic used by tests and adapters.
pub fn line_totals(lines: &[JournalLine]) -> (Decimal, Decimal) {
    lines.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(debit, kredit), line| (debit + line.debit.value(), kredit + line.kredit.value()),
    )
}
