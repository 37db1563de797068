//! Sequence issuer: the only component that retries storage conflicts.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::warn;

use crate::domain::ids::{CooperativeId, TenantId};
use crate::domain::ports::SequenceStoreBox;
use crate::domain::sequence::{CounterConfig, SequenceKey};
use crate::error::{LedgerError, Result};

/// Bounded retry budget for one `next` call.
const MAX_ATTEMPTS: u32 = 8;

/// Mints monotonically increasing numbers per (tenant, cooperative, name)
/// key. Uniqueness comes from the store's atomic cycle; this service adds
/// bounded backoff-retry around transient commit conflicts and nothing else.
pub struct SequenceIssuer {
    store: SequenceStoreBox,
}

impl SequenceIssuer {
    pub fn new(store: SequenceStoreBox) -> Self {
        Self { store }
    }

    /// Next value for `key` with default policy (step 1, never resets),
    /// evaluated against today's date.
    pub async fn next(
        &self,
        tenant_id: TenantId,
        cooperative_id: CooperativeId,
        name: &str,
    ) -> Result<u64> {
        self.next_on(
            tenant_id,
            cooperative_id,
            name,
            &CounterConfig::default(),
            Utc::now().date_naive(),
        )
        .await
    }

    /// Next value with an explicit counter policy and reference date. The
    /// date drives the reset-period check inside the store's atomic cycle.
    pub async fn next_on(
        &self,
        tenant_id: TenantId,
        cooperative_id: CooperativeId,
        name: &str,
        config: &CounterConfig,
        today: NaiveDate,
    ) -> Result<u64> {
        let key = SequenceKey::new(tenant_id, cooperative_id, name);
        for attempt in 1..=MAX_ATTEMPTS {
            match self.store.advance(&key, config, today).await {
                Ok(value) => return Ok(value),
                Err(LedgerError::Conflict(reason)) => {
                    warn!(%key, attempt, %reason, "sequence advance conflicted, retrying");
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err(other) => return Err(other),
            }
        }
        Err(LedgerError::SequenceConflict {
            key: key.to_string(),
            attempts: MAX_ATTEMPTS,
        })
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(1u64 << attempt.min(6))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use crate::domain::ports::SequenceStore;
    use crate::domain::sequence::ResetPeriod;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn fresh_key_starts_at_one() {
        let issuer = SequenceIssuer::new(Box::new(InMemoryStore::new()));
        let tenant = TenantId::new();
        let coop = CooperativeId::new();

        assert_eq!(issuer.next(tenant, coop, "journal").await.unwrap(), 1);
        assert_eq!(issuer.next(tenant, coop, "journal").await.unwrap(), 2);
        assert_eq!(issuer.next(tenant, coop, "journal").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn keys_do_not_contend_across_cooperatives() {
        let issuer = SequenceIssuer::new(Box::new(InMemoryStore::new()));
        let tenant = TenantId::new();
        let coop_a = CooperativeId::new();
        let coop_b = CooperativeId::new();

        assert_eq!(issuer.next(tenant, coop_a, "journal").await.unwrap(), 1);
        assert_eq!(issuer.next(tenant, coop_a, "journal").await.unwrap(), 2);
        assert_eq!(issuer.next(tenant, coop_b, "journal").await.unwrap(), 1);
        assert_eq!(issuer.next(tenant, coop_a, "member").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn monthly_counter_resets_on_boundary() {
        let issuer = SequenceIssuer::new(Box::new(InMemoryStore::new()));
        let tenant = TenantId::new();
        let coop = CooperativeId::new();
        let config = CounterConfig::monthly();

        let july = day(2026, 7, 31);
        let august = day(2026, 8, 1);
        assert_eq!(
            issuer
                .next_on(tenant, coop, "journal", &config, july)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            issuer
                .next_on(tenant, coop, "journal", &config, july)
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            issuer
                .next_on(tenant, coop, "journal", &config, august)
                .await
                .unwrap(),
            1
        );
    }

    struct AlwaysConflicting;

    #[async_trait]
    impl SequenceStore for AlwaysConflicting {
        async fn advance(
            &self,
            _key: &SequenceKey,
            _config: &CounterConfig,
            _today: NaiveDate,
        ) -> Result<u64> {
            Err(LedgerError::Conflict("row is locked".to_string()))
        }
    }

    #[tokio::test]
    async fn exhausted_retries_surface_sequence_conflict() {
        let issuer = SequenceIssuer::new(Box::new(AlwaysConflicting));
        let err = issuer
            .next_on(
                TenantId::new(),
                CooperativeId::new(),
                "journal",
                &CounterConfig {
                    step: 1,
                    reset: ResetPeriod::Never,
                },
                day(2026, 8, 8),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::SequenceConflict { attempts, .. } if attempts == MAX_ATTEMPTS
        ));
    }
}
