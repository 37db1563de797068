//! Sequence counters for minting human-readable document numbers.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{CooperativeId, TenantId};

/// Composite key of one counter row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceKey {
    pub tenant_id: TenantId,
    pub cooperative_id: CooperativeId,
    pub name: String,
}

impl SequenceKey {
    pub fn new(tenant_id: TenantId, cooperative_id: CooperativeId, name: impl Into<String>) -> Self {
        Self {
            tenant_id,
            cooperative_id,
            name: name.into(),
        }
    }
}

impl core::fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}/{}", self.tenant_id, self.cooperative_id, self.name)
    }
}

/// When a counter returns to its base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPeriod {
    #[default]
    Never,
    Daily,
    Monthly,
    Yearly,
}

impl ResetPeriod {
    /// Whether `today` lies past the period boundary of the last reset.
    ///
    /// Comparisons are one-directional: a clock that jumps backwards never
    /// triggers a reset, so values keep increasing within a period.
    pub fn crossed(self, last_reset: Option<NaiveDate>, today: NaiveDate) -> bool {
        let Some(last) = last_reset else {
            return false;
        };
        match self {
            ResetPeriod::Never => false,
            ResetPeriod::Daily => last < today,
            ResetPeriod::Monthly => {
                (today.year(), today.month()) > (last.year(), last.month())
            }
            ResetPeriod::Yearly => today.year() > last.year(),
        }
    }
}

/// Per-counter policy, supplied by the caller on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterConfig {
    pub step: u64,
    pub reset: ResetPeriod,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            step: 1,
            reset: ResetPeriod::Never,
        }
    }
}

impl CounterConfig {
    pub fn monthly() -> Self {
        Self {
            step: 1,
            reset: ResetPeriod::Monthly,
        }
    }
}

/// One stored counter row.
///
/// Exclusively mutated through [`SequenceCounter::advance`] inside the
/// store's atomic read-modify-write cycle; nothing else may touch the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceCounter {
    pub value: u64,
    pub step: u64,
    pub reset: ResetPeriod,
    pub last_reset: Option<NaiveDate>,
}

impl SequenceCounter {
    /// Fresh row for a key seen for the first time; its `value` of 1 is the
    /// first issued number.
    pub fn open(config: &CounterConfig, today: NaiveDate) -> Self {
        Self {
            value: 1,
            step: config.step,
            reset: config.reset,
            last_reset: Some(today),
        }
    }

    /// Reset check plus increment, returning the issued value.
    pub fn advance(&mut self, today: NaiveDate) -> u64 {
        if self.reset.crossed(self.last_reset, today) {
            self.value = 1;
            self.last_reset = Some(today);
        } else {
            self.value += self.step;
        }
        self.value
    }
}
