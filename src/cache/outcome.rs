//! Operation Outcomes
//!
//! Typed results for cache operations. None of these are errors: a miss or a
//! degraded write is a normal answer the caller may inspect or ignore.

use serde::Serialize;
use serde_json::Value;

// == Tier ==
/// Which storage layer answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Memory,
    Persistent,
}

// == Lookup ==
/// Result of `Cache::get`.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// A live value was found.
    Hit { value: Value, tier: Tier },
    /// Nothing usable was found.
    Miss(MissReason),
}

/// Why a lookup came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// The key is in neither tier.
    Absent,
    /// An entry existed but its TTL had elapsed; it has been evicted.
    Expired,
    /// The durable text could not be decoded; it has been evicted.
    Corrupted,
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit { .. })
    }

    /// Borrows the value on a hit.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Lookup::Hit { value, .. } => Some(value),
            Lookup::Miss(_) => None,
        }
    }

    /// Consumes the lookup, keeping only the value.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Lookup::Hit { value, .. } => Some(value),
            Lookup::Miss(_) => None,
        }
    }
}

// == Write Outcome ==
/// Result of `Cache::set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Stored in both tiers.
    Durable,
    /// Stored in the memory tier only.
    MemoryOnly(DegradeReason),
    /// Nothing was stored because the value could not be serialized.
    Rejected,
}

/// Why a write skipped the durable tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    /// No durable store is attached, or it reported itself unavailable.
    Unavailable,
    /// The store stayed over quota after a sweep and one retry.
    QuotaExceeded,
    /// The store failed for another reason (I/O, encoding).
    StoreFailure,
}

impl WriteOutcome {
    pub fn is_durable(&self) -> bool {
        matches!(self, WriteOutcome::Durable)
    }
}

// == Sweep Report ==
/// Counts from one maintenance sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Expired entries dropped from the memory tier
    pub memory_evicted: usize,
    /// Expired entries dropped from the durable tier
    pub persistent_evicted: usize,
    /// Undecodable entries dropped from the durable tier
    pub corrupted: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.memory_evicted + self.persistent_evicted + self.corrupted
    }
}
