//! Reconciliation planner.
//!
//! Diffs a live inventory against the prior record snapshot and selects the
//! keys to re-verify. Pure: no I/O, no clocks.
//!
//! - key never recorded, or recorded without a checksum → selected;
//! - recorded key the policy does not track → skipped;
//! - tracked key → selected only if the live timestamp is strictly newer.
//!
//! Keys that disappeared from the bucket are not reported.

mod policy;

use std::collections::{HashMap, HashSet};

use crate::bucket::InventoryEntry;
use crate::record_db::ObjectRecord;

pub use policy::{EligibilityPolicy, WatchPolicy};

/// One object selected for re-hashing.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationTask {
    pub key: String,
    pub size: u64,
    pub last_modified: f64,
}

impl From<InventoryEntry> for VerificationTask {
    fn from(e: InventoryEntry) -> Self {
        Self {
            key: e.key,
            size: e.size,
            last_modified: e.last_modified,
        }
    }
}

/// Counts for the run report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub listed: usize,
    /// Keys with no prior record (or no prior checksum).
    pub new: usize,
    /// Tracked keys whose timestamp moved forward.
    pub stale: usize,
    pub unchanged: usize,
    /// Recorded keys the policy does not track.
    pub excluded: usize,
    /// Repeated keys in the listing; only the first occurrence counts.
    pub duplicates: usize,
}

impl PlanSummary {
    pub fn selected(&self) -> usize {
        self.new + self.stale
    }
}

#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub tasks: Vec<VerificationTask>,
    pub summary: PlanSummary,
}

/// Index prior records by key.
pub fn index_records(records: Vec<ObjectRecord>) -> HashMap<String, ObjectRecord> {
    records.into_iter().map(|r| (r.key.clone(), r)).collect()
}

/// Select the keys that need verification. At most one task per key.
pub fn plan<I, P>(live: I, prior: &HashMap<String, ObjectRecord>, policy: &P) -> Plan
where
    I: IntoIterator<Item = InventoryEntry>,
    P: EligibilityPolicy + ?Sized,
{
    let mut out = Plan::default();
    let mut seen: HashSet<String> = HashSet::new();

    for entry in live {
        out.summary.listed += 1;
        if !seen.insert(entry.key.clone()) {
            out.summary.duplicates += 1;
            continue;
        }

        let Some(prev) = prior.get(&entry.key) else {
            out.summary.new += 1;
            out.tasks.push(entry.into());
            continue;
        };

        if !policy.tracks(&entry.key) {
            out.summary.excluded += 1;
            continue;
        }

        if prev.checksum.is_none() {
            out.summary.new += 1;
            out.tasks.push(entry.into());
        } else if entry.last_modified > prev.last_modified {
            out.summary.stale += 1;
            out.tasks.push(entry.into());
        } else {
            out.summary.unchanged += 1;
        }
    }

    out
}

#[cfg(test)]
mod tests;
