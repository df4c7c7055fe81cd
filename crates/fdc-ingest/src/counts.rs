//! Run-scoped row counters
//!
//! Every loader task increments the shared [`Counts`] per consumed row. The
//! counters are atomics so tasks never coordinate; a [`CountsSnapshot`] is
//! taken for reporting.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Which counter a loader feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountKind {
    Foods,
    Servings,
    Nutrients,
    /// Input foods, crosswalks, group assignments
    Other,
}

impl CountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountKind::Foods => "foods",
            CountKind::Servings => "servings",
            CountKind::Nutrients => "nutrients",
            CountKind::Other => "other",
        }
    }
}

#[derive(Debug, Default)]
pub struct Counts {
    foods: AtomicU64,
    servings: AtomicU64,
    nutrients: AtomicU64,
    other: AtomicU64,
    orphaned_rows: AtomicU64,
    dropped_facts: AtomicU64,
    failed_batches: AtomicU64,
}

impl Counts {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, kind: CountKind) -> &AtomicU64 {
        match kind {
            CountKind::Foods => &self.foods,
            CountKind::Servings => &self.servings,
            CountKind::Nutrients => &self.nutrients,
            CountKind::Other => &self.other,
        }
    }

    /// Count one consumed row; returns the new total for `kind`
    pub fn increment(&self, kind: CountKind) -> u64 {
        self.counter(kind).fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self, kind: CountKind) -> u64 {
        self.counter(kind).load(Ordering::Relaxed)
    }

    /// Rows whose parent food was not in the store when their run was flushed
    pub fn add_orphaned(&self, rows: u64) {
        self.orphaned_rows.fetch_add(rows, Ordering::Relaxed);
    }

    /// A fact batch the store rejected; its rows are gone
    pub fn add_dropped_batch(&self, facts: u64) {
        self.failed_batches.fetch_add(1, Ordering::Relaxed);
        self.dropped_facts.fetch_add(facts, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountsSnapshot {
        CountsSnapshot {
            foods: self.foods.load(Ordering::Relaxed),
            servings: self.servings.load(Ordering::Relaxed),
            nutrients: self.nutrients.load(Ordering::Relaxed),
            other: self.other.load(Ordering::Relaxed),
            orphaned_rows: self.orphaned_rows.load(Ordering::Relaxed),
            dropped_facts: self.dropped_facts.load(Ordering::Relaxed),
            failed_batches: self.failed_batches.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CountsSnapshot {
    pub foods: u64,
    pub servings: u64,
    pub nutrients: u64,
    pub other: u64,
    pub orphaned_rows: u64,
    pub dropped_facts: u64,
    pub failed_batches: u64,
}

impl CountsSnapshot {
    /// True when some consumed rows did not reach the store
    pub fn has_losses(&self) -> bool {
        self.orphaned_rows > 0 || self.dropped_facts > 0
    }
}
