//! Bounded hash table with KMV-style sampling.
//!
//! Entries are keyed by a 64-bit hash. While fewer than `capacity` distinct
//! hashes have been seen the table is exact. Past that, the largest hash is
//! evicted and becomes the new `theta`: only hashes below it are admitted from
//! then on, so the retained entries are a uniform sample with probability
//! `theta / 2^64`.

use super::summary::{Combine, MergeableSummary};
use crate::velocore::sql::error::SqlResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

const HASH_SPACE: f64 = 18_446_744_073_709_551_616.0; // 2^64

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThetaTable<V> {
    capacity: usize,
    theta: u64,
    entries: BTreeMap<u64, V>,
}

impl<V> ThetaTable<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            theta: u64::MAX,
            entries: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn retained(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once any entry has been evicted.
    pub fn is_estimation_mode(&self) -> bool {
        self.theta != u64::MAX
    }

    /// Sampling probability in `(0, 1]`.
    pub fn theta(&self) -> f64 {
        if self.is_estimation_mode() {
            self.theta as f64 / HASH_SPACE
        } else {
            1.0
        }
    }

    /// Estimated number of distinct hashes seen.
    pub fn estimate(&self) -> f64 {
        self.entries.len() as f64 / self.theta()
    }

    /// Relative standard error of [`estimate`](Self::estimate); zero when exact.
    pub fn standard_error(&self) -> f64 {
        if !self.is_estimation_mode() {
            return 0.0;
        }
        let k = self.entries.len().max(2) - 1;
        1.0 / (k as f64).sqrt()
    }

    pub fn get(&self, hash: u64) -> Option<&V> {
        self.entries.get(&hash)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.theta = u64::MAX;
    }

    fn enforce_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            if let Some((hash, _)) = self.entries.pop_last() {
                self.theta = hash;
            }
        }
    }
}

impl<V: Combine + Clone> ThetaTable<V> {
    /// Insert `value` under `hash`, combining with an existing entry.
    ///
    /// Returns whether the hash is retained after the insert.
    pub fn update(&mut self, hash: u64, value: V) -> SqlResult<bool> {
        if hash >= self.theta {
            return Ok(false);
        }
        match self.entries.entry(hash) {
            Entry::Occupied(mut existing) => existing.get_mut().combine(&value)?,
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
        self.enforce_capacity();
        Ok(self.entries.contains_key(&hash))
    }

    /// Union with another table: the smaller theta wins and every entry
    /// below it is kept, combining entries present on both sides.
    pub fn merge_table(&mut self, other: &ThetaTable<V>) -> SqlResult<()> {
        self.theta = self.theta.min(other.theta);
        let theta = self.theta;
        drop(self.entries.split_off(&theta));
        for (hash, value) in other.entries.range(..theta) {
            match self.entries.entry(*hash) {
                Entry::Occupied(mut existing) => existing.get_mut().combine(value)?,
                Entry::Vacant(slot) => {
                    slot.insert(value.clone());
                }
            }
        }
        self.enforce_capacity();
        Ok(())
    }
}

impl<V> MergeableSummary for ThetaTable<V>
where
    V: Combine + Clone + Serialize + DeserializeOwned,
{
    fn reset(&mut self) {
        self.clear();
    }

    fn merge(&mut self, other: &Self) -> SqlResult<()> {
        self.merge_table(other)
    }
}
