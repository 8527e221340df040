//! Dual-structure sketch driver.
//!
//! A sketch keeps two working structures: one absorbing raw updates and one
//! absorbing serialized summaries from elsewhere. Reading the sketch first
//! merges whatever changed into a single result. The merge is lazy: repeated
//! reads with no mutation in between reuse the previous result.
//!
//! ```text
//!   update ─┐                      ┌─ both      (updated && unioned)
//!           ├─ merge_if_needed ────┼─ union     (unioned only)
//!   union ──┘                      └─ update    (everything else)
//! ```

use super::summary::MergeableSummary;
use crate::velocore::sql::error::{SqlError, SqlResult};

/// Merge hooks supplied by a concrete sketch.
pub trait DualSketchMerge {
    /// Fold both working structures into the result.
    fn merge_both(&mut self) -> SqlResult<()>;
    /// Only the update structure holds new data.
    fn merge_update_only(&mut self) -> SqlResult<()>;
    /// Only the union structure holds new data.
    fn merge_union_only(&mut self) -> SqlResult<()>;
    /// Called before every merge. Returns true when an existing result had to
    /// be folded into the union structure, which then forces a union merge.
    fn needs_existing_result_union(&mut self) -> SqlResult<bool>;
    /// Drop all working structures and the result.
    fn reset_structures(&mut self);
}

#[derive(Debug, Clone)]
pub struct DualSketch<S> {
    structures: S,
    updated: bool,
    unioned: bool,
    must_merge: bool,
    merge_count: u64,
}

impl<S: DualSketchMerge> DualSketch<S> {
    pub fn new(structures: S) -> Self {
        Self {
            structures,
            updated: false,
            unioned: false,
            must_merge: true,
            merge_count: 0,
        }
    }

    /// Apply a raw update to the structures.
    pub fn update<R>(&mut self, apply: impl FnOnce(&mut S) -> SqlResult<R>) -> SqlResult<R> {
        self.updated = true;
        self.must_merge = true;
        apply(&mut self.structures)
    }

    /// Apply a union of foreign data to the structures.
    pub fn union<R>(&mut self, apply: impl FnOnce(&mut S) -> SqlResult<R>) -> SqlResult<R> {
        self.unioned = true;
        self.must_merge = true;
        apply(&mut self.structures)
    }

    pub fn reset(&mut self) {
        self.structures.reset_structures();
        self.updated = false;
        self.unioned = false;
        self.must_merge = true;
    }

    /// Merge pending changes into the result if anything changed since the
    /// last merge.
    pub fn merge_if_needed(&mut self) -> SqlResult<()> {
        if !self.must_merge {
            return Ok(());
        }
        if self.structures.needs_existing_result_union()? {
            self.unioned = true;
        }
        match (self.updated, self.unioned) {
            (true, true) => self.structures.merge_both()?,
            (_, true) => self.structures.merge_union_only()?,
            _ => self.structures.merge_update_only()?,
        }
        // Working structures were consumed into the result.
        self.updated = false;
        self.unioned = false;
        self.must_merge = false;
        self.merge_count += 1;
        log::trace!("Dual sketch merged (merge #{})", self.merge_count);
        Ok(())
    }

    /// Structures after merging pending changes.
    pub fn merged(&mut self) -> SqlResult<&S> {
        self.merge_if_needed()?;
        Ok(&self.structures)
    }

    pub fn must_merge(&self) -> bool {
        self.must_merge
    }

    pub fn is_updated(&self) -> bool {
        self.updated
    }

    pub fn is_unioned(&self) -> bool {
        self.unioned
    }

    /// Number of merges actually performed.
    pub fn merge_count(&self) -> u64 {
        self.merge_count
    }
}

/// Update, union and result instances of one [`MergeableSummary`] type.
#[derive(Debug, Clone)]
pub struct DualStructures<S> {
    update: S,
    union: S,
    result: Option<S>,
    empty: S,
}

impl<S: MergeableSummary + Clone> DualStructures<S> {
    /// `empty` is the template every working structure is reset to.
    pub fn new(empty: S) -> Self {
        Self {
            update: empty.clone(),
            union: empty.clone(),
            result: None,
            empty,
        }
    }

    pub fn update_mut(&mut self) -> &mut S {
        &mut self.update
    }

    pub fn union_mut(&mut self) -> &mut S {
        &mut self.union
    }

    pub fn result(&self) -> Option<&S> {
        self.result.as_ref()
    }

    fn take_update(&mut self) -> S {
        std::mem::replace(&mut self.update, self.empty.clone())
    }

    fn take_union(&mut self) -> S {
        std::mem::replace(&mut self.union, self.empty.clone())
    }
}

impl<S: MergeableSummary + Clone> DualSketchMerge for DualStructures<S> {
    fn merge_both(&mut self) -> SqlResult<()> {
        let update = self.take_update();
        self.union.merge(&update)?;
        self.result = Some(self.take_union());
        Ok(())
    }

    fn merge_update_only(&mut self) -> SqlResult<()> {
        self.result = Some(self.take_update());
        Ok(())
    }

    fn merge_union_only(&mut self) -> SqlResult<()> {
        self.result = Some(self.take_union());
        Ok(())
    }

    fn needs_existing_result_union(&mut self) -> SqlResult<bool> {
        match self.result.take() {
            Some(previous) => {
                self.union.merge(&previous)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn reset_structures(&mut self) {
        self.update.reset();
        self.union.reset();
        self.result = None;
    }
}

impl<S: MergeableSummary + Clone> DualSketch<DualStructures<S>> {
    /// The merged result summary.
    pub fn result(&mut self) -> SqlResult<&S> {
        self.merged()?
            .result()
            .ok_or_else(|| SqlError::sketch_error("Sketch has no merged result"))
    }
}
