//! Group table: grouping key to merged fixation and partial results
//!
//! Each run (and each partition of a partitioned run) owns its own table, so
//! no group state outlives or leaks between runs.

use crate::evaluator::{EvaluationResult, PartialResults};
use crate::fixation::{Fixation, GroupKey};
use indexmap::IndexMap;
use indexmap::map::Entry;

/// State of one output group
#[derive(Debug, Clone)]
pub(crate) struct GroupState {
    pub(crate) fixation: Fixation,
    pub(crate) partials: PartialResults,
}

/// Groups in first-seen order
#[derive(Debug, Default)]
pub(crate) struct GroupTable {
    groups: IndexMap<GroupKey, GroupState>,
}

impl GroupTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.groups.len()
    }

    /// Add a record to its group and return the group's partial results for accumulation
    pub(crate) fn join(
        &mut self,
        key: GroupKey,
        record: &Fixation,
        template: &PartialResults,
    ) -> &mut PartialResults {
        match self.groups.entry(key) {
            Entry::Occupied(entry) => {
                let merged = entry.get().fixation.merge(record, entry.key());
                let state = entry.into_mut();
                state.fixation = merged;
                &mut state.partials
            }
            Entry::Vacant(entry) => {
                &mut entry
                    .insert(GroupState {
                        fixation: record.clone(),
                        partials: template.clone(),
                    })
                    .partials
            }
        }
    }

    /// Fold another table into this one; groups new to this table keep the other's order
    pub(crate) fn absorb(&mut self, other: GroupTable) -> EvaluationResult<()> {
        for (key, incoming) in other.groups {
            match self.groups.entry(key) {
                Entry::Occupied(mut entry) => {
                    let merged = entry.get().fixation.merge(&incoming.fixation, entry.key());
                    let state = entry.get_mut();
                    state.fixation = merged;
                    state.partials.combine(incoming.partials)?;
                }
                Entry::Vacant(entry) => {
                    entry.insert(incoming);
                }
            }
        }
        Ok(())
    }

    pub(crate) fn into_groups(self) -> impl Iterator<Item = (GroupKey, GroupState)> {
        self.groups.into_iter()
    }
}
