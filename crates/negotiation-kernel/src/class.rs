//! Class definitions and the occurrences they expand into.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::registry::EntityId;

/// Final result of negotiating one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    Undetermined,
    Placed,
    NotPlaced,
}

/// A class as declared for one group, with per-parity meeting counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub class_id: EntityId,
    pub group_id: EntityId,
    pub type_id: EntityId,
    pub tool_ids: BTreeSet<EntityId>,
    /// (week parity index, repeat count) pairs.
    pub times: Vec<(usize, u32)>,
}

impl ClassDefinition {
    /// One occurrence per (parity, repetition). Zero counts expand to nothing.
    pub fn occurrences(&self) -> Vec<ClassOccurrence> {
        self.times
            .iter()
            .flat_map(|&(week, count)| {
                (0..count).map(move |_| ClassOccurrence {
                    class_id: self.class_id,
                    group_id: self.group_id,
                    type_id: self.type_id,
                    tool_ids: self.tool_ids.clone(),
                    week,
                    outcome: Outcome::Undetermined,
                })
            })
            .collect()
    }

    /// Meetings this class needs in `week`.
    pub fn load_in_week(&self, week: usize) -> usize {
        self.times
            .iter()
            .filter(|(w, _)| *w == week)
            .map(|(_, count)| *count as usize)
            .sum()
    }
}

/// One concrete meeting to negotiate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassOccurrence {
    pub class_id: EntityId,
    pub group_id: EntityId,
    pub type_id: EntityId,
    pub tool_ids: BTreeSet<EntityId>,
    /// Target week (parity band).
    pub week: usize,
    pub outcome: Outcome,
}

impl ClassOccurrence {
    /// Record the outcome. Only the first call has an effect.
    pub fn settle(&mut self, outcome: Outcome) -> bool {
        if self.outcome != Outcome::Undetermined {
            return false;
        }
        self.outcome = outcome;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> ClassDefinition {
        ClassDefinition {
            class_id: 10,
            group_id: 2,
            type_id: 5,
            tool_ids: BTreeSet::from([7]),
            times: vec![(0, 2), (1, 0), (1, 1)],
        }
    }

    #[test]
    fn test_expansion_skips_zero_counts() {
        let occurrences = definition().occurrences();
        assert_eq!(occurrences.len(), 3);
        assert_eq!(
            occurrences.iter().map(|o| o.week).collect::<Vec<_>>(),
            vec![0, 0, 1]
        );
        assert!(occurrences.iter().all(|o| o.outcome == Outcome::Undetermined));
    }

    #[test]
    fn test_load_in_week() {
        let def = definition();
        assert_eq!(def.load_in_week(0), 2);
        assert_eq!(def.load_in_week(1), 1);
        assert_eq!(def.load_in_week(2), 0);
    }

    #[test]
    fn test_outcome_set_once() {
        let mut occ = definition().occurrences().remove(0);
        assert!(occ.settle(Outcome::Placed));
        assert!(!occ.settle(Outcome::NotPlaced));
        assert_eq!(occ.outcome, Outcome::Placed);
    }
}
