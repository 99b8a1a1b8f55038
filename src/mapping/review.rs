//! Override review.
//!
//! The UI lets a human operator override any entry of a proposed mapping
//! before confirming the print. [`review_override`] re-checks such an
//! edited assignment (in the `-1`-sentinel wire form) against the
//! inventory and the requirement list and reports every problem found.
//! The issues are diagnoses for the operator, not failures: an override
//! with issues can still be confirmed if the operator insists.

use std::collections::HashMap;

use thiserror::Error;

use crate::inventory::LoadedFeed;
use crate::GlobalSlotId;

use super::{FilamentRequirement, UNMATCHED_SLOT};

/// One problem with a proposed manual assignment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverrideIssue {
    /// The proposed array does not cover the requirement list.
    #[error("assignment has {actual} entries but the job needs {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The proposed slot id names no loaded slot.
    #[error("entry {index}: slot {slot} is not a loaded feed slot")]
    UnknownSlot { index: usize, slot: i32 },

    /// The same slot is assigned to two requirements.
    #[error("entry {index}: slot {slot} is already assigned to entry {first}")]
    DoubleBooked {
        index: usize,
        slot: i32,
        first: usize,
    },

    /// The slot cannot reach the extruder the requirement is pinned to.
    #[error("entry {index}: slot {slot} cannot reach extruder {required}")]
    WrongExtruder {
        index: usize,
        slot: i32,
        required: u8,
        /// Extruder the slot actually feeds, when the wiring map says.
        actual: Option<u8>,
    },

    /// The slot holds a different material than the requirement needs.
    #[error("entry {index}: slot {slot} holds {loaded}, but the requirement needs {required}")]
    MaterialMismatch {
        index: usize,
        slot: i32,
        loaded: String,
        required: String,
    },
}

/// Check a proposed assignment (wire form, one `i32` per requirement,
/// [`UNMATCHED_SLOT`] allowed anywhere) against the inventory and the
/// requirement list.
///
/// Returns every issue found, in entry order; an empty vec means the
/// override is consistent. The matcher's own output always reviews
/// clean.
pub fn review_override(
    proposed: &[i32],
    requirements: &[FilamentRequirement],
    inventory: &[LoadedFeed],
) -> Vec<OverrideIssue> {
    if proposed.len() != requirements.len() {
        return vec![OverrideIssue::LengthMismatch {
            expected: requirements.len(),
            actual: proposed.len(),
        }];
    }

    let by_id: HashMap<GlobalSlotId, &LoadedFeed> =
        inventory.iter().map(|f| (f.global_id, f)).collect();
    let has_extruder_info = inventory.iter().any(|f| f.extruder.is_some());

    let mut issues = Vec::new();
    let mut first_use: HashMap<i32, usize> = HashMap::new();

    for (index, (&slot, requirement)) in proposed.iter().zip(requirements).enumerate() {
        if slot == UNMATCHED_SLOT {
            continue;
        }

        let feed = match GlobalSlotId::try_from(slot).ok().and_then(|id| by_id.get(&id)) {
            Some(feed) => *feed,
            None => {
                issues.push(OverrideIssue::UnknownSlot { index, slot });
                continue;
            }
        };

        match first_use.get(&slot) {
            Some(&first) => {
                issues.push(OverrideIssue::DoubleBooked { index, slot, first });
                continue;
            }
            None => {
                first_use.insert(slot, index);
            }
        }

        if let Some(required) = requirement.extruder {
            if has_extruder_info && feed.extruder != Some(required) {
                issues.push(OverrideIssue::WrongExtruder {
                    index,
                    slot,
                    required,
                    actual: feed.extruder,
                });
            }
        }

        if feed.material != requirement.material {
            issues.push(OverrideIssue::MaterialMismatch {
                index,
                slot,
                loaded: feed.material.clone(),
                required: requirement.material.clone(),
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{ExtruderTopology, FeedSlot, FeedSnapshot, FeedUnit};
    use crate::inventory::normalize_inventory;
    use crate::mapping::resolve_against;

    fn fixture() -> (Vec<LoadedFeed>, Vec<FilamentRequirement>) {
        let snapshot = FeedSnapshot {
            units: vec![FeedUnit::with_slots(
                0,
                vec![
                    FeedSlot::loaded(0, "PLA", "000000"),
                    FeedSlot::loaded(1, "PETG", "FF0000"),
                ],
            )],
            topology: Some(ExtruderTopology::from_pairs(&[(0, 0)])),
            ..FeedSnapshot::default()
        };
        let inventory = normalize_inventory(Some(&snapshot));
        let requirements = vec![
            FilamentRequirement::new("PLA", "000000"),
            FilamentRequirement::new("PETG", "FF0000"),
        ];
        (inventory, requirements)
    }

    #[test]
    fn test_matcher_output_reviews_clean() {
        let (inventory, requirements) = fixture();
        let result = resolve_against(&requirements, &inventory).unwrap();
        assert!(review_override(&result.slot_ids(), &requirements, &inventory).is_empty());
    }

    #[test]
    fn test_unmatched_entries_are_acceptable() {
        let (inventory, requirements) = fixture();
        let issues = review_override(&[UNMATCHED_SLOT, UNMATCHED_SLOT], &requirements, &inventory);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_length_mismatch_reported_alone() {
        let (inventory, requirements) = fixture();
        let issues = review_override(&[0], &requirements, &inventory);
        assert_eq!(
            issues,
            vec![OverrideIssue::LengthMismatch {
                expected: 2,
                actual: 1
            }]
        );
    }

    #[test]
    fn test_unknown_and_double_booked_slots() {
        let (inventory, requirements) = fixture();
        let issues = review_override(&[9, 9], &requirements, &inventory);
        assert_eq!(
            issues,
            vec![
                OverrideIssue::UnknownSlot { index: 0, slot: 9 },
                OverrideIssue::UnknownSlot { index: 1, slot: 9 },
            ]
        );

        let issues = review_override(&[0, 0], &requirements, &inventory);
        assert!(issues.contains(&OverrideIssue::DoubleBooked {
            index: 1,
            slot: 0,
            first: 0
        }));
    }

    #[test]
    fn test_wrong_extruder_and_material_mismatch() {
        let (inventory, mut requirements) = fixture();
        requirements[1].extruder = Some(1);

        // Entry 1 points at the PLA slot: wrong material, and its unit is
        // wired to extruder 0 while the requirement pins extruder 1.
        let issues = review_override(&[UNMATCHED_SLOT, 0], &requirements, &inventory);
        assert_eq!(
            issues,
            vec![
                OverrideIssue::WrongExtruder {
                    index: 1,
                    slot: 0,
                    required: 1,
                    actual: Some(0),
                },
                OverrideIssue::MaterialMismatch {
                    index: 1,
                    slot: 0,
                    loaded: "PLA".to_string(),
                    required: "PETG".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_issues_render_for_the_operator() {
        let issue = OverrideIssue::UnknownSlot { index: 2, slot: 42 };
        assert_eq!(issue.to_string(), "entry 2: slot 42 is not a loaded feed slot");

        // Every variant must render, whether or not the wiring is known.
        let issue = OverrideIssue::WrongExtruder {
            index: 0,
            slot: 3,
            required: 1,
            actual: Some(0),
        };
        assert_eq!(issue.to_string(), "entry 0: slot 3 cannot reach extruder 1");
        let issue = OverrideIssue::WrongExtruder {
            index: 0,
            slot: 3,
            required: 1,
            actual: None,
        };
        assert_eq!(issue.to_string(), "entry 0: slot 3 cannot reach extruder 1");
    }
}
