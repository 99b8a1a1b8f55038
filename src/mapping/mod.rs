//! Requirement matcher.
//!
//! Pairs each filament requirement of a sliced print job with a loaded
//! feed slot from the normalized inventory, in requirement order.
//!
//! ## Algorithm
//!
//! Each requirement is resolved against the slots not yet assigned in
//! this call:
//!
//! 1. **Nozzle filter (hard constraint)** - a requirement pinned to an
//!    extruder only considers slots wired to that extruder. An empty
//!    filtered pool means unmatched, with no fallback to the other
//!    extruder. Machines without wiring information skip this filter.
//! 2. **Tier 1, fingerprint** - a requirement carrying a spool
//!    fingerprint prefers the slot whose spool carries the same stamp
//!    (and the same material), disambiguating visually identical spools.
//! 3. **Tier 2, color** - same material and same normalized color.
//! 4. **Tier 3, type only** - same material, any color.
//!
//! Within a tier the first slot in inventory order wins, and a won slot
//! is consumed for the rest of the call. Matching is greedy and
//! order-dependent by design: the first requirement gets first pick.
//! This is deliberately not a global optimal-assignment solver; a
//! behaviorally compatible reimplementation must keep the greedy order.
//!
//! Both inputs are immutable; the result is recomputed from scratch per
//! call and nothing persists between calls.

mod review;

pub use review::{review_override, OverrideIssue};

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::color::colors_match;
use crate::feed::FeedSnapshot;
use crate::inventory::{normalize_inventory_with, HtSlotAddressing, LoadedFeed};
use crate::GlobalSlotId;

/// Wire-form sentinel for an unresolved requirement.
pub const UNMATCHED_SLOT: i32 = -1;

/// One line item from a slice job, as the slicer-metadata collaborator
/// delivers it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilamentRequirement {
    /// Slot label from the job file, carried only for round-tripping.
    #[serde(default)]
    pub label: String,

    /// Required material label, e.g. "PLA".
    pub material: String,

    /// Required color, raw; normalized for comparison.
    pub color: String,

    /// Mass this requirement will consume, in grams. Carried for the UI,
    /// not used in matching.
    #[serde(default)]
    pub required_grams: f32,

    /// Fingerprint of the spool used at slice time, if recorded.
    #[serde(default)]
    pub fingerprint: Option<String>,

    /// Extruder this requirement must print from, if the job pins one.
    #[serde(default)]
    pub extruder: Option<u8>,
}

impl FilamentRequirement {
    /// A requirement with just a material and color.
    pub fn new(material: &str, color: &str) -> Self {
        Self {
            material: material.to_string(),
            color: color.to_string(),
            ..Self::default()
        }
    }

    /// Attach the spool fingerprint recorded at slice time.
    pub fn with_fingerprint(mut self, fingerprint: &str) -> Self {
        self.fingerprint = Some(fingerprint.to_string());
        self
    }

    /// Pin this requirement to a physical extruder.
    pub fn on_extruder(mut self, extruder: u8) -> Self {
        self.extruder = Some(extruder);
        self
    }
}

/// Which tier won a match. Surfaced for UI badges and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    /// Spool fingerprint and material both matched.
    Fingerprint,
    /// Material and normalized color matched.
    Color,
    /// Only the material matched.
    TypeOnly,
}

/// Resolution of one requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrayAssignment {
    /// The requirement should be fed from this slot.
    Matched {
        slot: GlobalSlotId,
        kind: MatchKind,
    },
    /// No unconsumed slot satisfied any tier.
    Unmatched,
}

impl TrayAssignment {
    /// The wire form: the global slot id, or [`UNMATCHED_SLOT`].
    pub fn slot_id(&self) -> i32 {
        match self {
            Self::Matched { slot, .. } => i32::from(*slot),
            Self::Unmatched => UNMATCHED_SLOT,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Per-outcome counts over one [`MappingResult`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingStats {
    /// Matches won by spool fingerprint.
    pub fingerprint_matches: usize,
    /// Matches won by material and color.
    pub color_matches: usize,
    /// Matches won by material alone.
    pub type_only_matches: usize,
    /// Requirements no slot could satisfy.
    pub unmatched: usize,
}

impl MappingStats {
    /// Total requirements that found a slot.
    pub fn matched(&self) -> usize {
        self.fingerprint_matches + self.color_matches + self.type_only_matches
    }
}

/// The ordered mapping, same length and order as the requirement list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    assignments: Vec<TrayAssignment>,
}

impl MappingResult {
    /// Per-requirement assignments, in requirement order.
    pub fn assignments(&self) -> &[TrayAssignment] {
        &self.assignments
    }

    /// The wire form the UI collaborator consumes: one `i32` per
    /// requirement, [`UNMATCHED_SLOT`] where no slot was found.
    pub fn slot_ids(&self) -> Vec<i32> {
        self.assignments.iter().map(TrayAssignment::slot_id).collect()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrayAssignment> {
        self.assignments.iter()
    }

    /// Whether every requirement found a slot.
    pub fn is_fully_matched(&self) -> bool {
        self.assignments.iter().all(TrayAssignment::is_matched)
    }

    pub fn unmatched_count(&self) -> usize {
        self.assignments.iter().filter(|a| !a.is_matched()).count()
    }

    /// Count outcomes per winning tier.
    pub fn stats(&self) -> MappingStats {
        let mut stats = MappingStats::default();
        for assignment in &self.assignments {
            match assignment {
                TrayAssignment::Matched { kind: MatchKind::Fingerprint, .. } => {
                    stats.fingerprint_matches += 1
                }
                TrayAssignment::Matched { kind: MatchKind::Color, .. } => stats.color_matches += 1,
                TrayAssignment::Matched { kind: MatchKind::TypeOnly, .. } => {
                    stats.type_only_matches += 1
                }
                TrayAssignment::Unmatched => stats.unmatched += 1,
            }
        }
        stats
    }
}

/// Resolve a requirement list against a hardware snapshot, using the
/// default high-throughput addressing convention.
///
/// Returns `None` when there is nothing to assign (empty requirement
/// list) or nothing to assign from (no snapshot, or a snapshot whose
/// normalized inventory is empty). The two cases reach the caller the
/// same way but come from different collaborators, which is why the
/// snapshot stays an explicit `Option` at this boundary.
pub fn resolve_mapping(
    requirements: &[FilamentRequirement],
    snapshot: Option<&FeedSnapshot>,
) -> Option<MappingResult> {
    resolve_mapping_with(requirements, snapshot, HtSlotAddressing::default())
}

/// Resolve a requirement list under an explicit high-throughput
/// addressing convention.
pub fn resolve_mapping_with(
    requirements: &[FilamentRequirement],
    snapshot: Option<&FeedSnapshot>,
    addressing: HtSlotAddressing,
) -> Option<MappingResult> {
    let inventory = normalize_inventory_with(snapshot, addressing);
    resolve_against(requirements, &inventory)
}

/// Resolve a requirement list against an already-normalized inventory.
///
/// Useful when the caller resolves several jobs against one telemetry
/// refresh and wants to normalize once.
pub fn resolve_against(
    requirements: &[FilamentRequirement],
    inventory: &[LoadedFeed],
) -> Option<MappingResult> {
    if requirements.is_empty() || inventory.is_empty() {
        return None;
    }

    let has_extruder_info = inventory.iter().any(|f| f.extruder.is_some());
    let mut consumed: HashSet<GlobalSlotId> = HashSet::new();
    let mut assignments = Vec::with_capacity(requirements.len());

    for (position, requirement) in requirements.iter().enumerate() {
        let assignment = resolve_one(requirement, inventory, &consumed, has_extruder_info);
        match assignment {
            TrayAssignment::Matched { slot, .. } => {
                consumed.insert(slot);
            }
            TrayAssignment::Unmatched => {
                debug!(
                    "requirement {position} ({} {}) left unmatched",
                    requirement.material, requirement.color
                );
            }
        }
        assignments.push(assignment);
    }

    Some(MappingResult { assignments })
}

fn resolve_one(
    requirement: &FilamentRequirement,
    inventory: &[LoadedFeed],
    consumed: &HashSet<GlobalSlotId>,
    has_extruder_info: bool,
) -> TrayAssignment {
    // The nozzle filter is a hard physical constraint: a pinned
    // requirement never falls back to slots on the wrong extruder, and a
    // slot with unknown wiring cannot be trusted to reach the pinned one.
    let candidates: Vec<&LoadedFeed> = inventory
        .iter()
        .filter(|feed| !consumed.contains(&feed.global_id))
        .filter(|feed| match requirement.extruder {
            Some(target) if has_extruder_info => feed.extruder == Some(target),
            _ => true,
        })
        .collect();

    if let Some(fingerprint) = requirement
        .fingerprint
        .as_deref()
        .filter(|fp| !fp.is_empty())
    {
        if let Some(feed) = candidates
            .iter()
            .find(|f| f.material == requirement.material && f.fingerprint == fingerprint)
        {
            return TrayAssignment::Matched {
                slot: feed.global_id,
                kind: MatchKind::Fingerprint,
            };
        }
    }

    if let Some(feed) = candidates.iter().find(|f| {
        f.material == requirement.material && colors_match(f.color.as_deref(), &requirement.color)
    }) {
        return TrayAssignment::Matched {
            slot: feed.global_id,
            kind: MatchKind::Color,
        };
    }

    if let Some(feed) = candidates
        .iter()
        .find(|f| f.material == requirement.material)
    {
        return TrayAssignment::Matched {
            slot: feed.global_id,
            kind: MatchKind::TypeOnly,
        };
    }

    TrayAssignment::Unmatched
}
