//! Inventory normalizer.
//!
//! Flattens a raw [`FeedSnapshot`] into a uniform list of loaded feed
//! slots ([`LoadedFeed`]), resolving everything the matcher needs per
//! slot: the flat global slot id, external and high-throughput flags,
//! normalized color, and extruder ownership from the wiring map.
//!
//! ## Ordering and degradation
//!
//! Output preserves discovery order: all regular-unit slots first (unit
//! order, then slot order), external positions last. There are no error
//! conditions; a missing snapshot, an empty slot, or a malformed color
//! each degrade to "no entry" or "no color" rather than a failure.
//!
//! ## Global slot ids
//!
//! A regular (multi-slot) unit's slot maps to `unit_id * 4 + slot_index`.
//! External positions hold the fixed ids 254 and 255. Single-slot
//! high-throughput units have two addressing conventions in the wild, so
//! the convention is an explicit parameter ([`HtSlotAddressing`]) rather
//! than a silent choice. Global ids are unique within one normalized
//! inventory; a later slot whose computed id collides with an earlier
//! one contributes no entry.

use std::collections::HashSet;

use log::debug;

use crate::color::normalize_color;
use crate::feed::{
    ExternalSlot, ExtruderTopology, FeedSnapshot, FeedUnit, EXTERNAL_PRIMARY_ID,
    EXTERNAL_SECONDARY_ID, SLOTS_PER_UNIT,
};
use crate::GlobalSlotId;

/// Global-id convention for single-slot high-throughput units.
///
/// Observed machine behavior disagrees on how these units are addressed,
/// so both conventions are implemented and the caller picks one. The
/// default treats the unit id as the global id directly, which keeps
/// every id inside the feeder-id space that the 254/255 external
/// convention already pins below 256.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HtSlotAddressing {
    /// The unit id is the global slot id (unit 130 -> slot 130).
    #[default]
    UnitId,
    /// The regular-unit formula applies (unit 130 -> slot 520).
    Flattened,
}

/// One loaded feed slot, as the matcher consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFeed {
    /// Material label, verbatim from telemetry.
    pub material: String,
    /// Normalized 6-hex-digit uppercase color; `None` when telemetry
    /// reported none or an unparseable string. A colorless entry never
    /// color-matches.
    pub color: Option<String>,
    /// Owning unit id; `None` for external positions.
    pub unit_id: Option<u8>,
    /// Slot index within the owning unit; `None` for external positions.
    pub slot_index: Option<u8>,
    /// Flat identifier unique within one inventory.
    pub global_id: GlobalSlotId,
    /// Spool fingerprint; empty string when the spool carries none.
    pub fingerprint: String,
    /// Whether this is an external feed position.
    pub is_external: bool,
    /// Whether the owning unit is a single-slot high-throughput unit.
    pub is_high_throughput: bool,
    /// Extruder this slot can physically reach, when the wiring map says.
    pub extruder: Option<u8>,
}

impl LoadedFeed {
    /// Operator-facing slot name for status views: "A3" for unit 0
    /// slot 2, "HT-130" for a high-throughput unit, "External" and
    /// "External 2" for the fixed positions.
    pub fn display_name(&self) -> String {
        if self.is_external {
            if self.global_id == GlobalSlotId::from(EXTERNAL_SECONDARY_ID) {
                "External 2".to_string()
            } else {
                "External".to_string()
            }
        } else if self.is_high_throughput {
            match self.unit_id {
                Some(unit) => format!("HT-{unit}"),
                None => "HT".to_string(),
            }
        } else {
            match (self.unit_id, self.slot_index) {
                (Some(unit), Some(slot)) => {
                    let letter = (b'A' + unit % 26) as char;
                    format!("{letter}{}", slot + 1)
                }
                _ => format!("Slot {}", self.global_id),
            }
        }
    }
}

/// Global slot id of a regular unit's slot.
pub fn regular_global_id(unit_id: u8, slot_index: u8) -> GlobalSlotId {
    GlobalSlotId::from(unit_id) * GlobalSlotId::from(SLOTS_PER_UNIT) + GlobalSlotId::from(slot_index)
}

fn unit_global_id(unit: &FeedUnit, slot_index: u8, addressing: HtSlotAddressing) -> GlobalSlotId {
    if unit.is_high_throughput() {
        match addressing {
            HtSlotAddressing::UnitId => GlobalSlotId::from(unit.id),
            HtSlotAddressing::Flattened => regular_global_id(unit.id, slot_index),
        }
    } else {
        regular_global_id(unit.id, slot_index)
    }
}

/// Flatten a hardware-status snapshot into the loaded-feed inventory,
/// using the default high-throughput addressing convention.
///
/// `None` (no hardware status yet) yields an empty inventory.
pub fn normalize_inventory(snapshot: Option<&FeedSnapshot>) -> Vec<LoadedFeed> {
    normalize_inventory_with(snapshot, HtSlotAddressing::default())
}

/// Flatten a hardware-status snapshot under an explicit high-throughput
/// addressing convention.
pub fn normalize_inventory_with(
    snapshot: Option<&FeedSnapshot>,
    addressing: HtSlotAddressing,
) -> Vec<LoadedFeed> {
    let Some(snapshot) = snapshot else {
        return Vec::new();
    };

    let mut inventory = Vec::new();
    let mut seen_ids: HashSet<GlobalSlotId> = HashSet::new();
    let topology = snapshot.topology.as_ref();

    for unit in &snapshot.units {
        for slot in &unit.slots {
            if slot.is_empty() {
                continue;
            }
            let global_id = unit_global_id(unit, slot.index, addressing);
            if !seen_ids.insert(global_id) {
                debug!(
                    "dropping unit {} slot {}: global id {} already taken",
                    unit.id, slot.index, global_id
                );
                continue;
            }
            inventory.push(LoadedFeed {
                material: slot.material.clone().unwrap_or_default(),
                color: slot.color.as_deref().and_then(normalize_color),
                unit_id: Some(unit.id),
                slot_index: Some(slot.index),
                global_id,
                fingerprint: slot.fingerprint.clone().unwrap_or_default(),
                is_external: false,
                is_high_throughput: unit.is_high_throughput(),
                extruder: topology.and_then(|t| t.extruder_for(unit.id)),
            });
        }
    }

    let externals = [
        (snapshot.external.as_ref(), EXTERNAL_PRIMARY_ID),
        (snapshot.external_secondary.as_ref(), EXTERNAL_SECONDARY_ID),
    ];
    for (slot, position_id) in externals {
        let Some(slot) = slot else { continue };
        if slot.is_empty() {
            continue;
        }
        let global_id = GlobalSlotId::from(position_id);
        if !seen_ids.insert(global_id) {
            debug!("dropping external position {position_id}: global id already taken");
            continue;
        }
        inventory.push(external_entry(slot, global_id, topology, position_id));
    }

    inventory
}

fn external_entry(
    slot: &ExternalSlot,
    global_id: GlobalSlotId,
    topology: Option<&ExtruderTopology>,
    position_id: u8,
) -> LoadedFeed {
    LoadedFeed {
        material: slot.material.clone().unwrap_or_default(),
        color: slot.color.as_deref().and_then(normalize_color),
        unit_id: None,
        slot_index: None,
        global_id,
        fingerprint: slot.fingerprint.clone().unwrap_or_default(),
        is_external: true,
        is_high_throughput: false,
        extruder: topology.and_then(|t| t.extruder_for(position_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedSlot;

    fn four_slot_unit(id: u8) -> FeedUnit {
        FeedUnit::with_slots(
            id,
            vec![
                FeedSlot::loaded(0, "PLA", "#000000"),
                FeedSlot::loaded(1, "PETG", "#FF0000"),
                FeedSlot::empty(2),
                FeedSlot::loaded(3, "TPU", "#00FF00"),
            ],
        )
    }

    #[test]
    fn test_missing_snapshot_yields_empty_inventory() {
        assert!(normalize_inventory(None).is_empty());
        assert!(normalize_inventory(Some(&FeedSnapshot::default())).is_empty());
    }

    #[test]
    fn test_regular_unit_global_ids_and_order() {
        let snapshot = FeedSnapshot {
            units: vec![four_slot_unit(1)],
            ..FeedSnapshot::default()
        };
        let inventory = normalize_inventory(Some(&snapshot));

        // Empty slot 2 is skipped, order follows slot index.
        let ids: Vec<_> = inventory.iter().map(|f| f.global_id).collect();
        assert_eq!(ids, vec![4, 5, 7]);
        assert_eq!(regular_global_id(1, 2), 6);
        assert!(inventory.iter().all(|f| !f.is_external));
        assert!(inventory.iter().all(|f| !f.is_high_throughput));
    }

    #[test]
    fn test_ht_addressing_conventions() {
        let snapshot = FeedSnapshot {
            units: vec![FeedUnit::with_slots(
                130,
                vec![FeedSlot::loaded(0, "PLA", "FFFFFF")],
            )],
            ..FeedSnapshot::default()
        };

        let direct = normalize_inventory_with(Some(&snapshot), HtSlotAddressing::UnitId);
        assert_eq!(direct[0].global_id, 130);
        assert!(direct[0].is_high_throughput);

        let flattened = normalize_inventory_with(Some(&snapshot), HtSlotAddressing::Flattened);
        assert_eq!(flattened[0].global_id, 520);
    }

    #[test]
    fn test_external_positions_come_last_with_fixed_ids() {
        let snapshot = FeedSnapshot {
            units: vec![four_slot_unit(0)],
            external: Some(ExternalSlot::loaded("ASA", "#112233")),
            external_secondary: Some(ExternalSlot::loaded("PC", "#445566")),
            ..FeedSnapshot::default()
        };
        let inventory = normalize_inventory(Some(&snapshot));
        let ids: Vec<_> = inventory.iter().map(|f| f.global_id).collect();
        assert_eq!(ids, vec![0, 1, 3, 254, 255]);
        assert!(inventory[3].is_external && inventory[4].is_external);
    }

    #[test]
    fn test_unpopulated_external_contributes_nothing() {
        let snapshot = FeedSnapshot {
            external: Some(ExternalSlot::default()),
            external_secondary: Some(ExternalSlot::loaded("PLA", "000000")),
            ..FeedSnapshot::default()
        };
        let inventory = normalize_inventory(Some(&snapshot));
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].global_id, 255);
    }

    #[test]
    fn test_extruder_ownership_from_topology() {
        let snapshot = FeedSnapshot {
            units: vec![four_slot_unit(0), four_slot_unit(1)],
            external: Some(ExternalSlot::loaded("ASA", "#112233")),
            topology: Some(ExtruderTopology::from_pairs(&[(0, 0), (254, 1)])),
            ..FeedSnapshot::default()
        };
        let inventory = normalize_inventory(Some(&snapshot));

        assert!(inventory
            .iter()
            .filter(|f| f.unit_id == Some(0))
            .all(|f| f.extruder == Some(0)));
        // Unit 1 is missing from the wiring map.
        assert!(inventory
            .iter()
            .filter(|f| f.unit_id == Some(1))
            .all(|f| f.extruder.is_none()));
        assert_eq!(inventory.last().unwrap().extruder, Some(1));
    }

    #[test]
    fn test_global_id_collision_drops_later_entry() {
        // Two units claiming id 0 is malformed telemetry; the invariant
        // holds by dropping the later slots.
        let snapshot = FeedSnapshot {
            units: vec![four_slot_unit(0), four_slot_unit(0)],
            ..FeedSnapshot::default()
        };
        let inventory = normalize_inventory(Some(&snapshot));
        let mut ids: Vec<_> = inventory.iter().map(|f| f.global_id).collect();
        let before = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), before);
        assert_eq!(inventory.len(), 3);
    }

    #[test]
    fn test_color_normalized_on_entry() {
        let snapshot = FeedSnapshot {
            units: vec![FeedUnit::with_slots(
                0,
                vec![
                    FeedSlot::loaded(0, "PLA", "#00ae42ff"),
                    FeedSlot::loaded(1, "PLA", "mystery"),
                ],
            )],
            ..FeedSnapshot::default()
        };
        let inventory = normalize_inventory(Some(&snapshot));
        assert_eq!(inventory[0].color.as_deref(), Some("00AE42"));
        assert_eq!(inventory[1].color, None);
    }

    #[test]
    fn test_display_names() {
        let snapshot = FeedSnapshot {
            units: vec![
                four_slot_unit(0),
                FeedUnit::with_slots(130, vec![FeedSlot::loaded(0, "PLA", "FFFFFF")]),
            ],
            external: Some(ExternalSlot::loaded("ASA", "112233")),
            external_secondary: Some(ExternalSlot::loaded("PC", "445566")),
            ..FeedSnapshot::default()
        };
        let inventory = normalize_inventory(Some(&snapshot));
        let names: Vec<_> = inventory.iter().map(LoadedFeed::display_name).collect();
        assert_eq!(names, vec!["A1", "A2", "A4", "HT-130", "External", "External 2"]);
    }
}
