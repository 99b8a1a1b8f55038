//! Typed model of a printer's material-feed hardware status.
//!
//! This is the shape the telemetry collaborator hands over on every
//! refresh: zero or more multi-slot cartridge units ([`FeedUnit`]), up to
//! two external feed positions ([`ExternalSlot`]), and, on dual-extruder
//! machines, the wiring map from feeder to extruder
//! ([`ExtruderTopology`]).
//!
//! Absence is explicit everywhere: a slot with no material is empty, a
//! machine with no topology is single-extruder, a `None` snapshot means
//! no hardware status has arrived yet. The normalizer
//! ([`crate::inventory`]) degrades each of these to "no entries from that
//! source" rather than erroring.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Number of slots a regular cartridge unit exposes.
pub const SLOTS_PER_UNIT: u8 = 4;

/// Fixed feeder id of the primary external feed position.
pub const EXTERNAL_PRIMARY_ID: u8 = 254;

/// Fixed feeder id of the secondary external feed position
/// (dual-extruder machines only).
pub const EXTERNAL_SECONDARY_ID: u8 = 255;

/// One material position inside a [`FeedUnit`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSlot {
    /// Position within the unit, 0-3.
    pub index: u8,

    /// Free-text material label, e.g. "PLA". `None` or blank means the
    /// slot is empty and contributes nothing to the inventory.
    #[serde(default)]
    pub material: Option<String>,

    /// 6-8 hex digit color string, with or without a leading `#`.
    #[serde(default)]
    pub color: Option<String>,

    /// Spool fingerprint stamped when the spool was loaded. Unique per
    /// spool; used to disambiguate visually identical spools.
    #[serde(default)]
    pub fingerprint: Option<String>,

    /// Optional sub-brand label, e.g. "Matte".
    #[serde(default)]
    pub sub_brand: Option<String>,
}

impl FeedSlot {
    /// An empty slot at the given position.
    pub fn empty(index: u8) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// A loaded slot with the given material and color.
    pub fn loaded(index: u8, material: &str, color: &str) -> Self {
        Self {
            index,
            material: Some(material.to_string()),
            color: Some(color.to_string()),
            fingerprint: None,
            sub_brand: None,
        }
    }

    /// Attach a spool fingerprint.
    pub fn with_fingerprint(mut self, fingerprint: &str) -> Self {
        self.fingerprint = Some(fingerprint.to_string());
        self
    }

    /// Whether this slot holds no material.
    pub fn is_empty(&self) -> bool {
        self.material
            .as_deref()
            .map_or(true, |m| m.trim().is_empty())
    }
}

/// A physical multi-slot cartridge unit.
///
/// A unit exposing exactly one slot is a high-throughput unit; the flag
/// is structural, even though such unit ids tend to be numerically large
/// (>= 128).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedUnit {
    /// Unit identifier as reported by the machine.
    pub id: u8,

    /// Slots in index order, up to [`SLOTS_PER_UNIT`].
    #[serde(default)]
    pub slots: Vec<FeedSlot>,
}

impl FeedUnit {
    /// A unit with no slots reported yet.
    pub fn new(id: u8) -> Self {
        Self {
            id,
            slots: Vec::new(),
        }
    }

    /// A unit with the given slots.
    pub fn with_slots(id: u8, slots: Vec<FeedSlot>) -> Self {
        Self { id, slots }
    }

    /// Whether this is a single-slot high-throughput unit.
    pub fn is_high_throughput(&self) -> bool {
        self.slots.len() == 1
    }
}

/// A feed position outside any cartridge unit.
///
/// The primary position carries the fixed feeder id
/// [`EXTERNAL_PRIMARY_ID`]; the secondary, present only on dual-extruder
/// machines, carries [`EXTERNAL_SECONDARY_ID`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalSlot {
    /// Free-text material label; `None` or blank means unpopulated.
    #[serde(default)]
    pub material: Option<String>,

    /// 6-8 hex digit color string, with or without a leading `#`.
    #[serde(default)]
    pub color: Option<String>,

    /// Spool fingerprint stamped at load time.
    #[serde(default)]
    pub fingerprint: Option<String>,

    /// Optional sub-brand label.
    #[serde(default)]
    pub sub_brand: Option<String>,
}

impl ExternalSlot {
    /// A populated external position.
    pub fn loaded(material: &str, color: &str) -> Self {
        Self {
            material: Some(material.to_string()),
            color: Some(color.to_string()),
            fingerprint: None,
            sub_brand: None,
        }
    }

    /// Whether this position holds no material.
    pub fn is_empty(&self) -> bool {
        self.material
            .as_deref()
            .map_or(true, |m| m.trim().is_empty())
    }
}

/// Wiring map from feeder id to the physical extruder it supplies.
///
/// Keys may name feed-unit ids and external position ids alike. Absent
/// on single-extruder machines, in which case extruder ownership is
/// undefined for every slot and the matcher skips nozzle filtering
/// entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtruderTopology {
    assignments: HashMap<u8, u8>,
}

impl ExtruderTopology {
    /// Build a topology from `(feeder_id, extruder)` pairs.
    pub fn from_pairs(pairs: &[(u8, u8)]) -> Self {
        Self {
            assignments: pairs.iter().copied().collect(),
        }
    }

    /// Record which extruder a feeder supplies.
    pub fn assign(&mut self, feeder_id: u8, extruder: u8) {
        self.assignments.insert(feeder_id, extruder);
    }

    /// The extruder wired to the given feeder, if known.
    pub fn extruder_for(&self, feeder_id: u8) -> Option<u8> {
        self.assignments.get(&feeder_id).copied()
    }

    /// Whether any wiring is recorded at all.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// One hardware-status snapshot, captured by the telemetry collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    /// Cartridge units in report order.
    #[serde(default)]
    pub units: Vec<FeedUnit>,

    /// Primary external feed position, if the machine has one.
    #[serde(default)]
    pub external: Option<ExternalSlot>,

    /// Secondary external feed position (dual-extruder machines).
    #[serde(default)]
    pub external_secondary: Option<ExternalSlot>,

    /// Feeder-to-extruder wiring; absent on single-extruder machines.
    #[serde(default)]
    pub topology: Option<ExtruderTopology>,
}
