//! Filament-to-tray resolution for networked multi-material 3D printers.
//!
//! Given the filament requirements embedded in a sliced print job and a
//! live snapshot of a printer's material-feed hardware (multi-slot
//! cartridge units, optional external feed positions, one or two
//! extruders), this crate computes which physical slot should supply each
//! requirement.
//!
//! # Overview
//!
//! Two pure components, consumed in sequence:
//!
//! 1. [`inventory::normalize_inventory`] flattens a [`feed::FeedSnapshot`]
//!    into a uniform list of loaded feed slots, resolving global slot ids,
//!    external/high-throughput flags, and extruder ownership.
//! 2. [`mapping::resolve_mapping`] pairs each requirement with a slot from
//!    that inventory, applying tiered matching (spool fingerprint, then
//!    color, then material type) under a hard no-cross-extruder constraint
//!    and no-reuse discipline.
//!
//! Both are side-effect free and recompute from scratch on every call, so
//! the caller can re-run them on every telemetry refresh. Matching is
//! greedy and order-dependent by design: the first requirement in the
//! list gets first pick. This is not a global optimal-assignment solver.
//!
//! # Example
//!
//! ```
//! use traymap::{resolve_mapping, FeedSlot, FeedSnapshot, FeedUnit, FilamentRequirement};
//!
//! let snapshot = FeedSnapshot {
//!     units: vec![FeedUnit::with_slots(
//!         0,
//!         vec![
//!             FeedSlot::loaded(0, "PLA", "#000000"),
//!             FeedSlot::loaded(1, "PETG", "#FF0000"),
//!         ],
//!     )],
//!     ..FeedSnapshot::default()
//! };
//! let job = vec![FilamentRequirement::new("PETG", "#FF0000")];
//!
//! let result = resolve_mapping(&job, Some(&snapshot)).unwrap();
//! assert_eq!(result.slot_ids(), vec![1]);
//! ```

pub mod color;
pub mod feed;
pub mod inventory;
pub mod mapping;

/// Flat identifier naming one slot across all feed units and external
/// positions of a machine.
///
/// Regular four-slot units occupy `unit_id * 4 + slot_index`; external
/// positions hold the fixed ids 254 and 255; single-slot units follow the
/// configurable convention described in [`inventory::HtSlotAddressing`].
pub type GlobalSlotId = u16;

pub use feed::{
    ExternalSlot, ExtruderTopology, FeedSlot, FeedSnapshot, FeedUnit, EXTERNAL_PRIMARY_ID,
    EXTERNAL_SECONDARY_ID, SLOTS_PER_UNIT,
};
pub use inventory::{
    normalize_inventory, normalize_inventory_with, HtSlotAddressing, LoadedFeed,
};
pub use mapping::{
    resolve_against, resolve_mapping, resolve_mapping_with, review_override,
    FilamentRequirement, MappingResult, MappingStats, MatchKind, OverrideIssue, TrayAssignment,
    UNMATCHED_SLOT,
};
