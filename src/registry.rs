// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! The specification-aware key formatter registry (§4.5, §6): the closed
//! set of `(specifier_id, version)` pairs this crate recognizes, their key
//! tables, and the spec-identifier accumulation that picks which table
//! governs a given directory entry or leaf.

use crate::block::{directory_entries, Block, BlockKind, DirectoryEntry, EntryKeyType};

/// The 24-bit sentinel the spec uses to mean "unset" for either half of a
/// [`SpecIdentifier`] (stored widened to `u32` for arithmetic convenience).
const UNSET: u32 = 0xffff_ffff;

const KEY_DESCRIPTOR: u8 = 0x01;
const KEY_VENDOR: u8 = 0x03;
const KEY_SPECIFIER_ID: u8 = 0x12;
const KEY_VERSION: u8 = 0x13;

/// The `(specifier_id, version)` pair identifying the industry
/// specification that governs a unit, accumulated per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecIdentifier {
    pub specifier_id: u32,
    pub version: u32,
}

impl SpecIdentifier {
    pub const UNSET: SpecIdentifier = SpecIdentifier {
        specifier_id: UNSET,
        version: UNSET,
    };

    fn is_fully_set(&self) -> bool {
        self.specifier_id != UNSET && self.version != UNSET
    }

    /// Applies a single directory entry's contribution to this identifier,
    /// per §3: the first occurrence of `SPECIFIER_ID` and `VERSION` wins,
    /// and an immediate `VENDOR_INFO` seeds `specifier_id` only as a last
    /// resort (open question 1: the original falls through to this case
    /// without an early exit; only the observable effect — seeding
    /// `specifier_id` when nothing else has — is preserved here).
    pub(crate) fn apply(&mut self, entry: &DirectoryEntry) {
        if !matches!(entry.key_type, EntryKeyType::Immediate) {
            return;
        }
        match entry.key_id {
            KEY_SPECIFIER_ID if self.specifier_id == UNSET => self.specifier_id = entry.value,
            KEY_VERSION if self.version == UNSET => self.version = entry.value,
            KEY_VENDOR if self.specifier_id == UNSET => self.specifier_id = entry.value,
            _ => {}
        }
    }
}

fn find_block<'a>(blocks: &'a [Block], offset: usize) -> Option<&'a Block> {
    blocks.iter().find(|b| b.offset == offset)
}

fn parent_offset_of(block: &Block) -> Option<usize> {
    match block.kind {
        BlockKind::Directory { parent_offset, .. } | BlockKind::Leaf { parent_offset, .. } => {
            Some(parent_offset)
        }
        _ => None,
    }
}

/// Applies every entry of `block` (assumed to be a root-directory or
/// directory block) to `id`, in entry order.
fn apply_directory(buffer: &[u8], block: &Block, id: &mut SpecIdentifier) {
    for entry in directory_entries(block, buffer) {
        id.apply(&entry);
    }
}

/// Accumulates the spec identifier visible to the block whose *parent* is
/// at `start_parent_offset`, by walking upward through the chain of parent
/// directories and taking the first occurrence of `SPECIFIER_ID` and
/// `VERSION` encountered (§3). Pass `None` for a block with no enclosing
/// directory (the root directory itself).
pub fn accumulate_spec_identifier(
    buffer: &[u8],
    blocks: &[Block],
    start_parent_offset: Option<usize>,
) -> SpecIdentifier {
    let mut id = SpecIdentifier::UNSET;
    let mut offset = start_parent_offset;

    while let Some(off) = offset {
        if id.is_fully_set() {
            break;
        }
        let block = match find_block(blocks, off) {
            Some(b) => b,
            None => break,
        };
        apply_directory(buffer, block, &mut id);
        offset = parent_offset_of(block);
    }

    id
}

/// A registered `(key_type, key_id)` binding: a display name, plus whether
/// a dedicated content renderer exists for it (dispatched from
/// `crate::format` by key id, per the tagged-variant design of §9 rather
/// than literal function pointers, since renderer signatures differ across
/// key types).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFormatter {
    pub key_type: EntryKeyType,
    pub key_id: u8,
    pub name: &'static str,
}

impl KeyFormatter {
    const fn new(key_type: EntryKeyType, key_id: u8, name: &'static str) -> Self {
        KeyFormatter { key_type, key_id, name }
    }
}

/// A registered industry specification: its `(specifier_id, version)` pair,
/// display name, and key table.
#[derive(Debug, Clone, Copy)]
pub struct SpecEntry {
    pub specifier_id: u32,
    pub version: u32,
    pub name: &'static str,
    pub table: &'static [KeyFormatter],
}

/// SBP-2 / AV/C-over-SBP-3 unit directory keys beyond the generic CSR set.
static SBP_TABLE: &[KeyFormatter] = &[
    KeyFormatter::new(EntryKeyType::Immediate, 0x38, "command set"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x39, "command set revision"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x3c, "command set spec id"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x3d, "firmware revision"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x14, "logical unit number"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x54, "unit characteristics"),
];

/// IIDC unit directory keys beyond the generic CSR set.
static IIDC_TABLE: &[KeyFormatter] = &[KeyFormatter::new(EntryKeyType::Immediate, 0x38, "command set")];

/// Apple iSight vendor-dependent keys: registered for name resolution only;
/// content always falls through to the generic default (§6: Apple's own
/// sub-format is not public).
static APPLE_TABLE: &[KeyFormatter] = &[];

/// DPP / IICP / Alesis / LaCie HID: registered purely so the spec name
/// resolves; every entry falls through to the generic CSR table for
/// content (§6).
static EMPTY_TABLE: &[KeyFormatter] = &[];

/// The closed registry of recognized `(specifier_id, version)` pairs (§6).
pub static SPEC_REGISTRY: &[SpecEntry] = &[
    SpecEntry { specifier_id: 0x00_005e, version: 0x00_0001, name: "IPv4 over 1394 (RFC 2734)", table: EMPTY_TABLE },
    SpecEntry { specifier_id: 0x00_005e, version: 0x00_0002, name: "IPv6 over 1394 (RFC 3146)", table: EMPTY_TABLE },
    SpecEntry { specifier_id: 0x00_609e, version: 0x01_0483, name: "SBP-2", table: SBP_TABLE },
    SpecEntry { specifier_id: 0x00_609e, version: 0x01_05bb, name: "AV/C over SBP-3", table: SBP_TABLE },
    SpecEntry { specifier_id: 0x00_a02d, version: 0x01_0001, name: "AV/C", table: EMPTY_TABLE },
    SpecEntry { specifier_id: 0x00_a02d, version: 0x01_0002, name: "CAL", table: EMPTY_TABLE },
    SpecEntry { specifier_id: 0x00_a02d, version: 0x01_0004, name: "EHS", table: EMPTY_TABLE },
    SpecEntry { specifier_id: 0x00_a02d, version: 0x01_0008, name: "HAVi", table: EMPTY_TABLE },
    SpecEntry { specifier_id: 0x00_a02d, version: 0x01_4000, name: "Vendor Unique", table: EMPTY_TABLE },
    SpecEntry { specifier_id: 0x00_a02d, version: 0x01_4001, name: "Vendor Unique and AV/C", table: EMPTY_TABLE },
    SpecEntry { specifier_id: 0x00_a02d, version: 0x00_0100, name: "IIDC 1.04", table: IIDC_TABLE },
    SpecEntry { specifier_id: 0x00_a02d, version: 0x00_0101, name: "IIDC 1.20", table: IIDC_TABLE },
    SpecEntry { specifier_id: 0x00_a02d, version: 0x00_0102, name: "IIDC 1.30", table: IIDC_TABLE },
    SpecEntry { specifier_id: 0x00_a02d, version: 0x00_0110, name: "IIDC2", table: IIDC_TABLE },
    SpecEntry { specifier_id: 0x00_a02d, version: 0x0a_6be2, name: "DPP 1.0", table: EMPTY_TABLE },
    SpecEntry { specifier_id: 0x00_a02d, version: 0x4b_661f, name: "IICP 1.0", table: EMPTY_TABLE },
    SpecEntry { specifier_id: 0x00_0595, version: 0x00_0001, name: "Alesis audio", table: EMPTY_TABLE },
    SpecEntry { specifier_id: 0x00_0a27, version: 0x00_0010, name: "Apple iSight audio", table: APPLE_TABLE },
    SpecEntry { specifier_id: 0x00_0a27, version: 0x00_0011, name: "Apple iSight factory", table: APPLE_TABLE },
    SpecEntry { specifier_id: 0x00_0a27, version: 0x00_0012, name: "Apple iSight iris", table: APPLE_TABLE },
    SpecEntry { specifier_id: 0x00_d04b, version: 0x48_4944, name: "LaCie HID", table: EMPTY_TABLE },
];

/// The IEEE 1394 bus key table, used before falling back to the generic
/// CSR table (§4.5 point 3); these keys are bus-dependent and not carried
/// by any individual unit's spec.
static IEEE1394_BUS_TABLE: &[KeyFormatter] = &[
    KeyFormatter::new(EntryKeyType::Immediate, 0x02, "bus dependent info"),
];

/// The generic IEEE 1212 CSR key table (§6), consulted as the final
/// fallback before the per-key-type default of "(unspecified)".
static GENERIC_CSR_TABLE: &[KeyFormatter] = &[
    KeyFormatter::new(EntryKeyType::Leaf, 0x01, "descriptor"),
    KeyFormatter::new(EntryKeyType::Directory, 0x01, "descriptor"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x02, "bus dependent info"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x03, "vendor"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x04, "hardware version"),
    KeyFormatter::new(EntryKeyType::Directory, 0x07, "module"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x0c, "node capabilities"),
    KeyFormatter::new(EntryKeyType::Leaf, 0x0d, "EUI-64"),
    KeyFormatter::new(EntryKeyType::Directory, 0x11, "unit"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x12, "specifier id"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x13, "version"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x14, "dependent info"),
    KeyFormatter::new(EntryKeyType::CsrOffset, 0x14, "dependent info"),
    KeyFormatter::new(EntryKeyType::Leaf, 0x15, "unit location"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x17, "model"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x18, "instance"),
    KeyFormatter::new(EntryKeyType::Leaf, 0x19, "keyword"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x1a, "feature"),
    KeyFormatter::new(EntryKeyType::CsrOffset, 0x1f, "modifiable descriptor"),
    KeyFormatter::new(EntryKeyType::Immediate, 0x20, "directory id"),
];

/// The outcome of resolving a directory entry or leaf's key against the
/// registry (§4.5): a display name plus which table it was found in, so
/// the caller can decide whether to dispatch a spec-specific content
/// renderer.
#[derive(Debug, Clone, Copy)]
pub struct Resolved {
    pub name: &'static str,
    pub spec_name: Option<&'static str>,
}

/// Resolves `(key_type, key_id)` against the lookup order of §4.5: the
/// spec identified by `id` (if registered), then the IEEE 1394 bus table,
/// then the generic CSR table. Returns `None` on a miss in every table
/// (the per-key-type `"(unspecified)"` default is the caller's concern).
pub fn resolve(id: SpecIdentifier, key_type: EntryKeyType, key_id: u8) -> Option<Resolved> {
    if let Some(spec) = SPEC_REGISTRY
        .iter()
        .find(|s| s.specifier_id == id.specifier_id && s.version == id.version)
    {
        if let Some(hit) = spec.table.iter().find(|k| k.key_type == key_type && k.key_id == key_id) {
            return Some(Resolved { name: hit.name, spec_name: Some(spec.name) });
        }
    }

    if let Some(hit) = IEEE1394_BUS_TABLE
        .iter()
        .find(|k| k.key_type == key_type && k.key_id == key_id)
    {
        return Some(Resolved { name: hit.name, spec_name: None });
    }

    if let Some(hit) = GENERIC_CSR_TABLE
        .iter()
        .find(|k| k.key_type == key_type && k.key_id == key_id)
    {
        return Some(Resolved { name: hit.name, spec_name: None });
    }

    None
}

/// Looks up a registered spec's display name by identifier, independent of
/// any particular key (used to label a directory block's own title).
pub fn spec_name(id: SpecIdentifier) -> Option<&'static str> {
    SPEC_REGISTRY
        .iter()
        .find(|s| s.specifier_id == id.specifier_id && s.version == id.version)
        .map(|s| s.name)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_registered_spec_resolves_its_own_name() {
        for spec in SPEC_REGISTRY {
            let id = SpecIdentifier { specifier_id: spec.specifier_id, version: spec.version };
            assert_eq!(spec_name(id), Some(spec.name));
        }
    }

    #[test]
    fn unregistered_pair_falls_through_to_generic_csr() {
        let id = SpecIdentifier { specifier_id: 0x00_1234, version: 0x00_0001 };
        assert!(spec_name(id).is_none());
        let resolved = resolve(id, EntryKeyType::Immediate, KEY_SPECIFIER_ID).unwrap();
        assert_eq!(resolved.name, "specifier id");
        assert!(resolved.spec_name.is_none());
    }

    #[test]
    fn sbp2_logical_unit_number_resolves_under_its_spec_name() {
        let id = SpecIdentifier { specifier_id: 0x00_609e, version: 0x01_0483 };
        let resolved = resolve(id, EntryKeyType::Immediate, 0x14).unwrap();
        assert_eq!(resolved.name, "logical unit number");
        assert_eq!(resolved.spec_name, Some("SBP-2"));
    }

    #[test]
    fn vendor_info_seeds_specifier_id_only_as_last_resort() {
        let mut id = SpecIdentifier::UNSET;
        let vendor = DirectoryEntry { key_type: EntryKeyType::Immediate, key_id: KEY_VENDOR, value: 0x00_609e };
        id.apply(&vendor);
        assert_eq!(id.specifier_id, 0x00_609e);
        assert_eq!(id.version, UNSET);

        // A later explicit SPECIFIER_ID must not override the seeded value.
        let specifier = DirectoryEntry { key_type: EntryKeyType::Immediate, key_id: KEY_SPECIFIER_ID, value: 0x00_1111 };
        id.apply(&specifier);
        assert_eq!(id.specifier_id, 0x00_609e);
    }

    #[test]
    fn descriptor_key_is_registered_for_both_leaf_and_directory() {
        let id = SpecIdentifier::UNSET;
        assert!(resolve(id, EntryKeyType::Leaf, KEY_DESCRIPTOR).is_some());
        assert!(resolve(id, EntryKeyType::Directory, KEY_DESCRIPTOR).is_some());
    }
}
