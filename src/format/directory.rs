// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! The root-directory and directory block renderer (§4.6): both share the
//! same entry-dispatch logic, differing only in their title line and in
//! where the spec identifier they seed entry rendering with comes from.

use super::{crc_text, default_key_name, line, rule};
use crate::block::{
    parse_directory_header, quadlets_of, Block, DirectoryEntry, EntryKeyType,
};
use crate::crc::crc16;
use crate::registry::{self, SpecIdentifier};

const CSR_BASE: u64 = 0xffff_f000_0000;

pub fn render(
    buffer: &[u8],
    blocks: &[Block],
    block: &Block,
    title: String,
    seed: Option<SpecIdentifier>,
) -> Vec<String> {
    let mut lines = vec![title, rule()];

    let header_quadlet = match block.header_quadlet(buffer) {
        Some(q) => q,
        None => return lines,
    };
    let header = parse_directory_header(header_quadlet);
    let declared_quadlets = header.declared_length_quadlets as usize;
    let available: Vec<u32> = quadlets_of(block.content(buffer)).collect();

    let crc_span = declared_quadlets.min(available.len());
    let expected_crc = crc16(&available[..crc_span]);

    let mut header_text = format!(
        "directory_length {}, crc {}",
        header.declared_length_quadlets,
        crc_text(header.crc, expected_crc)
    );
    if available.len() < declared_quadlets {
        header_text.push_str(&format!(" (actual length {})", available.len()));
    }
    lines.push(line(block.offset, header_quadlet, &header_text));

    let mut id = seed.unwrap_or(SpecIdentifier::UNSET);
    let mut entry_offset = block.offset + 4;

    for quadlet in available {
        let entry = DirectoryEntry::parse(quadlet);
        let text = render_entry(blocks, buffer, entry_offset, &entry, id);
        lines.push(line(entry_offset, quadlet, &text));
        id.apply(&entry);
        entry_offset += 4;
    }

    lines
}

fn resolved_name(id: SpecIdentifier, key_type: EntryKeyType, key_id: u8) -> (String, Option<&'static str>) {
    match registry::resolve(id, key_type, key_id) {
        Some(r) => {
            let name = match r.spec_name {
                Some(spec) => format!("{} {}", spec, r.name),
                None => r.name.to_string(),
            };
            (name, r.spec_name)
        }
        None => (default_key_name(key_id), None),
    }
}

fn render_entry(
    _blocks: &[Block],
    _buffer: &[u8],
    entry_offset: usize,
    entry: &DirectoryEntry,
    id: SpecIdentifier,
) -> String {
    match entry.key_type {
        EntryKeyType::Immediate => render_immediate(entry.key_id, entry.value, id),
        EntryKeyType::CsrOffset => {
            let addr = CSR_BASE + 4 * entry.value as u64;
            let (name, _) = resolved_name(id, EntryKeyType::CsrOffset, entry.key_id);
            format!("--> {} at 0x{:012x}", name, addr)
        }
        EntryKeyType::Leaf => {
            let block_offset = entry_offset + 4 * entry.value as usize;
            let (name, _) = resolved_name(id, EntryKeyType::Leaf, entry.key_id);
            format!("--> {} leaf at 0x{:x}", name, super::bias(block_offset))
        }
        EntryKeyType::Directory => {
            let block_offset = entry_offset + 4 * entry.value as usize;
            let (name, _) = resolved_name(id, EntryKeyType::Directory, entry.key_id);
            format!("--> {} directory at 0x{:x}", name, super::bias(block_offset))
        }
    }
}

const SBP_SPEC_NAMES: [&str; 2] = ["SBP-2", "AV/C over SBP-3"];

fn render_immediate(key_id: u8, value: u32, id: SpecIdentifier) -> String {
    match registry::resolve(id, EntryKeyType::Immediate, key_id) {
        Some(r) if key_id == 0x14 && r.spec_name.map_or(false, |s| SBP_SPEC_NAMES.contains(&s)) => {
            sbp2_logical_unit_number(value, r.spec_name.unwrap())
        }
        Some(r) => {
            let prefix = r.spec_name.map(|s| format!("{} ", s)).unwrap_or_default();
            format!("{}{}: 0x{:06x}", prefix, r.name, value)
        }
        None => format!("{}: 0x{:06x}", default_key_name(key_id), value),
    }
}

/// SBP-2 `LOGICAL_UNIT_NUMBER` immediate (§6 of SPEC_FULL.md): `ordered`
/// bit 14, device type bits 12..8, `lun` bits 15..0.
fn sbp2_logical_unit_number(value: u32, spec_name: &str) -> String {
    let ordered = (value >> 14) & 0x1;
    let device_type = (value >> 8) & 0x1f;
    let lun = value & 0xffff;
    let type_name = match device_type {
        0x00 => "Disk",
        0x01 => "Tape",
        0x05 => "CD-ROM",
        0x07 => "Optical memory",
        0x0e => "Reduced block command (RBC) direct access",
        _ => "(unspecified type)",
    };
    format!(
        "{} logical unit number: ordered {}, type {}, lun {}",
        spec_name, ordered, type_name, lun
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::BlockKind;

    fn q(v: u32) -> [u8; 4] {
        v.to_ne_bytes()
    }

    #[test]
    fn sbp2_logical_unit_number_matches_expected_wording() {
        let text = sbp2_logical_unit_number(0x0000_0000, "SBP-2");
        assert_eq!(text, "SBP-2 logical unit number: ordered 0, type Disk, lun 0");
    }

    #[test]
    fn root_directory_with_specifier_id_and_version_resolves_unit_entries() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&q(0x0000_0000)); // bus info (unused by this test)
        // unit directory body: header already consumed by caller; here we
        // build the directory content directly.
        buf.extend_from_slice(&q(0x0003_0000)); // directory header: 3 quadlets
        buf.extend_from_slice(&q((0b00 << 30) | (0x12 << 24) | 0x00_609e)); // SPECIFIER_ID
        buf.extend_from_slice(&q((0b00 << 30) | (0x13 << 24) | 0x01_0483)); // VERSION
        buf.extend_from_slice(&q((0b00 << 30) | (0x14 << 24) | 0x00_0000)); // LOGICAL_UNIT_NUMBER

        let block = Block {
            offset: 4,
            length: 16,
            kind: BlockKind::Directory { key_id: 0x11, parent_offset: 0 },
        };
        let blocks = vec![block];
        let lines = render(&buf, &blocks, &block, "unit directory".to_string(), None);

        assert!(lines.iter().any(|l| l.contains("SBP-2 logical unit number: ordered 0, type Disk")));
    }
}
