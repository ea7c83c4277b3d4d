// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! The leaf block renderer (§4.6): per-key-id content decoding for textual
//! descriptors, EUI-64, keyword lists and unit-location leaves, with a raw
//! hex fallback for everything else.

use super::{continuation, crc_text, default_key_name, line, rule};
use crate::block::{parse_directory_header, quadlets_of, Block};
use crate::crc::crc16;
use crate::registry;

const KEY_DESCRIPTOR: u8 = 0x01;
const KEY_EUI64: u8 = 0x0d;
const KEY_KEYWORD: u8 = 0x19;
const KEY_UNIT_LOCATION: u8 = 0x15;

pub fn render(
    buffer: &[u8],
    blocks: &[Block],
    block: &Block,
    key_id: u8,
    parent_offset: usize,
) -> Vec<String> {
    let id = registry::accumulate_spec_identifier(buffer, blocks, Some(parent_offset));
    let resolved = registry::resolve(id, crate::block::EntryKeyType::Leaf, key_id);
    let (name, spec_name) = match resolved {
        Some(r) => (r.name.to_string(), r.spec_name),
        None => (default_key_name(key_id), None),
    };
    let title_name = match spec_name {
        Some(spec) => format!("{} {}", spec, name),
        None => name,
    };

    let mut lines = vec![
        format!("{} leaf at 0x{:x}", title_name, super::bias(block.offset)),
        rule(),
    ];

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
        "leaf_length {}, crc {}",
        header.declared_length_quadlets,
        crc_text(header.crc, expected_crc)
    );
    if available.len() < declared_quadlets {
        header_text.push_str(&format!(" (actual length {})", available.len()));
    }
    lines.push(line(block.offset, header_quadlet, &header_text));

    let body_offset = block.offset + 4;
    let content_lines = match key_id {
        KEY_DESCRIPTOR => render_textual_descriptor(body_offset, &available),
        KEY_EUI64 => render_eui64(body_offset, &available),
        KEY_KEYWORD => render_keyword(body_offset, &available),
        KEY_UNIT_LOCATION => render_unit_location(body_offset, &available),
        _ => render_raw(body_offset, &available),
    };
    lines.extend(content_lines);

    lines
}

fn render_raw(mut offset: usize, quadlets: &[u32]) -> Vec<String> {
    quadlets
        .iter()
        .map(|&q| {
            let text = line(offset, q, "");
            offset += 4;
            text
        })
        .collect()
}

/// The descriptor's own type occupies the leading content quadlet, per
/// IEEE 1212's descriptor-leaf layout: `descriptor_type` in the top 8
/// bits, `spec_id` in the low 24 (shift-then-mask, per spec.md §9 open
/// question 3). Only `TEXTUAL_DESCRIPTOR_TYPE` is decoded further; every
/// other type falls back to a raw dump, matching `DescriptorData::Reserved`.
const TEXTUAL_DESCRIPTOR_TYPE: u32 = 0;
const CSR_SPEC_SHIFT: u32 = 0;
const CSR_SPEC_MASK: u32 = 0x00ff_ffff;

/// §4.6 "Textual descriptor leaf".
fn render_textual_descriptor(offset: usize, quadlets: &[u32]) -> Vec<String> {
    let mut lines = Vec::new();
    let leading = match quadlets.first() {
        Some(&q) => q,
        None => return lines,
    };

    let descriptor_type = (leading >> 24) & 0xff;
    let spec_id = (leading >> CSR_SPEC_SHIFT) & CSR_SPEC_MASK;
    lines.push(line(
        offset,
        leading,
        &format!("descriptor_type {}, spec_id 0x{:06x}", descriptor_type, spec_id),
    ));

    if descriptor_type != TEXTUAL_DESCRIPTOR_TYPE {
        lines.extend(render_raw(offset + 4, &quadlets[1..]));
        return lines;
    }

    let mut offset = offset + 4;
    let meta = match quadlets.get(1) {
        Some(&q) => q,
        None => return lines,
    };

    let width = (meta >> 28) & 0xf;
    let character_set = (meta >> 16) & 0x0fff;
    let language = meta & 0xffff;
    let charset_text = if character_set == 0 {
        "minimal ASCII".to_string()
    } else {
        format!("character_set {}", character_set)
    };
    lines.push(line(
        offset,
        meta,
        &format!("width {}, {}, language {}", width, charset_text, language),
    ));
    offset += 4;

    for &q in &quadlets[2..] {
        let bytes = q.to_be_bytes();
        let mut text = String::new();
        for &b in &bytes {
            if b == 0 {
                break;
            }
            text.push(b as char);
        }
        if q == 0 {
            lines.push(continuation(&format!("\"{}\"", text)));
        } else {
            lines.push(line(offset, q, &format!("\"{}\"", text)));
        }
        offset += 4;
    }

    lines
}

/// §4.6 "EUI-64 leaf".
fn render_eui64(mut offset: usize, quadlets: &[u32]) -> Vec<String> {
    let mut lines = Vec::new();
    if quadlets.len() < 2 {
        return render_raw(offset, quadlets);
    }

    let q0 = quadlets[0];
    let q1 = quadlets[1];
    let company_id = (q0 >> 8) & 0x00ff_ffff;
    let device_id = (((q0 & 0xff) as u64) << 32) | q1 as u64;
    let eui64 = ((company_id as u64) << 40) | device_id;

    lines.push(line(offset, q0, &format!("company_id 0x{:06x}", company_id)));
    offset += 4;
    lines.push(line(offset, q1, &format!("EUI-64 {:016x}", eui64)));

    lines
}

/// §4.6 "Keyword leaf": NUL-separated keywords packed up to four per
/// quadlet.
fn render_keyword(mut offset: usize, quadlets: &[u32]) -> Vec<String> {
    let mut lines = Vec::new();
    for &q in quadlets {
        let bytes = q.to_be_bytes();
        let keywords: Vec<String> = bytes
            .split(|&b| b == 0)
            .filter(|chunk| !chunk.is_empty())
            .map(|chunk| chunk.iter().map(|&b| b as char).collect::<String>())
            .collect();
        let quoted = keywords
            .iter()
            .map(|k| format!("\"{}\"", k))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(line(offset, q, &quoted));
        offset += 4;
    }
    lines
}

/// §4.6 "Unit-location leaf": `base_address` (q0:q1), `upper_bound`
/// (q2:q3), each a 64-bit address.
fn render_unit_location(offset: usize, quadlets: &[u32]) -> Vec<String> {
    if quadlets.len() < 4 {
        return render_raw(offset, quadlets);
    }

    let base_address = ((quadlets[0] as u64) << 32) | quadlets[1] as u64;
    let upper_bound = ((quadlets[2] as u64) << 32) | quadlets[3] as u64;

    vec![
        line(offset, quadlets[0], &format!("base_address 0x{:016x} (high)", base_address)),
        line(offset + 4, quadlets[1], "base_address (low)"),
        line(offset + 8, quadlets[2], &format!("upper_bound 0x{:016x} (high)", upper_bound)),
        line(offset + 12, quadlets[3], "upper_bound (low)"),
    ]
}
