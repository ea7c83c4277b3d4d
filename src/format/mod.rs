// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Block renderers (§4.6) and the shared line layout they use. Each
//! submodule owns one block variant's rendering; [`render`] dispatches
//! across the whole arena in offset order.

pub mod bus_info;
pub mod directory;
pub mod leaf;
pub mod orphan;

use crate::block::{Block, BlockKind, EntryKeyType, CONFIG_ROM_BASE};
use crate::registry;

const PREFIX_WIDTH: usize = 15;
const MAX_LINE_WIDTH: usize = 100;
const RULE_WIDTH: usize = 65;

fn bias(offset: usize) -> usize {
    offset + CONFIG_ROM_BASE
}

fn clamp_width(mut s: String) -> String {
    if s.len() > MAX_LINE_WIDTH {
        s.truncate(MAX_LINE_WIDTH);
    }
    s
}

/// A horizontal rule separating a block's title from its content.
pub fn rule() -> String {
    "-".repeat(RULE_WIDTH)
}

/// A content line: the canonical 15-character `"%3lx  %08x  "` prefix (§4.6
/// "Line layout") followed by `text`, clamped to the maximum line width.
pub fn line(offset: usize, quadlet: u32, text: &str) -> String {
    clamp_width(format!("{:3x}  {:08x}  {}", bias(offset), quadlet, text))
}

/// A continuation line: blank space of the same width as the content-line
/// prefix, followed by `text`.
pub fn continuation(text: &str) -> String {
    clamp_width(format!("{:width$}{}", "", text, width = PREFIX_WIDTH))
}

/// The per-key-type default rendering for a key with no registry hit
/// (§4.5 point 4).
pub fn default_key_name(key_id: u8) -> String {
    format!("(unspecified key 0x{:02x})", key_id)
}

/// Renders a block's stored CRC next to the value actually computed over
/// its content, annotating a mismatch per §4.4/§7.
pub fn crc_text(actual: u16, expected: u16) -> String {
    if actual == expected {
        format!("{}", actual)
    } else {
        format!("{} (should be {})", actual, expected)
    }
}

/// Renders every block of a normalized arena, one line group per block, in
/// offset order. The caller inserts the blank-line separator between
/// groups required by §6.
pub fn render(buffer: &[u8], blocks: &[Block]) -> Vec<Vec<String>> {
    blocks.iter().map(|block| render_block(buffer, blocks, block)).collect()
}

fn render_block(buffer: &[u8], blocks: &[Block], block: &Block) -> Vec<String> {
    match block.kind {
        BlockKind::BusInfo => bus_info::render(buffer, block),
        BlockKind::RootDirectory => {
            directory::render(buffer, blocks, block, "Root directory".to_string(), None)
        }
        BlockKind::Directory { key_id, parent_offset } => {
            let id = registry::accumulate_spec_identifier(buffer, blocks, Some(parent_offset));
            let resolved = registry::resolve(id, EntryKeyType::Directory, key_id);
            let title = match resolved {
                Some(r) => match r.spec_name {
                    Some(spec) => format!("{} {} directory", spec, r.name),
                    None => format!("{} directory", r.name),
                },
                None => format!("{} directory", default_key_name(key_id)),
            };
            directory::render(buffer, blocks, block, title, Some(id))
        }
        BlockKind::Leaf { key_id, parent_offset } => {
            leaf::render(buffer, blocks, block, key_id, parent_offset)
        }
        BlockKind::Orphan => orphan::render(buffer, block),
    }
}
