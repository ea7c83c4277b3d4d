// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! The orphan-block renderer (§4.6): gap-filler blocks synthesized by
//! normalization carry no header and no key context, so every quadlet is
//! printed raw.

use super::{line, rule};
use crate::block::{quadlets_of, Block};

pub fn render(buffer: &[u8], block: &Block) -> Vec<String> {
    let mut lines = vec!["Unreferenced data".to_string(), rule()];

    let mut offset = block.offset;
    for quadlet in quadlets_of(block.content(buffer)) {
        lines.push(line(offset, quadlet, "(unreferenced data)"));
        offset += 4;
    }

    lines
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::BlockKind;

    fn q(v: u32) -> [u8; 4] {
        v.to_ne_bytes()
    }

    #[test]
    fn renders_one_line_per_quadlet_tagged_unreferenced() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&q(0x1111_1111));
        buf.extend_from_slice(&q(0x2222_2222));

        let block = Block {
            offset: 0,
            length: 8,
            kind: BlockKind::Orphan,
        };
        let lines = render(&buf, &block);

        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("(unreferenced data)"));
        assert!(lines[3].contains("(unreferenced data)"));
    }

    #[test]
    fn empty_block_renders_only_title_and_rule() {
        let buf = Vec::new();
        let block = Block {
            offset: 0,
            length: 0,
            kind: BlockKind::Orphan,
        };
        let lines = render(&buf, &block);
        assert_eq!(lines.len(), 2);
    }
}
