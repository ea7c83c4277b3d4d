// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! The block normalizer (§4.3): clamps overlapping declared lengths and
//! fills gaps with synthetic orphan blocks so the arena tiles
//! `[0, buffer_length)` exactly.

use crate::block::{Block, BlockKind};

/// Sorts `blocks` by offset, clamps each block so it does not overlap its
/// successor (or run past `buffer_length` for the last block), and inserts
/// an orphan block for every gap that remains. The result is in strictly
/// ascending offset order and tiles `[0, buffer_length)`.
pub fn normalize(mut blocks: Vec<Block>, buffer_length: usize) -> Vec<Block> {
    blocks.sort_by_key(|b| b.offset);

    let count = blocks.len();
    for i in 0..count {
        let next_offset = blocks.get(i + 1).map(|b| b.offset).unwrap_or(buffer_length);
        if blocks[i].offset + blocks[i].length > next_offset {
            blocks[i].length = next_offset - blocks[i].offset;
        }
    }

    let mut tiled = Vec::with_capacity(count);
    for i in 0..count {
        let next_offset = blocks.get(i + 1).map(|b| b.offset).unwrap_or(buffer_length);
        let end = blocks[i].end();
        tiled.push(blocks[i]);
        if end < next_offset {
            tiled.push(Block {
                offset: end,
                length: next_offset - end,
                kind: BlockKind::Orphan,
            });
        }
    }

    tiled
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tiling_and_uniqueness_hold_over_a_synthetic_buffer() {
        let blocks = vec![
            Block { offset: 0, length: 4, kind: BlockKind::BusInfo },
            Block { offset: 4, length: 4, kind: BlockKind::RootDirectory },
            Block {
                offset: 8,
                length: 8,
                kind: BlockKind::Leaf { key_id: 0x01, parent_offset: 4 },
            },
        ];
        let tiled = normalize(blocks, 24);

        assert_eq!(tiled[0].offset, 0);
        for i in 0..tiled.len() - 1 {
            assert_eq!(tiled[i].end(), tiled[i + 1].offset);
        }
        assert_eq!(tiled.last().unwrap().end(), 24);

        let mut non_orphan_offsets: Vec<_> = tiled
            .iter()
            .filter(|b| !b.is_orphan())
            .map(|b| b.offset)
            .collect();
        let before = non_orphan_offsets.len();
        non_orphan_offsets.sort_unstable();
        non_orphan_offsets.dedup();
        assert_eq!(non_orphan_offsets.len(), before);
    }

    #[test]
    fn gap_is_filled_with_a_single_orphan() {
        let blocks = vec![
            Block { offset: 0, length: 4, kind: BlockKind::BusInfo },
            Block { offset: 4, length: 4, kind: BlockKind::RootDirectory },
        ];
        let tiled = normalize(blocks, 16);

        assert_eq!(tiled.len(), 3);
        assert!(tiled[2].is_orphan());
        assert_eq!(tiled[2].offset, 8);
        assert_eq!(tiled[2].length, 8);
    }

    #[test]
    fn overlapping_declared_length_is_clamped() {
        let blocks = vec![
            Block { offset: 0, length: 4, kind: BlockKind::BusInfo },
            Block { offset: 4, length: 20, kind: BlockKind::RootDirectory },
            Block {
                offset: 12,
                length: 4,
                kind: BlockKind::Leaf { key_id: 0x01, parent_offset: 4 },
            },
        ];
        let tiled = normalize(blocks, 16);

        let root = tiled
            .iter()
            .find(|b| matches!(b.kind, BlockKind::RootDirectory))
            .unwrap();
        assert_eq!(root.length, 8);
    }
}
