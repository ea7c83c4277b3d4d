// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! The bus-info block renderer (§4.6).

use super::{crc_text, line, rule};
use crate::block::{parse_bus_info_header, quadlets_of, read_quadlet, Block};
use crate::crc::crc16;

const BUS_NAME_1394: u32 = 0x3133_3934;

pub fn render(buffer: &[u8], block: &Block) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push("Bus information block".to_string());
    lines.push(rule());

    let header_quadlet = match read_quadlet(buffer, block.offset) {
        Some(q) => q,
        None => return lines,
    };
    let header = parse_bus_info_header(header_quadlet);

    let content = block.content(buffer);
    let available_quadlets: Vec<u32> = quadlets_of(content).collect();

    let crc_span = header.crc_length_quadlets as usize;
    let (crc_quadlets, crc_note): (&[u32], Option<String>) = if crc_span <= available_quadlets.len() {
        (&available_quadlets[..crc_span], None)
    } else {
        (
            &available_quadlets[..],
            Some(format!("up to {}", available_quadlets.len())),
        )
    };
    let expected_crc = crc16(crc_quadlets);

    let header_text = match crc_note {
        Some(ref note) => format!(
            "bus_info_length {}, crc_length {}, crc {} ({})",
            header.declared_length_quadlets,
            header.crc_length_quadlets,
            crc_text(header.crc, expected_crc),
            note
        ),
        None => format!(
            "bus_info_length {}, crc_length {}, crc {}",
            header.declared_length_quadlets,
            header.crc_length_quadlets,
            crc_text(header.crc, expected_crc)
        ),
    };
    lines.push(line(block.offset, header_quadlet, &header_text));

    let mut quadlet_offset = block.offset + 4;
    let mut iter = available_quadlets.iter().copied();

    let bus_name_quadlet = iter.next();
    if let Some(q) = bus_name_quadlet {
        let name = if q == BUS_NAME_1394 { "1394" } else { "unspecified" };
        lines.push(line(quadlet_offset, q, &format!("bus_name \"{}\"", name)));
        quadlet_offset += 4;
    }

    let is_1394 = bus_name_quadlet == Some(BUS_NAME_1394);
    if let Some(q) = iter.next() {
        if is_1394 {
            for text in decode_capabilities(q) {
                lines.push(line(quadlet_offset, q, &text));
            }
        } else {
            lines.push(line(quadlet_offset, q, "capabilities (unspecified bus)"));
        }
        quadlet_offset += 4;
    }

    if let Some(company_quadlet) = iter.next() {
        let company_id = (company_quadlet >> 8) & 0x00ff_ffff;
        lines.push(line(
            quadlet_offset,
            company_quadlet,
            &format!("company_id 0x{:06x}", company_id),
        ));
        quadlet_offset += 4;

        if let Some(device_quadlet) = iter.next() {
            let device_id = (((company_quadlet & 0xff) as u64) << 32) | device_quadlet as u64;
            let eui64 = ((company_id as u64) << 40) | device_id;
            lines.push(line(
                quadlet_offset,
                device_quadlet,
                &format!("EUI-64 {:016x}", eui64),
            ));
            quadlet_offset += 4;
        }
    }

    for q in iter {
        lines.push(line(quadlet_offset, q, "(trailing data)"));
        quadlet_offset += 4;
    }

    lines
}

/// Decodes the bus-dependent capability quadlet for the IEEE 1394 bus
/// (§4.6 "IEEE 1394 bus-dependent capability decoding"). Returns one or two
/// lines depending on whether the generation nibble is non-zero.
fn decode_capabilities(quadlet: u32) -> Vec<String> {
    let irm_capable = (quadlet >> 31) & 0x1 != 0;
    let cm_capable = (quadlet >> 30) & 0x1 != 0;
    let is_capable = (quadlet >> 29) & 0x1 != 0;
    let bm_capable = (quadlet >> 28) & 0x1 != 0;
    let pm_capable = (quadlet >> 27) & 0x1 != 0;
    let cyc_clk_acc = (quadlet >> 16) & 0xff;
    let max_rec = (quadlet >> 12) & 0xf;
    let max_rom = (quadlet >> 8) & 0x3;
    let generation = (quadlet >> 4) & 0xf;
    let spd = quadlet & 0x7;

    let mut first = format!(
        "irm {}, cm {}, is {}, bm {}, cyc_clk_acc {}, max_rec {} ({})",
        irm_capable as u8,
        cm_capable as u8,
        is_capable as u8,
        bm_capable as u8,
        cyc_clk_acc,
        max_rec,
        1u32 << (max_rec + 1)
    );

    if generation == 0 {
        first.push_str(&format!(", spd {} (S{}00)", spd, 1u32 << spd));
        return vec![first];
    }

    first.push_str(&format!(", pm {}", pm_capable as u8));

    let second = format!(
        "max_rom {}, generation {}, spd {} (S{}00)",
        max_rom,
        generation,
        spd,
        1u32 << spd
    );

    vec![first, second]
}

#[cfg(test)]
mod test {
    use super::*;

    fn q(v: u32) -> [u8; 4] {
        v.to_ne_bytes()
    }

    #[test]
    fn renders_header_and_bus_name_for_minimal_rom() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&q(0x0404_0400));
        buf.extend_from_slice(&q(BUS_NAME_1394));
        buf.extend_from_slice(&q(0x0064_dc00));
        buf.extend_from_slice(&q(0x0800_278b));
        buf.extend_from_slice(&q(0x0000_0001));

        let block = Block {
            offset: 0,
            length: 20,
            kind: crate::block::BlockKind::BusInfo,
        };
        let lines = render(&buf, &block);

        assert!(lines[2].contains("bus_info_length 4, crc_length 4, crc"));
        assert!(lines.iter().any(|l| l.contains("bus_name \"1394\"")));
        assert!(lines.iter().any(|l| l.contains("EUI-64")));
    }

    #[test]
    fn unrecognized_bus_name_falls_back_to_unspecified() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&q(0x0000_0400));
        buf.extend_from_slice(&q(0xdead_beef));

        let block = Block {
            offset: 0,
            length: 8,
            kind: crate::block::BlockKind::BusInfo,
        };
        let lines = render(&buf, &block);
        assert!(lines.iter().any(|l| l.contains("bus_name \"unspecified\"")));
    }

    #[test]
    fn generation_zero_decodes_base_capabilities_only() {
        let lines = decode_capabilities(0x0000_0000);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn nonzero_generation_decodes_extended_capabilities() {
        let lines = decode_capabilities(0x0000_0010);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("generation 1"));
    }
}
