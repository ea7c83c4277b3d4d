// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

use config_rom_pretty_printer::render_config_rom;
use std::io::{IsTerminal, Read};

const MAX_ROM_LEN: usize = 1024;

fn main() {
    let code = read_buffer()
        .map(|mut buffer| {
            match render_config_rom(&mut buffer) {
                Ok(groups) => {
                    let mut first = true;
                    for group in groups {
                        if !first {
                            println!();
                        }
                        first = false;
                        for line in group {
                            println!("{}", line);
                        }
                    }
                    0
                }
                Err(e) => {
                    eprintln!("{}", e);
                    1
                }
            }
        })
        .unwrap_or_else(|msg| {
            eprintln!("{}", msg);
            print_help();
            1
        });

    std::process::exit(code);
}

/// Reads up to [`MAX_ROM_LEN`] bytes from standard input (§6). An
/// interactive terminal or an empty stream is a fatal condition.
fn read_buffer() -> Result<Vec<u8>, String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err("Standard input is a terminal; a Configuration ROM image is required.".to_string());
    }

    let mut raw = Vec::new();
    stdin
        .lock()
        .take(MAX_ROM_LEN as u64)
        .read_to_end(&mut raw)
        .map_err(|e| e.to_string())?;

    if raw.is_empty() {
        return Err("Nothing available via standard input.".to_string());
    }

    Ok(raw)
}

fn print_help() {
    print!(
        r###"
Usage:
  config-rom-pretty-printer < IMAGE

  where IMAGE is up to 1024 bytes of a Configuration ROM dump, in
  either host byte order or big-endian, read from standard input.
"###
    );
}
