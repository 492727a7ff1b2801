//! **Z80** snapshot reader.
//!
//! See the format reference on [World of Spectrum](https://worldofspectrum.org/faq/reference/z80format.htm).
//!
//! * Version 1: 30-byte header followed by 48K of RAM, optionally run-length
//!   compressed and terminated by `00 ED ED 00`.
//! * Versions 2 and 3: PC in the v1 header is zero and an extended header
//!   (23 bytes for v2, 54 or 55 for v3) follows, then one block per 16K page.
//!
//! Only reading is supported; the crate never produces `.z80` files.

use crate::snapshot::{Machine, Registers, Snapshot, PAGE_SIZE};
use crate::{Error, Result};
use tracing::debug;

/// Size of the version 1 header.
pub const V1_HEADER_SIZE: usize = 30;

const V2_EXT_LEN: usize = 23;
const V3_EXT_LEN: usize = 54;
const V3_EXT_LEN_LONG: usize = 55;

/// Marker ending compressed version 1 data.
const V1_END_MARKER: [u8; 4] = [0x00, 0xED, 0xED, 0x00];

/// Block length meaning "16K, stored uncompressed".
const UNCOMPRESSED_BLOCK: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Version {
    V2,
    V3,
}

/// Parse a Z80 snapshot
pub fn read(data: &[u8]) -> Result<Snapshot> {
    if data.len() < V1_HEADER_SIZE {
        return Err(Error::Snapshot(format!(
            "Z80 header needs {V1_HEADER_SIZE} bytes, got {}",
            data.len()
        )));
    }

    let mut registers = read_registers(data);
    if registers.pc != 0 {
        return read_v1(data, registers);
    }

    if data.len() < V1_HEADER_SIZE + 2 {
        return Err(Error::Snapshot("Z80 extended header is missing".to_string()));
    }
    let ext_len = usize::from(u16::from_le_bytes([data[30], data[31]]));
    let version = match ext_len {
        V2_EXT_LEN => Version::V2,
        V3_EXT_LEN | V3_EXT_LEN_LONG => Version::V3,
        n => {
            return Err(Error::UnsupportedSnapshot(format!(
                "Z80 extended header length {n}"
            )))
        }
    };

    let body = V1_HEADER_SIZE + 2 + ext_len;
    if data.len() < body {
        return Err(Error::Snapshot("Z80 extended header is truncated".to_string()));
    }

    registers.pc = u16::from_le_bytes([data[32], data[33]]);
    let machine = machine_for(version, data[34], data[37] & 0x80 != 0)?;

    let mut snap = Snapshot::new(machine);
    snap.registers = registers;
    if machine.has_128k_paging() {
        snap.paging = data[35];
        for bank in 0..bank_count(machine) {
            snap.set_page(bank, vec![0; PAGE_SIZE]);
        }
    } else {
        for bank in [5, 2, 0] {
            snap.set_page(bank, vec![0; PAGE_SIZE]);
        }
    }

    let mut pos = body;
    while pos < data.len() {
        if pos + 3 > data.len() {
            return Err(Error::Snapshot("Z80 page header is truncated".to_string()));
        }
        let len = u16::from_le_bytes([data[pos], data[pos + 1]]);
        let page = data[pos + 2];
        pos += 3;

        let (block, consumed) = if len == UNCOMPRESSED_BLOCK {
            let raw = data
                .get(pos..pos + PAGE_SIZE)
                .ok_or_else(|| Error::Snapshot(format!("Z80 page {page} is truncated")))?;
            (raw.to_vec(), PAGE_SIZE)
        } else {
            let len = usize::from(len);
            let packed = data
                .get(pos..pos + len)
                .ok_or_else(|| Error::Snapshot(format!("Z80 page {page} is truncated")))?;
            (decompress(packed, PAGE_SIZE)?, len)
        };
        pos += consumed;

        match bank_for_page(machine, page) {
            Some(bank) => snap.set_page(bank, block),
            None => debug!("Skipping Z80 page {} for {}", page, machine),
        }
    }

    Ok(snap)
}

fn read_registers(data: &[u8]) -> Registers {
    // Compatibility: 0xFF in byte 12 means 1
    let flags = if data[12] == 0xFF { 1 } else { data[12] };
    let word = |at: usize| u16::from_le_bytes([data[at], data[at + 1]]);

    Registers {
        a: data[0],
        f: data[1],
        bc: word(2),
        hl: word(4),
        pc: word(6),
        sp: word(8),
        i: data[10],
        r: (data[11] & 0x7F) | ((flags & 0x01) << 7),
        border: (flags >> 1) & 0x07,
        de: word(13),
        bc_alt: word(15),
        de_alt: word(17),
        hl_alt: word(19),
        a_alt: data[21],
        f_alt: data[22],
        iy: word(23),
        ix: word(25),
        iff1: data[27] != 0,
        iff2: data[28] != 0,
        im: data[29] & 0x03,
    }
}

fn read_v1(data: &[u8], registers: Registers) -> Result<Snapshot> {
    let flags = if data[12] == 0xFF { 1 } else { data[12] };
    let body = &data[V1_HEADER_SIZE..];

    let ram = if flags & 0x20 != 0 {
        let end = body
            .windows(V1_END_MARKER.len())
            .position(|w| w == V1_END_MARKER)
            .unwrap_or(body.len());
        decompress(&body[..end], 3 * PAGE_SIZE)?
    } else if body.len() >= 3 * PAGE_SIZE {
        body[..3 * PAGE_SIZE].to_vec()
    } else {
        return Err(Error::Snapshot(format!(
            "Z80 v1 RAM needs {} bytes, got {}",
            3 * PAGE_SIZE,
            body.len()
        )));
    };

    let mut snap = Snapshot::new(Machine::Spectrum48);
    snap.registers = registers;
    snap.set_page(5, ram[..PAGE_SIZE].to_vec());
    snap.set_page(2, ram[PAGE_SIZE..2 * PAGE_SIZE].to_vec());
    snap.set_page(0, ram[2 * PAGE_SIZE..].to_vec());
    Ok(snap)
}

/// Expand `ED ED nn bb` runs into exactly `expected` bytes
fn decompress(packed: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    let mut i = 0;

    while i < packed.len() {
        if packed[i] == 0xED && packed.get(i + 1) == Some(&0xED) {
            let (count, value) = match (packed.get(i + 2), packed.get(i + 3)) {
                (Some(&count), Some(&value)) => (count, value),
                _ => return Err(Error::Snapshot("Z80 run is truncated".to_string())),
            };
            out.extend(std::iter::repeat(value).take(usize::from(count)));
            i += 4;
        } else {
            out.push(packed[i]);
            i += 1;
        }

        if out.len() > expected {
            break;
        }
    }

    if out.len() != expected {
        return Err(Error::Snapshot(format!(
            "Z80 block expands to {} bytes, expected {expected}",
            out.len()
        )));
    }
    Ok(out)
}

fn machine_for(version: Version, mode: u8, modified: bool) -> Result<Machine> {
    let machine = match (version, mode) {
        (_, 0 | 1) => Machine::Spectrum48,
        (Version::V3, 3) => Machine::Spectrum48,
        (Version::V2, 3 | 4) => Machine::Spectrum128,
        (Version::V3, 4..=6) => Machine::Spectrum128,
        (_, 7 | 8) => Machine::Plus3,
        (_, 9) => Machine::Pentagon,
        (_, 10) => Machine::Scorpion,
        (_, 12) => Machine::Plus2,
        (_, 13) => Machine::Plus2A,
        (_, 14) => Machine::Tc2048,
        (_, 15) => Machine::Tc2068,
        (_, 128) => Machine::Ts2068,
        (_, n) => {
            return Err(Error::UnsupportedSnapshot(format!(
                "Z80 hardware mode {n}"
            )))
        }
    };

    Ok(match (machine, modified) {
        (Machine::Spectrum48, true) => Machine::Spectrum16,
        (Machine::Spectrum128, true) => Machine::Plus2,
        (Machine::Plus3, true) => Machine::Plus2A,
        (machine, _) => machine,
    })
}

fn bank_count(machine: Machine) -> u8 {
    match machine {
        Machine::Scorpion => 16,
        m if m.has_128k_paging() => 8,
        _ => 0,
    }
}

fn bank_for_page(machine: Machine, page: u8) -> Option<u8> {
    if machine.has_128k_paging() {
        let bank = page.checked_sub(3)?;
        (bank < bank_count(machine)).then_some(bank)
    } else {
        match page {
            8 => Some(5),
            4 => Some(2),
            5 => Some(0),
            _ => None,
        }
    }
}
