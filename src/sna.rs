//! SNA snapshot reader and writer for 48K and 128K Spectrum.
//!
//! **48K format** (49,179 bytes): 27-byte header + 49,152 bytes of RAM.
//! PC is stored on the stack, so it is popped on read and pushed back on
//! write; the RAM bytes under the stack are kept, which makes a read/write
//! cycle byte-identical.
//!
//! **128K format** (131,103 or 147,487 bytes): 27-byte header + banks 5, 2
//! and the paged bank + 4-byte extension (PC, port `0x7FFD`, TR-DOS flag) +
//! the remaining banks in ascending order. When bank 2 or 5 is paged in it
//! appears twice and six banks follow instead of five.

use crate::snapshot::{Machine, Registers, Snapshot, PAGE_SIZE};
use crate::{Error, Result};

/// Header size in bytes.
const HEADER_SIZE: usize = 27;

/// RAM dump size (48K from `0x4000`-`0xFFFF`).
const RAM_SIZE: usize = 3 * PAGE_SIZE;

/// 128K extension size.
const EXT_SIZE: usize = 4;

/// Expected size of a 48K SNA snapshot file.
pub const SNA_48K_SIZE: usize = HEADER_SIZE + RAM_SIZE;

/// 128K snapshot with a bank other than 2 or 5 paged in.
pub const SNA_128K_SIZE: usize = SNA_48K_SIZE + EXT_SIZE + 5 * PAGE_SIZE;

/// 128K snapshot with bank 2 or 5 paged in.
pub const SNA_128K_DUP_SIZE: usize = SNA_48K_SIZE + EXT_SIZE + 6 * PAGE_SIZE;

/// Whether a length matches one of the SNA layouts
pub fn is_sna_size(len: usize) -> bool {
    matches!(len, SNA_48K_SIZE | SNA_128K_SIZE | SNA_128K_DUP_SIZE)
}

/// Parse an SNA snapshot
pub fn read(data: &[u8]) -> Result<Snapshot> {
    match data.len() {
        SNA_48K_SIZE => read_48k(data),
        SNA_128K_SIZE | SNA_128K_DUP_SIZE => read_128k(data),
        n => Err(Error::Snapshot(format!(
            "SNA file must be {SNA_48K_SIZE} (48K) or {SNA_128K_SIZE}/{SNA_128K_DUP_SIZE} (128K) bytes, got {n}"
        ))),
    }
}

/// Encode a snapshot as SNA, 128K layout for machines with paging
pub fn write(snap: &Snapshot) -> Result<Vec<u8>> {
    if snap.machine.has_128k_paging() {
        write_128k(snap)
    } else {
        write_48k(snap)
    }
}

fn le16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn read_header(data: &[u8]) -> Registers {
    let iff2 = data[19] & 0x04 != 0;
    Registers {
        i: data[0],
        hl_alt: le16(data, 1),
        de_alt: le16(data, 3),
        bc_alt: le16(data, 5),
        f_alt: data[7],
        a_alt: data[8],
        hl: le16(data, 9),
        de: le16(data, 11),
        bc: le16(data, 13),
        iy: le16(data, 15),
        ix: le16(data, 17),
        iff1: iff2,
        iff2,
        r: data[20],
        f: data[21],
        a: data[22],
        sp: le16(data, 23),
        im: data[25],
        border: data[26],
        pc: 0,
    }
}

fn write_header(regs: &Registers, sp: u16, out: &mut Vec<u8>) {
    out.push(regs.i);
    out.extend_from_slice(&regs.hl_alt.to_le_bytes());
    out.extend_from_slice(&regs.de_alt.to_le_bytes());
    out.extend_from_slice(&regs.bc_alt.to_le_bytes());
    out.push(regs.f_alt);
    out.push(regs.a_alt);
    out.extend_from_slice(&regs.hl.to_le_bytes());
    out.extend_from_slice(&regs.de.to_le_bytes());
    out.extend_from_slice(&regs.bc.to_le_bytes());
    out.extend_from_slice(&regs.iy.to_le_bytes());
    out.extend_from_slice(&regs.ix.to_le_bytes());
    out.push(if regs.iff2 { 0x04 } else { 0x00 });
    out.push(regs.r);
    out.push(regs.f);
    out.push(regs.a);
    out.extend_from_slice(&sp.to_le_bytes());
    out.push(regs.im);
    out.push(regs.border);
}

fn read_48k(data: &[u8]) -> Result<Snapshot> {
    let mut snap = Snapshot::new(Machine::Spectrum48);
    snap.registers = read_header(data);

    let ram = &data[HEADER_SIZE..HEADER_SIZE + RAM_SIZE];
    snap.set_page(5, ram[..PAGE_SIZE].to_vec());
    snap.set_page(2, ram[PAGE_SIZE..2 * PAGE_SIZE].to_vec());
    snap.set_page(0, ram[2 * PAGE_SIZE..].to_vec());

    let sp = snap.registers.sp;
    if sp < 0x4000 || sp == 0xFFFF {
        return Err(Error::Snapshot(format!(
            "stack pointer ${sp:04X} does not point into RAM, cannot pop PC"
        )));
    }
    let lo = snap.read_byte(sp).unwrap_or(0);
    let hi = snap.read_byte(sp.wrapping_add(1)).unwrap_or(0);
    snap.registers.pc = u16::from_le_bytes([lo, hi]);
    snap.registers.sp = sp.wrapping_add(2);

    Ok(snap)
}

fn read_128k(data: &[u8]) -> Result<Snapshot> {
    let mut snap = Snapshot::new(Machine::Spectrum128);
    snap.registers = read_header(data);

    let ext = HEADER_SIZE + RAM_SIZE;
    snap.registers.pc = le16(data, ext);
    snap.paging = data[ext + 2];
    snap.trdos = data[ext + 3] != 0;

    let paged = snap.paging & 0x07;
    let remaining: Vec<u8> = (0u8..8)
        .filter(|&bank| bank != 5 && bank != 2 && bank != paged)
        .collect();

    let expected = ext + EXT_SIZE + remaining.len() * PAGE_SIZE;
    if data.len() != expected {
        return Err(Error::Snapshot(format!(
            "128K SNA with bank {paged} paged must be {expected} bytes, got {}",
            data.len()
        )));
    }

    let ram = &data[HEADER_SIZE..ext];
    snap.set_page(5, ram[..PAGE_SIZE].to_vec());
    snap.set_page(2, ram[PAGE_SIZE..2 * PAGE_SIZE].to_vec());
    snap.set_page(paged, ram[2 * PAGE_SIZE..].to_vec());

    let mut pos = ext + EXT_SIZE;
    for bank in remaining {
        snap.set_page(bank, data[pos..pos + PAGE_SIZE].to_vec());
        pos += PAGE_SIZE;
    }

    Ok(snap)
}

fn required_page(snap: &Snapshot, bank: u8) -> Result<&[u8]> {
    snap.page(bank).ok_or(Error::MissingPage(bank))
}

fn write_48k(snap: &Snapshot) -> Result<Vec<u8>> {
    let mut ram = Vec::with_capacity(RAM_SIZE);
    for bank in [5, 2, 0] {
        ram.extend_from_slice(required_page(snap, bank)?);
    }

    // Push PC onto the stack
    let sp = snap.registers.sp.wrapping_sub(2);
    if sp < 0x4000 || sp == 0xFFFF {
        return Err(Error::Snapshot(format!(
            "stack pointer ${:04X} leaves no RAM to push PC",
            snap.registers.sp
        )));
    }
    let [lo, hi] = snap.registers.pc.to_le_bytes();
    let at = sp as usize - 0x4000;
    ram[at] = lo;
    ram[at + 1] = hi;

    let mut out = Vec::with_capacity(SNA_48K_SIZE);
    write_header(&snap.registers, sp, &mut out);
    out.extend_from_slice(&ram);
    Ok(out)
}

fn write_128k(snap: &Snapshot) -> Result<Vec<u8>> {
    let paged = snap.paging & 0x07;
    let remaining: Vec<u8> = (0u8..8)
        .filter(|&bank| bank != 5 && bank != 2 && bank != paged)
        .collect();

    let mut out = Vec::with_capacity(SNA_48K_SIZE + EXT_SIZE + remaining.len() * PAGE_SIZE);
    write_header(&snap.registers, snap.registers.sp, &mut out);
    for bank in [5, 2, paged] {
        out.extend_from_slice(required_page(snap, bank)?);
    }

    out.extend_from_slice(&snap.registers.pc.to_le_bytes());
    out.push(snap.paging);
    out.push(u8::from(snap.trdos));

    for bank in remaining {
        out.extend_from_slice(required_page(snap, bank)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_sna(sp: u16, pc: u16) -> Vec<u8> {
        let mut data = vec![0u8; SNA_48K_SIZE];
        for (i, byte) in data.iter_mut().enumerate().skip(HEADER_SIZE) {
            *byte = (i % 251) as u8;
        }

        data[0] = 0x3F; // I
        data[19] = 0x04; // IFF2
        data[20] = 0x42; // R
        data[21] = 0xFF; // F
        data[22] = 0xAA; // A
        data[23] = sp as u8;
        data[24] = (sp >> 8) as u8;
        data[25] = 1; // IM 1
        data[26] = 2; // Border = red

        let sp_offset = (sp - 0x4000) as usize;
        data[HEADER_SIZE + sp_offset] = pc as u8;
        data[HEADER_SIZE + sp_offset + 1] = (pc >> 8) as u8;
        data
    }

    fn make_128k_sna(paging: u8, pc: u16) -> Vec<u8> {
        let paged = paging & 0x07;
        let extra = if paged == 2 || paged == 5 { 6 } else { 5 };
        let mut data = vec![0u8; SNA_48K_SIZE + EXT_SIZE + extra * PAGE_SIZE];

        data[0] = 0x3F;
        data[22] = 0xAA;
        data[24] = 0x80; // SP = $8000
        data[25] = 1;
        data[26] = 3;

        // First byte of every bank marks its number
        data[HEADER_SIZE] = 0x55;
        data[HEADER_SIZE + PAGE_SIZE] = 0x22;
        data[HEADER_SIZE + 2 * PAGE_SIZE] = match paged {
            5 => 0x55,
            2 => 0x22,
            n => 0x10 + n,
        };

        let ext = HEADER_SIZE + RAM_SIZE;
        data[ext] = pc as u8;
        data[ext + 1] = (pc >> 8) as u8;
        data[ext + 2] = paging;

        let mut pos = ext + EXT_SIZE;
        for bank in (0u8..8).filter(|&b| b != 5 && b != 2 && b != paged) {
            data[pos] = 0x10 + bank;
            pos += PAGE_SIZE;
        }
        data
    }

    #[test]
    fn read_48k_sets_registers() {
        let snap = read(&make_sna(0x8000, 0x1234)).expect("read should succeed");

        assert_eq!(snap.machine, Machine::Spectrum48);
        let regs = &snap.registers;
        assert_eq!(regs.i, 0x3F);
        assert_eq!(regs.r, 0x42);
        assert_eq!(regs.f, 0xFF);
        assert_eq!(regs.a, 0xAA);
        assert_eq!(regs.im, 1);
        assert_eq!(regs.border, 2);
        assert!(regs.iff1 && regs.iff2);
        assert_eq!(regs.pc, 0x1234);
        assert_eq!(regs.sp, 0x8002); // SP advanced by 2 after pop
    }

    #[test]
    fn read_48k_lays_out_banks() {
        let data = make_sna(0x8000, 0);
        let snap = read(&data).unwrap();
        assert_eq!(snap.page(5).unwrap(), &data[HEADER_SIZE..HEADER_SIZE + PAGE_SIZE]);
        assert_eq!(snap.page(0).unwrap(), &data[HEADER_SIZE + 2 * PAGE_SIZE..]);
        assert!(snap.page(7).is_none());
    }

    #[test]
    fn read_wrong_size() {
        assert!(matches!(read(&[0u8; 100]), Err(Error::Snapshot(_))));
    }

    #[test]
    fn read_sp_in_rom() {
        let mut sna = vec![0u8; SNA_48K_SIZE];
        sna[23] = 0x00;
        sna[24] = 0x00;

        let err = read(&sna).unwrap_err();
        assert!(err.to_string().contains("does not point into RAM"));
    }

    #[test]
    fn read_128k_loads_every_bank() {
        let snap = read(&make_128k_sna(0x13, 0xABCD)).unwrap();

        assert_eq!(snap.machine, Machine::Spectrum128);
        assert_eq!(snap.registers.pc, 0xABCD);
        assert_eq!(snap.paging, 0x13);
        assert_eq!(snap.page(5).unwrap()[0], 0x55);
        assert_eq!(snap.page(2).unwrap()[0], 0x22);
        for bank in [0u8, 1, 3, 4, 6, 7] {
            assert_eq!(snap.page(bank).unwrap()[0], 0x10 + bank);
        }
    }

    #[test]
    fn read_128k_with_bank_5_paged() {
        let snap = read(&make_128k_sna(0x05, 0)).unwrap();
        for bank in [0u8, 1, 3, 4, 6, 7] {
            assert_eq!(snap.page(bank).unwrap()[0], 0x10 + bank);
        }
    }

    #[test]
    fn mismatched_128k_length_is_rejected() {
        // Bank 5 paged needs six trailing banks, this file has five
        let mut data = make_128k_sna(0x00, 0);
        data[HEADER_SIZE + RAM_SIZE + 2] = 0x05;
        assert!(matches!(read(&data), Err(Error::Snapshot(_))));
    }

    #[test]
    fn round_trip_48k_is_byte_identical() {
        let data = make_sna(0xFF00, 0x4321);
        assert_eq!(write(&read(&data).unwrap()).unwrap(), data);
    }

    #[test]
    fn round_trip_128k_is_byte_identical() {
        for paging in [0x00, 0x08, 0x12, 0x05, 0x1F] {
            let data = make_128k_sna(paging, 0x8000);
            assert_eq!(write(&read(&data).unwrap()).unwrap(), data);
        }
    }

    #[test]
    fn write_without_ram_fails() {
        let snap = Snapshot::new(Machine::Spectrum48);
        assert!(matches!(write(&snap), Err(Error::MissingPage(5))));
    }
}
