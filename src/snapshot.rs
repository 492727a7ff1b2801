//! Snapshot - Serialized machine state and format detection
//!
//! Memory is held as 16K RAM banks keyed by bank number. 48K machines use
//! banks 5, 2 and 0 for `0x4000`, `0x8000` and `0xC000`, matching the
//! layout of a 128K machine with bank 0 paged in, so the display file is
//! always found in bank 5 (or bank 7 for the 128K shadow screen).

use crate::{sna, z80, Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Size of one RAM bank
pub const PAGE_SIZE: usize = 0x4000;

/// Emulated machine recorded in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Machine {
    Spectrum16,
    Spectrum48,
    Spectrum48Ntsc,
    Spectrum128,
    Spectrum128E,
    Plus2,
    Plus2A,
    Plus3,
    Plus3E,
    Pentagon,
    Pentagon512,
    Pentagon1024,
    Scorpion,
    Se,
    Tc2048,
    Tc2068,
    Ts2068,
    Unknown,
}

impl Machine {
    pub const ALL: [Machine; 18] = [
        Machine::Spectrum16,
        Machine::Spectrum48,
        Machine::Spectrum48Ntsc,
        Machine::Spectrum128,
        Machine::Spectrum128E,
        Machine::Plus2,
        Machine::Plus2A,
        Machine::Plus3,
        Machine::Plus3E,
        Machine::Pentagon,
        Machine::Pentagon512,
        Machine::Pentagon1024,
        Machine::Scorpion,
        Machine::Se,
        Machine::Tc2048,
        Machine::Tc2068,
        Machine::Ts2068,
        Machine::Unknown,
    ];

    /// Display name, also used as the per-machine directory segment
    pub fn name(self) -> &'static str {
        match self {
            Machine::Spectrum16 => "Spectrum 16K",
            Machine::Spectrum48 => "Spectrum 48K",
            Machine::Spectrum48Ntsc => "Spectrum 48K (NTSC)",
            Machine::Spectrum128 => "Spectrum 128K",
            Machine::Spectrum128E => "Spectrum 128Ke",
            Machine::Plus2 => "Spectrum +2",
            Machine::Plus2A => "Spectrum +2A",
            Machine::Plus3 => "Spectrum +3",
            Machine::Plus3E => "Spectrum +3e",
            Machine::Pentagon => "Pentagon 128K",
            Machine::Pentagon512 => "Pentagon 512K",
            Machine::Pentagon1024 => "Pentagon 1024K",
            Machine::Scorpion => "Scorpion ZS 256",
            Machine::Se => "Spectrum SE",
            Machine::Tc2048 => "Timex TC2048",
            Machine::Tc2068 => "Timex TC2068",
            Machine::Ts2068 => "Timex TS2068",
            Machine::Unknown => "Unknown",
        }
    }

    /// Whether the machine pages RAM through port `0x7FFD`
    pub fn has_128k_paging(self) -> bool {
        matches!(
            self,
            Machine::Pentagon
                | Machine::Pentagon512
                | Machine::Pentagon1024
                | Machine::Scorpion
                | Machine::Plus3E
                | Machine::Plus2A
                | Machine::Plus3
                | Machine::Plus2
                | Machine::Spectrum128
                | Machine::Spectrum128E
                | Machine::Se
        )
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Machine {
    type Err = Error;

    /// Accepts display names and short aliases such as `48`, `128`, `plus3`
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        if let Some(machine) = Machine::ALL
            .iter()
            .find(|m| m.name().to_lowercase() == key)
        {
            return Ok(*machine);
        }

        let machine = match key.as_str() {
            "16" | "16k" => Machine::Spectrum16,
            "48" | "48k" => Machine::Spectrum48,
            "48ntsc" => Machine::Spectrum48Ntsc,
            "128" | "128k" => Machine::Spectrum128,
            "128e" | "128ke" => Machine::Spectrum128E,
            "plus2" | "+2" => Machine::Plus2,
            "plus2a" | "+2a" => Machine::Plus2A,
            "plus3" | "+3" => Machine::Plus3,
            "plus3e" | "+3e" => Machine::Plus3E,
            "pentagon" | "pentagon128" => Machine::Pentagon,
            "pentagon512" => Machine::Pentagon512,
            "pentagon1024" => Machine::Pentagon1024,
            "scorpion" => Machine::Scorpion,
            "se" => Machine::Se,
            "tc2048" => Machine::Tc2048,
            "tc2068" => Machine::Tc2068,
            "ts2068" => Machine::Ts2068,
            _ => return Err(Error::UnknownMachine(s.to_string())),
        };
        Ok(machine)
    }
}

/// Snapshot container formats understood by [`Snapshot::parse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Sna,
    Z80,
}

impl SnapshotFormat {
    /// Guess the format from a file name's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "sna" => Some(SnapshotFormat::Sna),
            "z80" => Some(SnapshotFormat::Z80),
            _ => None,
        }
    }

    /// Guess the format from the data alone
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if sna::is_sna_size(bytes.len()) {
            Some(SnapshotFormat::Sna)
        } else if bytes.len() >= z80::V1_HEADER_SIZE {
            Some(SnapshotFormat::Z80)
        } else {
            None
        }
    }
}

/// Z80 CPU registers plus the ULA border colour
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub f: u8,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub a_alt: u8,
    pub f_alt: u8,
    pub bc_alt: u16,
    pub de_alt: u16,
    pub hl_alt: u16,
    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
    pub border: u8,
}

/// A parsed machine snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub machine: Machine,
    /// Last value written to port `0x7FFD`
    pub paging: u8,
    pub registers: Registers,
    /// TR-DOS ROM paged flag, kept for SNA round trips
    pub trdos: bool,
    pages: BTreeMap<u8, Vec<u8>>,
}

impl Snapshot {
    /// Create an empty snapshot for a machine
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            paging: 0,
            registers: Registers::default(),
            trdos: false,
            pages: BTreeMap::new(),
        }
    }

    /// Parse snapshot bytes
    ///
    /// Without a format hint the format is guessed from `source`'s
    /// extension, then from the data. `source` is only used for diagnostics.
    pub fn parse(bytes: &[u8], hint: Option<SnapshotFormat>, source: &str) -> Result<Self> {
        let format = hint
            .or_else(|| SnapshotFormat::from_path(Path::new(source)))
            .or_else(|| SnapshotFormat::sniff(bytes))
            .ok_or_else(|| Error::Snapshot(format!("'{}': unrecognised format", source)))?;

        let parsed = match format {
            SnapshotFormat::Sna => sna::read(bytes),
            SnapshotFormat::Z80 => z80::read(bytes),
        };

        parsed.map_err(|e| match e {
            Error::Snapshot(msg) => Error::Snapshot(format!("'{}': {}", source, msg)),
            Error::UnsupportedSnapshot(msg) => {
                Error::UnsupportedSnapshot(format!("'{}': {}", source, msg))
            }
            other => other,
        })
    }

    /// Read and parse a snapshot file
    pub fn read_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes, None, &path.to_string_lossy())
    }

    /// Encode in the given format
    pub fn encode(&self, format: SnapshotFormat) -> Result<Vec<u8>> {
        match format {
            SnapshotFormat::Sna => sna::write(self),
            SnapshotFormat::Z80 => Err(Error::UnsupportedFormat(".z80".to_string())),
        }
    }

    /// Write to a file, choosing the format from its extension
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let format = SnapshotFormat::from_path(path).ok_or_else(|| {
            Error::UnsupportedFormat(path.to_string_lossy().into_owned())
        })?;
        let bytes = self.encode(format)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// A 16K RAM bank
    pub fn page(&self, index: u8) -> Option<&[u8]> {
        self.pages.get(&index).map(|p| p.as_slice())
    }

    /// Store a RAM bank, padding or truncating it to 16K
    pub fn set_page(&mut self, index: u8, mut data: Vec<u8>) {
        data.resize(PAGE_SIZE, 0);
        self.pages.insert(index, data);
    }

    /// Bank currently paged at `0xC000`
    pub fn paged_bank(&self) -> u8 {
        if self.machine.has_128k_paging() {
            self.paging & 0x07
        } else {
            0
        }
    }

    /// Bank and offset backing a RAM address, None for ROM
    pub fn bank_for(&self, addr: u16) -> Option<(u8, usize)> {
        let offset = addr as usize & (PAGE_SIZE - 1);
        match addr {
            0x0000..=0x3FFF => None,
            0x4000..=0x7FFF => Some((5, offset)),
            0x8000..=0xBFFF => Some((2, offset)),
            _ => Some((self.paged_bank(), offset)),
        }
    }

    /// Read a byte from the mapped address space
    pub fn read_byte(&self, addr: u16) -> Option<u8> {
        let (bank, offset) = self.bank_for(addr)?;
        self.page(bank).map(|p| p[offset])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_families() {
        assert!(Machine::Spectrum128.has_128k_paging());
        assert!(Machine::Pentagon1024.has_128k_paging());
        assert!(Machine::Scorpion.has_128k_paging());
        assert!(Machine::Se.has_128k_paging());
        assert!(!Machine::Spectrum48.has_128k_paging());
        assert!(!Machine::Tc2048.has_128k_paging());
        assert!(!Machine::Unknown.has_128k_paging());
    }

    #[test]
    fn machine_from_names_and_aliases() {
        assert_eq!("48".parse::<Machine>().unwrap(), Machine::Spectrum48);
        assert_eq!("+3".parse::<Machine>().unwrap(), Machine::Plus3);
        assert_eq!(
            "Pentagon 128K".parse::<Machine>().unwrap(),
            Machine::Pentagon
        );
        assert!(matches!(
            "vic20".parse::<Machine>(),
            Err(Error::UnknownMachine(_))
        ));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            SnapshotFormat::from_path(Path::new("a/b/07.SNA")),
            Some(SnapshotFormat::Sna)
        );
        assert_eq!(
            SnapshotFormat::from_path(Path::new("game.z80")),
            Some(SnapshotFormat::Z80)
        );
        assert_eq!(SnapshotFormat::from_path(Path::new("game.tap")), None);
    }

    #[test]
    fn address_mapping_follows_paging() {
        let mut snap = Snapshot::new(Machine::Spectrum128);
        for bank in 0..8 {
            snap.set_page(bank, vec![bank; PAGE_SIZE]);
        }
        snap.paging = 0x03;
        assert_eq!(snap.read_byte(0x4000), Some(5));
        assert_eq!(snap.read_byte(0x8000), Some(2));
        assert_eq!(snap.read_byte(0xC000), Some(3));
        assert_eq!(snap.read_byte(0x0000), None);

        snap.machine = Machine::Spectrum48;
        assert_eq!(snap.read_byte(0xFFFF), Some(0));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = Snapshot::parse(&[1, 2, 3], None, "junk").unwrap_err();
        assert!(matches!(err, Error::Snapshot(_)));
    }
}
