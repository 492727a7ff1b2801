//! Common test utilities for quicksave integration tests
#![allow(dead_code)]

use quicksave::snapshot::PAGE_SIZE;
use quicksave::{
    EmulationHost, LoadIntent, Machine, Reporter, Settings, Severity, Snapshot, SnapshotFormat,
    SnapshotHost,
};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Isolated config root plus a directory for program files
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config_dir: PathBuf,
    pub games_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_dir = temp_dir.path().join("config");
        let games_dir = temp_dir.path().join("games");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::create_dir_all(&games_dir).unwrap();

        Self {
            temp_dir,
            config_dir,
            games_dir,
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            config_root: Some(self.config_dir.clone()),
            ..Settings::default()
        }
    }

    /// Write a snapshot into the games directory
    pub fn game(&self, name: &str, snap: &Snapshot) -> PathBuf {
        let path = self.games_dir.join(name);
        std::fs::write(&path, snap.encode(SnapshotFormat::Sna).unwrap()).unwrap();
        path
    }

    /// Save directory for a program identity
    pub fn save_dir(&self, program: &str) -> PathBuf {
        self.config_dir.join("savestates").join(program)
    }
}

/// A snapshot whose every bank is filled with `0x10 + bank`
pub fn snapshot(machine: Machine, paging: u8) -> Snapshot {
    let mut snap = Snapshot::new(machine);
    snap.paging = paging;
    let banks: Vec<u8> = if machine.has_128k_paging() {
        (0..8).collect()
    } else {
        vec![5, 2, 0]
    };
    for bank in banks {
        snap.set_page(bank, vec![0x10 + bank; PAGE_SIZE]);
    }
    snap.registers.sp = 0xFF00;
    snap.registers.pc = 0x8000;
    snap.registers.a = 0x3C;
    snap
}

/// Reporter keeping every message
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub errors: Vec<(Severity, String)>,
    pub statuses: Vec<String>,
}

impl Reporter for RecordingReporter {
    fn report_error(&mut self, severity: Severity, message: &str) {
        self.errors.push((severity, message.to_string()));
    }

    fn report_status(&mut self, message: &str) {
        self.statuses.push(message.to_string());
    }
}

/// Snapshot host logging every call made to it
pub struct RecordingHost {
    pub inner: SnapshotHost,
    pub events: Vec<String>,
}

impl RecordingHost {
    pub fn new(inner: SnapshotHost) -> Self {
        Self {
            inner,
            events: Vec::new(),
        }
    }

    pub fn opens(&self) -> usize {
        self.events.iter().filter(|e| e.starts_with("open")).count()
    }

    /// Switch to another program, as the emulator would on a normal open
    pub fn switch_program(&mut self, path: &Path) {
        let inner = std::mem::replace(&mut self.inner, SnapshotHost::new(Machine::Spectrum48));
        self.inner = inner.with_last_opened(Some(path.to_path_buf()));
    }
}

impl EmulationHost for RecordingHost {
    fn pause(&mut self) {
        self.events.push("pause".to_string());
        self.inner.pause();
    }

    fn resume(&mut self) {
        self.events.push("resume".to_string());
        self.inner.resume();
    }

    fn refresh_display(&mut self) {
        self.events.push("refresh".to_string());
        self.inner.refresh_display();
    }

    fn machine(&self) -> Machine {
        self.inner.machine()
    }

    fn last_opened(&self) -> Option<&Path> {
        self.inner.last_opened()
    }

    fn write_snapshot(&mut self, path: &Path) -> quicksave::Result<()> {
        self.events.push("write".to_string());
        self.inner.write_snapshot(path)
    }

    fn open_program(&mut self, path: &Path, intent: LoadIntent) -> quicksave::Result<()> {
        self.events.push(format!("open {:?}", intent));
        self.inner.open_program(path, intent)
    }
}
