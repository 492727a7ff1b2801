//! Host - The emulator and UI the quicksave session talks to

use crate::snapshot::{Machine, Snapshot};
use crate::{Error, Result};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Why the host is asked to open a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadIntent {
    /// A new program: becomes the tracked last opened file
    NormalOpen,
    /// A save slot: the tracked program and its settings must not change
    SlotLoad,
}

/// The running emulator
pub trait EmulationHost {
    /// Stop the emulation clock; a no-op when already paused
    fn pause(&mut self);
    /// Restart the emulation clock; a no-op when already running
    fn resume(&mut self);
    fn refresh_display(&mut self);
    /// Machine currently being emulated
    fn machine(&self) -> Machine;
    /// File the current program was opened from
    fn last_opened(&self) -> Option<&Path>;
    /// Serialize the current machine state to `path`
    fn write_snapshot(&mut self, path: &Path) -> Result<()>;
    fn open_program(&mut self, path: &Path, intent: LoadIntent) -> Result<()>;
}

/// Severity of a user-visible error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// User-visible messages
pub trait Reporter {
    fn report_error(&mut self, severity: Severity, message: &str);
    fn report_status(&mut self, message: &str);
}

/// Reporter writing to the tracing log
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report_error(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => info!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Error => error!("{}", message),
        }
    }

    fn report_status(&mut self, message: &str) {
        info!("{}", message);
    }
}

/// Keeps the emulation clock paused while alive
pub struct PauseGuard<'a, H: EmulationHost + ?Sized> {
    host: &'a mut H,
}

impl<'a, H: EmulationHost + ?Sized> PauseGuard<'a, H> {
    pub fn new(host: &'a mut H) -> Self {
        host.pause();
        Self { host }
    }
}

impl<H: EmulationHost + ?Sized> Deref for PauseGuard<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        &*self.host
    }
}

impl<H: EmulationHost + ?Sized> DerefMut for PauseGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut *self.host
    }
}

impl<H: EmulationHost + ?Sized> Drop for PauseGuard<'_, H> {
    fn drop(&mut self) {
        self.host.resume();
    }
}

/// A host whose machine state is a snapshot held in memory
///
/// Used by the CLI and tests. Snapshots are written in the format named by
/// the target's extension.
#[derive(Debug)]
pub struct SnapshotHost {
    machine: Machine,
    state: Option<Snapshot>,
    last_opened: Option<PathBuf>,
    paused: bool,
    refreshes: usize,
}

impl SnapshotHost {
    /// An idle host emulating `machine` with nothing loaded
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            state: None,
            last_opened: None,
            paused: false,
            refreshes: 0,
        }
    }

    /// A host running the snapshot in `path`
    pub fn from_file(path: &Path) -> Result<Self> {
        let snapshot = Snapshot::read_file(path)?;
        let mut host = Self::new(snapshot.machine);
        host.state = Some(snapshot);
        Ok(host)
    }

    /// Track `path` as the last opened program without loading it
    pub fn with_last_opened(mut self, path: Option<PathBuf>) -> Self {
        self.last_opened = path;
        self
    }

    pub fn state(&self) -> Option<&Snapshot> {
        self.state.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of display refreshes requested
    pub fn refreshes(&self) -> usize {
        self.refreshes
    }
}

impl EmulationHost for SnapshotHost {
    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn refresh_display(&mut self) {
        self.refreshes += 1;
    }

    fn machine(&self) -> Machine {
        self.machine
    }

    fn last_opened(&self) -> Option<&Path> {
        self.last_opened.as_deref()
    }

    fn write_snapshot(&mut self, path: &Path) -> Result<()> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| Error::Snapshot("no machine state to save".to_string()))?;
        state.write_file(path)?;
        debug!("Wrote {} snapshot to {:?}", self.machine, path);
        Ok(())
    }

    fn open_program(&mut self, path: &Path, intent: LoadIntent) -> Result<()> {
        let snapshot = Snapshot::read_file(path)?;
        self.machine = snapshot.machine;
        self.state = Some(snapshot);
        if intent == LoadIntent::NormalOpen {
            self.last_opened = Some(path.to_path_buf());
        }
        debug!("Opened {:?} as {:?}", path, intent);
        Ok(())
    }
}
