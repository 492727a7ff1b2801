//! Session - Save and load slots through an emulation host

use crate::{
    cache::DirectoryCache,
    config::Settings,
    host::{EmulationHost, LoadIntent, PauseGuard, Reporter, Severity},
    outcome::{Operation, Outcome},
    resolver::SlotResolver,
    savefile::{self, Savefile},
    screen::{self, Screen},
    Error, Result,
};
use std::path::PathBuf;
use tracing::debug;

/// Mid-level: the quicksave subsystem bound to one host and UI
///
/// The host is asked for the machine and last opened file on every call, so
/// paths always follow whatever program is currently loaded.
pub struct Session<H: EmulationHost, R: Reporter> {
    settings: Settings,
    host: H,
    reporter: R,
    cache: DirectoryCache,
}

impl<H: EmulationHost, R: Reporter> Session<H, R> {
    /// Create a new quicksave session
    pub fn new(settings: Settings, host: H, reporter: R) -> Self {
        Self {
            settings,
            host,
            reporter,
            cache: DirectoryCache::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Give back the host
    pub fn into_host(self) -> H {
        self.host
    }

    /// Path resolver for the host's current program
    pub fn resolver(&self) -> SlotResolver<'_> {
        SlotResolver::new(&self.settings, self.host.machine(), self.host.last_opened())
    }

    pub fn current_program(&self) -> Option<String> {
        self.resolver().current_program()
    }

    pub fn current_directory(&self) -> Option<PathBuf> {
        self.resolver().current_directory()
    }

    pub fn filename_for_slot(&self, slot: u8) -> Option<PathBuf> {
        self.resolver().filename_for_slot(slot)
    }

    pub fn slot_exists(&self, slot: u8) -> bool {
        self.resolver().slot_exists(slot)
    }

    pub fn is_savestate_possible(&self) -> bool {
        self.resolver().is_savestate_possible()
    }

    pub fn label(&self, slot: u8) -> Option<String> {
        self.resolver().label(slot)
    }

    pub fn last_change(&self, slot: u8) -> Option<String> {
        self.resolver().last_change(slot)
    }

    pub fn list_slots(&self) -> Vec<Savefile> {
        self.resolver().list_slots()
    }

    /// Whether the current save directory holds any slot
    ///
    /// Positive answers are cached until the directory changes.
    pub fn any_save_exists(&mut self) -> bool {
        let dir = self.current_directory();
        let format = &self.settings.format;
        self.cache
            .query(dir.as_deref(), |name| savefile::is_slot_file(name, format))
    }

    /// Drop the cached existence answer
    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }

    /// Screen thumbnail of a slot, blank when unavailable
    pub fn extract_screen(&self, slot: u8) -> Screen {
        screen::extract_screen(self.filename_for_slot(slot).as_deref())
    }

    /// Screen thumbnail of a slot, with the reason it is unavailable
    pub fn try_extract_screen(&self, slot: u8) -> Result<Screen> {
        let path = self.filename_for_slot(slot).ok_or(Error::NoProgram)?;
        screen::try_extract_screen(&path)
    }

    /// Save the machine state to a slot
    pub fn save(&mut self, slot: u8) -> Result<Outcome> {
        write_slot(&mut self.host, &mut self.reporter, &self.settings, slot)
    }

    /// Load a slot; a slot without a file is left alone
    pub fn load(&mut self, slot: u8) -> Result<Outcome> {
        read_slot(&mut self.host, &mut self.reporter, &self.settings, slot)
    }

    /// Save to the default slot with emulation paused
    pub fn quicksave(&mut self) -> Result<Outcome> {
        let slot = self.settings.slot;
        let mut host = PauseGuard::new(&mut self.host);
        write_slot(&mut *host, &mut self.reporter, &self.settings, slot)
    }

    /// Load the default slot with emulation paused
    pub fn quickload(&mut self) -> Result<Outcome> {
        let slot = self.settings.slot;
        if !self.slot_exists(slot) {
            return Ok(Outcome::skipped(Operation::Load, slot));
        }

        let mut host = PauseGuard::new(&mut self.host);
        let result = read_slot(&mut *host, &mut self.reporter, &self.settings, slot);
        host.refresh_display();
        result
    }

    /// Save to the slot named by a path such as `.../07.sna`
    ///
    /// The slot becomes the default slot.
    pub fn write_by_slot_path(&mut self, name: &str) -> Result<Outcome> {
        let slot = self.select_slot(name)?;
        self.save(slot)
    }

    /// Load the slot named by a path such as `.../07.sna`
    ///
    /// The slot becomes the default slot.
    pub fn read_by_slot_path(&mut self, name: &str) -> Result<Outcome> {
        let slot = self.select_slot(name)?;
        self.load(slot)
    }

    fn select_slot(&mut self, name: &str) -> Result<u8> {
        let slot = savefile::slot_from_name(name)
            .ok_or_else(|| Error::InvalidSlotName(name.to_string()))?;
        self.settings.slot = slot;
        Ok(slot)
    }
}

fn write_slot<H, R>(
    host: &mut H,
    reporter: &mut R,
    settings: &Settings,
    slot: u8,
) -> Result<Outcome>
where
    H: EmulationHost + ?Sized,
    R: Reporter + ?Sized,
{
    let path = {
        let resolver = SlotResolver::new(settings, host.machine(), host.last_opened());
        let path = resolver.filename_for_slot(slot).ok_or(Error::NoProgram)?;
        if let Err(e) = resolver.ensure_directory_exists() {
            return Err(save_failed(reporter, slot, e));
        }
        path
    };

    if let Err(e) = host.write_snapshot(&path) {
        return Err(save_failed(reporter, slot, e));
    }

    let message = with_timestamp(format!("Saved to slot {:02}", slot), &path);
    reporter.report_status(&message);
    debug!("Saved slot {} to {:?}", slot, path);
    Ok(Outcome::done(Operation::Save, slot, message).with_path(&path))
}

fn read_slot<H, R>(
    host: &mut H,
    reporter: &mut R,
    settings: &Settings,
    slot: u8,
) -> Result<Outcome>
where
    H: EmulationHost + ?Sized,
    R: Reporter + ?Sized,
{
    let savefile = SlotResolver::new(settings, host.machine(), host.last_opened())
        .savefile(slot)
        .filter(|s| s.exists());
    let Some(Savefile { path, .. }) = savefile else {
        debug!("Slot {} is empty, nothing to load", slot);
        return Ok(Outcome::skipped(Operation::Load, slot));
    };

    if let Err(e) = host.open_program(&path, LoadIntent::SlotLoad) {
        let e = Error::LoadFailed {
            slot,
            source: Box::new(e),
        };
        reporter.report_error(Severity::Error, &e.to_string());
        return Err(e);
    }

    let message = with_timestamp(format!("Loaded slot {:02}", slot), &path);
    reporter.report_status(&message);
    Ok(Outcome::done(Operation::Load, slot, message).with_path(&path))
}

fn save_failed<R: Reporter + ?Sized>(reporter: &mut R, slot: u8, source: Error) -> Error {
    let e = Error::SaveFailed {
        slot,
        source: Box::new(source),
    };
    reporter.report_error(Severity::Error, &e.to_string());
    e
}

fn with_timestamp(message: String, path: &std::path::Path) -> String {
    match savefile::last_change(path) {
        Some(time) => format!("{} ({})", message, time),
        None => message,
    }
}
