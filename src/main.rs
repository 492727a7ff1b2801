//! Quicksave CLI - Inspect and manage emulator save slots from the command line

use clap::{Parser, Subcommand};
use quicksave::host::TracingReporter;
use quicksave::{Formatters, Machine, Operation, Outcome, Session, Settings, SnapshotHost};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quicksave")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding quicksave.json and the savestates tree
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Program file the slots belong to (the emulator's last opened file)
    #[arg(short, long, global = true)]
    program: Option<PathBuf>,

    /// Emulated machine (48, 128, plus3, pentagon, ...)
    #[arg(short, long, global = true, default_value = "48")]
    machine: String,

    /// Slot file extension, overriding the settings file
    #[arg(long, global = true)]
    format: Option<String>,

    /// Keep slots in per-machine directories
    #[arg(long, global = true)]
    per_machine: bool,

    /// Output formatter (shell, text, json)
    #[arg(short, long, global = true, default_value = "shell")]
    formatter: String,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the program identity slots are grouped under
    Identity,
    /// Show the save directory, or one slot's file
    Path {
        slot: Option<u8>,
    },
    /// Check whether any slot exists for the program
    Exists,
    /// List existing slots
    List,
    /// Show a slot's menu label
    Label {
        slot: u8,
    },
    /// Save a snapshot file into a slot
    Save {
        slot: u8,

        /// Snapshot holding the machine state to save
        #[arg(long)]
        from: PathBuf,
    },
    /// Load a slot and write the restored machine state out
    Load {
        slot: u8,

        /// Where to write the restored state (.sna)
        #[arg(long)]
        to: PathBuf,
    },
    /// Extract a slot's screen as a 6912-byte .scr file
    Screen {
        slot: u8,

        /// Output .scr file
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(success) => {
            if !success {
                std::process::exit(2);
            }
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn load_settings(cli: &Cli) -> quicksave::Result<Settings> {
    let mut settings = match cli.config_dir {
        Some(ref dir) => Settings::load_from(&dir.join(quicksave::config::CONFIG_FILE))?,
        None => Settings::load()?,
    };

    if let Some(ref dir) = cli.config_dir {
        settings.config_root = Some(dir.clone());
    }
    if let Some(ref format) = cli.format {
        settings.format = format.clone();
    }
    settings.per_machine |= cli.per_machine;
    settings.validate()?;
    Ok(settings)
}

fn run(cli: Cli) -> quicksave::Result<bool> {
    let settings = load_settings(&cli)?;
    let machine: Machine = cli.machine.parse()?;
    let formatter = Formatters::by_name(&cli.formatter);

    let host = match cli.command {
        Commands::Save { ref from, .. } => SnapshotHost::from_file(from)?,
        _ => SnapshotHost::new(machine),
    };
    let host = host.with_last_opened(cli.program.clone());
    let mut session = Session::new(settings, host, TracingReporter);

    let outcome = match cli.command {
        Commands::Identity => match session.current_program() {
            Some(program) => Outcome::new(Operation::Path, None, true, Some(program)),
            None => not_loaded(Operation::Path),
        },
        Commands::Path { slot } => {
            let path = match slot {
                Some(slot) => session.filename_for_slot(slot),
                None => session.current_directory(),
            };
            match path {
                Some(path) => Outcome::new(
                    Operation::Path,
                    slot,
                    true,
                    Some(path.to_string_lossy().into_owned()),
                ),
                None => not_loaded(Operation::Path),
            }
        }
        Commands::Exists => {
            let exists = session.any_save_exists();
            let message = if exists { "Saves exist" } else { "No saves" };
            let mut outcome =
                Outcome::new(Operation::Exists, None, true, Some(message.to_string()));
            outcome.add_detail("exists".to_string(), serde_json::json!(exists));
            outcome
        }
        Commands::List => {
            let slots = session.list_slots();
            let lines: Vec<String> = slots
                .iter()
                .map(|s| match s.last_change() {
                    Some(time) => format!("{:02}  {}", s.slot, time),
                    None => format!("{:02}", s.slot),
                })
                .collect();
            let entries: Vec<serde_json::Value> = slots
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "slot": s.slot,
                        "path": s.path.to_string_lossy(),
                        "modified": s.last_change(),
                    })
                })
                .collect();

            let mut outcome = Outcome::new(Operation::List, None, true, Some(lines.join("\n")));
            outcome.add_detail("slots".to_string(), serde_json::json!(entries));
            outcome
        }
        Commands::Label { slot } => match session.label(slot) {
            Some(label) => Outcome::new(Operation::Path, Some(slot), true, Some(label)),
            None => not_loaded(Operation::Path),
        },
        Commands::Save { slot, .. } => session.save(slot)?,
        Commands::Load { slot, ref to } => {
            let mut outcome = session.load(slot)?;
            if outcome.is_skipped() {
                outcome.message = Some(format!("Slot {:02} is empty", slot));
            } else if let Some(state) = session.host().state() {
                state.write_file(to)?;
                outcome = outcome.with_path(to);
            }
            outcome
        }
        Commands::Screen { slot, ref out } => {
            let screen = session.extract_screen(slot);
            screen.write_file(out)?;
            let mut outcome = Outcome::done(
                Operation::Screen,
                slot,
                format!("Wrote screen of slot {:02}", slot),
            )
            .with_path(out);
            outcome.add_detail("blank".to_string(), serde_json::json!(screen.is_blank()));
            outcome
        }
    };

    let mut stdout = io::stdout();
    formatter.write_to(&outcome, &mut stdout)?;
    stdout.flush()?;

    Ok(outcome.is_success())
}

fn not_loaded(operation: Operation) -> Outcome {
    Outcome::new(
        operation,
        None,
        false,
        Some("No program loaded (use --program)".to_string()),
    )
}
