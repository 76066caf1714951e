//! Command-line front end over [`DiaryService`].

use crate::core::settings::{update_backup_prefix, StorageBackend};
use crate::diary::types::{format_date_key, parse_date_key, DailyRecord, Mood};
use crate::diary::{init_diary, switch_backend, DiaryService};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
/// Personal diary with daily to-dos, moods and photos, locked by a PIN.
#[command(name = "diary", version)]
pub struct Cli {
    /// Directory holding the diary data (defaults to the platform data dir).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// PIN used to unlock the diary.
    #[arg(long, global = true, env = "DIARY_PIN", hide_env_values = true)]
    pub pin: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show everything recorded for a day.
    #[command(name = "show")]
    Show {
        /// Day as YYYY-MM-DD (default: today).
        #[arg(value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },

    /// List the days that have entries.
    #[command(name = "list")]
    List,

    /// Manage the day's to-do list.
    #[command(name = "todo")]
    Todo {
        #[command(subcommand)]
        action: TodoAction,
    },

    /// Replace the diary text for a day.
    #[command(name = "write")]
    Write {
        text: String,

        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },

    /// Set the mood for a day (happy, excited, neutral, sad, angry, unset).
    #[command(name = "mood")]
    Mood {
        mood: Mood,

        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },

    /// Manage the day's photos.
    #[command(name = "photo")]
    Photo {
        #[command(subcommand)]
        action: PhotoAction,
    },

    /// Check or change the PIN.
    #[command(name = "pin")]
    Pin {
        #[command(subcommand)]
        action: PinAction,
    },

    /// Export or restore a full backup.
    #[command(name = "backup")]
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Show or change settings.
    #[command(name = "settings")]
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Delete all stored data, PIN included.
    #[command(name = "reset")]
    Reset {
        /// Required, there is no undo.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum TodoAction {
    /// Add a to-do.
    Add {
        text: String,

        /// Repeat this many days after completion.
        #[arg(long)]
        repeat: Option<u32>,

        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },

    /// Mark a to-do done, or undone.
    Toggle {
        id: String,

        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },

    /// Delete a to-do.
    Rm {
        id: String,

        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },

    /// Set or clear (`--clear`) the repeat interval.
    Repeat {
        id: String,

        days: Option<u32>,

        #[arg(long, conflicts_with = "days")]
        clear: bool,

        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
}

#[derive(Debug, Subcommand)]
pub enum PhotoAction {
    /// Attach an image file.
    Add {
        file: PathBuf,

        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },

    /// Remove the photo at INDEX.
    Rm {
        index: usize,

        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
}

#[derive(Debug, Subcommand)]
pub enum PinAction {
    /// Check whether `--pin` unlocks the diary.
    Check,

    /// Change the PIN (requires the current one via `--pin`).
    Set { new_pin: String },
}

#[derive(Debug, Subcommand)]
pub enum BackupAction {
    /// Write `<prefix>-<date>.json` into a directory.
    Export {
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Replace all records with the contents of a backup file.
    Import { file: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Print the current settings.
    Show,

    /// Switch the storage backend (file or sqlite), carrying the data over.
    Backend { backend: StorageBackend },

    /// Change the backup file name prefix.
    Prefix { prefix: String },
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_date_key(value).ok_or_else(|| format!("expected a YYYY-MM-DD date, got {:?}", value))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn require_unlocked(service: &DiaryService, pin: Option<&str>) -> anyhow::Result<()> {
    match pin {
        Some(pin) if service.unlock(pin) => Ok(()),
        Some(_) => bail!("wrong PIN"),
        None => bail!("diary is locked, pass --pin or set DIARY_PIN"),
    }
}

fn print_record(date: NaiveDate, record: &DailyRecord) {
    println!("{}  mood: {}", format_date_key(date), record.mood);
    if record.is_blank() {
        println!("  (nothing recorded)");
        return;
    }

    if record.todo.is_empty() {
        println!("  (no to-dos)");
    }
    for item in &record.todo {
        let mark = if item.completed { "x" } else { " " };
        match item.repeat {
            Some(days) => println!("  [{}] {}  {}  (every {}d)", mark, item.id, item.text, days),
            None => println!("  [{}] {}  {}", mark, item.id, item.text),
        }
    }

    if !record.diary.is_empty() {
        println!();
        println!("{}", record.diary);
    }

    for (index, photo) in record.photos.iter().enumerate() {
        let head: String = photo.chars().take(40).collect();
        println!("  photo #{}: {}... ({} bytes)", index, head, photo.len());
    }
}

/// Run one parsed command against the data in `storage_dir`.
pub fn execute(cli: Cli, storage_dir: &Path) -> anyhow::Result<()> {
    if let Command::Settings { action } = &cli.command {
        return run_settings(action, storage_dir);
    }

    let service = init_diary(storage_dir)
        .with_context(|| format!("opening diary at {}", storage_dir.display()))?;
    let pin = cli.pin.as_deref();

    match cli.command {
        Command::Pin {
            action: PinAction::Check,
        } => {
            require_unlocked(&service, pin)?;
            println!("unlocked");
        }
        Command::Pin {
            action: PinAction::Set { new_pin },
        } => {
            let current = pin.context("pass the current PIN with --pin")?;
            service.change_pin(current, &new_pin)?;
            println!("PIN changed");
        }
        command => {
            require_unlocked(&service, pin)?;
            run_unlocked(&service, command)?;
        }
    }

    Ok(())
}

fn run_unlocked(service: &DiaryService, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Show { date } => {
            let date = date.unwrap_or_else(today);
            print_record(date, &service.day(date));
        }
        Command::List => {
            let map = service.records().load_all();
            for (date, record) in &map {
                let done = record.todo.iter().filter(|t| t.completed).count();
                println!(
                    "{}  {:<8} to-dos {}/{}  photos {}{}",
                    format_date_key(*date),
                    record.mood.to_string(),
                    done,
                    record.todo.len(),
                    record.photos.len(),
                    if record.diary.is_empty() { "" } else { "  +text" }
                );
            }
        }
        Command::Todo { action } => run_todo(service, action)?,
        Command::Write { text, date } => {
            service.set_diary(date.unwrap_or_else(today), &text)?;
        }
        Command::Mood { mood, date } => {
            service.set_mood(date.unwrap_or_else(today), mood)?;
        }
        Command::Photo { action } => match action {
            PhotoAction::Add { file, date } => {
                let index = service.add_photo_file(date.unwrap_or_else(today), &file)?;
                println!("added photo #{}", index);
            }
            PhotoAction::Rm { index, date } => {
                service.remove_photo(date.unwrap_or_else(today), index)?;
                println!("removed photo #{}", index);
            }
        },
        Command::Backup { action } => match action {
            BackupAction::Export { out } => {
                let path = service.write_backup(&out, today())?;
                println!("backup written to {}", path.display());
            }
            BackupAction::Import { file } => {
                let count = service
                    .restore_backup_file(&file)
                    .with_context(|| format!("restoring {}", file.display()))?;
                println!("restored {} days", count);
            }
        },
        Command::Reset { yes } => {
            if !yes {
                bail!("refusing to delete everything without --yes");
            }
            service.reset()?;
            println!("all data deleted");
        }
        Command::Pin { .. } | Command::Settings { .. } => {
            bail!("command does not need an unlocked diary")
        }
    }

    Ok(())
}

fn run_todo(service: &DiaryService, action: TodoAction) -> anyhow::Result<()> {
    match action {
        TodoAction::Add { text, repeat, date } => {
            let item = service.add_todo(date.unwrap_or_else(today), &text, repeat)?;
            println!("{}", item.id);
        }
        TodoAction::Toggle { id, date } => {
            let outcome = service.toggle_todo(date.unwrap_or_else(today), &id)?;
            let state = if outcome.item.completed { "done" } else { "open" };
            println!("{} is {}", outcome.item.id, state);
            if let Some(next) = outcome.repeated_on {
                println!("next occurrence on {}", format_date_key(next));
            }
        }
        TodoAction::Rm { id, date } => {
            service.delete_todo(date.unwrap_or_else(today), &id)?;
        }
        TodoAction::Repeat {
            id,
            days,
            clear,
            date,
        } => {
            if days.is_none() && !clear {
                bail!("give a number of days or --clear");
            }
            service.set_repeat(date.unwrap_or_else(today), &id, days)?;
        }
    }
    Ok(())
}

fn run_settings(action: &SettingsAction, storage_dir: &Path) -> anyhow::Result<()> {
    let settings = match action {
        SettingsAction::Show => crate::core::settings::load_settings(storage_dir),
        SettingsAction::Backend { backend } => switch_backend(storage_dir, *backend)?,
        SettingsAction::Prefix { prefix } => update_backup_prefix(storage_dir, prefix)?,
    };

    println!("storage backend: {}", settings.storage_backend);
    println!("backup prefix:   {}", settings.backup_prefix);
    println!("data directory:  {}", storage_dir.display());
    Ok(())
}
