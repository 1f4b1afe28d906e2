use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use jotter::application::ConfigService;
use jotter::cli::output::{
    format_emotions, format_import_report, format_relocate_report, short_id,
};
use jotter::cli::{format_entry_detail, format_entry_list, format_stats, Cli, Commands, EntryArgs};
use jotter::domain::stats::month_key;
use jotter::domain::{JournalEntry, RichText};
use jotter::error::JotterError;
use jotter::infrastructure::ConfigStore;
use jotter::logging::init_logging;
use jotter::StorageManager;
use std::fs;
use std::path::Path;

fn main() {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e.display_with_suggestions());
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: Cli) -> Result<(), JotterError> {
    let settings = ConfigStore::discover()?;
    let config = settings.load()?;
    init_logging(&config.log_level);

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("jotter - Journal entries stored one file each");
            println!("Use --help for usage information");
            return Ok(());
        }
    };

    match command {
        Commands::Config { key, value, list } => {
            let service = ConfigService::new(settings);

            if list {
                let config = service.list()?;
                println!("storage_path = {}", config.storage_path.display());
                println!("filename_scheme = {}", config.filename_scheme);
                println!("log_level = {}", config.log_level);
            } else if let Some(k) = key {
                if let Some(v) = value {
                    service.set(&k, &v)?;
                    println!("Set {} = {}", k, v);
                } else {
                    println!("{}", service.get(&k)?);
                }
            } else {
                println!("Usage: jotter config [--list | <key> [<value>]]");
                println!("Valid keys: storage_path, filename_scheme, log_level");
            }
            Ok(())
        }
        Commands::Folder => {
            println!("{}", config.storage_path.display());
            Ok(())
        }
        Commands::Emotions => {
            print!("{}", format_emotions());
            Ok(())
        }
        command => {
            let mut manager = StorageManager::open(settings)?;
            run_with_manager(&mut manager, command)
        }
    }
}

fn run_with_manager(manager: &mut StorageManager, command: Commands) -> Result<(), JotterError> {
    match command {
        Commands::New { title, body, pin } => {
            let mut entry = JournalEntry::new(title, "");
            apply_entry_args(&mut entry, &body)?;
            entry.is_pinned = pin;
            let id = short_id(&entry);
            manager.create(entry)?;
            println!("Created {}", id);
            Ok(())
        }
        Commands::List { month, limit } => {
            if let Some(month) = &month {
                parse_month(month)?;
            }
            let entries: Vec<JournalEntry> = manager
                .entries()
                .iter()
                .filter(|e| month.as_ref().is_none_or(|m| month_key(e) == *m))
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect();
            let output = format_entry_list(&entries);
            if entries.is_empty() {
                println!("{}", output);
            } else {
                print!("{}", output);
            }
            Ok(())
        }
        Commands::Show { id } => {
            let entry = manager.find(&id)?;
            print!("{}", format_entry_detail(entry));
            Ok(())
        }
        Commands::Edit {
            id,
            title,
            body,
            clear_pleasantness,
        } => {
            let id = manager.find(&id)?.id();
            let old = manager
                .entry(id)
                .cloned()
                .ok_or_else(|| JotterError::EntryNotFound(id.to_string()))?;
            let mut new = old.clone();
            if let Some(title) = title {
                new.title = title;
            }
            apply_entry_args(&mut new, &body)?;
            if clear_pleasantness {
                new.set_pleasantness(None);
            }
            manager.update(&old, new)?;
            println!("Updated {}", short_id(&old));
            Ok(())
        }
        Commands::Pin { id } => {
            let entry = manager.find(&id)?;
            let (id, short) = (entry.id(), short_id(entry));
            manager.set_pinned(id, true)?;
            println!("Pinned {}", short);
            Ok(())
        }
        Commands::Unpin { id } => {
            let entry = manager.find(&id)?;
            let (id, short) = (entry.id(), short_id(entry));
            manager.set_pinned(id, false)?;
            println!("Unpinned {}", short);
            Ok(())
        }
        Commands::Delete { id } => {
            let entry = manager.find(&id)?.clone();
            manager.delete(&entry)?;
            println!("Deleted {}", short_id(&entry));
            Ok(())
        }
        Commands::Import { path, recursive } => {
            let report = if path.is_file() {
                manager.import_backup(&path)?
            } else {
                manager.import_from(&path, recursive)?
            };
            println!("{}", format_import_report(&report));
            Ok(())
        }
        Commands::Export { file } => {
            let count = manager.export_all(&file)?;
            println!("Exported {} entries to {}", count, file.display());
            Ok(())
        }
        Commands::Relocate { dir } => {
            let report = manager.relocate(&dir)?;
            println!("{}", format_relocate_report(&report));
            Ok(())
        }
        Commands::Stats => {
            print!("{}", format_stats(&manager.stats()));
            Ok(())
        }
        Commands::Config { .. } | Commands::Folder | Commands::Emotions => Ok(()),
    }
}

/// Apply the body and metadata options that were given, leaving the rest alone
fn apply_entry_args(entry: &mut JournalEntry, args: &EntryArgs) -> Result<(), JotterError> {
    if let Some(content) = &args.content {
        entry.set_content(content.as_str());
    }
    if let Some(path) = &args.markdown {
        let markdown = read_input(path)?;
        entry.set_rich_payload(RichText::new(markdown));
    }

    if !args.attachments.is_empty() {
        let mut markdown = match entry.rich_payload() {
            Some(rich) => rich.as_str().to_string(),
            None => entry.content().to_string(),
        };
        for path in &args.attachments {
            let data = fs::read(path).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => JotterError::NotFound(path.clone()),
                _ => JotterError::Io(e),
            })?;
            let alt = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let id = entry.add_attachment(data);
            if !markdown.is_empty() && !markdown.ends_with("\n\n") {
                markdown.push_str(if markdown.ends_with('\n') { "\n" } else { "\n\n" });
            }
            markdown.push_str(&RichText::image_markdown(id, &alt));
            markdown.push('\n');
        }
        entry.set_rich_payload(RichText::new(markdown));
    }

    if !args.emotions.is_empty() {
        entry.set_emotions(args.emotions.iter().map(String::as_str));
    }
    if let Some(value) = args.pleasantness {
        if !(0.0..=1.0).contains(&value) {
            return Err(JotterError::InvalidEntry(format!(
                "pleasantness {} is outside 0..1",
                value
            )));
        }
        entry.set_pleasantness(Some(value));
    }
    if let Some(date) = &args.date {
        entry.date = parse_date(date)?;
    }
    if !args.tags.is_empty() {
        entry.tags = args.tags.clone();
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String, JotterError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => JotterError::NotFound(path.to_path_buf()),
        _ => JotterError::Io(e),
    })
}

/// Parse `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp
fn parse_date(input: &str) -> Result<DateTime<Utc>, JotterError> {
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Ok(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .ok_or_else(|| {
            JotterError::InvalidEntry(format!(
                "Invalid date '{}': expected YYYY-MM-DD or RFC 3339",
                input
            ))
        })
}

fn parse_month(input: &str) -> Result<(), JotterError> {
    NaiveDate::parse_from_str(&format!("{}-01", input), "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| {
            JotterError::InvalidEntry(format!("Invalid month '{}': expected YYYY-MM", input))
        })
}
