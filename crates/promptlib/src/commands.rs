//! Subcommand handlers.

use crate::cli::{BackupCommand, Command, NoteCommand};
use anyhow::{Context, bail};
use log::{debug, info};
use promptlib::config::{OnDuplicate, PromptLibConfig};
use promptlib::core::{
    DuplicateResolver, FixedResolver, NewPrompt, PromptChanges, PromptLibrary, compute_stats,
    preview,
};
use promptlib::protocol::{PromptRecord, timestamp};
use std::fs;
use std::io::Write;

/// Everything a subcommand needs besides its arguments.
pub struct Session<'a> {
    pub library: &'a PromptLibrary,
    pub config: &'a PromptLibConfig,
    /// Used when neither `--on-duplicate` nor config fixes the answer.
    pub ask: &'a dyn DuplicateResolver,
}

pub fn run(session: &Session<'_>, command: Command, out: &mut dyn Write) -> anyhow::Result<()> {
    let library = session.library;
    match command {
        Command::Add {
            title,
            content,
            model,
            code,
        } => {
            let record = library
                .add_prompt(NewPrompt {
                    title,
                    content,
                    model,
                    is_code: code.value(),
                })
                .context("failed to add prompt")?;
            writeln!(out, "{}", record.id)?;
        }
        Command::List => {
            let records = library.list().context("failed to list prompts")?;
            if records.is_empty() {
                writeln!(out, "No prompts saved.")?;
            }
            for record in &records {
                writeln!(out, "{}", summary_line(record))?;
            }
        }
        Command::Show { id } => {
            let Some(record) = library.get(&id)? else {
                bail!("prompt not found: {id}");
            };
            write_details(out, &record)?;
        }
        Command::Delete { id } => {
            if !library.delete_prompt(&id)? {
                bail!("prompt not found: {id}");
            }
            writeln!(out, "Deleted {id}")?;
        }
        Command::Edit {
            id,
            title,
            content,
            model,
            code,
        } => {
            let changes = PromptChanges {
                title,
                content,
                model,
                is_code: code.value(),
            };
            let Some(record) = library
                .update_prompt(&id, changes)
                .context("failed to edit prompt")?
            else {
                bail!("prompt not found: {id}");
            };
            writeln!(out, "{}", summary_line(&record))?;
        }
        Command::Rate { id, value } => {
            let Some(record) = library.set_rating(&id, value)? else {
                bail!("prompt not found: {id}");
            };
            writeln!(out, "Rated {id}: {}", stars(record.rating))?;
        }
        Command::Unrate { id } => {
            if library.clear_rating(&id)?.is_none() {
                bail!("prompt not found: {id}");
            }
            writeln!(out, "Cleared rating of {id}")?;
        }
        Command::Note(note) => run_note(library, note, out)?,
        Command::Export { out_dir } => {
            let dir = out_dir.unwrap_or_else(|| session.config.export.output_dir());
            let path = library
                .export_to_file(&dir)
                .with_context(|| format!("failed to export to {}", dir.display()))?;
            writeln!(out, "Exported to {}", path.display())?;
        }
        Command::Import {
            file,
            mode,
            on_duplicate,
        } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let mode = mode.map(Into::into).unwrap_or(session.config.import.mode);
            let on_duplicate: OnDuplicate = on_duplicate
                .map(Into::into)
                .unwrap_or(session.config.import.on_duplicate);
            debug!("import requested (file={}, mode={mode})", file.display());
            let fixed = on_duplicate.policy().map(FixedResolver);
            let resolver: &dyn DuplicateResolver = match fixed.as_ref() {
                Some(fixed) => fixed,
                None => session.ask,
            };
            let report = library
                .import_all(&raw, mode, resolver)
                .context("import failed")?;
            writeln!(
                out,
                "Imported {} prompt(s) ({mode}): {} added, {} overwritten, {} kept; {} total",
                report.received, report.added, report.overwritten, report.kept, report.total
            )?;
            writeln!(out, "Backup: {}", report.backup_key)?;
        }
        Command::Stats => {
            let records = library.list()?;
            let stats = compute_stats(&records);
            writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
        }
        Command::Migrate => {
            let migrated = library.migrate_legacy().context("migration failed")?;
            info!("legacy migration finished (migrated={migrated})");
            writeln!(out, "Migrated {migrated} prompt(s)")?;
        }
        Command::Backups(BackupCommand::List) => {
            let backups = library.list_backups()?;
            if backups.is_empty() {
                writeln!(out, "No backups.")?;
            }
            for backup in backups {
                writeln!(
                    out,
                    "{}  {}",
                    backup.key,
                    timestamp::to_iso(&backup.created_at)
                )?;
            }
        }
        Command::Backups(BackupCommand::Restore { key }) => {
            let restored = library
                .restore_backup(&key)
                .with_context(|| format!("failed to restore {key}"))?;
            writeln!(out, "Restored {restored} prompt(s) from {key}")?;
        }
    }
    Ok(())
}

fn run_note(library: &PromptLibrary, command: NoteCommand, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        NoteCommand::Add { id, text } => {
            let Some(note) = library.add_note(&id, &text)? else {
                bail!("prompt not found: {id}");
            };
            writeln!(out, "{}", note.id)?;
        }
        NoteCommand::Edit { id, note_id, text } => {
            if library.update_note(&id, &note_id, &text)?.is_none() {
                bail!("note not found: {id}/{note_id}");
            }
            writeln!(out, "Updated note {note_id}")?;
        }
        NoteCommand::Delete { id, note_id } => {
            if !library.delete_note(&id, &note_id)? {
                bail!("note not found: {id}/{note_id}");
            }
            writeln!(out, "Deleted note {note_id}")?;
        }
    }
    Ok(())
}

fn stars(rating: u8) -> String {
    if rating == 0 {
        return "unrated".to_string();
    }
    format!("{}/5", rating)
}

fn summary_line(record: &PromptRecord) -> String {
    format!(
        "{}  {}  [{}] {}  {}",
        record.id,
        record.title,
        record.model(),
        stars(record.rating),
        preview(&record.content)
    )
}

fn write_details(out: &mut dyn Write, record: &PromptRecord) -> std::io::Result<()> {
    writeln!(out, "{} ({})", record.title, record.id)?;
    writeln!(out, "Model:  {}", record.model())?;
    writeln!(out, "Rating: {}", stars(record.rating))?;
    if let Some(metadata) = &record.metadata {
        let estimate = metadata.token_estimate;
        writeln!(
            out,
            "Tokens: {}-{} ({} confidence)",
            estimate.min, estimate.max, estimate.confidence
        )?;
        writeln!(
            out,
            "Created: {}  Updated: {}",
            timestamp::to_iso(&metadata.created_at),
            timestamp::to_iso(&metadata.updated_at)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{}", record.content)?;
    if !record.notes.is_empty() {
        writeln!(out)?;
        writeln!(out, "Notes:")?;
        for note in &record.notes {
            writeln!(out, "- [{}] {}", note.id, note.content)?;
        }
    }
    Ok(())
}
