//! Command-line definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use promptlib_config::OnDuplicate;
use promptlib_protocol::ImportMode;
use std::path::PathBuf;

/// Local prompt library with ratings, notes and JSON import/export.
#[derive(Debug, Parser)]
#[command(name = "promptlib", version)]
pub struct Cli {
    /// Optional path to a promptlib.json5 config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Data directory override
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save a new prompt
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        model: String,
        #[command(flatten)]
        code: CodeFlag,
    },
    /// List prompts, newest first
    List,
    /// Show one prompt with its notes and metadata
    Show { id: String },
    /// Delete a prompt
    Delete { id: String },
    /// Edit title, content or model of a prompt
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[command(flatten)]
        code: CodeFlag,
    },
    /// Rate a prompt from 0 to 5; out-of-range values are clamped
    Rate {
        id: String,
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
    /// Clear a prompt's rating
    Unrate { id: String },
    /// Manage notes
    #[command(subcommand)]
    Note(NoteCommand),
    /// Write all prompts to an export file
    Export {
        /// Output directory (defaults to export.dir from config)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Import prompts from an export file
    Import {
        file: PathBuf,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        #[arg(long, value_enum)]
        on_duplicate: Option<OnDuplicateArg>,
    },
    /// Print library statistics
    Stats,
    /// Add metadata to prompts saved before metadata tracking
    Migrate,
    /// Manage import backups
    #[command(subcommand)]
    Backups(BackupCommand),
}

#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    /// Attach a note to a prompt
    Add { id: String, text: String },
    /// Replace a note's text
    Edit {
        id: String,
        note_id: String,
        text: String,
    },
    /// Remove a note
    Delete { id: String, note_id: String },
}

#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// List import backups, newest first
    List,
    /// Replace the library with a backup
    Restore { key: String },
}

/// `--code` / `--no-code`; neither lets the content decide.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct CodeFlag {
    /// Estimate tokens as code
    #[arg(long, conflicts_with = "no_code")]
    pub code: bool,
    /// Estimate tokens as prose
    #[arg(long)]
    pub no_code: bool,
}

impl CodeFlag {
    pub fn value(self) -> Option<bool> {
        match (self.code, self.no_code) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Merge,
    Replace,
}

impl From<ModeArg> for ImportMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Merge => ImportMode::Merge,
            ModeArg::Replace => ImportMode::Replace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OnDuplicateArg {
    Ask,
    Keep,
    Overwrite,
}

impl From<OnDuplicateArg> for OnDuplicate {
    fn from(value: OnDuplicateArg) -> Self {
        match value {
            OnDuplicateArg::Ask => OnDuplicate::Ask,
            OnDuplicateArg::Keep => OnDuplicate::Keep,
            OnDuplicateArg::Overwrite => OnDuplicate::Overwrite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_add_with_code_flag() {
        let cli = Cli::try_parse_from([
            "promptlib", "add", "--title", "T", "--content", "C", "--model", "gpt-4", "--code",
        ])
        .expect("parse");
        let Command::Add { title, code, .. } = cli.command else {
            panic!("expected add");
        };
        assert_eq!(title, "T");
        assert_eq!(code.value(), Some(true));
    }

    #[test]
    fn code_flags_conflict() {
        let result = Cli::try_parse_from([
            "promptlib", "edit", "abc", "--code", "--no-code",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rate_accepts_negative_values() {
        let cli = Cli::try_parse_from(["promptlib", "rate", "abc", "-2"]).expect("parse");
        assert!(matches!(cli.command, Command::Rate { value: -2, .. }));
    }

    #[test]
    fn import_options_and_global_flags() {
        let cli = Cli::try_parse_from([
            "promptlib",
            "import",
            "export.json",
            "--mode",
            "replace",
            "--on-duplicate",
            "overwrite",
            "--data-dir",
            "/tmp/data",
            "-v",
        ])
        .expect("parse");
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/data")));
        let Command::Import {
            mode, on_duplicate, ..
        } = cli.command
        else {
            panic!("expected import");
        };
        assert_eq!(mode.map(ImportMode::from), Some(ImportMode::Replace));
        assert_eq!(
            on_duplicate.map(OnDuplicate::from),
            Some(OnDuplicate::Overwrite)
        );
    }

    #[test]
    fn note_subcommands_parse() {
        let cli = Cli::try_parse_from(["promptlib", "note", "edit", "p1", "n1", "new text"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Command::Note(NoteCommand::Edit { ref text, .. }) if text == "new text"
        ));
    }
}
