//! CLI definitions using clap.

use crate::model::{
    DownloadFilter, DownloadKind, NoteFilter, ProjectFilter, UtilityFilter, UtilityKind,
};
use crate::storage::Module;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Personal automation hub: projects, notes, launchers, reminders and backups
#[derive(Parser, Debug)]
#[command(name = "hub", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store path (default: platform data dir, automate-hub/hub.db)
    #[arg(long, global = true, env = "HUB_DB")]
    pub db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the store and apply default settings
    Init,

    /// Print version information
    Version,

    /// Show record counts and backup state
    Status,

    /// Read and change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Project management
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Spreadsheets
    Sheet {
        #[command(subcommand)]
        command: SheetCommands,
    },

    /// Notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },

    /// App, site and command launchers
    Utility {
        #[command(subcommand)]
        command: UtilityCommands,
    },

    /// Saved shell commands
    Cmd {
        #[command(subcommand)]
        command: CmdCommands,
    },

    /// Reminders
    Reminder {
        #[command(subcommand)]
        command: ReminderCommands,
    },

    /// Tracked downloads
    Download {
        #[command(subcommand)]
        command: DownloadCommands,
    },

    /// Audit log
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Backups of the store
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },

    /// Empty directories (temp folders, caches)
    Cleanup {
        /// Directories to empty
        paths: Vec<PathBuf>,

        /// Also empty the system temp directory
        #[arg(long)]
        temp: bool,
    },

    /// Run scheduled jobs now: auto-backup and due reminders
    Maintenance,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Settings Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Print one setting
    Get {
        key: String,
    },

    /// Change one setting
    Set {
        key: String,
        value: String,
    },

    /// Print all settings
    List,

    /// Restore every default (custom keys are removed)
    Reset,
}

// ============================================================================
// Project Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project and its folders
    Create(ProjectCreateArgs),

    /// List projects
    List {
        /// all, favorites, or type:<name>
        #[arg(long, default_value = "all")]
        filter: ProjectFilter,

        /// Case-insensitive text search
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show project details
    Show {
        id: i64,
    },

    /// Update a project
    Update(ProjectUpdateArgs),

    /// Delete a project record (folders are kept)
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
pub struct ProjectCreateArgs {
    /// Project name
    pub name: String,

    /// Project directory; relative paths go under the default project dir
    pub path: String,

    /// Project type (general, web, python, ...)
    #[arg(long = "type")]
    pub project_type: Option<String>,

    /// Sub-folder to create (repeatable)
    #[arg(short, long = "folder")]
    pub folders: Vec<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(long, default_value = "")]
    pub tags: String,

    /// Mark as favorite
    #[arg(long)]
    pub favorite: bool,
}

#[derive(Args, Debug)]
pub struct ProjectUpdateArgs {
    pub id: i64,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long = "type")]
    pub project_type: Option<String>,

    #[arg(long)]
    pub path: Option<String>,

    /// Replace the folder list (repeatable)
    #[arg(short, long = "folder")]
    pub folders: Vec<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(long)]
    pub tags: Option<String>,

    #[arg(long)]
    pub favorite: Option<bool>,
}

// ============================================================================
// Spreadsheet Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum SheetCommands {
    /// Create a spreadsheet
    Create {
        name: String,

        /// Comma-separated column names
        #[arg(long, value_delimiter = ',', required = true)]
        headers: Vec<String>,

        /// Comma-separated row values (repeatable)
        #[arg(long = "row")]
        rows: Vec<String>,
    },

    /// List spreadsheets
    List {
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show a spreadsheet
    Show {
        id: i64,
    },

    /// Update a spreadsheet
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_delimiter = ',')]
        headers: Option<Vec<String>>,

        /// Replace all rows (repeatable)
        #[arg(long = "row")]
        rows: Vec<String>,

        /// Append a row, keeping existing ones (repeatable)
        #[arg(long = "append-row", conflicts_with = "rows")]
        append_rows: Vec<String>,
    },

    /// Delete a spreadsheet
    Delete {
        id: i64,
    },

    /// Write a spreadsheet as CSV
    Export {
        id: i64,

        /// Output file (default: <export dir>/<name>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// ============================================================================
// Note Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum NoteCommands {
    /// Create a note
    Create {
        title: String,

        #[arg(short, long, default_value = "")]
        content: String,

        #[arg(long, default_value = "")]
        tags: String,

        #[arg(long)]
        favorite: bool,
    },

    /// List notes
    List {
        /// all or favorites
        #[arg(long, default_value = "all")]
        filter: NoteFilter,

        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show a note
    Show {
        id: i64,
    },

    /// Update a note
    Update {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,

        #[arg(long)]
        tags: Option<String>,

        #[arg(long)]
        favorite: Option<bool>,
    },

    /// Delete a note
    Delete {
        id: i64,
    },

    /// Write a note as Markdown
    Export {
        id: i64,

        /// Output file (default: <export dir>/<title>.md)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// ============================================================================
// Utility Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum UtilityCommands {
    /// Add a launcher
    Add {
        name: String,

        /// app, site, or command
        #[arg(long)]
        kind: UtilityKind,

        /// Application path or site URL
        #[arg(long)]
        path: Option<String>,

        /// Command line (command utilities)
        #[arg(long)]
        command: Option<String>,

        #[arg(long)]
        favorite: bool,
    },

    /// List launchers
    List {
        /// all, favorites, app, site, or command
        #[arg(long, default_value = "all")]
        filter: UtilityFilter,

        #[arg(short, long)]
        search: Option<String>,
    },

    /// Update a launcher
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        kind: Option<UtilityKind>,

        #[arg(long)]
        path: Option<String>,

        #[arg(long)]
        command: Option<String>,

        #[arg(long)]
        favorite: Option<bool>,
    },

    /// Delete a launcher
    Delete {
        id: i64,
    },

    /// Launch it
    Run {
        id: i64,
    },
}

// ============================================================================
// Custom Command Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum CmdCommands {
    /// Save a command line
    Add {
        name: String,

        /// Shell command line
        command: String,

        #[arg(long)]
        category: Option<String>,

        #[arg(long, default_value = "")]
        tags: String,
    },

    /// List saved commands
    List {
        #[arg(long)]
        category: Option<String>,

        #[arg(short, long)]
        search: Option<String>,
    },

    /// Update a saved command
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        command: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        tags: Option<String>,
    },

    /// Delete a saved command
    Delete {
        id: i64,
    },

    /// Run it and print its output
    Run {
        id: i64,
    },
}

// ============================================================================
// Reminder Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ReminderCommands {
    /// Add a reminder
    Add {
        title: String,

        /// Due time, local: "YYYY-MM-DD HH:MM"
        #[arg(long)]
        due: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// List reminders
    List {
        /// all, upcoming, due, pending, or completed
        #[arg(long, default_value = "pending")]
        filter: String,

        #[arg(short, long)]
        search: Option<String>,
    },

    /// Update a reminder
    Update {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        due: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Remove the due time
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,

        /// Remove the description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
    },

    /// Delete a reminder
    Delete {
        id: i64,
    },

    /// Mark a reminder done
    Complete {
        id: i64,
    },

    /// Fire reminders that are due now
    Poll,
}

// ============================================================================
// Download Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum DownloadCommands {
    /// Queue a download
    Add {
        url: String,

        /// video, audio, or file
        #[arg(long, default_value = "file")]
        kind: DownloadKind,

        #[arg(long)]
        format: Option<String>,

        #[arg(long)]
        quality: Option<String>,

        /// Target directory (default: the download dir setting)
        #[arg(long)]
        save_path: Option<String>,
    },

    /// List downloads
    List {
        /// all or a status (pending, downloading, paused, ...)
        #[arg(long, default_value = "all")]
        filter: DownloadFilter,

        #[arg(short, long)]
        search: Option<String>,
    },

    /// Update metadata or progress
    Update {
        id: i64,

        #[arg(long)]
        format: Option<String>,

        #[arg(long)]
        quality: Option<String>,

        #[arg(long)]
        save_path: Option<String>,

        /// Percent complete (0-100)
        #[arg(long)]
        progress: Option<f64>,

        /// Size in bytes
        #[arg(long)]
        total_size: Option<i64>,
    },

    /// Delete a download record
    Delete {
        id: i64,
    },

    /// pending -> downloading
    Start {
        id: i64,
    },

    /// downloading -> paused
    Pause {
        id: i64,
    },

    /// paused or failed -> downloading
    Resume {
        id: i64,
    },

    /// Cancel an unfinished download
    Cancel {
        id: i64,
    },

    /// downloading -> completed
    Complete {
        id: i64,
    },

    /// downloading -> failed
    Fail {
        id: i64,
    },
}

// ============================================================================
// History Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// Show recent audit entries, newest first
    List {
        /// Only this module (projects, notes, system, ...)
        #[arg(long)]
        module: Option<Module>,

        #[arg(short, long, default_value = "50")]
        limit: u32,
    },

    /// Apply the audit retention settings now
    Prune,
}

// ============================================================================
// Backup Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum BackupCommands {
    /// Back up the store
    Create {
        /// Target directory (default: the backup_dir setting)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Replace the store with a backup (the current state is saved first)
    Restore {
        path: PathBuf,
    },

    /// List backups, newest first
    List {
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Check a backup without restoring it
    Verify {
        path: PathBuf,
    },

    /// Delete all but the newest backups
    Prune {
        #[arg(long)]
        dir: Option<PathBuf>,

        /// How many to keep (default: the backup_retention setting)
        #[arg(long)]
        keep: Option<usize>,
    },
}
