use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "td", about = concat!("taskdeck v", env!("CARGO_PKG_VERSION"), " - tasks, tags and a calendar"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a config.toml template into the data directory
    Init(InitArgs),
    /// Create a task
    Add(AddArgs),
    /// Edit a task (without an ID, edits the task opened with `open`)
    Edit(EditArgs),
    /// Open a task for editing
    Open(IdArgs),
    /// Mark a task completed
    Done(MutateArgs),
    /// Mark a task not completed
    Undone(MutateArgs),
    /// Flip a task's completion
    Toggle(MutateArgs),
    /// Delete a task
    Rm(MutateArgs),
    /// Reorder tasks to the given ID sequence
    Reorder(ReorderArgs),
    /// Move an active task to a position in the active list
    Mv(MvArgs),
    /// List active tasks
    List,
    /// List completed tasks
    Completed,
    /// Select a tag and list its active tasks
    Tag(TagArgs),
    /// List active tasks for the selected tag
    Tagged,
    /// List tasks due after tomorrow, by day
    Upcoming,
    /// List tasks due on a day
    Day(DayArgs),
    /// Show a month calendar
    Calendar(CalendarArgs),
    /// Show completed/active counts
    Stats,
    /// Show or change the theme
    Theme(ThemeArgs),
    /// Show or change the sidebar state
    Sidebar(SidebarArgs),
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Description
    #[arg(long)]
    pub desc: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Comma-separated tags
    #[arg(long)]
    pub tags: Option<String>,
    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID (default: the task opened with `open`)
    pub id: Option<u64>,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New description (empty string clears it)
    #[arg(long)]
    pub desc: Option<String>,
    /// New due date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,
    /// New comma-separated tags (empty string clears them)
    #[arg(long)]
    pub tags: Option<String>,
    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Args)]
pub struct IdArgs {
    /// Task ID
    pub id: u64,
}

#[derive(Args)]
pub struct MutateArgs {
    /// Task ID
    pub id: u64,
    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Args)]
pub struct ReorderArgs {
    /// Task IDs in the new order; tasks not named keep their place
    #[arg(required = true)]
    pub ids: Vec<u64>,
    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task ID
    pub id: u64,
    /// New 0-based position in the active list
    pub index: usize,
    #[command(flatten)]
    pub render: RenderArgs,
}

/// Which view to show after a change
#[derive(Args)]
pub struct RenderArgs {
    #[arg(long, value_enum, default_value_t = ViewArg::Active)]
    pub view: ViewArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    Active,
    Completed,
    Upcoming,
    Tagged,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TagArgs {
    /// Tag to select
    pub tag: String,
}

#[derive(Args)]
pub struct DayArgs {
    /// Day (YYYY-MM-DD)
    pub date: String,
}

#[derive(Args)]
pub struct CalendarArgs {
    /// Month to show (YYYY-MM); default: the month of --date, else this month
    #[arg(long)]
    pub month: Option<String>,
    /// Day to select (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args)]
pub struct ThemeArgs {
    pub action: Option<ThemeAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeAction {
    Light,
    Dark,
    Toggle,
}

#[derive(Args)]
pub struct SidebarArgs {
    pub action: Option<SidebarAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SidebarAction {
    Collapse,
    Expand,
    Toggle,
}
