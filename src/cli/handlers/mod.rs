mod init;
pub use init::{CONFIG_TEMPLATE, cmd_init};

use std::io::IsTerminal;
use std::path::Path;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::state;
use crate::io::storage::FileStore;
use crate::model::prefs::Theme;
use crate::model::tag::parse_tag_list;
use crate::model::task::{Task, TaskFields, TaskId, parse_day};
use crate::ops::calendar::{MonthGrid, YearMonth};
use crate::ops::task_store::TaskStore;
use crate::ops::views::{self, View};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// One invocation's view of the data directory
struct Session {
    store: TaskStore<FileStore>,
    style: Style,
    json: bool,
    today: NaiveDate,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let data_dir = cli.data_dir.as_deref();
    let json = cli.json;
    // Init only writes config; every other command opens the store
    let session = || open_session(data_dir, json);

    match cli.command {
        Commands::Init(args) => cmd_init(args, data_dir),

        // Write commands
        Commands::Add(args) => cmd_add(&mut session()?, args),
        Commands::Edit(args) => cmd_edit(&mut session()?, args),
        Commands::Open(args) => cmd_open(&mut session()?, args),
        Commands::Done(args) => cmd_set_completed(&mut session()?, args, Some(true)),
        Commands::Undone(args) => cmd_set_completed(&mut session()?, args, Some(false)),
        Commands::Toggle(args) => cmd_set_completed(&mut session()?, args, None),
        Commands::Rm(args) => cmd_rm(&mut session()?, args),
        Commands::Reorder(args) => cmd_reorder(&mut session()?, args),
        Commands::Mv(args) => cmd_mv(&mut session()?, args),

        // Read commands
        Commands::List => show_view(&session()?, &View::Active),
        Commands::Completed => show_view(&session()?, &View::Completed),
        Commands::Tag(args) => cmd_tag(&mut session()?, args),
        Commands::Tagged => {
            let s = session()?;
            show_view(&s, &selected_tag_view(&s))
        }
        Commands::Upcoming => show_view(&session()?, &View::Upcoming),
        Commands::Day(args) => {
            let day = parse_date_arg(&args.date)?;
            show_view(&session()?, &View::Day(day))
        }
        Commands::Calendar(args) => cmd_calendar(&session()?, args),
        Commands::Stats => cmd_stats(&session()?),

        // Preferences
        Commands::Theme(args) => cmd_theme(&mut session()?, args),
        Commands::Sidebar(args) => cmd_sidebar(&mut session()?, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_session(data_dir: Option<&Path>, json: bool) -> Result<Session, Box<dyn std::error::Error>> {
    let data_dir = config_io::resolve_data_dir(data_dir)?;
    let config = config_io::read_config(&data_dir)?;
    let storage = FileStore::open(config_io::storage_path(&data_dir, &config))?;
    tracing::debug!(path = %storage.path().display(), "opened storage");

    let style = Style {
        color: config.ui.color && std::io::stdout().is_terminal(),
        date_format: config.ui.date_format,
    };
    Ok(Session {
        store: TaskStore::open(storage),
        style,
        json,
        today: Local::now().date_naive(),
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn not_found(id: TaskId) -> Box<dyn std::error::Error> {
    format!("task not found: {}", id).into()
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_day(raw).map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", raw))
}

fn selected_tag_view(s: &Session) -> View {
    View::Tagged(state::read_selected_tag(s.store.storage()))
}

fn resolve_view(s: &Session, arg: ViewArg) -> View {
    match arg {
        ViewArg::Active => View::Active,
        ViewArg::Completed => View::Completed,
        ViewArg::Upcoming => View::Upcoming,
        ViewArg::Tagged => selected_tag_view(s),
    }
}

fn show_view(s: &Session, view: &View) -> CmdResult {
    let result = view.select(s.store.tasks(), s.today);
    if s.json {
        return print_json(&view_to_json(view, result));
    }
    print_lines(&format_view(view, &result, &s.style));
    Ok(())
}

/// Report a finished mutation. JSON mode prints only the affected record;
/// otherwise a notice is followed by a fresh rendering of the chosen view.
fn after_mutation<T: Serialize>(s: &Session, notice: &str, record: &T, render: &RenderArgs) -> CmdResult {
    if s.json {
        return print_json(record);
    }
    println!("{}", notice);
    println!();
    show_view(s, &resolve_view(s, render.view))
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(s: &mut Session, args: AddArgs) -> CmdResult {
    let mut fields = TaskFields::new(args.title);
    if let Some(desc) = args.desc {
        fields = fields.with_description(desc);
    }
    if let Some(due) = args.due.as_deref() {
        fields = fields.with_due_date(parse_date_arg(due)?);
    }
    if let Some(tags) = args.tags.as_deref() {
        fields = fields.with_tags(parse_tag_list(tags));
    }

    let task = s.store.create(fields)?.clone();
    after_mutation(s, &format!("Task created: {}", task.id), &task, &args.render)
}

fn cmd_edit(s: &mut Session, args: EditArgs) -> CmdResult {
    let snapshot = state::peek_editing_task(s.store.storage());
    let id = match (args.id, snapshot) {
        (Some(id), _) => id,
        (None, Some(task)) => task.id,
        (None, None) => {
            return Err("no task open for editing (run `td open <id>` or pass an ID)".into());
        }
    };

    let mut fields = s.store.get(id).ok_or_else(|| not_found(id))?.fields();
    if let Some(title) = args.title {
        fields.title = title;
    }
    if let Some(desc) = args.desc {
        fields.description = Some(desc);
    }
    if args.clear_due {
        fields.due_date = None;
    } else if let Some(due) = args.due.as_deref() {
        fields.due_date = Some(parse_date_arg(due)?);
    }
    if let Some(tags) = args.tags.as_deref() {
        fields.tags = parse_tag_list(tags);
    }

    let task = s
        .store
        .update(id, fields)?
        .cloned()
        .ok_or_else(|| not_found(id))?;
    // A failed edit leaves the snapshot open for a retry
    state::take_editing_task(s.store.storage_mut())?;
    after_mutation(s, &format!("Task updated: {}", task.id), &task, &args.render)
}

fn cmd_open(s: &mut Session, args: IdArgs) -> CmdResult {
    let task = s.store.get(args.id).cloned().ok_or_else(|| not_found(args.id))?;
    state::write_editing_task(s.store.storage_mut(), &task)?;
    if s.json {
        return print_json(&task);
    }
    println!("Editing task {}", task.id);
    print_lines(&format_task_block(&task, &s.style));
    println!("Run `td edit` with the fields to change.");
    Ok(())
}

/// `value` of `None` toggles.
fn cmd_set_completed(s: &mut Session, args: MutateArgs, value: Option<bool>) -> CmdResult {
    let result = match value {
        Some(v) => s.store.set_completed(args.id, v)?,
        None => s.store.toggle(args.id)?,
    };
    let task = result.cloned().ok_or_else(|| not_found(args.id))?;
    let notice = if task.completed {
        "Task completed and moved to Completed"
    } else {
        "Task moved back to Tasks"
    };
    after_mutation(s, notice, &task, &args.render)
}

fn cmd_rm(s: &mut Session, args: MutateArgs) -> CmdResult {
    let deleted = s.store.delete(args.id)?;
    if !deleted {
        eprintln!("note: no task with id {}", args.id);
    }
    let notice = if deleted { "Task deleted" } else { "Nothing deleted" };
    let record = DeletedJson {
        id: args.id,
        deleted,
    };
    after_mutation(s, notice, &record, &args.render)
}

fn cmd_reorder(s: &mut Session, args: ReorderArgs) -> CmdResult {
    let changed = s.store.reorder(&args.ids)?;
    let notice = if changed { "Tasks reordered" } else { "Order unchanged" };
    let order: Vec<TaskId> = s.store.tasks().iter().map(|t| t.id).collect();
    after_mutation(s, notice, &order, &args.render)
}

fn cmd_mv(s: &mut Session, args: MvArgs) -> CmdResult {
    if !s.store.move_to(args.id, args.index)? {
        return Err(format!("no active task with id {}", args.id).into());
    }
    let order: Vec<TaskId> = views::active_tasks(s.store.tasks())
        .iter()
        .map(|t| t.id)
        .collect();
    after_mutation(s, &format!("Task {} moved", args.id), &order, &args.render)
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_tag(s: &mut Session, args: TagArgs) -> CmdResult {
    let tag = args.tag.trim();
    if tag.is_empty() {
        return Err("tag must not be empty".into());
    }
    state::write_selected_tag(s.store.storage_mut(), tag)?;
    show_view(s, &View::Tagged(Some(tag.to_string())))
}

fn cmd_calendar(s: &Session, args: CalendarArgs) -> CmdResult {
    let selected = state::date_param(args.date.as_deref());
    let month = match args.month.as_deref() {
        Some(raw) => YearMonth::parse(raw)
            .ok_or_else(|| format!("invalid month '{}' (expected YYYY-MM)", raw))?,
        None => YearMonth::containing(selected.unwrap_or(s.today)),
    };

    let tasks = s.store.tasks();
    let grid = MonthGrid::new(tasks, month).with_today(s.today);
    let selection: Option<(NaiveDate, Vec<&Task>)> =
        selected.map(|day| (day, views::tasks_for_date(tasks, day)));

    if s.json {
        return print_json(&calendar_to_json(grid, selection));
    }
    print_lines(&format_calendar(grid));
    if let Some((day, due)) = selection {
        println!();
        print_lines(&format_selected_day(day, &due, &s.style));
    }
    Ok(())
}

fn cmd_stats(s: &Session) -> CmdResult {
    let counts = views::task_counts(s.store.tasks());
    if s.json {
        return print_json(&stats_to_json(&counts));
    }
    print_lines(&format_stats(&counts));
    Ok(())
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

fn cmd_theme(s: &mut Session, args: ThemeArgs) -> CmdResult {
    let current = state::read_theme(s.store.storage());
    let theme = match args.action {
        None => current,
        Some(ThemeAction::Light) => Theme::Light,
        Some(ThemeAction::Dark) => Theme::Dark,
        Some(ThemeAction::Toggle) => current.toggled(),
    };
    if args.action.is_some() {
        state::write_theme(s.store.storage_mut(), theme)?;
    }
    if s.json {
        return print_json(&serde_json::json!({ "theme": theme.as_str() }));
    }
    println!("{}", theme);
    Ok(())
}

fn cmd_sidebar(s: &mut Session, args: SidebarArgs) -> CmdResult {
    let current = state::read_sidebar_collapsed(s.store.storage());
    let collapsed = match args.action {
        None => current,
        Some(SidebarAction::Collapse) => true,
        Some(SidebarAction::Expand) => false,
        Some(SidebarAction::Toggle) => !current,
    };
    if args.action.is_some() {
        state::write_sidebar_collapsed(s.store.storage_mut(), collapsed)?;
    }
    if s.json {
        return print_json(&serde_json::json!({ "collapsed": collapsed }));
    }
    println!("{}", if collapsed { "collapsed" } else { "expanded" });
    Ok(())
}
