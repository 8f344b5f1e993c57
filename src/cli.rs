use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::clock::Clock;
use crate::config::Config;
use crate::models::{
    PlannerTask, Project, TaskPriority, TaskStatus, Theme, TimerMode, TimerState, WorkSession,
};
use crate::planner::{NewTask, Planner, StatusUpdate, TaskUpdate};
use crate::reports::{self, ReportRange};
use crate::sessions::{self, SessionLog, SessionUpdate};
use crate::storage::{KeyValueStore, Storage, StorageError};
use crate::timer::{Timer, TimerEvent};
use crate::utils::{format_duration, format_hms, parse_date, parse_datetime};

#[derive(Parser)]
#[command(name = "deepwork")]
#[command(about = "Deep Work - focus timer, session log and task planner")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Control the focus timer
    Timer {
        #[command(subcommand)]
        action: TimerCommand,
    },
    /// Browse and edit recorded work sessions
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectCommand,
    },
    /// Manage planner tasks
    Task {
        #[command(subcommand)]
        action: TaskCommand,
    },
    /// Manage the status pipeline
    Status {
        #[command(subcommand)]
        action: StatusCommand,
    },
    /// Manage saved task views
    View {
        #[command(subcommand)]
        action: ViewCommand,
    },
    /// Today, week and month totals
    Stats {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Time report over a range
    Report {
        #[arg(long, value_enum, default_value_t = RangeArg::Week)]
        range: RangeArg,
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Custom range start (YYYY-MM-DD), requires --to
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Custom range end (YYYY-MM-DD), requires --from
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Only count these projects ("unassigned" for sessions without one)
        #[arg(long = "project")]
        projects: Vec<String>,
    },
    /// Show or set the colour theme
    Theme {
        #[arg(value_enum)]
        theme: Option<ThemeArg>,
    },
}

#[derive(Subcommand)]
pub enum TimerCommand {
    /// Start a focus session
    Start {
        /// What you are working on
        #[arg(long)]
        task: Option<String>,
        /// Project id, repeatable
        #[arg(long = "project")]
        projects: Vec<String>,
        /// Count down from this many minutes
        #[arg(long)]
        countdown: Option<u32>,
        /// Continue an earlier session (shares its group)
        #[arg(long = "continue")]
        continue_from: Option<String>,
        /// Link a planner task
        #[arg(long)]
        planner_task: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Pause,
    Resume,
    /// Stop and record the session
    Stop,
    /// Drop elapsed time but keep task details
    Reset,
    /// Drop everything
    Discard,
    Status {
        /// Keep refreshing once per second while running
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Subcommand)]
pub enum SessionCommand {
    List {
        /// Only sessions on this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        task: Option<String>,
        /// Project id, repeatable; replaces the current list
        #[arg(long = "project")]
        projects: Vec<String>,
        /// New start (RFC 3339 or "YYYY-MM-DD HH:MM")
        #[arg(long)]
        start: Option<String>,
        /// New end (RFC 3339 or "YYYY-MM-DD HH:MM")
        #[arg(long)]
        end: Option<String>,
        /// Replace notes; an empty string clears them
        #[arg(long)]
        notes: Option<String>,
    },
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Sessions grouped by continuation chain
    Groups,
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    List,
    Add {
        name: String,
        #[arg(long, default_value = "hsl(199, 89%, 58%)")]
        color: String,
    },
    Rename {
        id: String,
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum TaskCommand {
    Add {
        title: String,
        /// Status id, defaults to the first status
        #[arg(long)]
        status: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Scheduled date (YYYY-MM-DD)
        #[arg(long)]
        scheduled: Option<String>,
        #[arg(long = "project")]
        projects: Vec<String>,
        #[arg(long)]
        description: Option<String>,
    },
    List {
        /// View id, defaults to the default view
        #[arg(long)]
        view: Option<String>,
    },
    /// Tasks grouped by status
    Board,
    /// Move a task to a position within a status
    Move {
        id: String,
        status: String,
        index: usize,
    },
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        /// Due date (YYYY-MM-DD), "none" clears it
        #[arg(long)]
        due: Option<String>,
        /// Scheduled date (YYYY-MM-DD), "none" clears it
        #[arg(long)]
        scheduled: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: String },
    Stats,
}

#[derive(Subcommand)]
pub enum StatusCommand {
    List,
    Add {
        name: String,
        #[arg(long, default_value = "hsl(220, 9%, 46%)")]
        color: String,
        /// Tasks in this status count as completed
        #[arg(long)]
        done: bool,
    },
    Rename { id: String, name: String },
    /// Mark a status as a done status or not
    Done {
        id: String,
        #[arg(action = ArgAction::Set)]
        value: bool,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ViewCommand {
    List,
    Delete { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
    Urgent,
}

impl From<PriorityArg> for TaskPriority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Low => TaskPriority::Low,
            PriorityArg::Medium => TaskPriority::Medium,
            PriorityArg::High => TaskPriority::High,
            PriorityArg::Urgent => TaskPriority::Urgent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RangeArg {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Refused: {0}")]
    Refused(String),
}

fn parse_day(input: &str) -> Result<NaiveDate, CliError> {
    parse_date(input)
        .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", input, e)))
}

fn parse_optional_day(input: Option<String>) -> Result<Option<NaiveDate>, CliError> {
    input.as_deref().map(parse_day).transpose()
}

/// Date edit argument: `none` clears the field.
fn parse_day_edit(input: Option<String>) -> Result<Option<Option<NaiveDate>>, CliError> {
    match input.as_deref() {
        None => Ok(None),
        Some("none") => Ok(Some(None)),
        Some(day) => parse_day(day).map(|d| Some(Some(d))),
    }
}

fn parse_instant(input: Option<String>) -> Result<Option<chrono::DateTime<chrono::Utc>>, CliError> {
    input
        .map(|text| {
            parse_datetime(&text)
                .ok_or_else(|| CliError::DateParseError(format!("Invalid time '{}'", text)))
        })
        .transpose()
}

fn state_label(state: TimerState) -> &'static str {
    match state {
        TimerState::Idle => "idle",
        TimerState::Running => "running",
        TimerState::Paused => "paused",
    }
}

fn require_status(statuses: &[TaskStatus], id: &str) -> Result<(), CliError> {
    if statuses.iter().any(|s| s.id == id) {
        Ok(())
    } else {
        Err(CliError::NotFound(format!("status '{}'", id)))
    }
}

/// Dispatch a parsed command against the given storage and clock
pub fn run<S: KeyValueStore, C: Clock>(
    command: Commands,
    storage: &Storage<S>,
    clock: &C,
    config: &Config,
) -> Result<(), CliError> {
    match command {
        Commands::Timer { action } => handle_timer(action, storage, clock, config),
        Commands::Session { action } => handle_session(action, storage, clock),
        Commands::Project { action } => handle_project(action, storage),
        Commands::Task { action } => handle_task(action, storage, clock),
        Commands::Status { action } => handle_status(action, storage, clock),
        Commands::View { action } => handle_view(action, storage, clock),
        Commands::Stats { date } => handle_stats(date, storage, clock),
        Commands::Report { range, date, from, to, projects } => {
            handle_report(range, date, from, to, projects, storage, clock)
        }
        Commands::Theme { theme } => handle_theme(theme, storage),
    }
}

fn print_timer<S: KeyValueStore, C: Clock>(timer: &Timer<'_, S, C>, storage: &Storage<S>) {
    let config = timer.config();
    let projects: Vec<Project> = storage.load();
    let mode = match config.mode {
        TimerMode::Countdown => format!("countdown {}", format_hms(config.duration)),
        TimerMode::Stopwatch => "stopwatch".to_string(),
    };
    println!("{} [{}] {}", timer.formatted_display(), state_label(config.state), mode);
    if let Some(started) = timer.start_time() {
        println!("Started: {}", started.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"));
    }
    if !config.task_name.is_empty() {
        println!("Task: {}", config.task_name);
    }
    if !config.project_ids.is_empty() {
        let names: Vec<&str> = config
            .project_ids
            .iter()
            .map(|id| sessions::project_label(&projects, id))
            .collect();
        println!("Projects: {}", names.join(", "));
    }
    if let Some(task_id) = timer.planner_task_id() {
        println!("Planner task: {}", task_id);
    }
    if timer.countdown_complete() {
        println!("Countdown complete");
    }
}

/// Handle the timer subcommands
pub fn handle_timer<S: KeyValueStore, C: Clock>(
    action: TimerCommand,
    storage: &Storage<S>,
    clock: &C,
    config: &Config,
) -> Result<(), CliError> {
    let mut timer = Timer::restore(storage, clock);

    match action {
        TimerCommand::Start { task, projects, countdown, continue_from, planner_task, notes } => {
            if timer.state() != TimerState::Idle {
                return Err(CliError::Refused(format!(
                    "timer is already {}",
                    state_label(timer.state())
                )));
            }
            if let Some(session_id) = continue_from.as_deref() {
                if SessionLog::new(storage).session(session_id).is_none() {
                    return Err(CliError::NotFound(format!("session '{}'", session_id)));
                }
            }

            let mode = if countdown.is_some() { TimerMode::Countdown } else { config.default_mode };
            timer.set_mode(mode);
            if mode == TimerMode::Countdown {
                let seconds = countdown
                    .map(|minutes| i64::from(minutes) * 60)
                    .unwrap_or_else(|| config.default_countdown_seconds());
                timer.set_duration(seconds);
            }

            if let Some(task_id) = planner_task {
                let linked = Planner::new(storage, clock)
                    .task(&task_id)
                    .ok_or_else(|| CliError::NotFound(format!("task '{}'", task_id)))?;
                if task.is_none() {
                    timer.set_task_name(linked.title.clone());
                }
                if projects.is_empty() {
                    timer.set_project_ids(linked.project_ids.clone());
                }
                timer.set_planner_task_id(Some(linked.id));
            }
            if let Some(task) = task {
                timer.set_task_name(task);
            }
            if !projects.is_empty() {
                timer.set_project_ids(projects);
            }
            if let Some(notes) = notes {
                timer.set_notes(notes);
            }

            timer.start(continue_from.as_deref())?;
            print_timer(&timer, storage);
        }
        TimerCommand::Pause => {
            if !timer.pause() {
                return Err(CliError::Refused("timer is not running".to_string()));
            }
            print_timer(&timer, storage);
        }
        TimerCommand::Resume => {
            if !timer.resume() {
                return Err(CliError::Refused("timer is not paused".to_string()));
            }
            print_timer(&timer, storage);
        }
        TimerCommand::Stop => match timer.stop()? {
            Some(session) => println!(
                "Session recorded: {} ({}) (ID: {})",
                session.task_name,
                format_duration(session.duration),
                session.id
            ),
            None => println!("No time elapsed, nothing recorded"),
        },
        TimerCommand::Reset => {
            timer.reset();
            println!("Timer reset");
        }
        TimerCommand::Discard => {
            timer.discard();
            println!("Timer discarded");
        }
        TimerCommand::Status { watch } => {
            timer.tick();
            print_timer(&timer, storage);
            if watch {
                while timer.state() == TimerState::Running {
                    thread::sleep(Duration::from_secs(1));
                    if let Some(TimerEvent::CountdownComplete) = timer.tick() {
                        println!();
                        println!("Countdown complete");
                    }
                    print!("\r{}", timer.formatted_display());
                    if let Err(e) = io::stdout().flush() {
                        log::debug!("failed to flush stdout: {}", e);
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_session(session: &WorkSession, projects: &[Project]) {
    let names: Vec<&str> = session
        .project_ids
        .iter()
        .map(|id| sessions::project_label(projects, id))
        .collect();
    println!(
        "  {}  {}-{}  {:>8}  {}{}",
        session.id,
        session.start_time.with_timezone(&chrono::Local).format("%H:%M"),
        session.end_time.with_timezone(&chrono::Local).format("%H:%M"),
        format_duration(session.duration),
        session.task_name,
        if names.is_empty() { String::new() } else { format!(" [{}]", names.join(", ")) }
    );
}

/// Handle the session subcommands
pub fn handle_session<S: KeyValueStore, C: Clock>(
    action: SessionCommand,
    storage: &Storage<S>,
    clock: &C,
) -> Result<(), CliError> {
    let log = SessionLog::new(storage);

    match action {
        SessionCommand::List { date } => {
            let projects = log.projects();
            let all = match parse_optional_day(date)? {
                Some(day) => log.sessions_on(day),
                None => log.sessions(),
            };
            if all.is_empty() {
                println!("No sessions");
            }
            for day in sessions::history_by_day(&all) {
                println!("{}  {}", day.date.format("%a %Y-%m-%d"), format_duration(day.total_seconds));
                for session in &day.sessions {
                    print_session(session, &projects);
                }
            }
        }
        SessionCommand::Edit { id, task, projects, start, end, notes } => {
            if log.session(&id).is_none() {
                return Err(CliError::NotFound(format!("session '{}'", id)));
            }
            let update = SessionUpdate {
                task_name: task,
                project_ids: if projects.is_empty() { None } else { Some(projects) },
                notes: notes.map(|n| Some(n).filter(|n| !n.is_empty())),
                start_time: parse_instant(start)?,
                end_time: parse_instant(end)?,
            };
            match log.update_session(&id, update)? {
                Some(session) => {
                    println!("Session updated successfully (ID: {})", session.id);
                    print_session(&session, &log.projects());
                }
                None => return Err(CliError::Refused("end time precedes start time".to_string())),
            }
        }
        SessionCommand::Delete { ids } => {
            let removed = log.delete_sessions(&ids)?;
            println!("Deleted {} session(s)", removed);
        }
        SessionCommand::Groups => {
            let projects = log.projects();
            let today = clock.today();
            for group in sessions::group_sessions(&log.sessions()) {
                println!(
                    "{} - {} session(s), {}{}",
                    group.task_name,
                    group.sessions.len(),
                    format_duration(group.total_seconds),
                    if group.sessions.iter().any(|s| s.date == today) { " (today)" } else { "" }
                );
                for session in &group.sessions {
                    print_session(session, &projects);
                }
            }
        }
    }

    Ok(())
}

/// Handle the project subcommands
pub fn handle_project<S: KeyValueStore>(
    action: ProjectCommand,
    storage: &Storage<S>,
) -> Result<(), CliError> {
    let log = SessionLog::new(storage);

    match action {
        ProjectCommand::List => {
            for project in log.projects() {
                println!("{}  {}  {}", project.id, project.name, project.color);
            }
        }
        ProjectCommand::Add { name, color } => {
            let project = log.add_project(name, color)?;
            println!("Project created successfully (ID: {})", project.id);
        }
        ProjectCommand::Rename { id, name, color } => {
            let current = log
                .projects()
                .into_iter()
                .find(|p| p.id == id)
                .ok_or_else(|| CliError::NotFound(format!("project '{}'", id)))?;
            log.update_project(&id, name, color.unwrap_or(current.color))?;
            println!("Project updated successfully (ID: {})", id);
        }
        ProjectCommand::Delete { id } => {
            if !log.delete_project(&id)? {
                return Err(CliError::NotFound(format!("project '{}'", id)));
            }
            println!("Project deleted (ID: {})", id);
        }
    }

    Ok(())
}

fn print_task(task: &PlannerTask, statuses: &[TaskStatus]) {
    let status = statuses
        .iter()
        .find(|s| s.id == task.status_id)
        .map(|s| s.name.as_str())
        .unwrap_or("?");
    let mut line = format!("  {}  [{}] {}", task.id, status, task.title);
    if let Some(priority) = task.priority {
        line.push_str(&format!(" !{}", priority.as_str()));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", due));
    }
    if let Some(scheduled) = task.scheduled_date {
        line.push_str(&format!(" on {}", scheduled));
    }
    println!("{}", line);
}

/// Handle the task subcommands
pub fn handle_task<S: KeyValueStore, C: Clock>(
    action: TaskCommand,
    storage: &Storage<S>,
    clock: &C,
) -> Result<(), CliError> {
    let planner = Planner::new(storage, clock);

    match action {
        TaskCommand::Add { title, status, priority, due, scheduled, projects, description } => {
            let statuses = planner.statuses();
            let status_id = match status {
                Some(id) => {
                    require_status(&statuses, &id)?;
                    id
                }
                None => statuses
                    .first()
                    .map(|s| s.id.clone())
                    .ok_or_else(|| CliError::NotFound("any status".to_string()))?,
            };
            let task = planner.create_task(NewTask {
                title,
                description,
                status_id,
                priority: priority.map(TaskPriority::from),
                due_date: parse_optional_day(due)?,
                scheduled_date: parse_optional_day(scheduled)?,
                project_ids: projects,
            })?;
            println!("Task created successfully (ID: {})", task.id);
        }
        TaskCommand::List { view } => {
            let view = match view {
                Some(id) => planner
                    .view(&id)
                    .ok_or_else(|| CliError::NotFound(format!("view '{}'", id)))?,
                None => planner
                    .default_view()
                    .ok_or_else(|| CliError::NotFound("default view".to_string()))?,
            };
            let statuses = planner.statuses();
            println!("{}", view.name);
            for task in planner.tasks_for_view(&view) {
                print_task(&task, &statuses);
            }
        }
        TaskCommand::Board => {
            let statuses = planner.statuses();
            for column in planner.tasks_by_status(None) {
                println!("{} ({})", column.status.name, column.tasks.len());
                for task in &column.tasks {
                    print_task(task, &statuses);
                }
            }
        }
        TaskCommand::Move { id, status, index } => {
            require_status(&planner.statuses(), &status)?;
            if !planner.reorder_task(&id, &status, index)? {
                return Err(CliError::NotFound(format!("task '{}'", id)));
            }
            println!("Task moved (ID: {})", id);
        }
        TaskCommand::Update { id, title, status, priority, due, scheduled, description } => {
            if let Some(status) = &status {
                require_status(&planner.statuses(), status)?;
            }
            let update = TaskUpdate {
                title,
                description: description.map(|d| Some(d).filter(|d| !d.is_empty())),
                status_id: status,
                priority: priority.map(|p| Some(TaskPriority::from(p))),
                due_date: parse_day_edit(due)?,
                scheduled_date: parse_day_edit(scheduled)?,
                ..Default::default()
            };
            if planner.update_task(&id, update)?.is_none() {
                return Err(CliError::NotFound(format!("task '{}'", id)));
            }
            println!("Task updated successfully (ID: {})", id);
        }
        TaskCommand::Delete { id } => {
            if !planner.delete_task(&id)? {
                return Err(CliError::NotFound(format!("task '{}'", id)));
            }
            println!("Task deleted (ID: {})", id);
        }
        TaskCommand::Stats => {
            let stats = planner.stats();
            println!("Total:           {}", stats.total);
            println!("Completed:       {}", stats.completed);
            println!("Pending:         {}", stats.pending);
            println!("Scheduled today: {}", stats.scheduled_today);
            println!("Overdue:         {}", stats.overdue);
        }
    }

    Ok(())
}

/// Handle the status subcommands
pub fn handle_status<S: KeyValueStore, C: Clock>(
    action: StatusCommand,
    storage: &Storage<S>,
    clock: &C,
) -> Result<(), CliError> {
    let planner = Planner::new(storage, clock);

    match action {
        StatusCommand::List => {
            for status in planner.statuses() {
                println!(
                    "{}  {}{}",
                    status.id,
                    status.name,
                    if status.is_done { " (done)" } else { "" }
                );
            }
        }
        StatusCommand::Add { name, color, done } => {
            let status = planner.create_status(name, color, done)?;
            println!("Status created successfully (ID: {})", status.id);
        }
        StatusCommand::Rename { id, name } => {
            let update = StatusUpdate { name: Some(name), ..Default::default() };
            if planner.update_status(&id, update)?.is_none() {
                return Err(CliError::NotFound(format!("status '{}'", id)));
            }
            println!("Status updated successfully (ID: {})", id);
        }
        StatusCommand::Done { id, value } => {
            let update = StatusUpdate { is_done: Some(value), ..Default::default() };
            if planner.update_status(&id, update)?.is_none() {
                return Err(CliError::NotFound(format!("status '{}'", id)));
            }
            println!("Status updated successfully (ID: {})", id);
        }
        StatusCommand::Delete { id } => {
            require_status(&planner.statuses(), &id)?;
            if !planner.delete_status(&id)? {
                return Err(CliError::Refused("cannot delete the last status".to_string()));
            }
            println!("Status deleted (ID: {})", id);
        }
    }

    Ok(())
}

/// Handle the view subcommands
pub fn handle_view<S: KeyValueStore, C: Clock>(
    action: ViewCommand,
    storage: &Storage<S>,
    clock: &C,
) -> Result<(), CliError> {
    let planner = Planner::new(storage, clock);

    match action {
        ViewCommand::List => {
            for view in planner.views() {
                println!(
                    "{}  {}{}",
                    view.id,
                    view.name,
                    if view.is_default { " (default)" } else { "" }
                );
            }
        }
        ViewCommand::Delete { id } => {
            if planner.view(&id).is_none() {
                return Err(CliError::NotFound(format!("view '{}'", id)));
            }
            if !planner.delete_view(&id)? {
                return Err(CliError::Refused(
                    "the default view and the last view cannot be deleted".to_string(),
                ));
            }
            println!("View deleted (ID: {})", id);
        }
    }

    Ok(())
}

/// Handle the stats command
pub fn handle_stats<S: KeyValueStore, C: Clock>(
    date: Option<String>,
    storage: &Storage<S>,
    clock: &C,
) -> Result<(), CliError> {
    let day = parse_optional_day(date)?.unwrap_or_else(|| clock.today());
    let log = SessionLog::new(storage);
    let all = log.sessions();

    println!("Today:      {}", format_duration(sessions::today_total(&all, day)));
    println!("This week:  {}", format_duration(sessions::week_total(&all, day)));
    println!("This month: {}", format_duration(sessions::month_total(&all, day)));
    println!();
    for total in sessions::daily_breakdown(&all, day) {
        println!("  {:<10} {:>5.1}h", total.day_name, total.hours);
    }
    println!();
    for project in sessions::month_project_breakdown(&all, &log.projects(), day) {
        println!("  {:<14} {:>5.1}h", project.project_name, project.hours);
    }

    Ok(())
}

/// Handle the report command
pub fn handle_report<S: KeyValueStore, C: Clock>(
    range: RangeArg,
    date: Option<String>,
    from: Option<String>,
    to: Option<String>,
    projects: Vec<String>,
    storage: &Storage<S>,
    clock: &C,
) -> Result<(), CliError> {
    let anchor = parse_optional_day(date)?.unwrap_or_else(|| clock.today());
    let range = match (parse_optional_day(from)?, parse_optional_day(to)?) {
        (Some(start), Some(end)) => ReportRange::Custom { start, end },
        _ => match range {
            RangeArg::Day => ReportRange::Day(anchor),
            RangeArg::Week => ReportRange::Week(anchor),
            RangeArg::Month => ReportRange::Month(anchor),
            RangeArg::Year => ReportRange::Year(anchor),
        },
    };

    let log = SessionLog::new(storage);
    let report = reports::build_report(&log.sessions(), &log.projects(), range, &projects);

    println!("{} to {}", report.start, report.end);
    println!("Total:       {}", format_duration(report.total_seconds));
    println!("Active days: {}", report.days_with_sessions);
    println!(
        "Daily avg:   {}",
        format_duration(report.average_seconds_per_day.round() as i64)
    );
    println!();
    for bucket in &report.buckets {
        println!("  {:<24} {}", bucket.label, format_duration(bucket.seconds));
    }
    println!();
    for project in &report.projects {
        println!("  {:<14} {:>5.1}h", project.project_name, project.hours);
    }

    Ok(())
}

/// Handle the theme command
pub fn handle_theme<S: KeyValueStore>(
    theme: Option<ThemeArg>,
    storage: &Storage<S>,
) -> Result<(), CliError> {
    if let Some(theme) = theme {
        storage.set_theme(theme.into())?;
    }
    let current = match storage.theme() {
        Theme::Light => "light",
        Theme::Dark => "dark",
    };
    println!("Theme: {}", current);
    Ok(())
}
