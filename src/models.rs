use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Project {
    pub fn new(name: String, color: String) -> Self {
        Self {
            id: new_id(),
            name,
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSession {
    pub id: String,
    pub task_name: String,
    #[serde(default)]
    pub project_ids: Vec<String>,
    pub date: NaiveDate,
    pub duration: i64, // seconds of active (unpaused) time
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>, // opaque rich-text blob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planner_task_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Countdown,
    Stopwatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerConfig {
    pub mode: TimerMode,
    pub duration: i64, // countdown target in seconds
    pub elapsed: i64,  // always counts up
    pub state: TimerState,
    pub task_name: String,
    #[serde(default)]
    pub project_ids: Vec<String>,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            mode: TimerMode::Stopwatch,
            duration: 0,
            elapsed: 0,
            state: TimerState::Idle,
            task_name: String::new(),
            project_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Severity rank used for sorting; tasks without a priority rank 0.
    pub fn rank(self) -> u8 {
        match self {
            TaskPriority::Urgent => 4,
            TaskPriority::High => 3,
            TaskPriority::Medium => 2,
            TaskPriority::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerTask {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>, // opaque rich-text blob
    pub status_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub project_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub order: i64, // rank within status
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub id: String,
    pub name: String,
    pub color: String,
    pub order: i64,
    pub is_done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskViewType {
    List,
    Kanban,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupBy {
    Status,
    Project,
    Priority,
    DueDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Order,
    DueDate,
    Priority,
    CreatedAt,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Special values accepted by the scheduled-date filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScheduledFilter {
    Today,
    /// Current Monday-Sunday week.
    Week,
    /// Due date in the past and not in a done status.
    Overdue,
    On(NaiveDate),
}

impl TryFrom<String> for ScheduledFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "today" => Ok(ScheduledFilter::Today),
            "week" => Ok(ScheduledFilter::Week),
            "overdue" => Ok(ScheduledFilter::Overdue),
            other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
                .map(ScheduledFilter::On)
                .map_err(|e| format!("invalid scheduled date filter '{}': {}", other, e)),
        }
    }
}

impl From<ScheduledFilter> for String {
    fn from(value: ScheduledFilter) -> Self {
        match value {
            ScheduledFilter::Today => "today".to_string(),
            ScheduledFilter::Week => "week".to_string(),
            ScheduledFilter::Overdue => "overdue".to_string(),
            ScheduledFilter::On(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskViewFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priorities: Option<Vec<TaskPriority>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub show_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<ScheduledFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub view_type: TaskViewType,
    #[serde(default)]
    pub filters: TaskViewFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<GroupBy>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_default: bool,
}

/// Light/dark preference consumed only by presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

/// Generate a fresh identifier for any stored entity.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn default_projects() -> Vec<Project> {
    [
        ("1", "Development", "hsl(199, 89%, 58%)"),
        ("2", "Design", "hsl(262, 52%, 63%)"),
        ("3", "Research", "hsl(158, 64%, 52%)"),
        ("4", "Writing", "hsl(25, 95%, 66%)"),
    ]
    .into_iter()
    .map(|(id, name, color)| Project {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
    })
    .collect()
}

pub fn default_statuses() -> Vec<TaskStatus> {
    [
        ("backlog", "Backlog", "hsl(220, 9%, 46%)", false),
        ("todo", "To Do", "hsl(220, 9%, 46%)", false),
        ("in-progress", "In Progress", "hsl(217, 91%, 60%)", false),
        ("done", "Done", "hsl(142, 71%, 45%)", true),
    ]
    .into_iter()
    .enumerate()
    .map(|(order, (id, name, color, is_done))| TaskStatus {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        order: order as i64,
        is_done,
    })
    .collect()
}

pub fn default_views() -> Vec<TaskView> {
    vec![
        TaskView {
            id: "all-tasks".to_string(),
            name: "All Tasks".to_string(),
            view_type: TaskViewType::List,
            filters: TaskViewFilter::default(),
            group_by: None,
            sort_by: SortBy::Order,
            sort_order: SortOrder::Asc,
            is_default: true,
        },
        TaskView {
            id: "kanban-board".to_string(),
            name: "Kanban Board".to_string(),
            view_type: TaskViewType::Kanban,
            filters: TaskViewFilter {
                show_completed: true,
                ..Default::default()
            },
            group_by: Some(GroupBy::Status),
            sort_by: SortBy::Order,
            sort_order: SortOrder::Asc,
            is_default: false,
        },
        TaskView {
            id: "today".to_string(),
            name: "Today".to_string(),
            view_type: TaskViewType::List,
            filters: TaskViewFilter {
                scheduled_date: Some(ScheduledFilter::Today),
                ..Default::default()
            },
            group_by: None,
            sort_by: SortBy::Priority,
            sort_order: SortOrder::Desc,
            is_default: false,
        },
    ]
}
