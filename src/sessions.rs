//! Recorded work sessions and projects: edits on the stored collections and
//! the read-side totals built from them.

use chrono::{DateTime, NaiveDate, Utc};

use crate::clock;
use crate::models::{Project, WorkSession};
use crate::storage::{KeyValueStore, Storage, StorageError};
use crate::utils;

/// Breakdown key for sessions without any project.
pub const UNASSIGNED: &str = "unassigned";
pub const UNASSIGNED_COLOR: &str = "hsl(240, 5%, 50%)";

/// Field edits for a recorded session; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub task_name: Option<String>,
    pub project_ids: Option<Vec<String>>,
    pub notes: Option<Option<String>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

pub struct SessionLog<'a, S: KeyValueStore> {
    storage: &'a Storage<S>,
}

impl<'a, S: KeyValueStore> SessionLog<'a, S> {
    pub fn new(storage: &'a Storage<S>) -> Self {
        Self { storage }
    }

    pub fn sessions(&self) -> Vec<WorkSession> {
        self.storage.load()
    }

    pub fn session(&self, id: &str) -> Option<WorkSession> {
        self.sessions().into_iter().find(|s| s.id == id)
    }

    pub fn sessions_on(&self, date: NaiveDate) -> Vec<WorkSession> {
        self.sessions_in_range(date, date)
    }

    pub fn sessions_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<WorkSession> {
        self.sessions()
            .into_iter()
            .filter(|s| s.date >= start && s.date <= end)
            .collect()
    }

    /// Apply field edits to a session. Changing either boundary recomputes the
    /// duration (and the session date from the end time). A range whose end
    /// precedes its start is refused and `None` is returned.
    pub fn update_session(
        &self,
        id: &str,
        update: SessionUpdate,
    ) -> Result<Option<WorkSession>, StorageError> {
        let mut sessions = self.sessions();
        let Some(session) = sessions.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };

        if update.start_time.is_some() || update.end_time.is_some() {
            let start = update.start_time.unwrap_or(session.start_time);
            let end = update.end_time.unwrap_or(session.end_time);
            if end < start {
                log::warn!("refusing edit of session {}: end {} precedes start {}", id, end, start);
                return Ok(None);
            }
            session.start_time = start;
            session.end_time = end;
            session.duration = (end - start).num_seconds();
            session.date = clock::local_date(end);
        }
        if let Some(task_name) = update.task_name {
            session.task_name = task_name;
        }
        if let Some(project_ids) = update.project_ids {
            session.project_ids = project_ids;
        }
        if let Some(notes) = update.notes {
            session.notes = notes.filter(|n| !n.is_empty());
        }

        let updated = session.clone();
        self.storage.save(&sessions)?;
        log::debug!("updated session {}", id);
        Ok(Some(updated))
    }

    pub fn delete_session(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.delete_sessions(&[id.to_string()])? > 0)
    }

    /// Remove every listed session; returns how many were removed.
    pub fn delete_sessions(&self, ids: &[String]) -> Result<usize, StorageError> {
        let before = self.sessions().len();
        let after = self
            .storage
            .remove_where(|s: &WorkSession| ids.contains(&s.id))?
            .len();
        let removed = before - after;
        if removed > 0 {
            log::info!("deleted {} session(s)", removed);
        }
        Ok(removed)
    }

    pub fn projects(&self) -> Vec<Project> {
        self.storage.load()
    }

    pub fn add_project(&self, name: String, color: String) -> Result<Project, StorageError> {
        let project = Project::new(name, color);
        self.storage.append(project.clone())?;
        Ok(project)
    }

    pub fn update_project(
        &self,
        id: &str,
        name: String,
        color: String,
    ) -> Result<Option<Project>, StorageError> {
        let mut projects = self.projects();
        let Some(project) = projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        project.name = name;
        project.color = color;
        let updated = project.clone();
        self.storage.save(&projects)?;
        Ok(Some(updated))
    }

    /// Sessions and tasks that still reference the project are left alone and
    /// simply stop resolving to a name.
    pub fn delete_project(&self, id: &str) -> Result<bool, StorageError> {
        let before = self.projects().len();
        let after = self.storage.remove_where(|p: &Project| p.id == id)?.len();
        Ok(after < before)
    }
}

pub fn total_seconds<'s>(sessions: impl IntoIterator<Item = &'s WorkSession>) -> i64 {
    sessions.into_iter().map(|s| s.duration).sum()
}

/// Sessions whose date lies within `start..=end`.
pub fn sessions_between(
    sessions: &[WorkSession],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<&WorkSession> {
    sessions
        .iter()
        .filter(|s| s.date >= start && s.date <= end)
        .collect()
}

pub fn today_sessions(sessions: &[WorkSession], today: NaiveDate) -> Vec<&WorkSession> {
    sessions_between(sessions, today, today)
}

pub fn week_sessions(sessions: &[WorkSession], date: NaiveDate) -> Vec<&WorkSession> {
    let (start, end) = utils::week_bounds(date);
    sessions_between(sessions, start, end)
}

pub fn month_sessions(sessions: &[WorkSession], date: NaiveDate) -> Vec<&WorkSession> {
    let (start, end) = utils::month_bounds(date);
    sessions_between(sessions, start, end)
}

pub fn today_total(sessions: &[WorkSession], today: NaiveDate) -> i64 {
    total_seconds(today_sessions(sessions, today))
}

pub fn week_total(sessions: &[WorkSession], date: NaiveDate) -> i64 {
    total_seconds(week_sessions(sessions, date))
}

pub fn month_total(sessions: &[WorkSession], date: NaiveDate) -> i64 {
    total_seconds(month_sessions(sessions, date))
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub day_name: String,
    pub seconds: i64,
    pub hours: f64,
    pub session_count: usize,
}

/// Totals for each day of the Monday-start week containing `date`.
pub fn daily_breakdown(sessions: &[WorkSession], date: NaiveDate) -> Vec<DayTotal> {
    let (start, end) = utils::week_bounds(date);
    utils::days_between(start, end)
        .into_iter()
        .map(|day| {
            let on_day = today_sessions(sessions, day);
            let seconds = total_seconds(on_day.iter().copied());
            DayTotal {
                date: day,
                day_name: day.format("%a").to_string(),
                seconds,
                hours: seconds as f64 / 3600.0,
                session_count: on_day.len(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectTotal {
    pub project_id: String,
    pub project_name: String,
    pub color: String,
    pub seconds: f64,
    pub hours: f64,
}

/// Time per project. A session's duration is split evenly across its projects;
/// sessions without projects count fully towards [`UNASSIGNED`]. Unknown
/// project ids resolve to `unassigned_label`. Sorted by time, largest first.
pub fn project_breakdown<'s>(
    sessions: impl IntoIterator<Item = &'s WorkSession>,
    projects: &[Project],
    unassigned_label: &str,
) -> Vec<ProjectTotal> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    let mut add = |id: &str, seconds: f64| match totals.iter_mut().find(|(k, _)| k == id) {
        Some((_, total)) => *total += seconds,
        None => totals.push((id.to_string(), seconds)),
    };

    for session in sessions {
        if session.project_ids.is_empty() {
            add(UNASSIGNED, session.duration as f64);
            continue;
        }
        let share = session.duration as f64 / session.project_ids.len() as f64;
        for project_id in &session.project_ids {
            add(project_id, share);
        }
    }

    let mut breakdown: Vec<ProjectTotal> = totals
        .into_iter()
        .map(|(project_id, seconds)| {
            let project = projects.iter().find(|p| p.id == project_id);
            ProjectTotal {
                project_name: project
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| unassigned_label.to_string()),
                color: project
                    .map(|p| p.color.clone())
                    .unwrap_or_else(|| UNASSIGNED_COLOR.to_string()),
                project_id,
                seconds,
                hours: seconds / 3600.0,
            }
        })
        .collect();
    breakdown.sort_by(|a, b| b.seconds.total_cmp(&a.seconds));
    breakdown
}

/// Project breakdown for the month containing `date`.
pub fn month_project_breakdown(
    sessions: &[WorkSession],
    projects: &[Project],
    date: NaiveDate,
) -> Vec<ProjectTotal> {
    project_breakdown(month_sessions(sessions, date), projects, "Unassigned")
}

/// Display name for a project id, tolerating deleted projects.
pub fn project_label<'p>(projects: &'p [Project], id: &str) -> &'p str {
    projects
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.name.as_str())
        .unwrap_or("Unassigned")
}

/// Sessions that belong together: either one `groupId` chain or a standalone
/// session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionGroup {
    pub group_id: Option<String>,
    pub task_name: String,
    pub sessions: Vec<WorkSession>,
    pub total_seconds: i64,
}

/// Group sessions by `groupId`, in order of first appearance.
pub fn group_sessions(sessions: &[WorkSession]) -> Vec<SessionGroup> {
    let mut groups: Vec<SessionGroup> = Vec::new();
    for session in sessions {
        let existing = session.group_id.as_ref().and_then(|gid| {
            groups
                .iter_mut()
                .find(|g| g.group_id.as_deref() == Some(gid.as_str()))
        });
        match existing {
            Some(group) => {
                group.total_seconds += session.duration;
                group.sessions.push(session.clone());
            }
            None => groups.push(SessionGroup {
                group_id: session.group_id.clone(),
                task_name: session.task_name.clone(),
                sessions: vec![session.clone()],
                total_seconds: session.duration,
            }),
        }
    }
    groups
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayHistory {
    pub date: NaiveDate,
    pub sessions: Vec<WorkSession>,
    pub total_seconds: i64,
}

/// Sessions bucketed by date, newest day first; sessions within a day keep
/// their start order.
pub fn history_by_day(sessions: &[WorkSession]) -> Vec<DayHistory> {
    let mut days: Vec<DayHistory> = Vec::new();
    for session in sessions {
        match days.iter_mut().find(|d| d.date == session.date) {
            Some(day) => {
                day.total_seconds += session.duration;
                day.sessions.push(session.clone());
            }
            None => days.push(DayHistory {
                date: session.date,
                sessions: vec![session.clone()],
                total_seconds: session.duration,
            }),
        }
    }
    for day in &mut days {
        day.sessions.sort_by_key(|s| s.start_time);
    }
    days.sort_by(|a, b| b.date.cmp(&a.date));
    days
}
