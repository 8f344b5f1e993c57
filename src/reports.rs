use chrono::{Datelike, NaiveDate};

use crate::models::{Project, WorkSession};
use crate::sessions::{self, ProjectTotal, UNASSIGNED};
use crate::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportRange {
    Day(NaiveDate),
    Week(NaiveDate),
    Month(NaiveDate),
    Year(NaiveDate),
    Custom { start: NaiveDate, end: NaiveDate },
}

impl ReportRange {
    /// Inclusive first and last day covered.
    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        match *self {
            ReportRange::Day(date) => (date, date),
            ReportRange::Week(date) => utils::week_bounds(date),
            ReportRange::Month(date) => utils::month_bounds(date),
            ReportRange::Year(date) => utils::year_bounds(date),
            ReportRange::Custom { start, end } => (start, end),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportBucket {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub seconds: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_seconds: i64,
    pub days_with_sessions: usize,
    /// Average over days that have at least one session.
    pub average_seconds_per_day: f64,
    pub buckets: Vec<ReportBucket>,
    pub projects: Vec<ProjectTotal>,
}

/// Build a report over `range`. When `project_filter` is non-empty only
/// sessions touching one of those projects are counted; [`UNASSIGNED`] in the
/// filter selects sessions without projects.
pub fn build_report(
    sessions: &[WorkSession],
    projects: &[Project],
    range: ReportRange,
    project_filter: &[String],
) -> Report {
    let (start, end) = range.bounds();
    let selected: Vec<&WorkSession> = sessions::sessions_between(sessions, start, end)
        .into_iter()
        .filter(|s| matches_projects(s, project_filter))
        .collect();

    let total_seconds = sessions::total_seconds(selected.iter().copied());
    let mut active_days: Vec<NaiveDate> = selected.iter().map(|s| s.date).collect();
    active_days.sort();
    active_days.dedup();
    let days_with_sessions = active_days.len();
    let average_seconds_per_day = if days_with_sessions == 0 {
        0.0
    } else {
        total_seconds as f64 / days_with_sessions as f64
    };

    Report {
        start,
        end,
        total_seconds,
        days_with_sessions,
        average_seconds_per_day,
        buckets: buckets(&selected, range),
        projects: sessions::project_breakdown(selected.iter().copied(), projects, "No Project"),
    }
}

fn matches_projects(session: &WorkSession, filter: &[String]) -> bool {
    if filter.is_empty() {
        return true;
    }
    session.project_ids.iter().any(|id| filter.contains(id))
        || (session.project_ids.is_empty() && filter.iter().any(|id| id == UNASSIGNED))
}

fn sum_between(sessions: &[&WorkSession], start: NaiveDate, end: NaiveDate) -> i64 {
    sessions
        .iter()
        .filter(|s| s.date >= start && s.date <= end)
        .map(|s| s.duration)
        .sum()
}

fn buckets(sessions: &[&WorkSession], range: ReportRange) -> Vec<ReportBucket> {
    let (start, end) = range.bounds();
    match range {
        ReportRange::Day(date) => vec![ReportBucket {
            label: date.format("%A, %B %-d, %Y").to_string(),
            start: date,
            end: date,
            seconds: sum_between(sessions, date, date),
        }],
        ReportRange::Year(_) => (1..=12)
            .filter_map(|month| NaiveDate::from_ymd_opt(start.year(), month, 1))
            .map(|first| {
                let (month_start, month_end) = utils::month_bounds(first);
                ReportBucket {
                    label: first.format("%B").to_string(),
                    start: month_start,
                    end: month_end,
                    seconds: sum_between(sessions, month_start, month_end),
                }
            })
            .collect(),
        ReportRange::Week(_) | ReportRange::Month(_) | ReportRange::Custom { .. } => {
            let label_format = match range {
                ReportRange::Week(_) => "%a, %b %-d",
                ReportRange::Month(_) => "%-d",
                _ => "%b %-d",
            };
            utils::days_between(start, end)
                .into_iter()
                .map(|day| ReportBucket {
                    label: day.format(label_format).to_string(),
                    start: day,
                    end: day,
                    seconds: sum_between(sessions, day, day),
                })
                .collect()
        }
    }
}
