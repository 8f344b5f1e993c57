use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::models::{
    PlannerTask, ScheduledFilter, SortBy, SortOrder, TaskStatus, TaskView, TaskViewFilter,
};
use crate::utils;

fn done_status_ids(statuses: &[TaskStatus]) -> Vec<&str> {
    statuses
        .iter()
        .filter(|s| s.is_done)
        .map(|s| s.id.as_str())
        .collect()
}

pub fn is_done(task: &PlannerTask, statuses: &[TaskStatus]) -> bool {
    statuses
        .iter()
        .any(|s| s.id == task.status_id && s.is_done)
}

/// Due before `today` and not sitting in a done status.
pub fn is_overdue(task: &PlannerTask, statuses: &[TaskStatus], today: NaiveDate) -> bool {
    matches!(task.due_date, Some(due) if due < today) && !is_done(task, statuses)
}

/// Tasks matching every criterion set in `filter`.
pub fn filter_tasks(
    tasks: &[PlannerTask],
    statuses: &[TaskStatus],
    filter: &TaskViewFilter,
    today: NaiveDate,
) -> Vec<PlannerTask> {
    let done = done_status_ids(statuses);
    let (week_start, week_end) = utils::week_bounds(today);

    tasks
        .iter()
        .filter(|t| match &filter.status_ids {
            Some(ids) if !ids.is_empty() => ids.contains(&t.status_id),
            _ => true,
        })
        .filter(|t| match &filter.project_ids {
            Some(ids) if !ids.is_empty() => t.project_ids.iter().any(|p| ids.contains(p)),
            _ => true,
        })
        .filter(|t| match &filter.priorities {
            Some(wanted) if !wanted.is_empty() => {
                t.priority.is_some_and(|p| wanted.contains(&p))
            }
            _ => true,
        })
        .filter(|t| {
            let Some(range) = &filter.date_range else {
                return true;
            };
            let after_start = match range.start {
                Some(start) => t.due_date.is_some_and(|due| due >= start),
                None => true,
            };
            let before_end = match range.end {
                Some(end) => t.due_date.is_some_and(|due| due <= end),
                None => true,
            };
            after_start && before_end
        })
        .filter(|t| match filter.scheduled_date {
            None => true,
            Some(ScheduledFilter::Today) => t.scheduled_date == Some(today),
            Some(ScheduledFilter::Week) => t
                .scheduled_date
                .is_some_and(|d| d >= week_start && d <= week_end),
            Some(ScheduledFilter::Overdue) => is_overdue(t, statuses, today),
            Some(ScheduledFilter::On(date)) => t.scheduled_date == Some(date),
        })
        .filter(|t| filter.show_completed || !done.contains(&t.status_id.as_str()))
        .cloned()
        .collect()
}

fn priority_rank(task: &PlannerTask) -> u8 {
    task.priority.map(|p| p.rank()).unwrap_or(0)
}

/// Stable sort by the given key. Tasks without a due date always trail when
/// sorting by due date, whichever direction is requested.
pub fn sort_tasks(tasks: &mut [PlannerTask], sort_by: SortBy, sort_order: SortOrder) {
    let directed = |ordering: Ordering| match sort_order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };

    tasks.sort_by(|a, b| match sort_by {
        SortBy::Order => directed(a.order.cmp(&b.order)),
        SortBy::DueDate => match (a.due_date, b.due_date) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => directed(x.cmp(&y)),
        },
        SortBy::Priority => directed(priority_rank(a).cmp(&priority_rank(b))),
        SortBy::CreatedAt => directed(a.created_at.cmp(&b.created_at)),
        SortBy::Title => directed(a.title.cmp(&b.title)),
    });
}

/// Filter then sort, both as configured on the view.
pub fn apply_view(
    tasks: &[PlannerTask],
    statuses: &[TaskStatus],
    view: &TaskView,
    today: NaiveDate,
) -> Vec<PlannerTask> {
    let mut selected = filter_tasks(tasks, statuses, &view.filters, today);
    sort_tasks(&mut selected, view.sort_by, view.sort_order);
    selected
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusColumn {
    pub status: TaskStatus,
    pub tasks: Vec<PlannerTask>,
}

/// One column per status in pipeline order, each ordered by manual rank.
/// Tasks pointing at a status that no longer exists are left out.
pub fn group_by_status(tasks: &[PlannerTask], statuses: &[TaskStatus]) -> Vec<StatusColumn> {
    let mut ordered: Vec<&TaskStatus> = statuses.iter().collect();
    ordered.sort_by_key(|s| s.order);

    ordered
        .into_iter()
        .map(|status| {
            let mut column: Vec<PlannerTask> = tasks
                .iter()
                .filter(|t| t.status_id == status.id)
                .cloned()
                .collect();
            column.sort_by_key(|t| t.order);
            StatusColumn {
                status: status.clone(),
                tasks: column,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub scheduled_today: usize,
    pub overdue: usize,
}

pub fn task_stats(tasks: &[PlannerTask], statuses: &[TaskStatus], today: NaiveDate) -> TaskStats {
    let completed = tasks.iter().filter(|t| is_done(t, statuses)).count();
    TaskStats {
        total: tasks.len(),
        completed,
        pending: tasks.len() - completed,
        scheduled_today: tasks
            .iter()
            .filter(|t| t.scheduled_date == Some(today) && !is_done(t, statuses))
            .count(),
        overdue: tasks
            .iter()
            .filter(|t| is_overdue(t, statuses, today))
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_statuses, default_views, DateRange, TaskPriority};
    use chrono::{Duration, TimeZone, Utc};

    fn today() -> NaiveDate {
        // Wednesday
        NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()
    }

    fn task(id: &str, status: &str, order: i64) -> PlannerTask {
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
            + Duration::minutes(order);
        PlannerTask {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            status_id: status.to_string(),
            priority: None,
            due_date: None,
            scheduled_date: None,
            project_ids: vec![],
            completed_at: None,
            created_at: created,
            updated_at: created,
            order,
        }
    }

    fn ids(tasks: &[PlannerTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn completed_tasks_hidden_unless_requested() {
        let tasks = vec![task("a", "todo", 0), task("b", "done", 0)];
        let statuses = default_statuses();
        let hidden = filter_tasks(&tasks, &statuses, &TaskViewFilter::default(), today());
        assert_eq!(ids(&hidden), vec!["a"]);

        let shown = filter_tasks(
            &tasks,
            &statuses,
            &TaskViewFilter { show_completed: true, ..Default::default() },
            today(),
        );
        assert_eq!(shown.len(), 2);
    }

    #[test]
    fn criteria_combine_conjunctively() {
        let mut a = task("a", "todo", 0);
        a.project_ids = vec!["1".into()];
        a.priority = Some(TaskPriority::High);
        let mut b = task("b", "todo", 1);
        b.project_ids = vec!["1".into(), "2".into()];
        b.priority = Some(TaskPriority::Low);
        let mut c = task("c", "backlog", 0);
        c.project_ids = vec!["1".into()];
        c.priority = Some(TaskPriority::High);

        let filter = TaskViewFilter {
            status_ids: Some(vec!["todo".into()]),
            project_ids: Some(vec!["1".into()]),
            priorities: Some(vec![TaskPriority::High, TaskPriority::Urgent]),
            ..Default::default()
        };
        let result = filter_tasks(&[a, b, c], &default_statuses(), &filter, today());
        assert_eq!(ids(&result), vec!["a"]);
    }

    #[test]
    fn due_date_range_requires_a_due_date() {
        let mut a = task("a", "todo", 0);
        a.due_date = NaiveDate::from_ymd_opt(2024, 6, 10);
        let b = task("b", "todo", 1);
        let mut c = task("c", "todo", 2);
        c.due_date = NaiveDate::from_ymd_opt(2024, 7, 1);

        let filter = TaskViewFilter {
            date_range: Some(DateRange {
                start: NaiveDate::from_ymd_opt(2024, 6, 1),
                end: NaiveDate::from_ymd_opt(2024, 6, 30),
            }),
            ..Default::default()
        };
        let result = filter_tasks(&[a, b, c], &default_statuses(), &filter, today());
        assert_eq!(ids(&result), vec!["a"]);
    }

    #[test]
    fn scheduled_special_values() {
        let mut on_today = task("today", "todo", 0);
        on_today.scheduled_date = Some(today());
        let mut sunday = task("sunday", "todo", 1);
        sunday.scheduled_date = NaiveDate::from_ymd_opt(2024, 6, 9);
        let mut next_week = task("next", "todo", 2);
        next_week.scheduled_date = NaiveDate::from_ymd_opt(2024, 6, 10);
        let mut late = task("late", "todo", 3);
        late.due_date = NaiveDate::from_ymd_opt(2024, 6, 4);
        let mut late_done = task("late-done", "done", 0);
        late_done.due_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        let mut due_today = task("due-today", "todo", 4);
        due_today.due_date = Some(today());

        let tasks = vec![on_today, sunday, next_week, late, late_done, due_today];
        let statuses = default_statuses();
        let run = |scheduled| {
            let filter = TaskViewFilter {
                scheduled_date: Some(scheduled),
                show_completed: true,
                ..Default::default()
            };
            filter_tasks(&tasks, &statuses, &filter, today())
        };

        assert_eq!(ids(&run(ScheduledFilter::Today)), vec!["today"]);
        assert_eq!(ids(&run(ScheduledFilter::Week)), vec!["today", "sunday"]);
        assert_eq!(ids(&run(ScheduledFilter::Overdue)), vec!["late"]);
        assert_eq!(
            ids(&run(ScheduledFilter::On(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()))),
            vec!["next"]
        );
    }

    #[test]
    fn missing_due_dates_trail_in_both_directions() {
        let mut a = task("a", "todo", 0);
        a.due_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        let b = task("b", "todo", 1);
        let mut c = task("c", "todo", 2);
        c.due_date = NaiveDate::from_ymd_opt(2024, 6, 20);

        let mut tasks = vec![b.clone(), c.clone(), a.clone()];
        sort_tasks(&mut tasks, SortBy::DueDate, SortOrder::Asc);
        assert_eq!(ids(&tasks), vec!["a", "c", "b"]);

        sort_tasks(&mut tasks, SortBy::DueDate, SortOrder::Desc);
        assert_eq!(ids(&tasks), vec!["c", "a", "b"]);
    }

    #[test]
    fn priority_sort_follows_severity_rank() {
        let mut low = task("low", "todo", 0);
        low.priority = Some(TaskPriority::Low);
        let none = task("none", "todo", 1);
        let mut urgent = task("urgent", "todo", 2);
        urgent.priority = Some(TaskPriority::Urgent);
        let mut medium = task("medium", "todo", 3);
        medium.priority = Some(TaskPriority::Medium);

        let mut tasks = vec![low, none, urgent, medium];
        sort_tasks(&mut tasks, SortBy::Priority, SortOrder::Desc);
        assert_eq!(ids(&tasks), vec!["urgent", "medium", "low", "none"]);

        sort_tasks(&mut tasks, SortBy::Priority, SortOrder::Asc);
        assert_eq!(ids(&tasks), vec!["none", "low", "medium", "urgent"]);
    }

    #[test]
    fn order_title_and_created_sorts() {
        let mut tasks = vec![task("b", "todo", 2), task("c", "todo", 0), task("a", "todo", 1)];
        sort_tasks(&mut tasks, SortBy::Order, SortOrder::Asc);
        assert_eq!(ids(&tasks), vec!["c", "a", "b"]);
        sort_tasks(&mut tasks, SortBy::Title, SortOrder::Desc);
        assert_eq!(ids(&tasks), vec!["c", "b", "a"]);
        sort_tasks(&mut tasks, SortBy::CreatedAt, SortOrder::Desc);
        assert_eq!(ids(&tasks), vec!["b", "a", "c"]);
    }

    #[test]
    fn today_view_filters_then_sorts() {
        let views = default_views();
        let today_view = views.iter().find(|v| v.id == "today").unwrap();

        let mut a = task("a", "todo", 0);
        a.scheduled_date = Some(today());
        a.priority = Some(TaskPriority::Low);
        let mut b = task("b", "in-progress", 0);
        b.scheduled_date = Some(today());
        b.priority = Some(TaskPriority::Urgent);
        let mut c = task("c", "done", 0);
        c.scheduled_date = Some(today());
        let d = task("d", "todo", 1);

        let result = apply_view(&[a, b, c, d], &default_statuses(), today_view, today());
        assert_eq!(ids(&result), vec!["b", "a"]);
    }

    #[test]
    fn columns_and_stats() {
        let mut a = task("a", "todo", 1);
        a.due_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        let mut b = task("b", "todo", 0);
        b.scheduled_date = Some(today());
        let mut c = task("c", "done", 0);
        c.due_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        c.scheduled_date = Some(today());
        let orphan = task("orphan", "removed", 0);

        let tasks = vec![a, b, c, orphan];
        let statuses = default_statuses();
        let columns = group_by_status(&tasks, &statuses);
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].status.id, "backlog");
        assert!(columns[0].tasks.is_empty());
        assert_eq!(ids(&columns[1].tasks), vec!["b", "a"]);

        let stats = task_stats(&tasks, &statuses, today());
        assert_eq!(
            stats,
            TaskStats {
                total: 4,
                completed: 1,
                pending: 3,
                scheduled_today: 1,
                overdue: 1,
            }
        );
    }
}
