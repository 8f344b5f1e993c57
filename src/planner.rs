//! Task planner: tasks, the status pipeline and saved views.
//!
//! Every operation loads the collections it touches, mutates them in memory
//! and writes them back whole. Operations touching both tasks and statuses
//! write the two in one batch.

use chrono::{DateTime, NaiveDate, Utc};

use crate::clock::Clock;
use crate::models::{
    self, GroupBy, PlannerTask, SortBy, SortOrder, TaskPriority, TaskStatus, TaskView,
    TaskViewFilter, TaskViewType,
};
use crate::storage::{KeyValueStore, Storage, StorageError};
use crate::task_query::{self, StatusColumn, TaskStats};

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status_id: String,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub scheduled_date: Option<NaiveDate>,
    pub project_ids: Vec<String>,
}

/// Partial task edit. Outer `None` leaves a field alone; `Some(None)` clears
/// an optional field.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status_id: Option<String>,
    pub priority: Option<Option<TaskPriority>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub scheduled_date: Option<Option<NaiveDate>>,
    pub project_ids: Option<Vec<String>>,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub is_done: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewView {
    pub name: String,
    pub view_type: TaskViewType,
    pub filters: TaskViewFilter,
    pub group_by: Option<GroupBy>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, Default)]
pub struct ViewUpdate {
    pub name: Option<String>,
    pub view_type: Option<TaskViewType>,
    pub filters: Option<TaskViewFilter>,
    pub group_by: Option<Option<GroupBy>>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
}

/// Keep `completed_at` in step with the done flag of the task's status.
/// An existing completion time is preserved while the task stays done.
fn sync_completion(task: &mut PlannerTask, status_is_done: bool, now: DateTime<Utc>) {
    if status_is_done {
        if task.completed_at.is_none() {
            task.completed_at = Some(now);
        }
    } else {
        task.completed_at = None;
    }
}

fn status_is_done(statuses: &[TaskStatus], status_id: &str) -> bool {
    statuses.iter().any(|s| s.id == status_id && s.is_done)
}

/// Renumber `order` to 0..n-1 for the tasks of one status, keeping their
/// relative order.
fn compact_status(tasks: &mut [PlannerTask], status_id: &str) {
    let mut members: Vec<&mut PlannerTask> =
        tasks.iter_mut().filter(|t| t.status_id == status_id).collect();
    members.sort_by_key(|t| t.order);
    for (i, task) in members.into_iter().enumerate() {
        task.order = i as i64;
    }
}

fn next_order(tasks: &[PlannerTask], status_id: &str) -> i64 {
    tasks
        .iter()
        .filter(|t| t.status_id == status_id)
        .map(|t| t.order)
        .max()
        .map_or(0, |max| max + 1)
}

pub struct Planner<'a, S: KeyValueStore, C: Clock> {
    storage: &'a Storage<S>,
    clock: C,
}

impl<'a, S: KeyValueStore, C: Clock> Planner<'a, S, C> {
    pub fn new(storage: &'a Storage<S>, clock: C) -> Self {
        Self { storage, clock }
    }

    pub fn tasks(&self) -> Vec<PlannerTask> {
        self.storage.load()
    }

    pub fn task(&self, id: &str) -> Option<PlannerTask> {
        self.tasks().into_iter().find(|t| t.id == id)
    }

    /// Statuses in pipeline order.
    pub fn statuses(&self) -> Vec<TaskStatus> {
        let mut statuses: Vec<TaskStatus> = self.storage.load();
        statuses.sort_by_key(|s| s.order);
        statuses
    }

    pub fn views(&self) -> Vec<TaskView> {
        self.storage.load()
    }

    pub fn view(&self, id: &str) -> Option<TaskView> {
        self.views().into_iter().find(|v| v.id == id)
    }

    /// The view flagged as default, or the first one stored.
    pub fn default_view(&self) -> Option<TaskView> {
        let views = self.views();
        views
            .iter()
            .find(|v| v.is_default)
            .or_else(|| views.first())
            .cloned()
    }

    // === Tasks ===

    /// Add a task at the end of its status.
    pub fn create_task(&self, new: NewTask) -> Result<PlannerTask, StorageError> {
        let now = self.clock.now();
        let mut tasks = self.tasks();
        let statuses = self.statuses();

        let mut task = PlannerTask {
            id: models::new_id(),
            order: next_order(&tasks, &new.status_id),
            title: new.title,
            description: new.description,
            status_id: new.status_id,
            priority: new.priority,
            due_date: new.due_date,
            scheduled_date: new.scheduled_date,
            project_ids: new.project_ids,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        let done = status_is_done(&statuses, &task.status_id);
        sync_completion(&mut task, done, now);

        tasks.push(task.clone());
        self.storage.save(&tasks)?;
        log::debug!("created task {} in {}", task.id, task.status_id);
        Ok(task)
    }

    pub fn update_task(
        &self,
        id: &str,
        update: TaskUpdate,
    ) -> Result<Option<PlannerTask>, StorageError> {
        let now = self.clock.now();
        let mut tasks = self.tasks();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = due_date;
        }
        if let Some(scheduled_date) = update.scheduled_date {
            task.scheduled_date = scheduled_date;
        }
        if let Some(project_ids) = update.project_ids {
            task.project_ids = project_ids;
        }
        if let Some(order) = update.order {
            task.order = order;
        }
        if let Some(status_id) = update.status_id {
            let statuses = self.statuses();
            sync_completion(task, status_is_done(&statuses, &status_id), now);
            task.status_id = status_id;
        }
        task.updated_at = now;

        let updated = task.clone();
        self.storage.save(&tasks)?;
        Ok(Some(updated))
    }

    /// Remove a task. Siblings keep their order values; gaps are fine.
    pub fn delete_task(&self, id: &str) -> Result<bool, StorageError> {
        let before = self.tasks().len();
        let after = self.storage.remove_where(|t: &PlannerTask| t.id == id)?.len();
        Ok(after < before)
    }

    /// Move a task to `index` within `status_id`. The target status is then
    /// renumbered 0..n-1 around it, and so is the status it left.
    pub fn reorder_task(
        &self,
        id: &str,
        status_id: &str,
        index: usize,
    ) -> Result<bool, StorageError> {
        let now = self.clock.now();
        let mut tasks = self.tasks();
        let Some(position) = tasks.iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        let statuses = self.statuses();

        let mut moved = tasks.remove(position);
        let old_status_id = std::mem::replace(&mut moved.status_id, status_id.to_string());
        sync_completion(&mut moved, status_is_done(&statuses, status_id), now);
        moved.updated_at = now;

        let mut column: Vec<PlannerTask> = Vec::new();
        let mut rest: Vec<PlannerTask> = Vec::new();
        for task in tasks {
            if task.status_id == status_id {
                column.push(task);
            } else {
                rest.push(task);
            }
        }
        column.sort_by_key(|t| t.order);
        column.insert(index.min(column.len()), moved);
        for (i, task) in column.iter_mut().enumerate() {
            task.order = i as i64;
        }

        if old_status_id != status_id {
            compact_status(&mut rest, &old_status_id);
        }

        rest.extend(column);
        self.storage.save(&rest)?;
        log::debug!("moved task {} to {}[{}]", id, status_id, index);
        Ok(true)
    }

    // === Statuses ===

    pub fn create_status(
        &self,
        name: String,
        color: String,
        is_done: bool,
    ) -> Result<TaskStatus, StorageError> {
        let mut statuses = self.statuses();
        let status = TaskStatus {
            id: models::new_id(),
            name,
            color,
            order: statuses.iter().map(|s| s.order).max().map_or(0, |max| max + 1),
            is_done,
        };
        statuses.push(status.clone());
        self.storage.save(&statuses)?;
        Ok(status)
    }

    /// Edit a status. Changing `is_done` rewrites `completed_at` on every task
    /// currently in the status, in one pass.
    pub fn update_status(
        &self,
        id: &str,
        update: StatusUpdate,
    ) -> Result<Option<TaskStatus>, StorageError> {
        let mut statuses = self.statuses();
        let Some(status) = statuses.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            status.name = name;
        }
        if let Some(color) = update.color {
            status.color = color;
        }
        if let Some(is_done) = update.is_done {
            status.is_done = is_done;
        }
        let updated = status.clone();

        let mut changed = false;
        let mut tasks = Vec::new();
        if let Some(is_done) = update.is_done {
            let now = self.clock.now();
            tasks = self.tasks();
            for task in tasks.iter_mut().filter(|t| t.status_id == id) {
                let before = task.completed_at;
                sync_completion(task, is_done, now);
                changed |= before != task.completed_at;
            }
        }

        if changed {
            self.storage.save_pair(&statuses, &tasks)?;
        } else {
            self.storage.save(&statuses)?;
        }
        Ok(Some(updated))
    }

    /// Delete a status, moving its tasks to the end of the first remaining
    /// status. Refused when it is the last status.
    pub fn delete_status(&self, id: &str) -> Result<bool, StorageError> {
        let statuses = self.statuses();
        if statuses.len() <= 1 {
            log::warn!("refusing to delete the only status");
            return Ok(false);
        }
        if !statuses.iter().any(|s| s.id == id) {
            return Ok(false);
        }

        let mut remaining: Vec<TaskStatus> = statuses.into_iter().filter(|s| s.id != id).collect();
        for (i, status) in remaining.iter_mut().enumerate() {
            status.order = i as i64;
        }
        let fallback = remaining[0].clone();

        let now = self.clock.now();
        let mut tasks = self.tasks();
        let mut next = next_order(&tasks, &fallback.id);
        let mut orphans: Vec<&mut PlannerTask> =
            tasks.iter_mut().filter(|t| t.status_id == id).collect();
        orphans.sort_by_key(|t| t.order);
        let moved = orphans.len();
        for task in orphans {
            task.status_id = fallback.id.clone();
            task.order = next;
            next += 1;
            sync_completion(task, fallback.is_done, now);
            task.updated_at = now;
        }

        self.storage.save_pair(&remaining, &tasks)?;
        log::info!("deleted status {}, moved {} task(s) to {}", id, moved, fallback.id);
        Ok(true)
    }

    /// Reorder the pipeline to match `ids`. Unknown ids are ignored; statuses
    /// not listed keep their relative order after the listed ones.
    pub fn reorder_statuses(&self, ids: &[String]) -> Result<Vec<TaskStatus>, StorageError> {
        let mut statuses = self.statuses();
        statuses.sort_by_key(|s| {
            ids.iter()
                .position(|id| *id == s.id)
                .unwrap_or(ids.len())
        });
        for (i, status) in statuses.iter_mut().enumerate() {
            status.order = i as i64;
        }
        self.storage.save(&statuses)?;
        Ok(statuses)
    }

    // === Views ===

    pub fn create_view(&self, new: NewView) -> Result<TaskView, StorageError> {
        let view = TaskView {
            id: models::new_id(),
            name: new.name,
            view_type: new.view_type,
            filters: new.filters,
            group_by: new.group_by,
            sort_by: new.sort_by,
            sort_order: new.sort_order,
            is_default: false,
        };
        self.storage.append(view.clone())?;
        Ok(view)
    }

    pub fn update_view(&self, id: &str, update: ViewUpdate) -> Result<Option<TaskView>, StorageError> {
        let mut views = self.views();
        let Some(view) = views.iter_mut().find(|v| v.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            view.name = name;
        }
        if let Some(view_type) = update.view_type {
            view.view_type = view_type;
        }
        if let Some(filters) = update.filters {
            view.filters = filters;
        }
        if let Some(group_by) = update.group_by {
            view.group_by = group_by;
        }
        if let Some(sort_by) = update.sort_by {
            view.sort_by = sort_by;
        }
        if let Some(sort_order) = update.sort_order {
            view.sort_order = sort_order;
        }
        let updated = view.clone();
        self.storage.save(&views)?;
        Ok(Some(updated))
    }

    /// Refused for the default view and for the last remaining view.
    pub fn delete_view(&self, id: &str) -> Result<bool, StorageError> {
        let views = self.views();
        if views.len() <= 1 {
            return Ok(false);
        }
        match views.iter().find(|v| v.id == id) {
            None => return Ok(false),
            Some(view) if view.is_default => {
                log::warn!("refusing to delete default view {}", id);
                return Ok(false);
            }
            Some(_) => {}
        }
        self.storage.remove_where(|v: &TaskView| v.id == id)?;
        Ok(true)
    }

    // === Queries ===

    pub fn filter_tasks(&self, filter: &TaskViewFilter) -> Vec<PlannerTask> {
        task_query::filter_tasks(&self.tasks(), &self.statuses(), filter, self.clock.today())
    }

    pub fn tasks_for_view(&self, view: &TaskView) -> Vec<PlannerTask> {
        task_query::apply_view(&self.tasks(), &self.statuses(), view, self.clock.today())
    }

    /// Kanban columns, optionally restricted to what a view selects.
    pub fn tasks_by_status(&self, view: Option<&TaskView>) -> Vec<StatusColumn> {
        let tasks = match view {
            Some(view) => self.tasks_for_view(view),
            None => self.tasks(),
        };
        task_query::group_by_status(&tasks, &self.statuses())
    }

    pub fn stats(&self) -> TaskStats {
        task_query::task_stats(&self.tasks(), &self.statuses(), self.clock.today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    /// Memory store whose batch writes always fail.
    #[derive(Default)]
    struct BatchFailingStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for BatchFailingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }

        fn set_many(&self, _entries: &[(&str, &str)]) -> Result<(), StorageError> {
            Err(StorageError::DatabaseError(crate::database::DatabaseError::DirectoryError(
                "disk full".to_string(),
            )))
        }
    }

    fn setup() -> (Storage<MemoryStore>, ManualClock) {
        (
            Storage::new(MemoryStore::new()),
            ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 5, 10, 0, 0).unwrap()),
        )
    }

    fn add(planner: &Planner<'_, MemoryStore, &ManualClock>, title: &str, status: &str) -> PlannerTask {
        planner
            .create_task(NewTask {
                title: title.to_string(),
                status_id: status.to_string(),
                ..Default::default()
            })
            .unwrap()
    }

    fn orders(planner: &Planner<'_, MemoryStore, &ManualClock>, status: &str) -> Vec<(String, i64)> {
        let mut column: Vec<(String, i64)> = planner
            .tasks()
            .into_iter()
            .filter(|t| t.status_id == status)
            .map(|t| (t.title, t.order))
            .collect();
        column.sort_by_key(|(_, order)| *order);
        column
    }

    #[test]
    fn new_tasks_append_to_their_status() {
        let (storage, clock) = setup();
        let planner = Planner::new(&storage, &clock);
        assert_eq!(add(&planner, "a", "todo").order, 0);
        assert_eq!(add(&planner, "b", "todo").order, 1);
        assert_eq!(add(&planner, "c", "backlog").order, 0);

        let done = add(&planner, "d", "done");
        assert_eq!(done.completed_at, Some(clock.now()));
    }

    #[test]
    fn status_change_maintains_completed_at() {
        let (storage, clock) = setup();
        let planner = Planner::new(&storage, &clock);
        let task = add(&planner, "a", "todo");

        let done = planner
            .update_task(&task.id, TaskUpdate { status_id: Some("done".into()), ..Default::default() })
            .unwrap()
            .unwrap();
        assert_eq!(done.completed_at, Some(clock.now()));

        clock.advance_secs(60);
        let renamed = planner
            .update_task(&task.id, TaskUpdate { title: Some("b".into()), ..Default::default() })
            .unwrap()
            .unwrap();
        assert_eq!(renamed.completed_at, done.completed_at);
        assert!(renamed.updated_at > done.updated_at);

        let reopened = planner
            .update_task(&task.id, TaskUpdate { status_id: Some("todo".into()), ..Default::default() })
            .unwrap()
            .unwrap();
        assert_eq!(reopened.completed_at, None);

        assert!(planner.update_task("missing", TaskUpdate::default()).unwrap().is_none());
    }

    #[test]
    fn delete_leaves_gaps() {
        let (storage, clock) = setup();
        let planner = Planner::new(&storage, &clock);
        add(&planner, "a", "todo");
        let b = add(&planner, "b", "todo");
        add(&planner, "c", "todo");
        assert!(planner.delete_task(&b.id).unwrap());
        assert!(!planner.delete_task(&b.id).unwrap());
        assert_eq!(orders(&planner, "todo"), vec![("a".into(), 0), ("c".into(), 2)]);
    }

    #[test]
    fn reorder_within_a_status() {
        let (storage, clock) = setup();
        let planner = Planner::new(&storage, &clock);
        add(&planner, "a", "todo");
        add(&planner, "b", "todo");
        let c = add(&planner, "c", "todo");

        assert!(planner.reorder_task(&c.id, "todo", 0).unwrap());
        assert_eq!(
            orders(&planner, "todo"),
            vec![("c".into(), 0), ("a".into(), 1), ("b".into(), 2)]
        );
    }

    #[test]
    fn reorder_across_statuses_compacts_both() {
        let (storage, clock) = setup();
        let planner = Planner::new(&storage, &clock);
        add(&planner, "a", "todo");
        let b = add(&planner, "b", "todo");
        add(&planner, "c", "todo");
        add(&planner, "x", "done");
        add(&planner, "y", "done");

        assert!(planner.reorder_task(&b.id, "done", 1).unwrap());
        assert_eq!(orders(&planner, "todo"), vec![("a".into(), 0), ("c".into(), 1)]);
        assert_eq!(
            orders(&planner, "done"),
            vec![("x".into(), 0), ("b".into(), 1), ("y".into(), 2)]
        );
        let moved = planner.task(&b.id).unwrap();
        assert_eq!(moved.completed_at, Some(clock.now()));

        // An index past the end lands the task last.
        assert!(planner.reorder_task(&b.id, "backlog", 99).unwrap());
        assert_eq!(orders(&planner, "backlog"), vec![("b".into(), 0)]);
        assert_eq!(planner.task(&b.id).unwrap().completed_at, None);
        assert!(!planner.reorder_task("missing", "todo", 0).unwrap());
    }

    #[test]
    fn toggling_done_rewrites_member_tasks() {
        let (storage, clock) = setup();
        let planner = Planner::new(&storage, &clock);
        let a = add(&planner, "a", "in-progress");
        let other = add(&planner, "other", "todo");

        let status = planner
            .update_status("in-progress", StatusUpdate { is_done: Some(true), ..Default::default() })
            .unwrap()
            .unwrap();
        assert!(status.is_done);
        assert_eq!(planner.task(&a.id).unwrap().completed_at, Some(clock.now()));
        assert_eq!(planner.task(&other.id).unwrap().completed_at, None);

        planner
            .update_status("in-progress", StatusUpdate { is_done: Some(false), ..Default::default() })
            .unwrap();
        assert_eq!(planner.task(&a.id).unwrap().completed_at, None);
    }

    #[test]
    fn deleting_a_status_reassigns_its_tasks() {
        let (storage, clock) = setup();
        let planner = Planner::new(&storage, &clock);
        add(&planner, "existing", "backlog");
        for title in ["p", "q", "r"] {
            add(&planner, title, "in-progress");
        }

        assert!(planner.delete_status("in-progress").unwrap());
        let statuses = planner.statuses();
        assert_eq!(statuses.len(), 3);
        assert_eq!(statuses.iter().map(|s| s.order).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(
            orders(&planner, "backlog"),
            vec![
                ("existing".into(), 0),
                ("p".into(), 1),
                ("q".into(), 2),
                ("r".into(), 3),
            ]
        );
        assert!(planner.tasks().iter().all(|t| t.status_id == "backlog"));
    }

    #[test]
    fn last_status_cannot_be_deleted() {
        let (storage, clock) = setup();
        let planner = Planner::new(&storage, &clock);
        for id in ["backlog", "todo", "in-progress"] {
            assert!(planner.delete_status(id).unwrap());
        }
        assert!(!planner.delete_status("done").unwrap());
        assert_eq!(planner.statuses().len(), 1);
        assert!(!planner.delete_status("nope").unwrap());
    }

    #[test]
    fn new_status_goes_last_and_pipeline_can_be_reordered() {
        let (storage, clock) = setup();
        let planner = Planner::new(&storage, &clock);
        let review = planner
            .create_status("Review".into(), "orange".into(), false)
            .unwrap();
        assert_eq!(review.order, 4);

        let reordered = planner
            .reorder_statuses(&["done".into(), review.id.clone()])
            .unwrap();
        let ids: Vec<&str> = reordered.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["done", review.id.as_str(), "backlog", "todo", "in-progress"]);
        assert_eq!(planner.statuses()[1].id, review.id);
    }

    #[test]
    fn default_view_is_protected() {
        let (storage, clock) = setup();
        let planner = Planner::new(&storage, &clock);
        assert!(!planner.delete_view("all-tasks").unwrap());
        assert!(planner.delete_view("today").unwrap());
        assert!(planner.delete_view("kanban-board").unwrap());
        assert_eq!(planner.views().len(), 1);
        assert_eq!(planner.default_view().unwrap().id, "all-tasks");
    }

    #[test]
    fn views_can_be_created_and_edited() {
        let (storage, clock) = setup();
        let planner = Planner::new(&storage, &clock);
        let view = planner
            .create_view(NewView {
                name: "Urgent".into(),
                view_type: TaskViewType::List,
                filters: TaskViewFilter {
                    priorities: Some(vec![TaskPriority::Urgent]),
                    ..Default::default()
                },
                group_by: None,
                sort_by: SortBy::DueDate,
                sort_order: SortOrder::Asc,
            })
            .unwrap();
        assert_eq!(planner.views().len(), 4);

        let updated = planner
            .update_view(&view.id, ViewUpdate { name: Some("Fires".into()), ..Default::default() })
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Fires");
        assert_eq!(planner.view(&view.id).unwrap().sort_by, SortBy::DueDate);
        assert!(planner.delete_view(&view.id).unwrap());
    }

    #[test]
    fn board_and_stats_use_the_clock_date() {
        let (storage, clock) = setup();
        let planner = Planner::new(&storage, &clock);
        let task = add(&planner, "today", "todo");
        planner
            .update_task(
                &task.id,
                TaskUpdate { scheduled_date: Some(Some(clock.today())), ..Default::default() },
            )
            .unwrap();

        let today_view = planner.view("today").unwrap();
        assert_eq!(planner.tasks_for_view(&today_view).len(), 1);

        let columns = planner.tasks_by_status(None);
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[1].tasks.len(), 1);
        assert_eq!(planner.stats().scheduled_today, 1);
    }

    #[test]
    fn status_changes_write_tasks_and_statuses_together() {
        let storage = Storage::new(BatchFailingStore::default());
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 5, 10, 0, 0).unwrap());
        let planner = Planner::new(&storage, &clock);
        let task = planner
            .create_task(NewTask {
                title: "a".into(),
                status_id: "in-progress".into(),
                ..Default::default()
            })
            .unwrap();

        assert!(planner.delete_status("in-progress").is_err());
        assert_eq!(planner.statuses().len(), 4);
        assert_eq!(planner.task(&task.id).unwrap().status_id, "in-progress");

        let done = StatusUpdate { is_done: Some(true), ..Default::default() };
        assert!(planner.update_status("in-progress", done).is_err());
        assert!(!planner.statuses()[2].is_done);
        assert_eq!(planner.task(&task.id).unwrap().completed_at, None);

        // Renames touch only statuses and do not need a batch.
        let rename = StatusUpdate { name: Some("Doing".into()), ..Default::default() };
        assert!(planner.update_status("in-progress", rename).unwrap().is_some());
        assert_eq!(planner.statuses()[2].name, "Doing");
    }
}
