//! Focus timer engine.
//!
//! Elapsed time is never accumulated by ticking. The engine keeps the wall-clock
//! instant the current running segment began plus the time banked by earlier
//! segments, and recomputes `banked + (now - segment_start)` whenever asked.
//! Time spent suspended, hidden or between process runs is therefore counted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{self, Clock};
use crate::models::{self, TimerConfig, TimerMode, TimerState, WorkSession};
use crate::storage::{KeyValueStore, Storage, StorageError, TIMER_KEY};
use crate::utils::format_hms;

pub const UNTITLED_SESSION: &str = "Untitled Session";

/// What is persisted so a timer can be rebuilt after the process goes away.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub config: TimerConfig,
    /// When the focus session began; survives pauses.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Anchor of the running segment; `None` unless running.
    #[serde(default)]
    pub segment_start: Option<DateTime<Utc>>,
    /// Elapsed milliseconds banked before the current segment.
    #[serde(default)]
    pub banked_ms: i64,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planner_task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub countdown_complete: bool,
    /// When the snapshot was written. Older snapshots carry only this and
    /// `config.elapsed` as of that instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<DateTime<Utc>>,
}

impl TimerSnapshot {
    fn is_pristine(&self) -> bool {
        self.config.state == TimerState::Idle
            && self.config.task_name.is_empty()
            && self.config.project_ids.is_empty()
            && self.notes.is_empty()
            && self.planner_task_id.is_none()
            && self.group_id.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// A countdown reached its target. Fired once per session; counting goes on.
    CountdownComplete,
}

pub struct Timer<'a, S: KeyValueStore, C: Clock> {
    storage: &'a Storage<S>,
    clock: C,
    snap: TimerSnapshot,
}

impl<'a, S: KeyValueStore, C: Clock> Timer<'a, S, C> {
    /// Rebuild the timer from its persisted snapshot, or start fresh.
    pub fn restore(storage: &'a Storage<S>, clock: C) -> Self {
        let mut snap = Self::load_snapshot(storage);

        if snap.config.state == TimerState::Running && snap.segment_start.is_none() {
            snap.segment_start = match snap.last_update_time {
                Some(written) => Some(written),
                None => {
                    log::warn!("running timer snapshot without an anchor, re-anchoring at now");
                    Some(clock.now())
                }
            };
        }
        if snap.config.state != TimerState::Running {
            snap.segment_start = None;
        }

        let mut timer = Self {
            storage,
            clock,
            snap,
        };
        timer.snap.config.elapsed = timer.elapsed();
        timer
    }

    /// Read the stored snapshot. Snapshots without `bankedMs` take their
    /// banked time from `config.elapsed`.
    fn load_snapshot(storage: &Storage<S>) -> TimerSnapshot {
        let Some(raw) = storage.load_value::<serde_json::Value>(TIMER_KEY) else {
            return TimerSnapshot::default();
        };
        let has_bank = raw.get("bankedMs").is_some();
        match serde_json::from_value::<TimerSnapshot>(raw) {
            Ok(mut snap) => {
                if !has_bank {
                    log::debug!("timer snapshot without banked time, using config.elapsed");
                    snap.banked_ms = snap.config.elapsed.max(0) * 1000;
                }
                snap
            }
            Err(e) => {
                log::warn!("discarding malformed timer snapshot: {}", e);
                TimerSnapshot::default()
            }
        }
    }

    pub fn config(&self) -> &TimerConfig {
        &self.snap.config
    }

    pub fn state(&self) -> TimerState {
        self.snap.config.state
    }

    pub fn notes(&self) -> &str {
        &self.snap.notes
    }

    pub fn planner_task_id(&self) -> Option<&str> {
        self.snap.planner_task_id.as_deref()
    }

    pub fn group_id(&self) -> Option<&str> {
        self.snap.group_id.as_deref()
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.snap.start_time
    }

    pub fn countdown_complete(&self) -> bool {
        self.snap.countdown_complete
    }

    fn elapsed_ms_at(&self, now: DateTime<Utc>) -> i64 {
        let running = match (self.snap.config.state, self.snap.segment_start) {
            (TimerState::Running, Some(anchor)) => (now - anchor).num_milliseconds().max(0),
            _ => 0,
        };
        self.snap.banked_ms + running
    }

    /// Whole seconds of active time, recomputed from the wall clock.
    pub fn elapsed(&self) -> i64 {
        self.elapsed_ms_at(self.clock.now()) / 1000
    }

    /// Resample the wall clock. Called on every display refresh and whenever
    /// the host reports the process became visible again.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        let elapsed = self.elapsed();
        self.snap.config.elapsed = elapsed;

        let config = &self.snap.config;
        if config.mode == TimerMode::Countdown
            && config.state == TimerState::Running
            && elapsed >= config.duration
            && !self.snap.countdown_complete
        {
            self.snap.countdown_complete = true;
            self.persist();
            return Some(TimerEvent::CountdownComplete);
        }
        None
    }

    /// Begin a new focus session. Only valid while idle.
    ///
    /// `continuation_of` names an earlier session this one continues. Its task
    /// name, projects and planner link fill in whatever is still unset, and both
    /// sessions end up sharing a group id.
    pub fn start(&mut self, continuation_of: Option<&str>) -> Result<bool, StorageError> {
        if self.snap.config.state != TimerState::Idle {
            log::debug!("ignoring start while {:?}", self.snap.config.state);
            return Ok(false);
        }

        if let Some(session_id) = continuation_of {
            self.link_continuation(session_id)?;
        }

        let now = self.clock.now();
        self.snap.start_time = Some(now);
        self.snap.segment_start = Some(now);
        self.snap.banked_ms = 0;
        self.snap.countdown_complete = false;
        self.snap.config.elapsed = 0;
        self.snap.config.state = TimerState::Running;
        self.persist();
        log::debug!("timer started at {}", now);
        Ok(true)
    }

    fn link_continuation(&mut self, session_id: &str) -> Result<(), StorageError> {
        let mut sessions = self.storage.load::<WorkSession>();
        let Some(index) = sessions.iter().position(|s| s.id == session_id) else {
            log::warn!("cannot continue unknown session {}", session_id);
            return Ok(());
        };

        if sessions[index].group_id.is_none() {
            sessions[index].group_id = Some(models::new_id());
            self.storage.save(&sessions)?;
        }

        let prior = &sessions[index];
        if self.snap.config.task_name.trim().is_empty() {
            self.snap.config.task_name = prior.task_name.clone();
        }
        if self.snap.config.project_ids.is_empty() {
            self.snap.config.project_ids = prior.project_ids.clone();
        }
        if self.snap.planner_task_id.is_none() && prior.planner_task_id.is_some() {
            self.snap.planner_task_id = prior.planner_task_id.clone();
        }
        self.snap.group_id = prior.group_id.clone();
        Ok(())
    }

    pub fn pause(&mut self) -> bool {
        if self.snap.config.state != TimerState::Running {
            return false;
        }
        let banked = self.elapsed_ms_at(self.clock.now());
        self.snap.banked_ms = banked;
        self.snap.segment_start = None;
        self.snap.config.elapsed = banked / 1000;
        self.snap.config.state = TimerState::Paused;
        self.persist();
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.snap.config.state != TimerState::Paused {
            return false;
        }
        self.snap.segment_start = Some(self.clock.now());
        self.snap.config.state = TimerState::Running;
        self.persist();
        true
    }

    /// Finish the focus session. Commits a work session when any time elapsed
    /// and returns it; the timer goes back to idle either way.
    pub fn stop(&mut self) -> Result<Option<WorkSession>, StorageError> {
        if self.snap.config.state == TimerState::Idle {
            return Ok(None);
        }

        let now = self.clock.now();
        let elapsed = self.elapsed_ms_at(now) / 1000;

        let committed = match self.snap.start_time {
            Some(start_time) if elapsed > 0 => {
                let config = &self.snap.config;
                let task_name = if config.task_name.trim().is_empty() {
                    UNTITLED_SESSION.to_string()
                } else {
                    config.task_name.clone()
                };
                let session = WorkSession {
                    id: models::new_id(),
                    task_name,
                    project_ids: config.project_ids.clone(),
                    date: clock::local_date(now),
                    duration: elapsed,
                    start_time,
                    end_time: now,
                    group_id: self.snap.group_id.clone(),
                    notes: Some(self.snap.notes.clone()).filter(|n| !n.is_empty()),
                    planner_task_id: self.snap.planner_task_id.clone(),
                };
                self.storage.append(session.clone())?;
                log::info!(
                    "recorded session '{}' ({}s)",
                    session.task_name,
                    session.duration
                );
                Some(session)
            }
            _ => None,
        };

        let TimerConfig { mode, duration, .. } = self.snap.config;
        self.snap = TimerSnapshot {
            config: TimerConfig {
                mode,
                duration,
                ..TimerConfig::default()
            },
            ..TimerSnapshot::default()
        };
        self.persist();
        Ok(committed)
    }

    /// Throw away elapsed time without recording. Task details are kept.
    pub fn reset(&mut self) {
        self.snap.config.elapsed = 0;
        self.snap.config.state = TimerState::Idle;
        self.snap.start_time = None;
        self.snap.segment_start = None;
        self.snap.banked_ms = 0;
        self.snap.countdown_complete = false;
        self.snap.notes.clear();
        self.persist();
    }

    /// Abandon the session entirely, task details included.
    pub fn discard(&mut self) {
        self.reset();
        self.snap.config.task_name.clear();
        self.snap.config.project_ids.clear();
        self.snap.planner_task_id = None;
        self.snap.group_id = None;
        self.persist();
    }

    pub fn set_mode(&mut self, mode: TimerMode) -> bool {
        if self.snap.config.state != TimerState::Idle {
            return false;
        }
        self.snap.config.mode = mode;
        self.snap.config.elapsed = 0;
        self.snap.banked_ms = 0;
        self.persist();
        true
    }

    pub fn set_duration(&mut self, seconds: i64) -> bool {
        if self.snap.config.state != TimerState::Idle {
            return false;
        }
        self.snap.config.duration = seconds.max(0);
        self.persist();
        true
    }

    pub fn set_task_name(&mut self, task_name: impl Into<String>) {
        self.snap.config.task_name = task_name.into();
        self.persist();
    }

    pub fn set_project_ids(&mut self, project_ids: Vec<String>) {
        self.snap.config.project_ids = project_ids;
        self.persist();
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.snap.notes = notes.into();
        self.persist();
    }

    pub fn set_planner_task_id(&mut self, task_id: Option<String>) {
        self.snap.planner_task_id = task_id;
        self.persist();
    }

    /// Seconds to show: remaining time for a countdown, overtime once past the
    /// target, plain elapsed for a stopwatch.
    pub fn display_seconds(&self) -> i64 {
        let elapsed = self.elapsed();
        let config = &self.snap.config;
        match config.mode {
            TimerMode::Countdown if elapsed >= config.duration => elapsed - config.duration,
            TimerMode::Countdown => config.duration - elapsed,
            TimerMode::Stopwatch => elapsed,
        }
    }

    pub fn is_overtime(&self) -> bool {
        self.snap.config.mode == TimerMode::Countdown && self.elapsed() >= self.snap.config.duration
    }

    /// `HH:MM:SS`, prefixed with `+` in overtime.
    pub fn formatted_display(&self) -> String {
        let formatted = format_hms(self.display_seconds());
        if self.is_overtime() {
            format!("+{}", formatted)
        } else {
            formatted
        }
    }

    fn persist(&self) {
        let result = if self.snap.is_pristine() {
            self.storage.remove_value(TIMER_KEY)
        } else {
            let mut snap = self.snap.clone();
            snap.config.elapsed = snap.banked_ms / 1000;
            snap.last_update_time = Some(self.clock.now());
            self.storage.save_value(TIMER_KEY, &snap)
        };
        if let Err(e) = result {
            log::warn!("failed to persist timer state: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
    }

    fn setup() -> (Storage<MemoryStore>, ManualClock) {
        (Storage::new(MemoryStore::new()), ManualClock::new(t0()))
    }

    #[test]
    fn pause_resume_stop_records_active_time() {
        let (storage, clock) = setup();
        let mut timer = Timer::restore(&storage, &clock);
        timer.set_task_name("Refactor parser");

        assert!(timer.start(None).unwrap());
        clock.advance_secs(125);
        assert!(timer.pause());
        assert_eq!(timer.elapsed(), 125);

        clock.advance_secs(75);
        assert_eq!(timer.elapsed(), 125);
        assert!(timer.resume());

        clock.advance_secs(60);
        let session = timer.stop().unwrap().unwrap();
        assert_eq!(session.duration, 185);
        assert_eq!(session.task_name, "Refactor parser");
        assert_eq!(session.start_time, t0());
        assert_eq!(session.end_time, t0() + chrono::Duration::seconds(260));

        assert_eq!(storage.load::<WorkSession>(), vec![session]);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.config().elapsed, 0);
        assert!(timer.config().task_name.is_empty());
        assert!(timer.config().project_ids.is_empty());
    }

    #[test]
    fn uninterrupted_session_duration_matches_boundaries() {
        let (storage, clock) = setup();
        let mut timer = Timer::restore(&storage, &clock);
        timer.start(None).unwrap();
        clock.advance_secs(3601);

        let session = timer.stop().unwrap().unwrap();
        assert_eq!(
            session.duration,
            (session.end_time - session.start_time).num_seconds()
        );
        assert_eq!(session.task_name, UNTITLED_SESSION);
    }

    #[test]
    fn stop_without_elapsed_time_records_nothing() {
        let (storage, clock) = setup();
        let mut timer = Timer::restore(&storage, &clock);
        timer.start(None).unwrap();
        assert_eq!(timer.stop().unwrap(), None);
        assert!(storage.load::<WorkSession>().is_empty());
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn elapsed_survives_reload_regardless_of_gap() {
        let (storage, clock) = setup();
        {
            let mut timer = Timer::restore(&storage, &clock);
            timer.set_task_name("Long haul");
            timer.start(None).unwrap();
            clock.advance_secs(100);
            timer.pause();
            clock.advance_secs(50);
            timer.resume();
        }

        clock.advance_secs(3 * 24 * 3600);
        let timer = Timer::restore(&storage, &clock);
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.elapsed(), 100 + 3 * 24 * 3600);
        assert_eq!(timer.config().elapsed, 100 + 3 * 24 * 3600);
        assert_eq!(timer.config().task_name, "Long haul");
    }

    #[test]
    fn paused_timer_does_not_grow_across_reload() {
        let (storage, clock) = setup();
        {
            let mut timer = Timer::restore(&storage, &clock);
            timer.start(None).unwrap();
            clock.advance_secs(42);
            timer.pause();
        }
        clock.advance_secs(10_000);
        let timer = Timer::restore(&storage, &clock);
        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.elapsed(), 42);
    }

    #[test]
    fn countdown_enters_overtime_once_and_keeps_counting() {
        let (storage, clock) = setup();
        let mut timer = Timer::restore(&storage, &clock);
        assert!(timer.set_mode(TimerMode::Countdown));
        assert!(timer.set_duration(1500));
        timer.start(None).unwrap();

        clock.advance_secs(1499);
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.display_seconds(), 1);
        assert!(!timer.is_overtime());

        clock.advance_secs(1);
        assert_eq!(timer.tick(), Some(TimerEvent::CountdownComplete));
        assert!(timer.is_overtime());
        assert_eq!(timer.formatted_display(), "+00:00:00");

        clock.advance_secs(120);
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.display_seconds(), 120);
        assert_eq!(timer.formatted_display(), "+00:02:00");
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn mode_and_duration_locked_outside_idle() {
        let (storage, clock) = setup();
        let mut timer = Timer::restore(&storage, &clock);
        timer.start(None).unwrap();
        assert!(!timer.set_mode(TimerMode::Countdown));
        assert!(!timer.set_duration(60));
        assert_eq!(timer.config().mode, TimerMode::Stopwatch);

        timer.set_task_name("still editable");
        timer.set_project_ids(vec!["2".to_string()]);
        assert_eq!(timer.config().task_name, "still editable");
        assert!(!timer.start(None).unwrap());
    }

    #[test]
    fn reset_keeps_task_details_and_discard_clears_them() {
        let (storage, clock) = setup();
        let mut timer = Timer::restore(&storage, &clock);
        timer.set_task_name("Reading");
        timer.set_project_ids(vec!["3".to_string()]);
        timer.start(None).unwrap();
        clock.advance_secs(30);

        timer.reset();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.elapsed(), 0);
        assert_eq!(timer.config().task_name, "Reading");
        assert!(storage.load::<WorkSession>().is_empty());
        assert!(storage.store().get(TIMER_KEY).unwrap().is_some());

        timer.discard();
        assert!(timer.config().task_name.is_empty());
        assert!(timer.config().project_ids.is_empty());
        assert!(storage.store().get(TIMER_KEY).unwrap().is_none());
    }

    #[test]
    fn continuing_a_session_shares_its_group() {
        let (storage, clock) = setup();
        let mut timer = Timer::restore(&storage, &clock);
        timer.set_task_name("Thesis");
        timer.set_project_ids(vec!["4".to_string()]);
        timer.set_planner_task_id(Some("task-1".to_string()));
        timer.start(None).unwrap();
        clock.advance_secs(600);
        let first = timer.stop().unwrap().unwrap();
        assert_eq!(first.group_id, None);
        assert_eq!(first.planner_task_id.as_deref(), Some("task-1"));

        clock.advance_secs(3600);
        assert!(timer.start(Some(first.id.as_str())).unwrap());
        assert_eq!(timer.config().task_name, "Thesis");
        let group = timer.group_id().unwrap().to_string();
        clock.advance_secs(300);
        let second = timer.stop().unwrap().unwrap();

        let sessions = storage.load::<WorkSession>();
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().all(|s| s.group_id.as_deref() == Some(group.as_str())));
        assert_eq!(second.project_ids, vec!["4".to_string()]);
        assert_eq!(second.planner_task_id.as_deref(), Some("task-1"));

        // The chain keeps reusing the same group.
        timer.start(Some(second.id.as_str())).unwrap();
        assert_eq!(timer.group_id(), Some(group.as_str()));
    }

    #[test]
    fn corrupt_snapshot_restores_idle_timer() {
        let (storage, clock) = setup();
        storage.store().set(TIMER_KEY, "{\"config\": 7}").unwrap();
        let timer = Timer::restore(&storage, &clock);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.elapsed(), 0);
    }

    #[test]
    fn notes_are_committed_with_the_session() {
        let (storage, clock) = setup();
        let mut timer = Timer::restore(&storage, &clock);
        timer.start(None).unwrap();
        timer.set_notes("{\"type\":\"doc\"}");
        clock.advance_secs(5);
        let session = timer.stop().unwrap().unwrap();
        assert_eq!(session.notes.as_deref(), Some("{\"type\":\"doc\"}"));
        assert_eq!(timer.notes(), "");
    }

    #[test]
    fn explicit_details_win_over_continued_session() {
        let (storage, clock) = setup();
        let mut timer = Timer::restore(&storage, &clock);
        timer.set_task_name("Old");
        timer.set_project_ids(vec!["1".to_string()]);
        timer.start(None).unwrap();
        clock.advance_secs(60);
        let first = timer.stop().unwrap().unwrap();

        timer.set_task_name("New");
        timer.set_project_ids(vec!["2".to_string()]);
        timer.start(Some(first.id.as_str())).unwrap();
        clock.advance_secs(60);
        let second = timer.stop().unwrap().unwrap();

        assert_eq!(second.task_name, "New");
        assert_eq!(second.project_ids, vec!["2".to_string()]);
        assert!(second.group_id.is_some());
        assert_eq!(second.group_id, storage.load::<WorkSession>()[0].group_id);
    }

    #[test]
    fn snapshot_without_banked_time_keeps_stored_elapsed() {
        let (storage, clock) = setup();
        storage
            .store()
            .set(
                TIMER_KEY,
                r#"{"config":{"mode":"stopwatch","duration":0,"elapsed":600,"state":"paused","taskName":"Essay","projectIds":[]},"startTime":"2024-06-03T08:00:00Z","lastUpdateTime":"2024-06-03T08:10:00Z","notes":""}"#,
            )
            .unwrap();

        let mut timer = Timer::restore(&storage, &clock);
        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.elapsed(), 600);

        let session = timer.stop().unwrap().unwrap();
        assert_eq!(session.duration, 600);
        assert_eq!(session.task_name, "Essay");
    }

    #[test]
    fn running_snapshot_without_anchor_counts_from_last_write() {
        let (storage, clock) = setup();
        // Written 5 minutes before t0 with 120 seconds already elapsed.
        storage
            .store()
            .set(
                TIMER_KEY,
                r#"{"config":{"mode":"stopwatch","duration":0,"elapsed":120,"state":"running","taskName":"","projectIds":[]},"startTime":"2024-06-03T08:53:00Z","lastUpdateTime":"2024-06-03T08:55:00Z"}"#,
            )
            .unwrap();

        let timer = Timer::restore(&storage, &clock);
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.elapsed(), 120 + 300);
        assert_eq!(
            timer.start_time(),
            Some(Utc.with_ymd_and_hms(2024, 6, 3, 8, 53, 0).unwrap())
        );
    }
}
