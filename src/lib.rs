pub mod cli;
pub mod clock;
pub mod config;
pub mod database;
pub mod models;
pub mod planner;
pub mod reports;
pub mod sessions;
pub mod storage;
pub mod task_query;
pub mod timer;
pub mod utils;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use database::Database;
pub use models::{PlannerTask, Project, TaskStatus, TaskView, WorkSession};
pub use planner::Planner;
pub use sessions::SessionLog;
pub use storage::{KeyValueStore, MemoryStore, Storage};
pub use timer::Timer;
pub use utils::Profile;
