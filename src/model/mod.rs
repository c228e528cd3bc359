pub mod config;
pub mod date;
pub mod task;
pub mod user;

pub use config::*;
pub use task::{Task, TaskDraft, TaskPatch, TASKS};
pub use user::*;
