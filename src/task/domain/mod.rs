//! Domain model for the task lifecycle.
//!
//! Validated value types guard task construction; the [`TaskStatus`]
//! transition table guards every later change.

mod details;
mod error;
mod ids;
mod schedule;
mod task;

pub use details::{TaskDescription, TaskTitle};
pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{MaxClaimants, Reward, TaskId};
pub use schedule::TaskSchedule;
pub use task::{PersistedTaskData, Task, TaskDraft, TaskStatus};
