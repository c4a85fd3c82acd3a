//! # Scheduler Binding
//!
//! Job scheduler abstraction used by initiators: triggers grouped per
//! job group, pause/resume of a whole group, and a recovery trigger that
//! lives alongside the business-as-usual ones.

pub mod binding;
pub mod errors;
pub mod local;
pub mod store;
pub mod trigger;

pub use binding::SchedulerBinding;
pub use errors::{SchedulerError, SchedulerResult};
pub use local::LocalScheduler;
pub use store::{FileTriggerStore, MemTriggerStore, StoredSchedule, StoredTrigger, TriggerStore};
pub use trigger::{JobDetail, JobKey, Trigger, TriggerKey, TriggerSchedule, TriggerState, DEFAULT_GROUP};
