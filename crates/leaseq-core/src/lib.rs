mod error;
mod task;

pub use error::{QueueError, Result};
pub use task::{Delivery, Task, TaskId, TaskRecord, TaskStatus, LEASE_TIMESTAMP_FORMAT};
