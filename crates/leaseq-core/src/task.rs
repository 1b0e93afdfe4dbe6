use crate::{QueueError, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a task
pub type TaskId = Uuid;

/// Timestamp rendering used in snapshot records (second precision, UTC)
pub const LEASE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Task status in the queue system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Task is waiting to be leased by a consumer
    Pending,
    /// Task has been delivered and its visibility timeout is running
    Leased,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Leased => "leased",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "leased" => Some(TaskStatus::Leased),
            _ => None,
        }
    }
}

/// The tuple handed to a consumer on a successful lease
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub id: TaskId,
    pub length: u64,
    pub data: String,
}

/// A single unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Unique task identifier, assigned at creation and never reassigned
    pub id: TaskId,

    /// Client-supplied length, informational only
    pub length: u64,

    /// Opaque payload
    pub data: String,

    /// Name of the owning queue, immutable after creation
    pub queue: String,

    /// Current status
    pub status: TaskStatus,

    /// Set exactly when the task becomes Leased, renewed on re-lease
    pub lease_start: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new Pending task with a fresh id
    pub fn new(length: u64, data: String, queue: String) -> Self {
        Task {
            id: Uuid::new_v4(),
            length,
            data,
            queue,
            status: TaskStatus::Pending,
            lease_start: None,
        }
    }

    /// Whether the task may be leased at `now`: Pending, or Leased with an
    /// expired visibility timeout.
    pub fn is_eligible(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        match self.status {
            TaskStatus::Pending => true,
            TaskStatus::Leased => match self.lease_start {
                Some(start) => now - start >= timeout,
                // Leased implies lease_start is set; treat the broken case
                // as ineligible so lease() can report it
                None => false,
            },
        }
    }

    /// Transition to Leased at `now` and hand out the payload.
    ///
    /// Re-leasing a task whose previous lease has expired renews
    /// `lease_start` (same identity, fresh visibility window). Calling this
    /// on an ineligible task violates the queue invariant.
    pub fn lease(&mut self, now: DateTime<Utc>, timeout: Duration) -> Result<Delivery> {
        if !self.is_eligible(now, timeout) {
            return Err(QueueError::InternalState(format!(
                "task {} leased while ineligible",
                self.id.simple()
            )));
        }

        self.status = TaskStatus::Leased;
        self.lease_start = Some(now);

        Ok(Delivery {
            id: self.id,
            length: self.length,
            data: self.data.clone(),
        })
    }

    /// Lossless structural form for the snapshot codec
    pub fn to_record(&self) -> TaskRecord {
        TaskRecord {
            id: self.id.simple().to_string(),
            length: self.length,
            data: self.data.clone(),
            timeout: self
                .lease_start
                .map(|t| t.format(LEASE_TIMESTAMP_FORMAT).to_string()),
            queue: self.queue.clone(),
            status: self.status.as_str().to_string(),
        }
    }

    /// Rebuild a task from its snapshot record, rejecting malformed ids,
    /// unknown statuses, and unparseable lease timestamps.
    pub fn from_record(record: &TaskRecord) -> Result<Self> {
        let id = Uuid::parse_str(&record.id)
            .map_err(|_| QueueError::InvalidRecord(format!("bad task id: {}", record.id)))?;

        let status = TaskStatus::parse(&record.status)
            .ok_or_else(|| QueueError::InvalidRecord(format!("bad status: {}", record.status)))?;

        let lease_start = match &record.timeout {
            Some(raw) => {
                let naive = NaiveDateTime::parse_from_str(raw, LEASE_TIMESTAMP_FORMAT)
                    .map_err(|_| {
                        QueueError::InvalidRecord(format!("bad lease timestamp: {raw}"))
                    })?;
                Some(naive.and_utc())
            }
            None => None,
        };

        if status == TaskStatus::Leased && lease_start.is_none() {
            return Err(QueueError::InvalidRecord(format!(
                "leased task {} has no lease timestamp",
                record.id
            )));
        }

        Ok(Task {
            id,
            length: record.length,
            data: record.data.clone(),
            queue: record.queue.clone(),
            status,
            lease_start,
        })
    }
}

/// Serialized form of a task inside a queue snapshot line.
///
/// The `timeout` field holds the lease-start instant; the name is kept from
/// the historic snapshot format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub length: u64,
    pub data: String,
    pub timeout: Option<String>,
    pub queue: String,
    pub status: String,
}
