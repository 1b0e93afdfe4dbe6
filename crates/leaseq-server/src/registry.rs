use crate::queue::TaskQueue;
use chrono::{DateTime, Duration, Utc};
use leaseq_core::{Delivery, QueueError, Result, Task, TaskId};
use leaseq_persistence::{self as persistence, SnapshotStore};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// The process-wide collection of queues, plus persistence.
///
/// An explicit instance with no ambient state; tests construct as many
/// independent registries as they like. Queues are created lazily on first
/// `ADD` and never destroyed. Operations on different queues only contend
/// on the brief map lookup.
pub struct Registry {
    queues: RwLock<HashMap<String, Arc<TaskQueue>>>,
    visibility_timeout: Duration,
    store: SnapshotStore,
}

impl Registry {
    pub fn new(visibility_timeout: Duration, checkpoint_dir: &Path) -> Self {
        Registry {
            queues: RwLock::new(HashMap::new()),
            visibility_timeout,
            store: SnapshotStore::new(checkpoint_dir),
        }
    }

    /// Create and enqueue a new task, creating the queue if needed.
    /// Always succeeds; returns the fresh task id.
    pub fn add_task(&self, queue: &str, length: u64, data: String) -> TaskId {
        let queue = self.queue_or_create(queue);
        let task = Task::new(length, data, queue.name().to_string());
        let id = task.id;
        queue.push(task);
        debug!(queue = queue.name(), id = %id.simple(), "added task");
        id
    }

    /// Lease the first eligible task at `now`, or `None` if nothing
    /// qualifies. Unknown queue names fail.
    pub fn get_task(&self, queue: &str, now: DateTime<Utc>) -> Result<Option<Delivery>> {
        self.queue(queue)?.pop(now)
    }

    /// Permanently remove a task. Returns whether it was present.
    pub fn ack_task(&self, queue: &str, id: &TaskId) -> Result<bool> {
        Ok(self.queue(queue)?.delete(id))
    }

    /// Whether the task is still present in the queue.
    pub fn check_task(&self, queue: &str, id: &TaskId) -> Result<bool> {
        Ok(self.queue(queue)?.exists(id))
    }

    /// Serialize every queue into the snapshot file.
    ///
    /// The map read lock is held while records are collected, so no queue
    /// can be created mid-snapshot; each queue's own lock covers its
    /// serialization. Write failures propagate — a silently failed
    /// snapshot would masquerade as durability.
    pub fn save(&self) -> persistence::Result<()> {
        let records = {
            let queues = self.queues.read();
            let mut records: Vec<_> = queues.values().map(|q| q.snapshot()).collect();
            records.sort_by(|a, b| a.name.cmp(&b.name));
            records
        };

        self.store.write(&records)
    }

    /// Rebuild all queues from the snapshot file.
    ///
    /// A missing snapshot leaves the registry empty. Any other failure
    /// (unreadable file, corrupt record) returns an error without
    /// committing a partially replayed map.
    pub fn load(&self) -> persistence::Result<()> {
        let records = match self.store.read()? {
            Some(records) => records,
            None => {
                info!("no snapshot to load, starting empty");
                return Ok(());
            }
        };

        let mut map = HashMap::new();
        for record in records {
            let queue = TaskQueue::new(record.name.clone(), self.visibility_timeout);
            for task_record in &record.tasks_list {
                queue.push(Task::from_record(task_record)?);
            }
            debug!(queue = record.name.as_str(), tasks = queue.len(), "loaded queue");
            map.insert(record.name, Arc::new(queue));
        }

        info!(queues = map.len(), "loaded snapshot");
        *self.queues.write() = map;
        Ok(())
    }

    fn queue(&self, name: &str) -> Result<Arc<TaskQueue>> {
        self.queues
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| QueueError::QueueNotFound(name.to_string()))
    }

    fn queue_or_create(&self, name: &str) -> Arc<TaskQueue> {
        if let Some(queue) = self.queues.read().get(name) {
            return queue.clone();
        }

        let mut queues = self.queues.write();
        queues
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(TaskQueue::new(name.to_string(), self.visibility_timeout))
            })
            .clone()
    }
}
