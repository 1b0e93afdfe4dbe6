use chrono::{DateTime, Duration, Utc};
use leaseq_core::{Delivery, Result, Task, TaskId};
use leaseq_persistence::QueueRecord;
use parking_lot::Mutex;

/// A named, ordered collection of tasks and the lease/expiry scan over it.
///
/// Insertion order is preserved and significant: `pop` always delivers the
/// first eligible task. Mutating operations take the internal lock for the
/// duration of one call, so concurrent pops on the same queue never lease
/// the same task.
pub struct TaskQueue {
    name: String,
    visibility_timeout: Duration,
    tasks: Mutex<Vec<Task>>,
}

impl TaskQueue {
    pub fn new(name: String, visibility_timeout: Duration) -> Self {
        TaskQueue {
            name,
            visibility_timeout,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a task at the tail. O(1).
    pub fn push(&self, task: Task) {
        self.tasks.lock().push(task);
    }

    /// Lease and return the first eligible task at `now`.
    ///
    /// Unexpired leases are skipped, not waited on, so they never block
    /// delivery of later Pending tasks (deliberately not strict FIFO).
    /// Returns `None` when nothing qualifies; never blocks.
    pub fn pop(&self, now: DateTime<Utc>) -> Result<Option<Delivery>> {
        let mut tasks = self.tasks.lock();

        for task in tasks.iter_mut() {
            if task.is_eligible(now, self.visibility_timeout) {
                return task.lease(now, self.visibility_timeout).map(Some);
            }
        }

        Ok(None)
    }

    /// Remove the task with the given id regardless of its lease state.
    /// Returns whether one was found and removed. The only removal path.
    pub fn delete(&self, id: &TaskId) -> bool {
        let mut tasks = self.tasks.lock();
        match tasks.iter().position(|t| t.id == *id) {
            Some(idx) => {
                tasks.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Presence test. True for any task still in the queue, including a
    /// leased task whose timeout has expired but which has not been
    /// re-popped yet: existence tracks presence, not lease validity.
    pub fn exists(&self, id: &TaskId) -> bool {
        self.tasks.lock().iter().any(|t| t.id == *id)
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Structural snapshot of this queue, tasks in insertion order.
    pub fn snapshot(&self) -> QueueRecord {
        let tasks = self.tasks.lock();
        QueueRecord {
            name: self.name.clone(),
            tasks_list: tasks.iter().map(Task::to_record).collect(),
            size_list: tasks.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use leaseq_core::TaskStatus;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn queue_with(timeout_secs: i64) -> TaskQueue {
        TaskQueue::new("q".to_string(), Duration::seconds(timeout_secs))
    }

    fn push_task(queue: &TaskQueue, data: &str) -> TaskId {
        let task = Task::new(data.len() as u64, data.to_string(), "q".to_string());
        let id = task.id;
        queue.push(task);
        id
    }

    #[test]
    fn pop_delivers_in_insertion_order() {
        let queue = queue_with(30);
        let id1 = push_task(&queue, "one");
        let id2 = push_task(&queue, "two");
        let id3 = push_task(&queue, "three");

        // Ack after each retrieval, as a well-behaved consumer would
        for expected in [id1, id2, id3] {
            let delivery = queue.pop(t0()).unwrap().unwrap();
            assert_eq!(delivery.id, expected);
            assert!(queue.delete(&expected));
        }
        assert!(queue.pop(t0()).unwrap().is_none());
    }

    #[test]
    fn unexpired_lease_does_not_block_later_tasks() {
        let queue = queue_with(30);
        let id1 = push_task(&queue, "first");
        let id2 = push_task(&queue, "second");

        assert_eq!(queue.pop(t0()).unwrap().unwrap().id, id1);

        // id1 is leased and unexpired; the scan skips it
        let next = queue.pop(t0() + Duration::seconds(1)).unwrap().unwrap();
        assert_eq!(next.id, id2);

        // Everything leased now
        assert!(queue.pop(t0() + Duration::seconds(2)).unwrap().is_none());
    }

    #[test]
    fn expired_lease_is_redelivered_at_the_boundary() {
        let queue = queue_with(5);
        let id = push_task(&queue, "x");

        assert_eq!(queue.pop(t0()).unwrap().unwrap().id, id);
        assert!(queue.pop(t0() + Duration::seconds(4)).unwrap().is_none());

        // Eligible again exactly at lease_start + timeout
        let redelivered = queue.pop(t0() + Duration::seconds(5)).unwrap().unwrap();
        assert_eq!(redelivered.id, id);
    }

    #[test]
    fn redelivery_prefers_the_earlier_expired_task() {
        let queue = queue_with(5);
        let id1 = push_task(&queue, "a");
        let id2 = push_task(&queue, "b");

        assert_eq!(queue.pop(t0()).unwrap().unwrap().id, id1);
        assert_eq!(queue.pop(t0()).unwrap().unwrap().id, id2);

        // Both expired; insertion order wins again
        let later = t0() + Duration::seconds(10);
        assert_eq!(queue.pop(later).unwrap().unwrap().id, id1);
    }

    #[test]
    fn delete_removes_regardless_of_status() {
        let queue = queue_with(30);
        let id = push_task(&queue, "x");

        queue.pop(t0()).unwrap().unwrap();

        // Leased and unexpired, still removable
        assert!(queue.delete(&id));
        assert!(!queue.delete(&id));
        assert!(queue.is_empty());
    }

    #[test]
    fn exists_tracks_presence_not_lease_validity() {
        let queue = queue_with(5);
        let id = push_task(&queue, "x");

        assert!(queue.exists(&id));

        // Still present while leased, and while expired-but-unreclaimed
        queue.pop(t0()).unwrap().unwrap();
        assert!(queue.exists(&id));

        queue.delete(&id);
        assert!(!queue.exists(&id));
    }

    #[test]
    fn snapshot_preserves_order_and_count() {
        let queue = queue_with(30);
        let id1 = push_task(&queue, "a");
        let id2 = push_task(&queue, "b");
        queue.pop(t0()).unwrap().unwrap();

        let record = queue.snapshot();
        assert_eq!(record.name, "q");
        assert_eq!(record.size_list, 2);
        assert_eq!(record.tasks_list[0].id, id1.simple().to_string());
        assert_eq!(record.tasks_list[1].id, id2.simple().to_string());
        assert_eq!(record.tasks_list[0].status, TaskStatus::Leased.as_str());
        assert_eq!(record.tasks_list[1].status, TaskStatus::Pending.as_str());
    }
}
