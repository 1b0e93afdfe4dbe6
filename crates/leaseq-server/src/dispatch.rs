use crate::registry::Registry;
use chrono::{DateTime, Utc};
use leaseq_core::{QueueError, TaskId};
use leaseq_protocol::{Request, Response};
use tracing::error;
use uuid::Uuid;

/// Parse one request frame, route it to the registry, and format the
/// result as a response.
///
/// Missing queues and absent task ids degrade to negative responses;
/// malformed frames get an `ERR` response. Neither ends the connection.
pub fn dispatch(registry: &Registry, frame: &str, now: DateTime<Utc>) -> Response {
    match Request::parse(frame) {
        Ok(request) => execute(registry, request, now),
        Err(e) => Response::Error(e.to_string()),
    }
}

fn execute(registry: &Registry, request: Request, now: DateTime<Utc>) -> Response {
    match request {
        Request::Add {
            queue,
            length,
            data,
        } => Response::Id(registry.add_task(&queue, length, data)),

        Request::Get { queue } => match registry.get_task(&queue, now) {
            Ok(Some(delivery)) => Response::Delivery(delivery),
            // An unknown queue looks the same as an empty one to GET
            Ok(None) | Err(QueueError::QueueNotFound(_)) => Response::None,
            Err(e) => internal(&e),
        },

        Request::Ack { queue, id } => match parse_id(&id) {
            Some(id) => match registry.ack_task(&queue, &id) {
                Ok(true) => Response::Yes,
                Ok(false) | Err(QueueError::QueueNotFound(_)) => Response::No,
                Err(e) => internal(&e),
            },
            // An id that is not even well-formed cannot be present
            None => Response::No,
        },

        Request::In { queue, id } => match parse_id(&id) {
            Some(id) => match registry.check_task(&queue, &id) {
                Ok(true) => Response::Yes,
                Ok(false) | Err(QueueError::QueueNotFound(_)) => Response::No,
                Err(e) => internal(&e),
            },
            None => Response::No,
        },

        Request::Save => match registry.save() {
            Ok(()) => Response::Saved,
            Err(e) => {
                error!(error = %e, "snapshot write failed");
                Response::Error(format!("save failed: {e}"))
            }
        },
    }
}

fn parse_id(raw: &str) -> Option<TaskId> {
    Uuid::parse_str(raw).ok()
}

fn internal(e: &QueueError) -> Response {
    // Invariant violations indicate queue corruption; never absorb silently
    error!(error = %e, "internal state error");
    Response::Error(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn registry(dir: &TempDir, timeout_secs: i64) -> Registry {
        Registry::new(Duration::seconds(timeout_secs), dir.path())
    }

    /// The literal lifecycle scenario: ADD, IN, GET, ACK, ACK, IN.
    #[test]
    fn lifecycle_scenario() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, 300);
        let now = t0();

        let id = match dispatch(&registry, "ADD q1 5 hello", now) {
            Response::Id(id) => id.simple().to_string(),
            other => panic!("expected id, got {other:?}"),
        };

        assert_eq!(dispatch(&registry, &format!("IN q1 {id}"), now), Response::Yes);

        let reply = dispatch(&registry, "GET q1", now);
        assert_eq!(reply.to_string(), format!("{id} 5 hello"));

        assert_eq!(dispatch(&registry, &format!("IN q1 {id}"), now), Response::Yes);
        assert_eq!(dispatch(&registry, &format!("ACK q1 {id}"), now), Response::Yes);
        assert_eq!(dispatch(&registry, &format!("ACK q1 {id}"), now), Response::No);
        assert_eq!(dispatch(&registry, &format!("IN q1 {id}"), now), Response::No);
    }

    /// The literal timeout scenario with a 5 second visibility timeout.
    #[test]
    fn timeout_scenario() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, 5);

        let id = match dispatch(&registry, "ADD q 5 x", t0()) {
            Response::Id(id) => id.simple().to_string(),
            other => panic!("expected id, got {other:?}"),
        };

        // t=1: leased
        let reply = dispatch(&registry, "GET q", t0() + Duration::seconds(1));
        assert!(reply.to_string().starts_with(&id));

        // t=3: still leased, not expired
        assert_eq!(
            dispatch(&registry, "GET q", t0() + Duration::seconds(3)),
            Response::None
        );

        // t=6: expired, re-leased
        let reply = dispatch(&registry, "GET q", t0() + Duration::seconds(6));
        assert!(reply.to_string().starts_with(&id));

        assert_eq!(
            dispatch(&registry, &format!("ACK q {id}"), t0() + Duration::seconds(7)),
            Response::Yes
        );
    }

    #[test]
    fn get_on_unknown_queue_answers_none() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, 30);

        assert_eq!(dispatch(&registry, "GET nowhere", t0()), Response::None);
    }

    #[test]
    fn ack_and_in_on_unknown_queue_answer_no() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, 30);
        let id = TaskId::new_v4().simple().to_string();

        assert_eq!(dispatch(&registry, &format!("ACK nowhere {id}"), t0()), Response::No);
        assert_eq!(dispatch(&registry, &format!("IN nowhere {id}"), t0()), Response::No);
    }

    #[test]
    fn malformed_id_answers_no() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, 30);
        registry.add_task("q", 1, "x".to_string());

        assert_eq!(dispatch(&registry, "IN q not-a-uuid", t0()), Response::No);
    }

    #[test]
    fn protocol_errors_become_err_responses() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, 30);

        assert!(matches!(
            dispatch(&registry, "NOPE q1", t0()),
            Response::Error(_)
        ));
        assert!(matches!(
            dispatch(&registry, "GET", t0()),
            Response::Error(_)
        ));
        assert!(matches!(
            dispatch(&registry, "ADD q1 five data", t0()),
            Response::Error(_)
        ));
    }

    #[test]
    fn add_with_spaced_payload_roundtrips_through_get() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, 30);

        let id = match dispatch(&registry, "ADD q 13 hello world !", t0()) {
            Response::Id(id) => id.simple().to_string(),
            other => panic!("expected id, got {other:?}"),
        };

        let reply = dispatch(&registry, "GET q", t0());
        assert_eq!(reply.to_string(), format!("{id} 13 hello world !"));
    }

    #[test]
    fn save_then_load_serves_the_same_tasks() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, 30);

        let id = match dispatch(&registry, "ADD q1 5 hello", t0()) {
            Response::Id(id) => id.simple().to_string(),
            other => panic!("expected id, got {other:?}"),
        };
        assert_eq!(dispatch(&registry, "SAVE", t0()), Response::Saved);

        let restored = Registry::new(Duration::seconds(30), dir.path());
        restored.load().unwrap();

        assert_eq!(
            dispatch(&restored, &format!("IN q1 {id}"), t0()),
            Response::Yes
        );
    }
}
