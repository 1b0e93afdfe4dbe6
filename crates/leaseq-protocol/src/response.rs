use leaseq_core::{Delivery, TaskId};
use std::fmt;

/// One server response frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Id of a freshly added task
    Id(TaskId),

    /// A leased task: `<id> <length> <data>`
    Delivery(Delivery),

    /// No eligible task available (or unknown queue on GET)
    None,

    /// Positive answer for ACK/IN
    Yes,

    /// Negative answer for ACK/IN
    No,

    /// SAVE completed durably
    Saved,

    /// Request could not be served; the `ERR` prefix keeps this
    /// distinguishable from ids and YES/NO
    Error(String),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Id(id) => write!(f, "{}", id.simple()),
            Response::Delivery(d) => write!(f, "{} {} {}", d.id.simple(), d.length, d.data),
            Response::None => write!(f, "NONE"),
            Response::Yes => write!(f, "YES"),
            Response::No => write!(f, "NO"),
            Response::Saved => write!(f, "OK"),
            Response::Error(reason) => write!(f, "ERR {reason}"),
        }
    }
}
