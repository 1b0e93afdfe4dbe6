use crate::{ProtocolError, Result};

/// One parsed client request frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Submit a new task to a queue
    Add {
        queue: String,
        length: u64,
        data: String,
    },

    /// Lease the first eligible task from a queue
    Get { queue: String },

    /// Acknowledge (permanently remove) a task
    Ack { queue: String, id: String },

    /// Check whether a task is still present
    In { queue: String, id: String },

    /// Write a durable snapshot of all queues
    Save,
}

impl Request {
    /// Parse one frame (already stripped of its line terminator).
    ///
    /// `ADD`'s data argument is rest-of-frame: everything after the third
    /// separator, so payloads may contain interior whitespace.
    pub fn parse(frame: &str) -> Result<Self> {
        if frame.is_empty() {
            return Err(ProtocolError::EmptyFrame);
        }

        let (command, rest) = match frame.split_once(' ') {
            Some((command, rest)) => (command, rest),
            None => (frame, ""),
        };

        match command {
            "ADD" => {
                let (queue, rest) = rest
                    .split_once(' ')
                    .ok_or(Self::arity("ADD", 3))?;
                let (length, data) = rest
                    .split_once(' ')
                    .ok_or(Self::arity("ADD", 3))?;
                if queue.is_empty() || length.is_empty() {
                    return Err(Self::arity("ADD", 3));
                }
                let length = length
                    .parse::<u64>()
                    .map_err(|_| ProtocolError::InvalidLength(length.to_string()))?;
                Ok(Request::Add {
                    queue: queue.to_string(),
                    length,
                    data: data.to_string(),
                })
            }
            "GET" => {
                let queue = Self::exactly_one(rest, "GET")?;
                Ok(Request::Get { queue })
            }
            "ACK" => {
                let (queue, id) = Self::exactly_two(rest, "ACK")?;
                Ok(Request::Ack { queue, id })
            }
            "IN" => {
                let (queue, id) = Self::exactly_two(rest, "IN")?;
                Ok(Request::In { queue, id })
            }
            "SAVE" => {
                if !rest.trim().is_empty() {
                    return Err(Self::arity("SAVE", 0));
                }
                Ok(Request::Save)
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }

    fn arity(command: &'static str, expected: usize) -> ProtocolError {
        ProtocolError::WrongArgumentCount { command, expected }
    }

    fn exactly_one(rest: &str, command: &'static str) -> Result<String> {
        let mut tokens = rest.split_whitespace();
        let first = tokens.next().ok_or(Self::arity(command, 1))?;
        if tokens.next().is_some() {
            return Err(Self::arity(command, 1));
        }
        Ok(first.to_string())
    }

    fn exactly_two(rest: &str, command: &'static str) -> Result<(String, String)> {
        let mut tokens = rest.split_whitespace();
        let first = tokens.next().ok_or(Self::arity(command, 2))?;
        let second = tokens.next().ok_or(Self::arity(command, 2))?;
        if tokens.next().is_some() {
            return Err(Self::arity(command, 2));
        }
        Ok((first.to_string(), second.to_string()))
    }
}
