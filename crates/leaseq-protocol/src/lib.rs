mod codec;
mod request;
mod response;

pub use codec::FrameCodec;
pub use request::Request;
pub use response::Response;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("wrong argument count for {command}: expected {expected}")]
    WrongArgumentCount {
        command: &'static str,
        expected: usize,
    },

    #[error("invalid length argument: {0}")]
    InvalidLength(String),

    #[error("empty frame")]
    EmptyFrame,

    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("frame is not valid UTF-8")]
    InvalidUtf8,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Maximum frame size: 1MiB, generous for a single textual request line
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;
