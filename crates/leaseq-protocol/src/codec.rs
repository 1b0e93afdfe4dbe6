use crate::{ProtocolError, Response, Result, MAX_FRAME_SIZE};
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Codec for the line-oriented wire protocol.
///
/// A frame is one UTF-8 line terminated by `\n` (a trailing `\r` is
/// tolerated and stripped). Decoding yields the raw frame text; request
/// parsing happens above the codec so a malformed frame produces an error
/// response instead of tearing down the connection.
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        FrameCodec {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    #[cfg(test)]
    fn with_max_frame_size(max_frame_size: usize) -> Self {
        FrameCodec { max_frame_size }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let newline = src.iter().position(|&b| b == b'\n');

        let newline = match newline {
            Some(idx) => idx,
            None => {
                // No terminator yet; refuse to buffer without bound
                if src.len() > self.max_frame_size {
                    return Err(ProtocolError::FrameTooLarge(src.len()));
                }
                return Ok(None);
            }
        };

        if newline > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge(newline));
        }

        let mut line = src.split_to(newline + 1);
        line.truncate(newline); // drop the '\n'
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }

        let frame =
            String::from_utf8(line.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)?;
        Ok(Some(frame))
    }
}

impl Encoder<Response> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<()> {
        let rendered = item.to_string();
        dst.reserve(rendered.len() + 1);
        dst.put_slice(rendered.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
