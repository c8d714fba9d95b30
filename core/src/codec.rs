//! Line codec for client connections.
//!
//! Inbound lines may end in `\n`, `\r\n` or a bare `\r`; the terminator is
//! stripped. Outbound items are encoded as prefixed `\n`-terminated lines.

use crate::message::Reply;
use crate::Error;
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

pub struct ChatLineCodec {
    /// Index of next byte to check for a terminator
    next_index: usize,
    /// Maximum line length, terminator included
    max_len: usize,
    /// Previous line ended in `\r`, so a leading `\n` belongs to it
    skip_lf: bool,
}

impl ChatLineCodec {
    pub fn new(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            skip_lf: false,
        }
    }
}

impl Decoder for ChatLineCodec {
    type Item = String;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, Error> {
        if self.skip_lf && !src.is_empty() {
            if src[0] == b'\n' {
                let _ = src.split_to(1);
            }
            self.skip_lf = false;
        }

        let Some(offset) = src[self.next_index..]
            .iter()
            .position(|b| *b == b'\n' || *b == b'\r')
        else {
            // No complete line yet - remember where we stopped
            self.next_index = src.len();
            if src.len() > self.max_len {
                return Err(Error::Codec(format!(
                    "Line exceeds {} bytes",
                    self.max_len
                )));
            }
            return Ok(None);
        };

        let end = self.next_index + offset;
        self.next_index = 0;
        if end + 1 > self.max_len {
            return Err(Error::Codec(format!("Line exceeds {} bytes", self.max_len)));
        }

        let line = src.split_to(end + 1);
        let terminator = line[end];
        if terminator == b'\r' {
            if src.first() == Some(&b'\n') {
                let _ = src.split_to(1);
            } else if src.is_empty() {
                self.skip_lf = true;
            }
        }

        Ok(Some(String::from_utf8_lossy(&line[..end]).into_owned()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }

        // Unterminated trailing line
        self.next_index = 0;
        let rest = src.split_to(src.len());
        Ok(Some(String::from_utf8_lossy(&rest).into_owned()))
    }
}

impl Encoder<Reply> for ChatLineCodec {
    type Error = Error;

    fn encode(&mut self, reply: Reply, dst: &mut BytesMut) -> Result<(), Error> {
        let wire = reply.to_wire();
        dst.reserve(wire.len());
        dst.put_slice(wire.as_bytes());
        Ok(())
    }
}
