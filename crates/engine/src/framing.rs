//! Newline-delimited frame reassembly over arbitrary byte chunks.
//!
//! Transports deliver output as raw chunks cut wherever the pipe or
//! network happened to flush. [`FrameReassembler`] buffers those bytes
//! and hands back exactly the `\n`-terminated frames, so an event split
//! across two reads comes out whole and a chunk carrying three events
//! comes out as three frames.

/// Reassembles newline-delimited frames from a chunked byte stream.
///
/// One instance per output channel; it is the sole owner of that
/// channel's partial-frame state. Frames come back in input order with
/// the trailing `\n` (and a preceding `\r`, if any) stripped.
#[derive(Debug, Default)]
pub struct FrameReassembler {
    pending: Vec<u8>,
}

impl FrameReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one chunk and return every frame it completes.
    ///
    /// Splitting happens on bytes, before any text decoding, so a
    /// multi-byte character cut in half by a chunk boundary is
    /// reassembled intact.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos;
            frames.push(decode_frame_bytes(&self.pending[start..end]));
            start = end + 1;
        }
        self.pending.drain(..start);
        frames
    }

    /// Consume the reassembler, yielding the final unterminated frame
    /// if the stream ended without a trailing newline.
    pub fn finish(self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(decode_frame_bytes(&self.pending))
        }
    }
}

/// Decode one frame's bytes, dropping a trailing `\r`.
fn decode_frame_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
