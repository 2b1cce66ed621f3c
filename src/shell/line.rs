//! Line buffer for console input

use unicode_width::UnicodeWidthChar;

/// maximum number of bytes in one input line
pub const LINE_CAPACITY: usize = 255;

/// Bounded input line.
///
/// Stores raw bytes as typed. Bytes beyond [`LINE_CAPACITY`] are refused.
/// Columns are counted by display width, so wide (CJK) characters take two
/// and the terminal erase count stays exact for non-ASCII input.
#[derive(Clone, Debug, Default)]
pub struct InputLine {
    buf: Vec<u8>,
    overflowed: bool,
}

impl InputLine {
    /// Create empty line
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(LINE_CAPACITY),
            overflowed: false,
        }
    }

    /// Push a byte, returns false when the line is full
    pub fn push(&mut self, byte: u8) -> bool {
        if self.buf.len() < LINE_CAPACITY {
            self.buf.push(byte);
            true
        } else {
            self.overflowed = true;
            false
        }
    }

    /// Remove the last character, returns false on an empty line
    pub fn backspace(&mut self) -> bool {
        while let Some(byte) = self.buf.pop() {
            if !is_continuation(byte) {
                return true;
            }
        }
        false
    }

    /// Take the contents, leaving the line empty
    pub fn take(&mut self) -> Vec<u8> {
        self.overflowed = false;
        std::mem::replace(&mut self.buf, Vec::with_capacity(LINE_CAPACITY))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// True once a byte was refused since the line was last taken
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Number of terminal columns the line occupies
    pub fn columns(&self) -> usize {
        let mut chunks = self.buf.utf8_chunks().peekable();
        let mut columns = 0;
        while let Some(chunk) = chunks.next() {
            columns += chunk
                .valid()
                .chars()
                .map(|c| c.width().unwrap_or(0))
                .sum::<usize>();
            // a partial character at the end is still being typed and shows nothing
            if !chunk.invalid().is_empty() && chunks.peek().is_some() {
                columns += 1;
            }
        }
        columns
    }
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}
