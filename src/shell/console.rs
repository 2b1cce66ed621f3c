//! # Console
//!
//! The single terminal output shared by the line editor and the reader loop.
//!
//! The in-progress [`InputLine`] lives here, behind the same lock as the
//! terminal writer. The editor mutates it, the reader only redraws it, and the
//! number of columns erased before a redraw is always computed from the state
//! that was drawn.

use super::line::InputLine;
use log::debug;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// prompt shown in front of the input line
pub const PROMPT: &str = "Enter text to send: ";

/// marker in front of received data (green)
pub const RECEIVED_TAG: &str = "\x1b[0;32mReceived:\x1b[0m";

/// marker in front of sent data (red)
pub const SENT_TAG: &str = "\x1b[0;31msent->\x1b[0m";

/// erase one column: back, blank, back
const ERASE_COLUMN: &[u8] = b"\x08 \x08";

/// Outcome of offering a byte to the input line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Push {
    /// stored and echoed
    Echoed,
    /// the line just filled up, first byte dropped since it was last emptied
    Full,
    /// the line is still full, the byte was dropped
    Dropped,
}

struct ConsoleState {
    out: Box<dyn Write + Send>,
    line: InputLine,
    prompt_shown: bool,
}

impl ConsoleState {
    /// columns currently occupied by prompt and input
    fn drawn_columns(&self) -> usize {
        if self.prompt_shown {
            PROMPT.len() + self.line.columns()
        } else {
            0
        }
    }

    fn erase(&mut self, columns: usize) -> io::Result<()> {
        for _ in 0..columns {
            self.out.write_all(ERASE_COLUMN)?;
        }
        Ok(())
    }

    fn draw_prompt(&mut self) -> io::Result<()> {
        self.out.write_all(PROMPT.as_bytes())?;
        self.out.write_all(self.line.as_bytes())?;
        self.prompt_shown = true;
        Ok(())
    }

    /// erase prompt and input, print a full line, draw them again
    fn interject(&mut self, message: &str) -> io::Result<()> {
        let columns = self.drawn_columns();
        self.erase(columns)?;
        writeln!(self.out, "{message}")?;
        if self.prompt_shown {
            self.draw_prompt()?;
        }
        self.out.flush()
    }
}

/// Shared terminal output.
pub struct Console {
    state: Mutex<ConsoleState>,
}

impl Console {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Console {
            state: Mutex::new(ConsoleState {
                out,
                line: InputLine::new(),
                prompt_shown: false,
            }),
        }
    }

    /// Console on the process's standard output
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    fn lock(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Show the prompt followed by any pending input
    pub fn prompt(&self) {
        let mut state = self.lock();
        if state.prompt_shown {
            return;
        }
        let result = state.draw_prompt().and_then(|_| state.out.flush());
        report(result);
    }

    /// Append a byte to the input line and echo it
    pub fn push(&self, byte: u8) -> Push {
        let mut state = self.lock();
        let already_full = state.line.overflowed();
        if !state.line.push(byte) {
            return if already_full { Push::Dropped } else { Push::Full };
        }
        let result = state
            .out
            .write_all(&[byte])
            .and_then(|_| state.out.flush());
        report(result);
        Push::Echoed
    }

    /// Remove the last character and erase its columns, false on empty line
    pub fn backspace(&self) -> bool {
        let mut state = self.lock();
        let before = state.line.columns();
        if !state.line.backspace() {
            return false;
        }
        let removed = before - state.line.columns();
        let result = state.erase(removed).and_then(|_| state.out.flush());
        report(result);
        true
    }

    /// Erase prompt and input from the terminal and hand back the line.
    ///
    /// The prompt stays hidden until the next [`Console::prompt`], so status
    /// lines printed in between are not followed by a stale prompt.
    pub fn take_line(&self) -> Vec<u8> {
        let mut state = self.lock();
        let columns = state.drawn_columns();
        let result = state.erase(columns).and_then(|_| state.out.flush());
        report(result);
        state.prompt_shown = false;
        state.line.take()
    }

    /// Print one line above the prompt, keeping the user's partial input
    pub fn interject(&self, message: &str) {
        let result = self.lock().interject(message);
        report(result);
    }

    /// Print a status line for a failed operation
    pub fn error(&self, message: &str) {
        self.interject(&format!("error: {message}"));
    }

    /// Snapshot of the input line
    pub fn line(&self) -> Vec<u8> {
        self.lock().line.as_bytes().to_vec()
    }

    pub fn is_line_empty(&self) -> bool {
        self.lock().line.is_empty()
    }

    /// Number of columns prompt and input occupy right now
    pub fn drawn_columns(&self) -> usize {
        self.lock().drawn_columns()
    }

    /// Erase prompt and input before the session ends
    pub fn finish(&self) {
        let mut state = self.lock();
        let columns = state.drawn_columns();
        let result = state.erase(columns).and_then(|_| state.out.flush());
        report(result);
        state.prompt_shown = false;
    }
}

fn report(result: io::Result<()>) {
    if let Err(e) = result {
        debug!("console write failed: {}", e);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Screen;
    use super::*;

    fn console() -> (Console, Screen) {
        let screen = Screen::default();
        (Console::new(Box::new(screen.clone())), screen)
    }

    fn erase(columns: usize) -> String {
        "\x08 \x08".repeat(columns)
    }

    #[test]
    fn test_prompt_is_drawn_once() {
        let (console, screen) = console();
        console.prompt();
        console.prompt();
        assert_eq!(screen.text(), PROMPT);
        assert_eq!(console.drawn_columns(), PROMPT.len());
    }

    #[test]
    fn test_push_echoes() {
        let (console, screen) = console();
        console.prompt();
        assert_eq!(console.push(b'h'), Push::Echoed);
        assert_eq!(console.push(b'i'), Push::Echoed);
        assert_eq!(screen.text(), format!("{PROMPT}hi"));
        assert_eq!(console.drawn_columns(), PROMPT.len() + 2);
    }

    #[test]
    fn test_push_full_line_is_dropped() {
        let (console, screen) = console();
        for _ in 0..crate::shell::line::LINE_CAPACITY {
            assert_eq!(console.push(b'x'), Push::Echoed);
        }
        screen.clear();
        assert_eq!(console.push(b'y'), Push::Full);
        assert_eq!(console.push(b'z'), Push::Dropped);
        assert!(console.backspace());
        assert_eq!(console.push(b'y'), Push::Echoed);
        assert_eq!(console.push(b'z'), Push::Dropped);

        // a new line may fill up and report it again
        console.take_line();
        for _ in 0..crate::shell::line::LINE_CAPACITY {
            console.push(b'x');
        }
        assert_eq!(console.push(b'y'), Push::Full);
    }

    #[test]
    fn test_backspace_on_empty_line_is_noop() {
        let (console, screen) = console();
        console.prompt();
        screen.clear();
        assert!(!console.backspace());
        assert_eq!(screen.text(), "");
        assert_eq!(console.drawn_columns(), PROMPT.len());
    }

    #[test]
    fn test_backspace_erases_one_column() {
        let (console, screen) = console();
        console.push(b'a');
        console.push(b'b');
        screen.clear();
        assert!(console.backspace());
        assert_eq!(screen.text(), erase(1));
        assert_eq!(console.line(), b"a".to_vec());
    }

    #[test]
    fn test_wide_characters_erase_two_columns() {
        let (console, screen) = console();
        console.prompt();
        for byte in "日".bytes() {
            assert_eq!(console.push(byte), Push::Echoed);
        }
        assert_eq!(console.drawn_columns(), PROMPT.len() + 2);

        screen.clear();
        assert!(console.backspace());
        assert_eq!(screen.text(), erase(2));
        assert!(console.is_line_empty());
    }

    #[test]
    fn test_interject_redraws_partial_input() {
        let (console, screen) = console();
        console.prompt();
        console.push(b'a');
        console.push(b'b');
        screen.clear();

        console.interject("Received: world");

        let expected = format!(
            "{}Received: world\n{PROMPT}ab",
            erase(PROMPT.len() + 2)
        );
        assert_eq!(screen.text(), expected);
        assert_eq!(console.line(), b"ab".to_vec());
    }

    #[test]
    fn test_take_line_hides_prompt() {
        let (console, screen) = console();
        console.prompt();
        for byte in b"hello" {
            console.push(*byte);
        }
        screen.clear();

        assert_eq!(console.take_line(), b"hello".to_vec());
        assert_eq!(screen.text(), erase(PROMPT.len() + 5));
        assert_eq!(console.drawn_columns(), 0);

        // nothing to erase or redraw while the prompt is hidden
        screen.clear();
        console.interject("Redirection : to shell");
        assert_eq!(screen.text(), "Redirection : to shell\n");
    }

    #[test]
    fn test_error_is_prefixed() {
        let (console, screen) = console();
        console.error("Short write: 1 of 2 bytes");
        assert_eq!(screen.text(), "error: Short write: 1 of 2 bytes\n");
    }
}
