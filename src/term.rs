//! Terminal control for the interactive session.
//!
//! [`RawMode`] switches standard input to character-at-a-time input without
//! echo and restores the saved settings when dropped. [`StdinKeys`] delivers
//! keystrokes with a poll timeout so the editor can notice shutdown.

use crate::error::{Result, UartShellError};
use crate::shell::editor::{Input, KeySource};
use log::{debug, warn};
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, poll};
use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use std::io::{self, BufRead, Stdin};
use std::os::fd::AsFd;
use std::time::Duration;

/// Non-canonical, unechoed standard input for as long as the guard lives.
///
/// Signal generation stays enabled so Ctrl-C still raises SIGINT.
pub struct RawMode {
    original: Termios,
}

impl RawMode {
    /// Switch standard input to raw mode, saving the current settings
    pub fn enable() -> Result<Self> {
        let stdin = io::stdin();
        let original = termios::tcgetattr(stdin.as_fd())
            .map_err(|e| UartShellError::terminal(format!("tcgetattr: {e}")))?;

        let mut raw = original.clone();
        raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::tcsetattr(stdin.as_fd(), SetArg::TCSANOW, &raw)
            .map_err(|e| UartShellError::terminal(format!("tcsetattr: {e}")))?;

        debug!("Terminal switched to raw mode");
        Ok(RawMode { original })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        match termios::tcsetattr(io::stdin().as_fd(), SetArg::TCSANOW, &self.original) {
            Ok(()) => debug!("Terminal mode restored"),
            Err(e) => warn!("Failed to restore terminal mode: {}", e),
        }
    }
}

/// Keystrokes from standard input
pub struct StdinKeys {
    stdin: Stdin,
}

impl Default for StdinKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl StdinKeys {
    pub fn new() -> Self {
        StdinKeys { stdin: io::stdin() }
    }
}

impl KeySource for StdinKeys {
    fn poll_keys(&mut self, timeout: Duration) -> io::Result<Input> {
        let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
        let ready = {
            let mut fds = [PollFd::new(self.stdin.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, millis) {
                Ok(n) => n > 0,
                Err(Errno::EINTR) => false,
                Err(e) => return Err(e.into()),
            }
        };
        if !ready {
            return Ok(Input::Idle);
        }

        // everything buffered is consumed, so the next poll sees the fd state
        let mut lock = self.stdin.lock();
        let bytes = lock.fill_buf()?.to_vec();
        lock.consume(bytes.len());
        if bytes.is_empty() {
            Ok(Input::Closed)
        } else {
            Ok(Input::Bytes(bytes))
        }
    }
}
