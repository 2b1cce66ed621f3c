//! # Line Editor
//!
//! Turns raw terminal bytes into an edited line and, on Enter, into a
//! [`Command`] that is carried out right away on the editor's thread.

use super::command::Command;
use super::console::{Console, Push, SENT_TAG};
use super::router::OutputRouter;
use crate::error::{Result, UartShellError};
use crate::serial::transmit::transmit_file;
use crate::serial::writer::SerialWriter;
use crate::shutdown::Shutdown;
use log::{debug, error, info, warn};
use std::io::{self, Write};
use std::time::Duration;

/// how long one terminal poll may block before shutdown is checked again
pub const KEY_POLL: Duration = Duration::from_millis(50);

const BACKSPACE: u8 = 0x7F;
const CTRL_H: u8 = 0x08;
const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;
const ESC: u8 = 0x1B;

/// What a terminal poll produced
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    /// keystrokes, in order
    Bytes(Vec<u8>),
    /// nothing within the timeout
    Idle,
    /// the terminal input reached end of file
    Closed,
}

/// Source of raw keystrokes
pub trait KeySource {
    /// Wait at most `timeout` for input
    fn poll_keys(&mut self, timeout: Duration) -> io::Result<Input>;
}

/// Bytes appended to every literal line sent to the device
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineEnding {
    /// send the line exactly as typed
    #[default]
    None,
    /// append `\n`
    Lf,
}

impl LineEnding {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineEnding::None => b"",
            LineEnding::Lf => b"\n",
        }
    }
}

/// Whether the editor keeps going after a byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Escape sequence state, `ESC [` introduces a CSI sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EscapeState {
    Normal,
    Escape,
    Bracket,
}

/// Interactive line editor
pub struct LineEditor<'a, W> {
    console: &'a Console,
    router: &'a OutputRouter,
    writer: &'a SerialWriter<W>,
    shutdown: Shutdown,
    line_ending: LineEnding,
    escape: EscapeState,
}

impl<'a, W: Write> LineEditor<'a, W> {
    pub fn new(
        console: &'a Console,
        router: &'a OutputRouter,
        writer: &'a SerialWriter<W>,
        shutdown: Shutdown,
    ) -> Self {
        LineEditor {
            console,
            router,
            writer,
            shutdown,
            line_ending: LineEnding::None,
            escape: EscapeState::Normal,
        }
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Process keystrokes until shutdown or end of input
    pub fn run<K: KeySource>(&mut self, keys: &mut K) {
        info!("Line editor started");
        self.console.prompt();
        while !self.shutdown.is_triggered() {
            match keys.poll_keys(KEY_POLL) {
                Ok(Input::Bytes(bytes)) => {
                    if bytes.into_iter().any(|b| self.handle_byte(b) == Flow::Quit) {
                        info!("Quit requested from the terminal");
                        self.shutdown.trigger();
                    }
                }
                Ok(Input::Idle) => {}
                Ok(Input::Closed) => {
                    info!("Terminal input closed");
                    self.shutdown.trigger();
                }
                Err(e) => {
                    error!("Reading terminal input failed: {}", e);
                    self.shutdown.trigger();
                }
            }
        }
        info!("Line editor stopped");
    }

    /// Process a single input byte
    pub fn handle_byte(&mut self, byte: u8) -> Flow {
        match self.escape {
            EscapeState::Normal => {}
            EscapeState::Escape => {
                self.escape = if byte == b'[' {
                    EscapeState::Bracket
                } else {
                    EscapeState::Normal
                };
                return Flow::Continue;
            }
            EscapeState::Bracket => {
                // parameters until the final byte
                if (0x40..=0x7E).contains(&byte) {
                    self.escape = EscapeState::Normal;
                }
                return Flow::Continue;
            }
        }

        match byte {
            b'\n' | b'\r' => self.submit(),
            BACKSPACE | CTRL_H => {
                self.console.backspace();
            }
            ESC => self.escape = EscapeState::Escape,
            CTRL_C => return Flow::Quit,
            CTRL_D if self.console.is_line_empty() => return Flow::Quit,
            0x00..=0x1F => {}
            _ => {
                if self.console.push(byte) == Push::Full {
                    warn!("Input line is full, dropping further characters");
                }
            }
        }
        Flow::Continue
    }

    /// Enter: classify and run the line, then prompt again
    fn submit(&mut self) {
        if self.console.is_line_empty() {
            return;
        }
        let line = self.console.take_line();

        let line = String::from_utf8_lossy(&line);
        if let Some(command) = Command::parse(&line) {
            debug!("command: {:?}", command);
            if let Err(e) = self.dispatch(command) {
                if e.is_fatal() {
                    error!("{}", e);
                } else {
                    warn!("{}", e);
                }
                self.console.error(&e.to_string());
            }
        }
        self.console.prompt();
    }

    /// Carry out one command, printing its status line
    pub fn dispatch(&self, command: Command) -> Result<()> {
        match command {
            Command::RedirectToShell => {
                if let Some(path) = self.router.to_console() {
                    debug!("stopped redirecting to {}", path.display());
                }
                self.console.interject("Redirection : to shell");
            }
            Command::RedirectToFile(path) => {
                self.router.to_file(&path)?;
                self.console
                    .interject(&format!("Redirection : to {}", path.display()));
            }
            Command::TransmitFile(path) => {
                let report = transmit_file(&path, self.writer, self.console, &self.shutdown)?;
                if report.failed_chunks > 0 {
                    self.console.error(&format!(
                        "{} of {} chunks from {} failed",
                        report.failed_chunks,
                        report.chunks,
                        path.display()
                    ));
                }
            }
            Command::SendLiteral(text) => self.send_literal(&text)?,
        }
        Ok(())
    }

    fn send_literal(&self, text: &str) -> Result<()> {
        let mut data = text.as_bytes().to_vec();
        data.extend_from_slice(self.line_ending.as_bytes());

        let written = self.writer.write(&data).map_err(UartShellError::PortWrite)?;
        if written != data.len() {
            return Err(UartShellError::short_write(written, data.len()));
        }
        self.console.interject(&format!("{SENT_TAG}{text}"));
        Ok(())
    }
}
