//! Classification of completed input lines.
//!
//! `R>shell` stops redirection, `R><path>` redirects received data to a file,
//! `T<<path>` transmits a file. Anything else is sent as typed.

use std::fmt;
use std::path::PathBuf;

const REDIRECT_PREFIX: &str = "R>";
const TRANSMIT_PREFIX: &str = "T<";
const SHELL_TARGET: &str = "shell";

/// A classified input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// show received data on the console again
    RedirectToShell,
    /// save received data to a file
    RedirectToFile(PathBuf),
    /// stream a file to the device
    TransmitFile(PathBuf),
    /// send the line as-is
    SendLiteral(String),
}

impl Command {
    /// Classify a line, `None` for an empty line
    pub fn parse(line: &str) -> Option<Command> {
        if line.is_empty() {
            return None;
        }

        let command = if let Some(target) = line.strip_prefix(REDIRECT_PREFIX) {
            if target == SHELL_TARGET {
                Command::RedirectToShell
            } else {
                Command::RedirectToFile(PathBuf::from(target))
            }
        } else if let Some(source) = line.strip_prefix(TRANSMIT_PREFIX) {
            Command::TransmitFile(PathBuf::from(source))
        } else {
            Command::SendLiteral(line.to_string())
        };
        Some(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::RedirectToShell => write!(f, "{REDIRECT_PREFIX}{SHELL_TARGET}"),
            Command::RedirectToFile(path) => write!(f, "{REDIRECT_PREFIX}{}", path.display()),
            Command::TransmitFile(path) => write!(f, "{TRANSMIT_PREFIX}{}", path.display()),
            Command::SendLiteral(text) => write!(f, "{text}"),
        }
    }
}
