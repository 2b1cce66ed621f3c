//! # Serial Reader
//!
//! Drains the device for the whole session and hands every received chunk to
//! the console or the redirect file, depending on the current output route.

use crate::error::UartShellError;
use crate::shell::console::{Console, RECEIVED_TAG};
use crate::shell::router::{Delivery, OutputRouter};
use crate::shutdown::Shutdown;
use log::{debug, info, trace, warn};
use std::io::{ErrorKind, Read};
use std::thread;
use std::time::Duration;

/// most bytes taken from the device per read
pub const READ_CHUNK: usize = 255;

/// pause after a zero-length read
pub const IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// pause after a failed read
pub const ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Reader loop state and options
pub struct SerialReader<'a> {
    router: &'a OutputRouter,
    console: &'a Console,
    timestamp: bool,
}

/// result of one read attempt
#[derive(Debug, PartialEq, Eq)]
pub enum Poll {
    /// this many bytes were routed
    Received(usize),
    /// nothing arrived within the device timeout
    Idle,
    /// the read failed and was reported
    Failed,
}

impl<'a> SerialReader<'a> {
    pub fn new(router: &'a OutputRouter, console: &'a Console) -> Self {
        SerialReader {
            router,
            console,
            timestamp: false,
        }
    }

    /// prefix received reports with the local time
    pub fn with_timestamp(mut self, timestamp: bool) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Read until `shutdown` is triggered.
    ///
    /// `port` is expected to block for at most its read timeout, which bounds
    /// how long shutdown takes to be noticed.
    pub fn run<R: Read>(&self, port: &mut R, shutdown: &Shutdown) {
        info!("Serial reader started");
        let mut buf = [0u8; READ_CHUNK];
        while !shutdown.is_triggered() {
            match self.poll(port, &mut buf) {
                Poll::Received(_) => {}
                Poll::Idle => thread::sleep(IDLE_BACKOFF),
                Poll::Failed => thread::sleep(ERROR_BACKOFF),
            }
        }
        info!("Serial reader stopped");
    }

    /// One bounded read, routed per the current output mode
    pub fn poll<R: Read>(&self, port: &mut R, buf: &mut [u8]) -> Poll {
        match port.read(buf) {
            Ok(0) => Poll::Idle,
            Ok(n) => {
                self.dispatch(&buf[..n]);
                Poll::Received(n)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Poll::Idle
            }
            Err(e) => {
                let err = UartShellError::PortRead(e);
                warn!("{}", err);
                self.console.error(&err.to_string());
                Poll::Failed
            }
        }
    }

    fn dispatch(&self, data: &[u8]) {
        trace!("rx {}: {}", data.len(), hex::encode(data));
        match self.router.deliver(data) {
            Ok(Delivery::Display) => {
                let text = String::from_utf8_lossy(data);
                let text = text.trim_end_matches(['\r', '\n']);
                self.console
                    .interject(&format!("{}{RECEIVED_TAG} {text}", self.stamp()));
            }
            Ok(Delivery::Saved(n)) => {
                debug!("saved {} received bytes", n);
                self.console
                    .interject(&format!("{}{RECEIVED_TAG} saved {n} to file.", self.stamp()));
            }
            Err(e) => {
                warn!("Error writing to destination file: {}", e);
                self.console
                    .error(&format!("Error writing to destination file: {e}"));
            }
        }
    }

    fn stamp(&self) -> String {
        if self.timestamp {
            format!("[{}] ", chrono::Local::now().format("%H:%M:%S%.3f"))
        } else {
            String::new()
        }
    }
}
