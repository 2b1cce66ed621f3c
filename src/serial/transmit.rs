//! # Transmit File
//!
//! Streams a local file to the device in fixed-size chunks. A failed or short
//! chunk is reported and the loop moves on to the next one.

use super::writer::SerialWriter;
use crate::error::{Result, UartShellError};
use crate::shell::console::{Console, SENT_TAG};
use crate::shutdown::Shutdown;
use log::{debug, info, trace, warn};
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

/// bytes read from the source file per write
pub const CHUNK_SIZE: usize = 256;

/// Summary of one transmission
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransmitReport {
    /// chunks read from the source
    pub chunks: usize,
    /// chunks the device did not fully accept
    pub failed_chunks: usize,
    /// bytes the device accepted
    pub bytes_sent: usize,
    /// stopped early because the session is shutting down
    pub interrupted: bool,
}

impl TransmitReport {
    pub fn is_complete(&self) -> bool {
        self.failed_chunks == 0 && !self.interrupted
    }
}

/// Send the file at `path` through `writer`, one status line per chunk.
///
/// Fails only when the source cannot be opened; nothing is sent then.
pub fn transmit_file<W: Write>(
    path: &Path,
    writer: &SerialWriter<W>,
    console: &Console,
    shutdown: &Shutdown,
) -> Result<TransmitReport> {
    let source = File::open(path).map_err(|source| UartShellError::SourceOpen {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Transmitting {}", path.display());
    let report = transmit(source, &path.display().to_string(), writer, console, shutdown);
    info!(
        "Transmitted {} of {} chunks ({} bytes) from {}",
        report.chunks - report.failed_chunks,
        report.chunks,
        report.bytes_sent,
        path.display()
    );
    Ok(report)
}

/// chunk loop over any byte source
pub fn transmit<R: Read, W: Write>(
    mut source: R,
    name: &str,
    writer: &SerialWriter<W>,
    console: &Console,
    shutdown: &Shutdown,
) -> TransmitReport {
    let mut report = TransmitReport::default();
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        if shutdown.is_triggered() {
            debug!("transmit of {} interrupted by shutdown", name);
            report.interrupted = true;
            break;
        }

        let read = match source.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Reading {} failed: {}", name, e);
                console.error(&format!("reading {name} failed: {e}"));
                break;
            }
        };
        report.chunks += 1;
        let data = &chunk[..read];
        trace!("chunk {} of {}: {}", report.chunks, name, hex::encode(data));

        match writer.write(data) {
            Ok(written) if written == read => {
                report.bytes_sent += written;
                console.interject(&format!(
                    "{SENT_TAG}{read} bytes transmitted from {name}"
                ));
            }
            Ok(written) => {
                report.bytes_sent += written;
                report.failed_chunks += 1;
                let err = UartShellError::short_write(written, read);
                warn!("chunk {} of {}: {}", report.chunks, name, err);
                console.error(&format!("chunk {} of {name}: {err}", report.chunks));
            }
            Err(e) => {
                report.failed_chunks += 1;
                let err = UartShellError::PortWrite(e);
                warn!("chunk {} of {}: {}", report.chunks, name, err);
                console.error(&format!("chunk {} of {name}: {err}", report.chunks));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::writer::tests::{MockPort, SlowDevice};
    use crate::shell::console::testing::Screen;
    use mockall::Sequence;
    use std::io;
    use tempfile::NamedTempFile;

    fn console() -> (Console, Screen) {
        let screen = Screen::default();
        (Console::new(Box::new(screen.clone())), screen)
    }

    fn source_file(len: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        file.write_all(&data).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_short_chunk_does_not_abort() {
        let file = source_file(CHUNK_SIZE * 2 + 100);
        let mut port = MockPort::new();
        let mut seq = Sequence::new();
        port.expect_write()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|buf| Ok(buf.len()));
        port.expect_write()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|buf| Ok(buf.len() - 1));
        port.expect_write()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|buf| buf.len() == 100)
            .returning(|buf| Ok(buf.len()));
        let writer = SerialWriter::new(port);
        let (console, screen) = console();

        let report = transmit_file(file.path(), &writer, &console, &Shutdown::new()).unwrap();

        assert_eq!(report.chunks, 3);
        assert_eq!(report.failed_chunks, 1);
        assert_eq!(report.bytes_sent, CHUNK_SIZE * 2 + 100 - 1);
        assert!(!report.is_complete());

        let text = screen.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(&format!("{CHUNK_SIZE} bytes transmitted from")));
        assert!(lines[1].starts_with("error: chunk 2"));
        assert!(lines[1].contains("Short write: 255 of 256 bytes"));
        assert!(lines[2].contains("100 bytes transmitted from"));
    }

    #[test]
    fn test_failed_chunk_does_not_abort() {
        let file = source_file(CHUNK_SIZE + 1);
        let mut port = MockPort::new();
        let mut seq = Sequence::new();
        port.expect_write()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(io::Error::from(io::ErrorKind::TimedOut)));
        port.expect_write()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|buf| Ok(buf.len()));
        let writer = SerialWriter::new(port);
        let (console, _screen) = console();

        let report = transmit_file(file.path(), &writer, &console, &Shutdown::new()).unwrap();
        assert_eq!(report.chunks, 2);
        assert_eq!(report.failed_chunks, 1);
        assert_eq!(report.bytes_sent, 1);
    }

    #[test]
    fn test_whole_file_reaches_device() {
        let file = source_file(1000);
        let device = SlowDevice::default();
        let wire = device.wire.clone();
        let writer = SerialWriter::new(device);
        let (console, _screen) = console();

        let report = transmit_file(file.path(), &writer, &console, &Shutdown::new()).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.chunks, 4);
        assert_eq!(*wire.lock().unwrap(), std::fs::read(file.path()).unwrap());
    }

    #[test]
    fn test_missing_source_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let port = MockPort::new();
        let writer = SerialWriter::new(port);
        let (console, screen) = console();

        let err = transmit_file(
            &dir.path().join("missing.bin"),
            &writer,
            &console,
            &Shutdown::new(),
        )
        .unwrap_err();
        assert!(matches!(err, UartShellError::SourceOpen { .. }));
        assert_eq!(screen.text(), "");
    }

    #[test]
    fn test_empty_file_sends_nothing() {
        let file = source_file(0);
        let writer = SerialWriter::new(MockPort::new());
        let (console, _screen) = console();
        let report = transmit_file(file.path(), &writer, &console, &Shutdown::new()).unwrap();
        assert_eq!(report, TransmitReport::default());
    }

    #[test]
    fn test_shutdown_stops_between_chunks() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let writer = SerialWriter::new(MockPort::new());
        let (console, _screen) = console();
        let report = transmit(&b"payload"[..], "inline", &writer, &console, &shutdown);
        assert!(report.interrupted);
        assert_eq!(report.chunks, 0);
    }
}
