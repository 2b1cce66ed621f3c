//! # Session
//!
//! Owns every piece of the bridge for one device and runs the two session
//! threads:
//!
//! - `serial-reader`: [`SerialReader::run`] on the read half of the device
//! - `line-editor`: [`LineEditor::run`] on the terminal keystrokes
//!
//! Both threads only borrow the shared parts, each of which carries its own
//! lock. When either thread ends the shutdown flag is raised so the other one
//! follows; the session then closes the redirect file and the device halves.

use crate::error::{Result, UartShellError};
use crate::serial::port::{PortSettings, SerialPort, open_port};
use crate::serial::reader::SerialReader;
use crate::serial::writer::SerialWriter;
use crate::shell::console::Console;
use crate::shell::editor::{KeySource, LineEditor, LineEnding};
use crate::shell::router::OutputRouter;
use crate::shutdown::Shutdown;
use log::{error, info};
use std::io::{Read, Write};
use std::thread;

/// Behaviour switches of a session
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionOptions {
    /// appended to every literal line
    pub line_ending: LineEnding,
    /// prefix received data with the local time
    pub timestamp: bool,
}

/// A session on an opened serial device
pub type DeviceSession = Session<Box<dyn SerialPort>, Box<dyn SerialPort>>;

/// One interactive session
pub struct Session<R, W> {
    reader: R,
    writer: SerialWriter<W>,
    router: OutputRouter,
    console: Console,
    shutdown: Shutdown,
    options: SessionOptions,
}

/// Raises the shutdown flag when a session thread ends, panics included.
struct TriggerOnExit<'a>(&'a Shutdown);

impl Drop for TriggerOnExit<'_> {
    fn drop(&mut self) {
        self.0.trigger();
    }
}

impl Session<Box<dyn SerialPort>, Box<dyn SerialPort>> {
    /// Open the device and attach the session to standard output
    pub fn open(settings: &PortSettings, options: SessionOptions) -> Result<DeviceSession> {
        let halves = open_port(settings)?;
        Ok(Session::new(
            halves.reader,
            halves.writer,
            Console::stdout(),
            options,
        ))
    }
}

impl<R: Read + Send, W: Write + Send> Session<R, W> {
    pub fn new(reader: R, writer: W, console: Console, options: SessionOptions) -> Self {
        Session {
            reader,
            writer: SerialWriter::new(writer),
            router: OutputRouter::new(),
            console,
            shutdown: Shutdown::new(),
            options,
        }
    }

    /// Handle to stop the session from another thread or a signal handler
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Run both session threads until shutdown, then release everything.
    pub fn run<K: KeySource + Send>(self, keys: K) -> Result<()> {
        let Session {
            mut reader,
            writer,
            router,
            console,
            shutdown,
            options,
        } = self;

        let result = thread::scope(|scope| -> Result<()> {
            let (router, console, writer, shutdown) = (&router, &console, &writer, &shutdown);
            let reader = &mut reader;

            let reader_thread = thread::Builder::new()
                .name("serial-reader".into())
                .spawn_scoped(scope, move || {
                    let _exit = TriggerOnExit(shutdown);
                    SerialReader::new(router, console)
                        .with_timestamp(options.timestamp)
                        .run(reader, shutdown);
                })
                .map_err(|source| UartShellError::ThreadSpawn {
                    name: "serial-reader",
                    source,
                })?;

            let editor_thread = thread::Builder::new()
                .name("line-editor".into())
                .spawn_scoped(scope, move || {
                    let _exit = TriggerOnExit(shutdown);
                    let mut keys = keys;
                    LineEditor::new(console, router, writer, shutdown.clone())
                        .with_line_ending(options.line_ending)
                        .run(&mut keys);
                });
            let editor_thread = match editor_thread {
                Ok(handle) => handle,
                Err(source) => {
                    shutdown.trigger();
                    let _ = reader_thread.join();
                    return Err(UartShellError::ThreadSpawn {
                        name: "line-editor",
                        source,
                    });
                }
            };

            if editor_thread.join().is_err() {
                error!("line editor thread panicked");
            }
            if reader_thread.join().is_err() {
                error!("serial reader thread panicked");
            }
            Ok(())
        });

        console.finish();
        if let Some(path) = router.to_console() {
            info!("Closed redirect file {} at shutdown", path.display());
        }
        info!("Session ended");
        result
    }
}
