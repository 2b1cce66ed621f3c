//! # Output Router
//!
//! Decides where received serial data goes: the console or a redirect file.
//!
//! The redirect file handle lives inside [`Route::File`], so a file route
//! without an open handle cannot exist, and replacing the route drops (closes)
//! the previous handle exactly once. Only the line editor changes the route;
//! the reader loop only calls [`OutputRouter::deliver`].

use crate::error::{Result, UartShellError};
use log::{info, trace};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Where received data currently goes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    ToConsole,
    ToFile,
}

enum Route {
    Console,
    File { path: PathBuf, file: File },
}

/// What the reader should do with a received chunk
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    /// show it on the console
    Display,
    /// it was written to the redirect file
    Saved(usize),
}

/// Current output route, shared between editor and reader
pub struct OutputRouter {
    route: Mutex<Route>,
}

impl Default for OutputRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputRouter {
    pub fn new() -> Self {
        OutputRouter {
            route: Mutex::new(Route::Console),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Route> {
        self.route.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> OutputMode {
        match *self.lock() {
            Route::Console => OutputMode::ToConsole,
            Route::File { .. } => OutputMode::ToFile,
        }
    }

    /// Path of the open redirect file, if any
    pub fn redirect_path(&self) -> Option<PathBuf> {
        match &*self.lock() {
            Route::Console => None,
            Route::File { path, .. } => Some(path.clone()),
        }
    }

    /// Route received data to the console, closing any redirect file.
    ///
    /// Returns the path of the file that was closed.
    pub fn to_console(&self) -> Option<PathBuf> {
        let previous = std::mem::replace(&mut *self.lock(), Route::Console);
        match previous {
            Route::Console => None,
            Route::File { path, file } => {
                drop(file);
                info!("Closed redirect file {}", path.display());
                Some(path)
            }
        }
    }

    /// Route received data to `path`, created or truncated.
    ///
    /// The file is opened before the route changes: on failure the current
    /// route, including any open redirect file, is kept.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let file = open_redirect(path).map_err(|source| UartShellError::RedirectOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let previous = std::mem::replace(
            &mut *self.lock(),
            Route::File {
                path: path.to_path_buf(),
                file,
            },
        );
        if let Route::File { path: old, .. } = previous {
            info!("Closed redirect file {}", old.display());
        }
        info!("Redirecting received data to {}", path.display());
        Ok(())
    }

    /// Hand a received chunk to the current route.
    ///
    /// In file mode the chunk is written with a single call while the route
    /// is locked, so the file cannot be closed underneath the write.
    pub fn deliver(&self, data: &[u8]) -> Result<Delivery> {
        let mut route = self.lock();
        match &mut *route {
            Route::Console => Ok(Delivery::Display),
            Route::File { path, file } => {
                let written = file.write(data)?;
                trace!("saved {} bytes to {}", written, path.display());
                if written == data.len() {
                    Ok(Delivery::Saved(written))
                } else {
                    Err(UartShellError::short_write(written, data.len()))
                }
            }
        }
    }
}

#[cfg(unix)]
fn open_redirect(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_redirect(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
