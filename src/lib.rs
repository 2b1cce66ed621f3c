//! # UART Shell
//!
//! An interactive bridge between the terminal and a serial (UART) device.
//!
//! Typed lines are sent to the device, received bytes are shown above the
//! prompt without disturbing the line being typed. Received data can be
//! redirected to a file and a file can be streamed to the device.
//!
//! ## Architecture
//!
//! The project is organized into the following modules:
//!
//! - [`serial`]: Device access, the shared serial writer, the reader loop and
//!   file transmission
//! - [`shell`]: Line editing, command classification, console output and the
//!   output router
//! - [`session`]: Wiring of the two session threads and orderly teardown
//! - [`term`]: Raw terminal mode and keystroke polling
//! - [`shutdown`]: Shared stop flag and OS signal handling
//! - [`config`]: Command line arguments
//! - [`error`]: Custom error types for the application

pub mod config;
pub mod error;
pub mod serial;
pub mod session;
pub mod shell;
pub mod shutdown;
pub mod term;
