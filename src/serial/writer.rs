//! # Serial Writer
//!
//! Exclusive access to the write direction of the device. Both the
//! interactive send path and the file transmit path go through the same
//! [`SerialWriter`], so their writes reach the wire whole and in lock order.

use log::trace;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// write half of the serial device behind a mutex
pub struct SerialWriter<W> {
    port: Mutex<W>,
}

impl<W: Write> SerialWriter<W> {
    pub fn new(port: W) -> Self {
        SerialWriter {
            port: Mutex::new(port),
        }
    }

    /// Write `data` with a single call to the device.
    ///
    /// Returns the number of bytes the device accepted. A count lower than
    /// `data.len()` is a genuine short write and is not retried.
    pub fn write(&self, data: &[u8]) -> io::Result<usize> {
        let mut port = self.port.lock().unwrap_or_else(PoisonError::into_inner);
        let written = port.write(data)?;
        trace!("tx {}/{}: {}", written, data.len(), hex::encode(data));
        Ok(written)
    }
}
