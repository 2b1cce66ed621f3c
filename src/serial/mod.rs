//! Serial device access: opening the port, the shared write half, the reader
//! loop and file transmission.

pub mod port;
pub mod reader;
pub mod transmit;
pub mod writer;

pub use port::{BaudRate, PortSettings, SUPPORTED_BAUD_RATES, open_port};
pub use reader::SerialReader;
pub use transmit::{TransmitReport, transmit_file};
pub use writer::SerialWriter;
