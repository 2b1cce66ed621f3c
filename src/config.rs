//! Command line configuration.
//!
//! There is no configuration file: the device, its baud rate and a couple of
//! switches come from the command line, and logging is tuned with `RUST_LOG`.

use crate::serial::port::{BaudRate, PortSettings};
use crate::session::SessionOptions;
use crate::shell::editor::LineEnding;
use clap::Parser;

#[derive(Parser, Debug)]
#[clap(
    name = "uart-shell",
    version,
    about = "Interactive terminal for a serial (UART) device",
    after_help = "Commands typed at the prompt:\n  R>shell   show received data on the console\n  R><path>  save received data to <path>\n  T<<path>  send the contents of <path>\nAny other line is sent to the device as typed."
)]
pub struct Args {
    #[clap(help = "Serial device, e.g. /dev/ttyUSB0")]
    pub device: String,

    #[clap(
        value_parser = parse_baud_rate,
        help = "Baud rate: 9600, 19200, 38400, 57600 or 115200"
    )]
    pub baud: BaudRate,

    #[clap(long, help = "Append a line feed to every line sent to the device")]
    pub line_feed: bool,

    #[clap(long, help = "Prefix received data with the local time")]
    pub timestamp: bool,
}

impl Args {
    /// 8N1 settings for the requested device
    pub fn port_settings(&self) -> PortSettings {
        PortSettings::new(&self.device, self.baud)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            line_ending: if self.line_feed {
                LineEnding::Lf
            } else {
                LineEnding::None
            },
            timestamp: self.timestamp,
        }
    }
}

fn parse_baud_rate(value: &str) -> Result<BaudRate, String> {
    value.parse::<BaudRate>().map_err(|e| e.to_string())
}
