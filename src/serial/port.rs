use crate::error::{Result, UartShellError};
use crate::serial::transmit::CHUNK_SIZE;
use log::{error, info};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
pub use tokio_serial::{DataBits, FlowControl, Parity, SerialPort, StopBits};

/// serial port baud rates accepted on the command line
pub const SUPPORTED_BAUD_RATES: &[u32] = &[9600, 19200, 38400, 57600, 115200];

/// read timeout of the device, bounds how long the reader blocks per poll
pub const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// slack added to the time the link needs to drain one transmit chunk
pub const WRITE_TIMEOUT_MARGIN: Duration = Duration::from_secs(1);

/// bits on the wire per byte with 8N1 framing
const BITS_PER_FRAME: u64 = 10;

/// serial port baud rate, always one of [`SUPPORTED_BAUD_RATES`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaudRate(u32);

impl BaudRate {
    /// validate a numeric baud rate
    pub fn new(rate: u32) -> Result<Self> {
        if SUPPORTED_BAUD_RATES.contains(&rate) {
            Ok(BaudRate(rate))
        } else {
            Err(UartShellError::unsupported_baud_rate(rate.to_string()))
        }
    }

    /// get the numeric value
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl FromStr for BaudRate {
    type Err = UartShellError;

    fn from_str(s: &str) -> Result<Self> {
        let rate = s
            .trim()
            .parse::<u32>()
            .map_err(|_| UartShellError::unsupported_baud_rate(s))?;
        BaudRate::new(rate)
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// serial port settings
#[derive(Clone, Debug)]
pub struct PortSettings {
    pub port_name: String,
    pub baud_rate: BaudRate,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
    /// read timeout
    pub timeout: Duration,
    /// how long one write may wait for room in the device's transmit buffer
    pub write_timeout: Duration,
}

/// serial port settings implementation
impl PortSettings {
    /// 8N1, no flow control
    pub fn new(port_name: impl Into<String>, baud_rate: BaudRate) -> Self {
        PortSettings {
            port_name: port_name.into(),
            baud_rate,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
            timeout: READ_TIMEOUT,
            write_timeout: write_timeout_for(baud_rate),
        }
    }

    /// get serial port line settings, e.g. `8N1`
    pub fn line_settings_name(&self) -> String {
        let data_bits = match self.data_bits {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let stop_bits = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        format!("{data_bits}{parity}{stop_bits}")
    }
}

/// Write timeout for `baud_rate`: four transmit chunks worth of line time
/// plus [`WRITE_TIMEOUT_MARGIN`].
pub fn write_timeout_for(baud_rate: BaudRate) -> Duration {
    let bits = (CHUNK_SIZE as u64) * BITS_PER_FRAME * 4;
    let drain = Duration::from_micros(bits * 1_000_000 / u64::from(baud_rate.value()));
    drain + WRITE_TIMEOUT_MARGIN
}

/// The two directions of one opened device.
pub struct SerialHalves {
    /// read direction, owned by the reader loop
    pub reader: Box<dyn SerialPort>,
    /// write direction, wrapped by the serial writer
    pub writer: Box<dyn SerialPort>,
}

/// open serial port
///
/// The port is opened in raw mode (no canonical input, echo or signal
/// generation on the device side) with the line settings in `settings`.
pub fn open_port(settings: &PortSettings) -> Result<SerialHalves> {
    let reader = tokio_serial::new(&settings.port_name, settings.baud_rate.value())
        .data_bits(settings.data_bits)
        .parity(settings.parity)
        .stop_bits(settings.stop_bits)
        .flow_control(settings.flow_control)
        .timeout(settings.timeout)
        .open()
        .map_err(|e| {
            error!("Unable to open serial port {}: {}", settings.port_name, e);
            UartShellError::port_open(&settings.port_name, e.to_string())
        })?;

    // the clone starts with the short read timeout, which would fail writes
    // whenever the transmit buffer is full
    let mut writer = reader
        .try_clone()
        .map_err(|e| UartShellError::port_open(&settings.port_name, e.to_string()))?;
    writer
        .set_timeout(settings.write_timeout)
        .map_err(|e| UartShellError::port_open(&settings.port_name, e.to_string()))?;

    info!(
        "Opened serial port {} at {} baud ({})",
        settings.port_name,
        settings.baud_rate,
        settings.line_settings_name()
    );
    Ok(SerialHalves { reader, writer })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_baud_rates_parse() {
        for rate in SUPPORTED_BAUD_RATES {
            let baud: BaudRate = rate.to_string().parse().unwrap();
            assert_eq!(baud.value(), *rate);
        }
    }

    #[test]
    fn test_unsupported_baud_rate_rejected() {
        let err = "4800".parse::<BaudRate>().unwrap_err();
        assert!(matches!(err, UartShellError::UnsupportedBaudRate(ref v) if v == "4800"));
        assert!("230400".parse::<BaudRate>().is_err());
    }

    #[test]
    fn test_garbage_baud_rate_rejected() {
        assert!("fast".parse::<BaudRate>().is_err());
        assert!("".parse::<BaudRate>().is_err());
    }

    #[test]
    fn test_default_settings_are_8n1() {
        let settings = PortSettings::new("/dev/ttyUSB0", BaudRate::new(115200).unwrap());
        assert_eq!(settings.data_bits, DataBits::Eight);
        assert_eq!(settings.parity, Parity::None);
        assert_eq!(settings.stop_bits, StopBits::One);
        assert_eq!(settings.flow_control, FlowControl::None);
        assert_eq!(settings.line_settings_name(), "8N1");
        assert!(settings.write_timeout > settings.timeout);
    }

    #[test]
    fn test_write_timeout_covers_chunk_drain() {
        // 256 bytes at 9600 baud take about 267 ms on the wire
        let slow = write_timeout_for(BaudRate::new(9600).unwrap());
        assert!(slow >= Duration::from_millis(1000 + 4 * 266));

        let fast = write_timeout_for(BaudRate::new(115200).unwrap());
        assert!(fast < slow);
        assert!(fast > WRITE_TIMEOUT_MARGIN);
    }

    #[test]
    fn test_open_missing_device_fails() {
        let settings = PortSettings::new(
            "/dev/uart-shell-does-not-exist",
            BaudRate::new(9600).unwrap(),
        );
        let err = open_port(&settings).err().unwrap();
        assert!(matches!(err, UartShellError::PortOpen { .. }));
    }
}
