//! Serial port link to the motor controller
//!
//! Wraps a `serialport` device in the hal UART traits so it can be handed to
//! [`polargraph_hal::UartChannel`].

use std::io::{self, Read, Write};
use std::time::Duration;

use polargraph_hal::uart::{DataBits, Parity, StopBits};
use polargraph_hal::{UartConfig, UartRx, UartTx};
use serialport::SerialPort;

/// Blocking serial port
pub struct SerialUart {
    port: Box<dyn SerialPort>,
}

impl SerialUart {
    /// Open and configure a serial device
    pub fn open(path: &str, config: &UartConfig) -> Result<Self, serialport::Error> {
        let port = serialport::new(path, config.baudrate)
            .data_bits(data_bits(config.data_bits))
            .parity(parity(config.parity))
            .stop_bits(stop_bits(config.stop_bits))
            .timeout(Duration::from_millis(config.read_timeout_ms as u64))
            .open()?;
        Ok(Self { port })
    }

    /// Device name, if the OS reports one
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl UartTx for SerialUart {
    type Error = io::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), io::Error> {
        self.port.write_all(data)
    }

    fn flush(&mut self) -> Result<(), io::Error> {
        self.port.flush()
    }
}

impl UartRx for SerialUart {
    type Error = io::Error;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        match self.port.read(buf)? {
            0 => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "serial port closed",
            )),
            n => Ok(n),
        }
    }

    fn is_timeout(error: &io::Error) -> bool {
        error.kind() == io::ErrorKind::TimedOut
    }
}

fn data_bits(bits: DataBits) -> serialport::DataBits {
    match bits {
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Even => serialport::Parity::Even,
        Parity::Odd => serialport::Parity::Odd,
    }
}

fn stop_bits(bits: StopBits) -> serialport::StopBits {
    match bits {
        StopBits::One => serialport::StopBits::One,
        StopBits::Two => serialport::StopBits::Two,
    }
}
