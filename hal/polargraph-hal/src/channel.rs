//! Byte channel abstraction
//!
//! The remote motor controller is driven one byte at a time: every outgoing
//! byte is answered by exactly one incoming byte. On an SPI link that is the
//! natural full-duplex transfer; on a serial link it is a write followed by a
//! blocking single-byte read.

use embedded_hal::spi::SpiBus;

use crate::uart::{UartRx, UartTx};

/// Synchronous single-byte exchange with the remote side
pub trait ByteChannel {
    /// Error type for exchange failures
    type Error;

    /// Send one byte and return the byte received in the same exchange
    ///
    /// Blocks until the exchange completes.
    fn exchange(&mut self, byte: u8) -> Result<u8, Self::Error>;

    /// Whether an error means the remote side sent nothing in time
    ///
    /// A timed-out exchange during the handshake is treated like a reply
    /// that is not an ACK. Channels that cannot time out keep the default.
    fn is_timeout(_error: &Self::Error) -> bool {
        false
    }
}

impl<T: ByteChannel + ?Sized> ByteChannel for &mut T {
    type Error = T::Error;

    fn exchange(&mut self, byte: u8) -> Result<u8, Self::Error> {
        (**self).exchange(byte)
    }

    fn is_timeout(error: &Self::Error) -> bool {
        T::is_timeout(error)
    }
}

/// Byte channel over an SPI master
///
/// Each exchange is a one-byte in-place transfer.
#[derive(Debug)]
pub struct SpiChannel<B> {
    bus: B,
}

impl<B: SpiBus> SpiChannel<B> {
    /// Wrap an SPI bus
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Release the underlying bus
    pub fn into_inner(self) -> B {
        self.bus
    }
}

impl<B: SpiBus> ByteChannel for SpiChannel<B> {
    type Error = B::Error;

    fn exchange(&mut self, byte: u8) -> Result<u8, Self::Error> {
        let mut buf = [byte];
        self.bus.transfer_in_place(&mut buf)?;
        Ok(buf[0])
    }
}

/// Byte channel over a UART
///
/// Writes the outgoing byte, flushes, then blocks for the reply byte.
#[derive(Debug)]
pub struct UartChannel<U> {
    uart: U,
}

impl<U: UartTx + UartRx> UartChannel<U> {
    /// Wrap a UART
    pub fn new(uart: U) -> Self {
        Self { uart }
    }

    /// Release the underlying UART
    pub fn into_inner(self) -> U {
        self.uart
    }
}

/// Errors from a UART-backed byte channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartChannelError<TxE, RxE> {
    /// Writing or flushing the outgoing byte failed
    Tx(TxE),
    /// Reading the reply byte failed
    Rx(RxE),
}

impl<U: UartTx + UartRx> ByteChannel for UartChannel<U> {
    type Error = UartChannelError<<U as UartTx>::Error, <U as UartRx>::Error>;

    fn exchange(&mut self, byte: u8) -> Result<u8, Self::Error> {
        self.uart
            .write_blocking(&[byte])
            .map_err(UartChannelError::Tx)?;
        self.uart.flush().map_err(UartChannelError::Tx)?;
        self.uart.read_byte().map_err(UartChannelError::Rx)
    }

    fn is_timeout(error: &Self::Error) -> bool {
        matches!(error, UartChannelError::Rx(e) if <U as UartRx>::is_timeout(e))
    }
}
