//! UART driver trait for abstraction and testability
//!
//! This trait defines the operations the bridge performs on the external
//! UART peripheral, allowing the actual hardware driver to be swapped
//! with a mock for testing. The driver owns both byte queues; the bridge
//! only observes the receive fill level and issues drain requests.

/// Errors that can occur during serial operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    /// Transmit buffer overflow
    OverflowError,
    /// Write rejected (peripheral stopped or faulted)
    WriteError,
}

/// Abstract UART driver interface
///
/// All operations are synchronous register/buffer manipulation with
/// bounded latency. `drain` and `bytes_available` act on the receive
/// queue (bytes that arrived from the wire); `write` feeds the transmit
/// queue (bytes heading out the wire).
pub trait UartDriver {
    /// Start the peripheral
    fn start(&mut self);

    /// Stop the peripheral
    fn stop(&mut self);

    /// Discard everything queued for transmission
    fn clear_tx_buffer(&mut self);

    /// Discard everything received but not yet drained
    fn clear_rx_buffer(&mut self);

    /// Number of received bytes waiting to be drained
    fn bytes_available(&self) -> usize;

    /// Move up to `buf.len()` received bytes into `buf`, oldest first.
    ///
    /// Returns the number of bytes moved.
    fn drain(&mut self, buf: &mut [u8]) -> usize;

    /// Queue bytes for transmission out the serial port
    fn write(&mut self, data: &[u8]) -> Result<(), SerialError>;
}
