//! BLE stack trait for abstraction and testability
//!
//! This trait defines the calls the bridge core makes into the external
//! BLE stack, allowing the real stack binding to be swapped with a mock
//! for testing.

use crate::ble::events::{AdvertisingMode, AttHandle, ConnHandle, WriteScope};
use core::future::Future;

/// ATT error codes the stack can report on attribute access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GattError {
    /// The attribute handle does not exist in the database
    InvalidHandle,
    /// The attribute's permissions forbid writing
    WriteNotPermitted,
    /// The value length does not match the attribute
    InvalidAttributeLength,
    /// The link lacks the authentication the attribute requires
    InsufficientAuthentication,
    /// Unspecified attribute-layer failure
    UnlikelyError,
}

/// Failures of stack API calls outside the attribute protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// The stack cannot accept the operation in its current state
    InvalidState,
    /// A parameter was rejected by the stack
    InvalidParameter,
    /// The stack's internal queue is out of capacity
    InsufficientResources,
}

/// Abstract BLE stack interface for the bridge core
///
/// All calls are bounded-latency stack primitives, not network round
/// trips. The bridge never caches the busy state; it queries it through
/// [`is_link_busy`](Self::is_link_busy) immediately before each send.
pub trait BleStack {
    /// Read the current value of an attribute in the GATT database.
    ///
    /// Returns the number of bytes copied into `buf`.
    fn read_attribute(
        &mut self,
        handle: AttHandle,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<usize, GattError>>;

    /// Write an attribute value into the GATT database.
    ///
    /// `scope` selects whether the stack applies the attribute's peer
    /// access checks before accepting the value.
    fn write_attribute(
        &mut self,
        handle: AttHandle,
        value: &[u8],
        scope: WriteScope,
    ) -> impl Future<Output = Result<(), GattError>>;

    /// Acknowledge a peer write request on the given connection.
    fn send_write_response(
        &mut self,
        conn: ConnHandle,
    ) -> impl Future<Output = Result<(), StackError>>;

    /// Whether the outbound link queue currently refuses more data.
    fn is_link_busy(&mut self) -> bool;

    /// Start advertising in the requested mode.
    fn start_advertising(
        &mut self,
        mode: AdvertisingMode,
    ) -> impl Future<Output = Result<(), StackError>>;

    /// Push a notification of `handle`'s value to the connected peer.
    fn notify(
        &mut self,
        conn: ConnHandle,
        handle: AttHandle,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), StackError>>;
}
