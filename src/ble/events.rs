//! BLE stack event definitions
//!
//! The external stack delivers these as a closed set; the bridge consumes
//! them through a single dispatch point in `bridge::handler`.

use crate::config::gatt::MAX_ATTR_LEN;
use heapless::Vec;

/// Attribute handle in the GATT database
pub type AttHandle = u16;

/// Connection handle assigned by the stack
pub type ConnHandle = u16;

/// Advertising interval mode requested from the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingMode {
    /// Fast interval, used when resuming after a disconnect
    Fast,
    /// Reduced-duty interval
    Slow,
}

/// Scope of an attribute-value access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteScope {
    /// Access originates locally; peer permission checks do not apply
    Local,
    /// Access originates from the connected peer; the stack enforces the
    /// attribute's access permissions
    PeerInitiated,
}

/// Events delivered by the BLE stack
#[derive(Debug, Clone, PartialEq)]
pub enum BleEvent {
    /// Stack initialisation finished; advertising starts autonomously
    StackOn,

    /// A peer established a connection
    PeerConnected { conn: ConnHandle },

    /// The peer connection dropped
    PeerDisconnected,

    /// Write-without-response from the peer (bytes bound for the serial port)
    GattWriteCommand {
        handle: AttHandle,
        value: Vec<u8, MAX_ATTR_LEN>,
    },

    /// Acknowledged write request from the peer (descriptor updates)
    GattWriteRequest {
        handle: AttHandle,
        value: Vec<u8, MAX_ATTR_LEN>,
    },

    /// Peer opened MTU negotiation with its proposed value
    MtuExchangeRequest { mtu: u16 },
}
