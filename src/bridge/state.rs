//! Flow-control and connection state
//!
//! Folds the stack-mirrored connection state, the notification descriptor
//! mirror and the negotiated MTU into one owned context. Constructed once
//! at boot, mutated only by the event handler and the scheduler, both on
//! the same thread.

use crate::ble::events::ConnHandle;
use crate::config::gatt::{CCCD_LEN, LOCAL_MTU};

/// Mirror of the BLE stack's reported connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Stack not yet initialised
    Initializing,
    /// Advertising, waiting for a peer
    Advertising,
    /// A peer is connected
    Connected,
    /// The peer dropped and advertising has not resumed yet
    Disconnected,
    /// Stack shut down
    Stopped,
}

/// Mirror of the TX characteristic's client configuration descriptor.
///
/// `{0, 0}` means notifications are disabled; any nonzero byte enables
/// them. Reset to disabled on every disconnect — the value never survives
/// a disconnect/reconnect cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationConfig {
    value: [u8; CCCD_LEN],
}

impl NotificationConfig {
    /// The disabled descriptor value
    pub const fn disabled() -> Self {
        Self {
            value: [0; CCCD_LEN],
        }
    }

    /// Whether the peer has notifications enabled
    pub fn is_enabled(&self) -> bool {
        self.value.iter().any(|&b| b != 0)
    }

    /// Reset to the disabled value
    pub fn disable(&mut self) {
        self.value = [0; CCCD_LEN];
    }

    /// Overwrite the mirror from a descriptor value read from or written
    /// through the stack. Bytes beyond the descriptor length are ignored;
    /// missing bytes read as zero.
    pub fn update(&mut self, bytes: &[u8]) {
        let count = bytes.len().min(CCCD_LEN);
        self.value = [0; CCCD_LEN];
        self.value[..count].copy_from_slice(&bytes[..count]);
    }

    /// Raw descriptor bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.value
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Volatile per-boot bridge context.
///
/// Nothing here persists across power cycles; every field reinitialises
/// to its safe default at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkState {
    /// Mirror of the stack's connection state
    pub connection: ConnectionState,
    /// Mirror of the TX notification descriptor
    pub notifications: NotificationConfig,
    /// Negotiated MTU, never above the local capability
    pub effective_mtu: u16,
    /// Handle of the current connection, retained for its lifetime
    pub conn_handle: Option<ConnHandle>,
}

impl LinkState {
    /// Boot-time defaults: initialising, notifications disabled, local MTU
    pub fn new() -> Self {
        Self {
            connection: ConnectionState::Initializing,
            notifications: NotificationConfig::disabled(),
            effective_mtu: LOCAL_MTU,
            conn_handle: None,
        }
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}
