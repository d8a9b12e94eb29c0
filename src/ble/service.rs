//! Serial-bridge attribute handles
//!
//! The GATT database (service layout, UUIDs, attribute table) is generated
//! outside this crate; the bridge only needs the handles of the three
//! attributes it touches.

use crate::ble::events::AttHandle;

/// Handles of the serial-bridge attributes in the external GATT database.
///
/// The usual BLE serial service layout: an RX characteristic the peer
/// writes serial-bound bytes to, a TX characteristic the bridge notifies
/// UART bytes on, and the TX CCCD the peer writes to enable those
/// notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GattHandles {
    /// TX data characteristic value (UART to BLE notifications)
    pub tx_data: AttHandle,
    /// Client characteristic configuration descriptor of the TX characteristic
    pub tx_cccd: AttHandle,
    /// RX data characteristic value (BLE to UART writes)
    pub rx_data: AttHandle,
}
