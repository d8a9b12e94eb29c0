//! BLE event dispatch
//!
//! Consumes the stack's event stream and applies it to the link state:
//! connection lifecycle, peer configuration writes, MTU negotiation and
//! peer-to-serial forwarding.

use log::{debug, info, warn};

use crate::ble::events::{AdvertisingMode, AttHandle, BleEvent, ConnHandle, WriteScope};
use crate::ble::service::GattHandles;
use crate::ble::traits::BleStack;
use crate::bridge::state::{ConnectionState, LinkState};
use crate::bridge::BridgeError;
use crate::config::gatt::LOCAL_MTU;
use crate::serial::traits::UartDriver;

/// Dispatches BLE stack events against the bridge state
pub struct EventHandler {
    handles: GattHandles,
}

impl EventHandler {
    /// Create a handler bound to the bridge's attribute handles
    pub fn new(handles: GattHandles) -> Self {
        Self { handles }
    }

    /// Apply one stack event.
    ///
    /// All stack-call failures are absorbed here by dropping the failed
    /// operation's side effect, except an advertising restart failure
    /// after a disconnect, which is fatal to connectivity and surfaced
    /// to the caller.
    pub async fn handle<B: BleStack, U: UartDriver>(
        &self,
        state: &mut LinkState,
        event: BleEvent,
        ble: &mut B,
        uart: &mut U,
    ) -> Result<(), BridgeError> {
        match event {
            // The stack starts advertising autonomously after power-on
            BleEvent::StackOn => Ok(()),
            BleEvent::PeerConnected { conn } => {
                self.on_connected(state, conn);
                Ok(())
            }
            BleEvent::PeerDisconnected => self.on_disconnected(state, ble, uart).await,
            BleEvent::GattWriteRequest { handle, value } => {
                self.on_write_request(state, handle, &value, ble).await;
                Ok(())
            }
            BleEvent::GattWriteCommand { handle, value } => {
                self.on_write_command(handle, &value, uart);
                Ok(())
            }
            BleEvent::MtuExchangeRequest { mtu } => {
                self.on_mtu_exchange(state, mtu);
                Ok(())
            }
        }
    }

    fn on_connected(&self, state: &mut LinkState, conn: ConnHandle) {
        info!("BLE: connection established (handle {})", conn);
        state.connection = ConnectionState::Connected;
        state.conn_handle = Some(conn);
    }

    /// Tear down everything tied to the dead link, then resume advertising.
    async fn on_disconnected<B: BleStack, U: UartDriver>(
        &self,
        state: &mut LinkState,
        ble: &mut B,
        uart: &mut U,
    ) -> Result<(), BridgeError> {
        info!("BLE: disconnected");
        state.connection = ConnectionState::Disconnected;
        state.conn_handle = None;
        state.notifications.disable();

        // Full UART reset; in-flight bytes belonged to the dead link
        uart.stop();
        uart.clear_tx_buffer();
        uart.clear_rx_buffer();
        uart.start();

        match ble.start_advertising(AdvertisingMode::Fast).await {
            Ok(()) => {
                state.connection = ConnectionState::Advertising;
                Ok(())
            }
            Err(e) => {
                warn!("BLE: advertising restart failed: {:?}", e);
                Err(BridgeError::AdvertisingRestart(e))
            }
        }
    }

    /// Peer write request. Only the TX notification descriptor is handled
    /// here; the stack validates the write under peer-initiated scope.
    async fn on_write_request<B: BleStack>(
        &self,
        state: &mut LinkState,
        handle: AttHandle,
        value: &[u8],
        ble: &mut B,
    ) {
        if handle != self.handles.tx_cccd {
            return;
        }

        match ble
            .write_attribute(handle, value, WriteScope::PeerInitiated)
            .await
        {
            Ok(()) => {
                state.notifications.update(value);
                if let Some(conn) = state.conn_handle {
                    let _ = ble.send_write_response(conn).await;
                }
                info!(
                    "BLE: notifications {}",
                    if state.notifications.is_enabled() {
                        "enabled"
                    } else {
                        "disabled"
                    }
                );
            }
            Err(e) => {
                // No ack; the peer times out and may retry
                debug!("BLE: descriptor write rejected: {:?}", e);
            }
        }
    }

    /// Write-without-response carrying peer bytes bound for the serial port
    fn on_write_command<U: UartDriver>(&self, handle: AttHandle, value: &[u8], uart: &mut U) {
        if handle != self.handles.rx_data {
            return;
        }

        if let Err(e) = uart.write(value) {
            warn!("UART: dropped {} peer bytes: {:?}", value.len(), e);
        }
    }

    fn on_mtu_exchange(&self, state: &mut LinkState, peer_mtu: u16) {
        state.effective_mtu = peer_mtu.min(LOCAL_MTU);
        debug!("BLE: effective MTU {}", state.effective_mtu);
    }
}
