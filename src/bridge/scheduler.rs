//! Per-tick traffic scheduling
//!
//! Invoked once per main-loop iteration. Decides from the link state and
//! the stack's busy signal whether buffered UART bytes may be pushed to
//! the peer, and drains them in MTU-sized notifications when allowed.

use log::{trace, warn};

use crate::ble::events::AdvertisingMode;
use crate::ble::service::GattHandles;
use crate::ble::traits::BleStack;
use crate::bridge::state::{ConnectionState, LinkState};
use crate::bridge::BridgeError;
use crate::config::gatt::{ATT_NOTIFY_OVERHEAD, CCCD_LEN, MAX_NOTIFY_PAYLOAD};
use crate::serial::traits::UartDriver;

/// Periodic decision loop for UART-to-BLE traffic
pub struct TrafficScheduler {
    handles: GattHandles,
}

impl TrafficScheduler {
    /// Create a scheduler bound to the bridge's attribute handles
    pub fn new(handles: GattHandles) -> Self {
        Self { handles }
    }

    /// Run one scheduling tick.
    ///
    /// Cooperative and non-blocking; never invoked concurrently with
    /// itself or with event dispatch. There is no pending-send state —
    /// a skipped tick re-evaluates everything from scratch on the next.
    pub async fn tick<B: BleStack, U: UartDriver>(
        &self,
        state: &mut LinkState,
        ble: &mut B,
        uart: &mut U,
    ) -> Result<(), BridgeError> {
        match state.connection {
            ConnectionState::Advertising => Ok(()),
            ConnectionState::Connected => {
                self.service_uplink(state, ble, uart).await;
                Ok(())
            }
            ConnectionState::Disconnected => self.reassert_idle(state, ble).await,
            ConnectionState::Initializing | ConnectionState::Stopped => Ok(()),
        }
    }

    /// Connected tick: resync the descriptor mirror, then drain UART bytes
    /// into notifications while the link accepts them.
    async fn service_uplink<B: BleStack, U: UartDriver>(
        &self,
        state: &mut LinkState,
        ble: &mut B,
        uart: &mut U,
    ) {
        // The peer may have changed the descriptor since the last write
        // event; the stack's copy is authoritative.
        let mut cccd = [0u8; CCCD_LEN];
        if let Ok(count) = ble.read_attribute(self.handles.tx_cccd, &mut cccd).await {
            state.notifications.update(&cccd[..count]);
        }

        if !state.notifications.is_enabled() {
            // Bytes accumulate in the UART buffer until the peer subscribes
            return;
        }

        let conn = match state.conn_handle {
            Some(conn) => conn,
            None => return,
        };

        let budget = (state.effective_mtu as usize)
            .saturating_sub(ATT_NOTIFY_OVERHEAD)
            .min(MAX_NOTIFY_PAYLOAD);
        if budget == 0 {
            return;
        }

        let mut chunk = [0u8; MAX_NOTIFY_PAYLOAD];
        while uart.bytes_available() > 0 {
            // Queried fresh before every send, never cached
            if ble.is_link_busy() {
                trace!("BLE: link busy, deferring to next tick");
                return;
            }

            let count = uart.drain(&mut chunk[..budget]);
            if count == 0 {
                return;
            }

            if let Err(e) = ble.notify(conn, self.handles.tx_data, &chunk[..count]).await {
                warn!("BLE: notify failed, {} bytes lost: {:?}", count, e);
                return;
            }
        }
    }

    /// Disconnected tick: re-assert the disabled descriptor mirror and get
    /// advertising running again.
    async fn reassert_idle<B: BleStack>(
        &self,
        state: &mut LinkState,
        ble: &mut B,
    ) -> Result<(), BridgeError> {
        state.notifications.disable();

        match ble.start_advertising(AdvertisingMode::Fast).await {
            Ok(()) => {
                state.connection = ConnectionState::Advertising;
                Ok(())
            }
            Err(e) => Err(BridgeError::AdvertisingRestart(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::events::ConnHandle;
    use crate::ble::traits::mock::MockBleStack;
    use crate::ble::traits::StackError;
    use crate::config::gatt::LOCAL_MTU;
    use crate::serial::traits::mock::MockUartDriver;

    const HANDLES: GattHandles = GattHandles {
        tx_data: 0x0012,
        tx_cccd: 0x0013,
        rx_data: 0x0015,
    };

    fn connected_state(conn: ConnHandle) -> LinkState {
        let mut state = LinkState::new();
        state.connection = ConnectionState::Connected;
        state.conn_handle = Some(conn);
        state
    }

    fn run_tick(
        scheduler: &TrafficScheduler,
        state: &mut LinkState,
        ble: &mut MockBleStack,
        uart: &mut MockUartDriver,
    ) -> Result<(), BridgeError> {
        futures::executor::block_on(scheduler.tick(state, ble, uart))
    }

    #[test]
    fn test_advertising_tick_is_inert() {
        let scheduler = TrafficScheduler::new(HANDLES);
        let mut state = LinkState::new();
        state.connection = ConnectionState::Advertising;
        let mut ble = MockBleStack::new();
        let mut uart = MockUartDriver::new();
        uart.queue_rx_data(&[0x01, 0x02]);

        run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();

        assert!(ble.notifications().is_empty());
        assert_eq!(uart.bytes_available(), 2);
    }

    #[test]
    fn test_initializing_and_stopped_ticks_are_inert() {
        let scheduler = TrafficScheduler::new(HANDLES);
        let mut ble = MockBleStack::new();
        let mut uart = MockUartDriver::new();
        uart.queue_rx_data(&[0x01]);

        for connection in [ConnectionState::Initializing, ConnectionState::Stopped] {
            let mut state = LinkState::new();
            state.connection = connection;

            run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();

            assert!(ble.notifications().is_empty());
            assert!(ble.adv_requests().is_empty());
            assert_eq!(uart.bytes_available(), 1);
        }
    }

    #[test]
    fn test_connected_tick_sends_pending_bytes() {
        let scheduler = TrafficScheduler::new(HANDLES);
        let mut state = connected_state(1);
        let mut ble = MockBleStack::new();
        let mut uart = MockUartDriver::new();
        ble.set_attribute(HANDLES.tx_cccd, &[0x01, 0x00]);
        uart.queue_rx_data(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);

        run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();

        let sent = ble.notifications();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].conn, 1);
        assert_eq!(sent[0].handle, HANDLES.tx_data);
        assert_eq!(
            sent[0].payload.as_slice(),
            &[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09]
        );
        assert!(sent[0].payload.len() <= LOCAL_MTU as usize - ATT_NOTIFY_OVERHEAD);
        assert_eq!(uart.bytes_available(), 0);
    }

    #[test]
    fn test_busy_tick_sends_nothing() {
        let scheduler = TrafficScheduler::new(HANDLES);
        let mut state = connected_state(1);
        let mut ble = MockBleStack::new();
        let mut uart = MockUartDriver::new();
        ble.set_attribute(HANDLES.tx_cccd, &[0x01, 0x00]);
        ble.set_link_busy(true);
        uart.queue_rx_data(&[0x01, 0x02, 0x03]);

        run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();

        // No notify, and the buffer fill level did not decrease
        assert!(ble.notifications().is_empty());
        assert_eq!(uart.bytes_available(), 3);

        // Back-pressure clears, the next tick drains from scratch
        ble.set_link_busy(false);
        run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();
        assert_eq!(ble.notifications().len(), 1);
        assert_eq!(uart.bytes_available(), 0);
    }

    #[test]
    fn test_disabled_notifications_accumulate_bytes() {
        let scheduler = TrafficScheduler::new(HANDLES);
        let mut state = connected_state(1);
        let mut ble = MockBleStack::new();
        let mut uart = MockUartDriver::new();
        ble.set_attribute(HANDLES.tx_cccd, &[0x00, 0x00]);
        // Stale mirror claims enabled; the stack read must win
        state.notifications.update(&[0x01, 0x00]);
        uart.queue_rx_data(&[0x01, 0x02, 0x03]);

        run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();

        assert!(ble.notifications().is_empty());
        assert!(!state.notifications.is_enabled());
        assert_eq!(uart.bytes_available(), 3);
    }

    #[test]
    fn test_out_of_band_enable_is_picked_up() {
        let scheduler = TrafficScheduler::new(HANDLES);
        let mut state = connected_state(1);
        let mut ble = MockBleStack::new();
        let mut uart = MockUartDriver::new();
        // Mirror says disabled, but the stack's descriptor was enabled
        // without a write event reaching us
        ble.set_attribute(HANDLES.tx_cccd, &[0x01, 0x00]);
        uart.queue_rx_data(&[0xAA, 0xBB]);

        run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();

        assert!(state.notifications.is_enabled());
        assert_eq!(ble.notifications().len(), 1);
        assert_eq!(ble.notifications()[0].payload.as_slice(), &[0xAA, 0xBB]);
    }

    #[test]
    fn test_drain_is_chunked_to_effective_mtu() {
        let scheduler = TrafficScheduler::new(HANDLES);
        let mut state = connected_state(1);
        let mut ble = MockBleStack::new();
        let mut uart = MockUartDriver::new();
        ble.set_attribute(HANDLES.tx_cccd, &[0x01, 0x00]);

        let data: [u8; 50] = core::array::from_fn(|i| i as u8);
        uart.queue_rx_data(&data);

        run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();

        // 50 bytes at a 20-byte payload budget: 20 + 20 + 10
        let sent = ble.notifications();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].payload.len(), 20);
        assert_eq!(sent[1].payload.len(), 20);
        assert_eq!(sent[2].payload.len(), 10);
        assert_eq!(sent[0].payload.as_slice(), &data[..20]);
        assert_eq!(sent[2].payload.as_slice(), &data[40..]);
        assert_eq!(uart.bytes_available(), 0);
    }

    #[test]
    fn test_negotiated_mtu_shrinks_chunks() {
        let scheduler = TrafficScheduler::new(HANDLES);
        let mut state = connected_state(1);
        state.effective_mtu = 20;
        let mut ble = MockBleStack::new();
        let mut uart = MockUartDriver::new();
        ble.set_attribute(HANDLES.tx_cccd, &[0x01, 0x00]);

        let data: [u8; 20] = core::array::from_fn(|i| i as u8);
        uart.queue_rx_data(&data);

        run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();

        let sent = ble.notifications();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].payload.len(), 17);
        assert_eq!(sent[1].payload.len(), 3);
    }

    #[test]
    fn test_busy_mid_drain_defers_remainder() {
        let scheduler = TrafficScheduler::new(HANDLES);
        let mut state = connected_state(1);
        let mut ble = MockBleStack::new();
        let mut uart = MockUartDriver::new();
        ble.set_attribute(HANDLES.tx_cccd, &[0x01, 0x00]);
        ble.set_busy_after_notifications(1);

        let data: [u8; 50] = core::array::from_fn(|i| i as u8);
        uart.queue_rx_data(&data);

        run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();

        // One chunk went out before the link pushed back
        assert_eq!(ble.notifications().len(), 1);
        assert_eq!(uart.bytes_available(), 30);
    }

    #[test]
    fn test_notify_failure_stops_drain_for_tick() {
        let scheduler = TrafficScheduler::new(HANDLES);
        let mut state = connected_state(1);
        let mut ble = MockBleStack::new();
        let mut uart = MockUartDriver::new();
        ble.set_attribute(HANDLES.tx_cccd, &[0x01, 0x00]);
        ble.set_next_notify_error(StackError::InsufficientResources);

        let data: [u8; 50] = core::array::from_fn(|i| i as u8);
        uart.queue_rx_data(&data);

        run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();

        // The failed chunk is lost; the rest waits for the next tick
        assert!(ble.notifications().is_empty());
        assert_eq!(uart.bytes_available(), 30);

        run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();
        assert_eq!(ble.notifications().len(), 2);
        assert_eq!(uart.bytes_available(), 0);
    }

    #[test]
    fn test_disconnected_tick_restarts_advertising() {
        let scheduler = TrafficScheduler::new(HANDLES);
        let mut state = LinkState::new();
        state.connection = ConnectionState::Disconnected;
        state.notifications.update(&[0x01, 0x00]);
        let mut ble = MockBleStack::new();
        let mut uart = MockUartDriver::new();

        run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();

        assert!(!state.notifications.is_enabled());
        assert_eq!(ble.adv_requests().as_slice(), &[AdvertisingMode::Fast]);
        assert_eq!(state.connection, ConnectionState::Advertising);
    }

    #[test]
    fn test_disconnected_tick_advertising_failure_is_fatal() {
        let scheduler = TrafficScheduler::new(HANDLES);
        let mut state = LinkState::new();
        state.connection = ConnectionState::Disconnected;
        let mut ble = MockBleStack::new();
        let mut uart = MockUartDriver::new();
        ble.set_next_adv_error(StackError::InvalidParameter);

        let result = run_tick(&scheduler, &mut state, &mut ble, &mut uart);

        assert_eq!(
            result,
            Err(BridgeError::AdvertisingRestart(StackError::InvalidParameter))
        );
        assert_eq!(state.connection, ConnectionState::Disconnected);
    }

    #[test]
    fn test_connected_tick_with_empty_buffer_sends_nothing() {
        let scheduler = TrafficScheduler::new(HANDLES);
        let mut state = connected_state(1);
        let mut ble = MockBleStack::new();
        let mut uart = MockUartDriver::new();
        ble.set_attribute(HANDLES.tx_cccd, &[0x01, 0x00]);

        run_tick(&scheduler, &mut state, &mut ble, &mut uart).unwrap();

        assert!(ble.notifications().is_empty());
    }
}
