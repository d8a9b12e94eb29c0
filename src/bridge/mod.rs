//! Bridge core: link state, event dispatch and traffic scheduling
//!
//! The embedding firmware's main loop feeds every BLE stack event into
//! [`UartBleBridge::handle_event`] as it is delivered and calls
//! [`UartBleBridge::tick`] once per iteration. Event dispatch and ticks
//! run strictly interleaved on one thread; the bridge holds no locks.

pub mod handler;
pub mod scheduler;
pub mod state;

pub use handler::EventHandler;
pub use scheduler::TrafficScheduler;
pub use state::{ConnectionState, LinkState, NotificationConfig};

use crate::ble::events::BleEvent;
use crate::ble::service::GattHandles;
use crate::ble::traits::{BleStack, StackError};
use crate::serial::traits::UartDriver;

/// Fatal bridge-level failures.
///
/// Everything else is absorbed locally by dropping the failed operation's
/// side effect; protocol-level peer retry and the system watchdog cover
/// recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// Advertising could not be restarted after a disconnect. There is no
    /// retry at this layer; connectivity is gone until the caller or a
    /// watchdog intervenes.
    AdvertisingRestart(StackError),
}

/// The UART-BLE bridge core.
///
/// Owns the volatile link state and applies stack events and scheduler
/// ticks to it. Hardware stays behind the [`BleStack`] and [`UartDriver`]
/// traits supplied by the embedding firmware.
pub struct UartBleBridge {
    state: LinkState,
    handler: EventHandler,
    scheduler: TrafficScheduler,
}

impl UartBleBridge {
    /// Create a bridge bound to the serial-service handles of the external
    /// GATT database.
    pub fn new(handles: GattHandles) -> Self {
        Self {
            state: LinkState::new(),
            handler: EventHandler::new(handles),
            scheduler: TrafficScheduler::new(handles),
        }
    }

    /// Current link state snapshot
    pub fn state(&self) -> &LinkState {
        &self.state
    }

    /// Apply one BLE stack event
    pub async fn handle_event<B: BleStack, U: UartDriver>(
        &mut self,
        event: BleEvent,
        ble: &mut B,
        uart: &mut U,
    ) -> Result<(), BridgeError> {
        self.handler
            .handle(&mut self.state, event, ble, uart)
            .await
    }

    /// Run one scheduling tick
    pub async fn tick<B: BleStack, U: UartDriver>(
        &mut self,
        ble: &mut B,
        uart: &mut U,
    ) -> Result<(), BridgeError> {
        self.scheduler.tick(&mut self.state, ble, uart).await
    }
}
