//! Bluetooth Low Energy collaborator interfaces
//!
//! Event definitions, the GATT handle map and the stack trait the bridge
//! drives. The stack implementation itself lives outside this crate.

pub mod events;
pub mod service;
pub mod traits;

pub use events::{AdvertisingMode, BleEvent, WriteScope};
pub use service::GattHandles;
pub use traits::{BleStack, GattError, StackError};
