#![cfg_attr(not(test), no_std)]

pub mod ble;
pub mod bridge;
pub mod config;
pub mod serial;

pub use bridge::{BridgeError, UartBleBridge};
