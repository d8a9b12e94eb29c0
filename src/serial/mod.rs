//! Serial (UART) collaborator interface

pub mod traits;

pub use traits::{SerialError, UartDriver};
