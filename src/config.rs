//! Protocol and driver constants for the UART-BLE bridge

/// GATT/ATT protocol constants
pub mod gatt {
    /// Local ATT_MTU capability. The effective MTU negotiated with a peer
    /// never exceeds this, protecting the fixed-size notification buffer.
    pub const LOCAL_MTU: u16 = 23;

    /// ATT notification header: opcode (1 byte) + attribute handle (2 bytes).
    /// Subtracted from the effective MTU to get the per-notification payload.
    pub const ATT_NOTIFY_OVERHEAD: usize = 3;

    /// Largest payload a single notification can carry at the local MTU cap
    pub const MAX_NOTIFY_PAYLOAD: usize = LOCAL_MTU as usize - ATT_NOTIFY_OVERHEAD;

    /// Client characteristic configuration descriptor value length
    pub const CCCD_LEN: usize = 2;

    /// Upper bound on an attribute value delivered in a write event
    pub const MAX_ATTR_LEN: usize = 512;
}

/// Serial configuration
pub mod serial {
    pub const BAUD_RATE: u32 = 115200;
    pub const RX_BUFFER_SIZE: usize = 512;
    pub const TX_BUFFER_SIZE: usize = 512;
}
