//! `DEVICE_INFO` payload packing (opcode `0x02`).
//!
//! Sent receiver -> sender, optionally, on connect. Advisory only: the
//! engine forwards a decoded value to the application and never acts on it
//! itself.

/// Decoded `DEVICE_INFO` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_type: u8,
    pub battery_percent: u8,
    pub width: u16,
    pub height: u16,
}

impl DeviceInfo {
    /// Pack into the `(param1, param2)` pair carried by a `DEVICE_INFO`
    /// control message: `param1` low byte = device type, next byte =
    /// battery %; `param2` low 16 bits = width, high 16 bits = height.
    #[must_use]
    pub const fn to_params(self) -> (u32, u32) {
        let param1 = (self.device_type as u32) | ((self.battery_percent as u32) << 8);
        let param2 = (self.width as u32) | ((self.height as u32) << 16);
        (param1, param2)
    }

    /// Unpack from the `(param1, param2)` pair of a decoded control message.
    #[must_use]
    pub const fn from_params(param1: u32, param2: u32) -> Self {
        Self {
            device_type: (param1 & 0xFF) as u8,
            battery_percent: ((param1 >> 8) & 0xFF) as u8,
            width: (param2 & 0xFFFF) as u16,
            height: ((param2 >> 16) & 0xFFFF) as u16,
        }
    }
}
