// Evrs Device Layer - Device Identity
// Mirror of the kernel's struct input_id, filled by EVIOCGID

use crate::codes;

/// Identity of an input device: bus attachment plus vendor/product/version
/// numbers.
///
/// `repr(C)` so the kernel writes it directly through the EVIOCGID request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct InputId {
    /// Bus the device is attached to (`BUS_*` code space).
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

impl InputId {
    /// Human-readable bus name, `"UNKNOWN"` for values outside the table.
    pub fn bus(&self) -> &'static str {
        codes::bus_name(self.bustype)
    }
}
