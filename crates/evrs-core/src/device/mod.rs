// Evrs Device Layer
// Handle lifecycle, identity queries and capability analysis

pub mod caps;
pub mod error;
pub mod handle;
pub mod id;

pub use caps::{is_keyboard, parse_bitmask, DeviceCapabilities};
pub use error::{DeviceError, DeviceResult};
pub use handle::Device;
pub use id::InputId;
