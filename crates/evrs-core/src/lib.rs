// Evrs Core Library
// Typed event streams from Linux input device nodes

pub mod codes;
pub mod device;
pub mod event;
pub mod sys;

pub use codes::EventType;
pub use device::{
    is_keyboard, parse_bitmask, Device, DeviceCapabilities, DeviceError, DeviceResult, InputId,
};
pub use event::{InputEvent, EVENT_SIZE};
