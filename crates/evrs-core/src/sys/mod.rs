// Evrs Sys Layer
// Raw system-call surface shared by the device handle

pub mod ioc;
pub mod ioctl;

pub use ioc::{io, ior, iow, Request};
pub use ioctl::{ioctl, Arg};
