// Evrs Sys Layer - Control Primitive
// Single chokepoint for device control requests against an open descriptor

use std::io;
use std::os::unix::io::RawFd;

use super::ioc::Request;

/// Argument to a control request.
///
/// The kernel takes one machine word whose meaning depends on the request: a
/// flag passed by value, the address of a caller-owned buffer, or an already
/// resolved word. Modeling the three shapes as a sum type means an
/// unsupported shape cannot be expressed, so there is no runtime
/// argument-kind failure to report.
#[derive(Clone, Copy, Debug)]
pub enum Arg {
    /// Small integer passed by value (e.g. the grab flag).
    Int(libc::c_int),
    /// Raw address of a caller-owned buffer the request fills or consumes.
    Ptr(*mut libc::c_void),
    /// A pre-resolved machine word.
    Word(usize),
}

impl Arg {
    /// Resolve to the word handed to the kernel.
    fn as_word(self) -> usize {
        match self {
            Arg::Int(value) => value as usize,
            Arg::Ptr(ptr) => ptr as usize,
            Arg::Word(word) => word,
        }
    }
}

/// Issue a single control request against `fd`.
///
/// Performs exactly one raw `ioctl(2)` call. Interrupted calls are not
/// restarted: some requests are not idempotent, so retry policy belongs to
/// the caller. On failure the kernel's errno is returned verbatim and stays
/// observable through [`io::Error::raw_os_error`], so callers can tell
/// "request unsupported" from "device disappeared".
///
/// # Safety
///
/// The caller must guarantee that `request` expects an argument of the given
/// shape, and that memory behind an [`Arg::Ptr`] is valid for whatever
/// access the request performs.
pub unsafe fn ioctl(fd: RawFd, request: Request, arg: Arg) -> io::Result<()> {
    let rc = libc::ioctl(fd, request as _, arg.as_word());
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
