// Evrs Sys Layer - Request Number Encoding
// The kernel's _IOC request construction from asm-generic/ioctl.h

/// An encoded ioctl request number.
pub type Request = libc::c_ulong;

const IOC_NRBITS: u32 = 8;
const IOC_TYPEBITS: u32 = 8;
const IOC_SIZEBITS: u32 = 14;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;

const IOC_NONE: Request = 0;
const IOC_WRITE: Request = 1;
const IOC_READ: Request = 2;

/// Encode a request number from its direction, type group, number and
/// payload size. Mirrors the kernel's `_IOC()` macro, so request values
/// always agree with the running kernel instead of being transcribed.
const fn ioc(dir: Request, ty: u8, nr: u8, size: usize) -> Request {
    (dir << IOC_DIRSHIFT)
        | ((ty as Request) << IOC_TYPESHIFT)
        | ((nr as Request) << IOC_NRSHIFT)
        | ((size as Request) << IOC_SIZESHIFT)
}

/// `_IO(type, nr)`: request with no payload.
pub const fn io(ty: u8, nr: u8) -> Request {
    ioc(IOC_NONE, ty, nr, 0)
}

/// `_IOR(type, nr, size)`: the kernel writes `size` bytes to the caller.
pub const fn ior(ty: u8, nr: u8, size: usize) -> Request {
    ioc(IOC_READ, ty, nr, size)
}

/// `_IOW(type, nr, size)`: the kernel reads `size` bytes from the caller.
pub const fn iow(ty: u8, nr: u8, size: usize) -> Request {
    ioc(IOC_WRITE, ty, nr, size)
}
