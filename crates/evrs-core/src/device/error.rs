// Evrs Device Layer - Error Taxonomy
// Failure kinds for opening, controlling and reading a device node

use std::io;
use std::path::PathBuf;

/// Result type for device handle operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors reported by [`Device`](super::Device) operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The device node does not exist.
    #[error("no such device node: {0}")]
    NotFound(PathBuf),

    /// The caller is not allowed to open the device node.
    #[error("permission denied opening {0}")]
    PermissionDenied(PathBuf),

    /// The path exists but is not a character special device.
    #[error("not a character device: {0}")]
    NotADevice(PathBuf),

    /// The handle was already closed.
    #[error("device handle is closed")]
    Closed,

    /// No event is currently available. Expected and frequent on the
    /// non-blocking descriptor; wait for readability and call again.
    #[error("no event available")]
    WouldBlock,

    /// Fewer bytes than one full record were available. Surfaced as-is,
    /// never padded into a zero-filled event.
    #[error("truncated event record: got {got} of {expected} bytes")]
    TruncatedEvent { got: usize, expected: usize },

    /// Any other OS-level failure. The kernel's error code stays observable
    /// through [`io::Error::raw_os_error`].
    #[error("device I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DeviceError {
    /// Cheap check for the retry-later case, so polling loops can split
    /// "nothing to do yet" from real failures without matching every variant.
    pub fn is_would_block(&self) -> bool {
        matches!(self, DeviceError::WouldBlock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_would_block_is_distinguishable() {
        assert!(DeviceError::WouldBlock.is_would_block());
        assert!(!DeviceError::Closed.is_would_block());
        assert!(!DeviceError::TruncatedEvent {
            got: 3,
            expected: 24
        }
        .is_would_block());
    }

    #[test]
    fn test_os_error_code_is_preserved() {
        let err = DeviceError::from(io::Error::from_raw_os_error(libc::ENODEV));
        match err {
            DeviceError::Io(inner) => assert_eq!(inner.raw_os_error(), Some(libc::ENODEV)),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
