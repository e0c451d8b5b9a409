// Evrs Device Layer - Device Handle
// Lifecycle and I/O surface for one open input device node

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::codes::{self, EventType};
use crate::device::caps::{parse_bitmask, DeviceCapabilities};
use crate::device::error::{DeviceError, DeviceResult};
use crate::device::id::InputId;
use crate::event::{InputEvent, EVENT_SIZE};
use crate::sys::{ioctl, Arg, Request};

/// Buffer size for the string-returning identity queries.
const STRING_QUERY_LEN: usize = 256;

/// Handle to one opened input device node.
///
/// The descriptor is owned exclusively by this value and is always opened
/// read-only in non-blocking mode; [`read_one`](Device::read_one) returning
/// [`DeviceError::WouldBlock`] instead of blocking depends on that open
/// mode. Reads through a shared handle are serialized internally, so
/// concurrent callers always observe whole records.
#[derive(Debug)]
pub struct Device {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl Device {
    /// Open the input device node at `path`.
    ///
    /// The node is opened read-only with `O_NONBLOCK | O_CLOEXEC`. The
    /// non-blocking mode is part of this constructor's contract, not an
    /// implementation detail: every guarantee `read_one` makes about
    /// returning [`DeviceError::WouldBlock`] immediately rests on it.
    ///
    /// Fails with [`DeviceError::NotFound`] or
    /// [`DeviceError::PermissionDenied`] as classified by the OS, and with
    /// [`DeviceError::NotADevice`] when the path is not a character special
    /// file. Open failures are never retried here.
    pub fn open(path: impl AsRef<Path>) -> DeviceResult<Device> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK | libc::O_CLOEXEC)
            .open(&path)
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => DeviceError::NotFound(path.clone()),
                io::ErrorKind::PermissionDenied => DeviceError::PermissionDenied(path.clone()),
                _ => DeviceError::Io(err),
            })?;

        if !file.metadata().map_err(DeviceError::Io)?.file_type().is_char_device() {
            return Err(DeviceError::NotADevice(path));
        }

        log::debug!("opened input device {}", path.display());
        Ok(Device {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    /// Adopt an already-open descriptor.
    ///
    /// The caller must have opened `file` for reading in non-blocking mode;
    /// over a blocking descriptor `read_one` loses its never-blocks
    /// guarantee. `path` is kept for diagnostics only.
    pub fn from_file(file: File, path: impl Into<PathBuf>) -> Device {
        Device {
            path: path.into(),
            file: Mutex::new(Some(file)),
        }
    }

    /// Path this handle was constructed from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the handle still owns an open descriptor.
    pub fn is_open(&self) -> bool {
        self.file.lock().is_some()
    }

    /// Raw descriptor for external readiness multiplexing (`poll(2)`,
    /// `epoll(7)`), `None` once closed.
    ///
    /// This is the intended composition point for callers that want a
    /// bounded wait: the handle itself never waits. The descriptor remains
    /// owned by the handle; do not close it.
    pub fn raw_fd(&self) -> Option<RawFd> {
        self.file.lock().as_ref().map(|file| file.as_raw_fd())
    }

    /// Request exclusive delivery of this device's events.
    ///
    /// While the grab is held the kernel routes events from this device to
    /// this descriptor only, and every other listener on the node goes
    /// silent. That reaches far outside this process: grabbing the only
    /// keyboard locks input away from the whole session until the grab is
    /// released or the descriptor closed. Nothing in this crate grabs
    /// automatically. Returns `true` iff the kernel accepted the grab.
    pub fn grab(&self) -> bool {
        self.grab_flag(1)
    }

    /// Give up a grab obtained through [`grab`](Device::grab).
    ///
    /// Safe to call without a prior grab: the kernel reports a benign
    /// failure, surfaced as `false` and nothing more.
    pub fn release(&self) -> bool {
        self.grab_flag(0)
    }

    fn grab_flag(&self, flag: libc::c_int) -> bool {
        let guard = self.file.lock();
        let Some(file) = guard.as_ref() else {
            log::debug!("EVIOCGRAB({}) on closed handle {}", flag, self.path.display());
            return false;
        };
        // Exactly one call, no EINTR retry: grab requests stay at-most-once.
        match unsafe { ioctl(file.as_raw_fd(), codes::EVIOCGRAB, Arg::Int(flag)) } {
            Ok(()) => true,
            Err(err) => {
                log::debug!(
                    "EVIOCGRAB({}) failed on {}: {}",
                    flag,
                    self.path.display(),
                    err
                );
                false
            }
        }
    }

    /// Read exactly one event record.
    ///
    /// Never blocks: with nothing to read this returns
    /// [`DeviceError::WouldBlock`] immediately, which is the expected idle
    /// result, not a failure. A source that has been drained for good (an
    /// adopted pipe or file whose writer is gone) also reads as
    /// `WouldBlock` rather than an end-of-file error. Short reads surface as
    /// [`DeviceError::TruncatedEvent`]; a partial record is never padded
    /// into a valid-looking event.
    ///
    /// Calls through a shared handle are serialized on the descriptor, so a
    /// successful return is always one complete, uncorrupted record.
    pub fn read_one(&self) -> DeviceResult<InputEvent> {
        let guard = self.file.lock();
        let Some(mut file) = guard.as_ref() else {
            return Err(DeviceError::Closed);
        };

        let mut buf = [0u8; EVENT_SIZE];
        let n = match file.read(&mut buf) {
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                return Err(DeviceError::WouldBlock)
            }
            Err(err) => return Err(DeviceError::Io(err)),
        };

        match n {
            0 => Err(DeviceError::WouldBlock),
            n if n < EVENT_SIZE => Err(DeviceError::TruncatedEvent {
                got: n,
                expected: EVENT_SIZE,
            }),
            _ => Ok(InputEvent::from_ne_bytes(&buf)),
        }
    }

    /// Input driver version as `(major, minor, patch)`.
    pub fn driver_version(&self) -> DeviceResult<(u8, u8, u8)> {
        let mut version: libc::c_int = 0;
        self.query(
            codes::EVIOCGVERSION,
            Arg::Ptr(&mut version as *mut libc::c_int as *mut libc::c_void),
        )?;
        Ok((
            ((version >> 16) & 0xff) as u8,
            ((version >> 8) & 0xff) as u8,
            (version & 0xff) as u8,
        ))
    }

    /// Bus/vendor/product/version identity of the device.
    pub fn input_id(&self) -> DeviceResult<InputId> {
        let mut id = InputId::default();
        self.query(
            codes::EVIOCGID,
            Arg::Ptr(&mut id as *mut InputId as *mut libc::c_void),
        )?;
        Ok(id)
    }

    /// Device name as reported by the driver.
    pub fn name(&self) -> DeviceResult<String> {
        self.query_string(codes::EVIOCGNAME(STRING_QUERY_LEN))
    }

    /// Physical topology path, e.g. `usb-0000:00:14.0-3/input0`.
    pub fn physical_path(&self) -> DeviceResult<String> {
        self.query_string(codes::EVIOCGPHYS(STRING_QUERY_LEN))
    }

    /// Unique identifier; often empty for built-in devices.
    pub fn unique_id(&self) -> DeviceResult<String> {
        self.query_string(codes::EVIOCGUNIQ(STRING_QUERY_LEN))
    }

    /// Event types this device can emit.
    pub fn supported_events(&self) -> DeviceResult<SmallVec<[EventType; 8]>> {
        let mut bitmap = [0u8; (codes::EV_MAX as usize + 1).div_ceil(8)];
        self.query(
            codes::EVIOCGBIT(0, bitmap.len()),
            Arg::Ptr(bitmap.as_mut_ptr() as *mut libc::c_void),
        )?;
        Ok(parse_bitmask(&bitmap)
            .into_iter()
            .filter_map(EventType::from_raw)
            .collect())
    }

    /// Key and button codes this device claims to support.
    pub fn supported_keys(&self) -> DeviceResult<Vec<u16>> {
        let mut bitmap = [0u8; (codes::KEY_MAX as usize + 1).div_ceil(8)];
        self.query(
            codes::EVIOCGBIT(codes::EV_KEY, bitmap.len()),
            Arg::Ptr(bitmap.as_mut_ptr() as *mut libc::c_void),
        )?;
        Ok(parse_bitmask(&bitmap))
    }

    /// Key capability summary, suitable for
    /// [`is_keyboard`](crate::device::caps::is_keyboard).
    pub fn capabilities(&self) -> DeviceResult<DeviceCapabilities> {
        let events = self.supported_events()?;
        let has_ev_key = events.contains(&EventType::Key);
        let supported_keys = if has_ev_key {
            self.supported_keys()?
        } else {
            Vec::new()
        };
        Ok(DeviceCapabilities::new(has_ev_key, supported_keys))
    }

    /// Close the handle.
    ///
    /// Any held grab is released first on a best-effort basis; that result
    /// is ignored by policy, because a failed release must never keep the
    /// descriptor open (closing drops the kernel-side grab regardless).
    /// Close-level failures are surfaced. Closing an already-closed handle
    /// is a no-op returning `Ok(())`.
    pub fn close(&self) -> io::Result<()> {
        let Some(file) = self.file.lock().take() else {
            return Ok(());
        };

        // Best effort; ignored per the release-before-close policy.
        if let Err(err) = unsafe { ioctl(file.as_raw_fd(), codes::EVIOCGRAB, Arg::Int(0)) } {
            log::debug!(
                "release before close failed on {}: {}",
                self.path.display(),
                err
            );
        }

        // Detach the descriptor so the close result is observable instead of
        // being swallowed by File's Drop.
        let fd = file.into_raw_fd();
        if unsafe { libc::close(fd) } < 0 {
            return Err(io::Error::last_os_error());
        }
        log::debug!("closed input device {}", self.path.display());
        Ok(())
    }

    fn query(&self, request: Request, arg: Arg) -> DeviceResult<()> {
        let guard = self.file.lock();
        let Some(file) = guard.as_ref() else {
            return Err(DeviceError::Closed);
        };
        // Call sites in this module only pass pointers to live, correctly
        // sized buffers for the given request.
        unsafe { ioctl(file.as_raw_fd(), request, arg) }.map_err(DeviceError::Io)
    }

    fn query_string(&self, request: Request) -> DeviceResult<String> {
        let mut buf = [0u8; STRING_QUERY_LEN];
        self.query(request, Arg::Ptr(buf.as_mut_ptr() as *mut libc::c_void))?;
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
    }
}

/// Releases any grab and closes the descriptor when the handle goes away.
///
/// Runs on normal return, early return and panic unwinding alike: a grabbed
/// keyboard must never stay locked because the owning handle died without an
/// explicit [`Device::close`].
impl Drop for Device {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("closing {} failed: {}", self.path.display(), err);
        }
    }
}
