// Evrs Event Layer
// Fixed-layout input_event wire records as emitted by the kernel

use std::mem::size_of;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::codes::{self, EventType};

/// Width of the timestamp-seconds field: the platform's native long.
const SEC_BYTES: usize = size_of::<libc::time_t>();
/// Width of the timestamp-microseconds field.
const USEC_BYTES: usize = size_of::<libc::suseconds_t>();

/// Size in bytes of one wire record on this target.
///
/// An ABI property, not a constant: the two timestamp fields use the
/// platform's native long width, so a record is 24 bytes on 64-bit targets
/// and 16 bytes on 32-bit targets. Resolved at compile time from the C types.
pub const EVENT_SIZE: usize = size_of::<libc::input_event>();

// The decode below assumes the record packs with no padding; a target where
// that does not hold must fail the build, not corrupt timestamps.
const _: () = assert!(EVENT_SIZE == SEC_BYTES + USEC_BYTES + 2 + 2 + 4);

/// One decoded input event.
///
/// Field-for-field mirror of the kernel's `struct input_event`. Values are
/// passed through exactly as the kernel reported them; no range validation
/// of `event_type`/`code` happens at this layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputEvent {
    /// Timestamp, seconds part.
    pub time_sec: libc::time_t,
    /// Timestamp, microseconds part.
    pub time_usec: libc::suseconds_t,
    /// Event type (`EV_*` code space).
    pub event_type: u16,
    /// Event code within the type's code space.
    pub code: u16,
    /// Event value: edge for keys, delta for relative axes, position for
    /// absolute axes.
    pub value: i32,
}

fn take<const N: usize>(buf: &[u8], at: &mut usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[*at..*at + N]);
    *at += N;
    out
}

fn put(buf: &mut [u8], at: &mut usize, bytes: &[u8]) {
    buf[*at..*at + bytes.len()].copy_from_slice(bytes);
    *at += bytes.len();
}

impl InputEvent {
    pub fn new(
        time_sec: libc::time_t,
        time_usec: libc::suseconds_t,
        event_type: u16,
        code: u16,
        value: i32,
    ) -> Self {
        Self {
            time_sec,
            time_usec,
            event_type,
            code,
            value,
        }
    }

    /// Decode one wire record.
    ///
    /// A pure transform over the kernel's fixed layout in the host's native
    /// byte order (the order the kernel writes). Field offsets are derived
    /// from the platform C types, so 32- and 64-bit targets both decode
    /// correctly without a runtime branch.
    pub fn from_ne_bytes(buf: &[u8; EVENT_SIZE]) -> Self {
        let mut at = 0;
        let time_sec = libc::time_t::from_ne_bytes(take::<SEC_BYTES>(buf, &mut at));
        let time_usec = libc::suseconds_t::from_ne_bytes(take::<USEC_BYTES>(buf, &mut at));
        let event_type = u16::from_ne_bytes(take::<2>(buf, &mut at));
        let code = u16::from_ne_bytes(take::<2>(buf, &mut at));
        let value = i32::from_ne_bytes(take::<4>(buf, &mut at));
        Self {
            time_sec,
            time_usec,
            event_type,
            code,
            value,
        }
    }

    /// Encode to the wire layout; exact inverse of
    /// [`from_ne_bytes`](InputEvent::from_ne_bytes).
    pub fn to_ne_bytes(&self) -> [u8; EVENT_SIZE] {
        let mut out = [0u8; EVENT_SIZE];
        let mut at = 0;
        put(&mut out, &mut at, &self.time_sec.to_ne_bytes());
        put(&mut out, &mut at, &self.time_usec.to_ne_bytes());
        put(&mut out, &mut at, &self.event_type.to_ne_bytes());
        put(&mut out, &mut at, &self.code.to_ne_bytes());
        put(&mut out, &mut at, &self.value.to_ne_bytes());
        out
    }

    /// Event type resolved against the constant table, `None` for codes this
    /// build does not know (the raw number stays available in `event_type`).
    pub fn kind(&self) -> Option<EventType> {
        EventType::from_raw(self.event_type)
    }

    /// Wall-clock capture time.
    pub fn timestamp(&self) -> SystemTime {
        let micros = Duration::from_micros(self.time_usec.max(0) as u64);
        if self.time_sec >= 0 {
            UNIX_EPOCH + Duration::from_secs(self.time_sec as u64) + micros
        } else {
            UNIX_EPOCH - Duration::from_secs((self.time_sec as i64).unsigned_abs()) + micros
        }
    }

    /// Whether this is a key press/release/repeat event.
    pub fn is_key_event(&self) -> bool {
        self.event_type == codes::EV_KEY
    }

    /// Whether this event terminates a report batch.
    pub fn is_syn_report(&self) -> bool {
        self.event_type == codes::EV_SYN && self.code == codes::SYN_REPORT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_size_matches_platform_long_width() {
        #[cfg(target_pointer_width = "64")]
        assert_eq!(EVENT_SIZE, 24);
        #[cfg(target_pointer_width = "32")]
        assert_eq!(EVENT_SIZE, 16);
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let samples = [
            InputEvent::new(1000, 500, codes::EV_KEY, 30, 1),
            InputEvent::new(0, 0, codes::EV_SYN, codes::SYN_REPORT, 0),
            InputEvent::new(-1, 999_999, codes::EV_REL, 1, -120),
            InputEvent::new(libc::time_t::MAX, 0, u16::MAX, u16::MAX, i32::MIN),
        ];
        for event in samples {
            let decoded = InputEvent::from_ne_bytes(&event.to_ne_bytes());
            assert_eq!(decoded, event);
        }
    }

    #[test]
    fn test_decode_known_key_record() {
        // Hand-built record: second 1000, microsecond 500, EV_KEY, KEY_A, press.
        let mut buf = [0u8; EVENT_SIZE];
        let mut at = 0;
        put(&mut buf, &mut at, &(1000 as libc::time_t).to_ne_bytes());
        put(&mut buf, &mut at, &(500 as libc::suseconds_t).to_ne_bytes());
        put(&mut buf, &mut at, &1u16.to_ne_bytes());
        put(&mut buf, &mut at, &30u16.to_ne_bytes());
        put(&mut buf, &mut at, &1i32.to_ne_bytes());

        let event = InputEvent::from_ne_bytes(&buf);
        assert_eq!(event.time_sec, 1000);
        assert_eq!(event.time_usec, 500);
        assert_eq!(event.event_type, 1);
        assert_eq!(event.code, 30);
        assert_eq!(event.value, 1);
        assert!(event.is_key_event());
        assert_eq!(event.kind(), Some(EventType::Key));
    }

    #[test]
    fn test_unknown_type_passes_through_undecoded() {
        let event = InputEvent::new(1, 2, 0x1f, 0x123, 7);
        assert_eq!(event.kind(), None);
        let decoded = InputEvent::from_ne_bytes(&event.to_ne_bytes());
        assert_eq!(decoded.event_type, 0x1f);
        assert_eq!(decoded.code, 0x123);
    }

    #[test]
    fn test_syn_report_detection() {
        assert!(InputEvent::new(0, 0, codes::EV_SYN, codes::SYN_REPORT, 0).is_syn_report());
        assert!(!InputEvent::new(0, 0, codes::EV_SYN, codes::SYN_DROPPED, 0).is_syn_report());
        assert!(!InputEvent::new(0, 0, codes::EV_KEY, codes::SYN_REPORT, 0).is_syn_report());
    }

    #[test]
    fn test_timestamp_places_event_after_epoch() {
        let event = InputEvent::new(1000, 500, codes::EV_KEY, 30, 1);
        let expected = UNIX_EPOCH + Duration::new(1000, 500_000);
        assert_eq!(event.timestamp(), expected);
    }
}
