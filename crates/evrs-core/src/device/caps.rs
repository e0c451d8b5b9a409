// Evrs Device Layer - Capability Analysis
// Interpret EVIOCGBIT bitmaps and classify opened devices

use std::collections::HashSet;

/// Decode a kernel capability bitmap into the list of set code numbers.
///
/// EVIOCGBIT fills a byte buffer where bit `n` set means code `n` is
/// supported; byte 0 bit 0 is code 0.
pub fn parse_bitmask(bitmap: &[u8]) -> Vec<u16> {
    let mut codes = Vec::new();
    for (byte_idx, byte) in bitmap.iter().enumerate() {
        if *byte == 0 {
            continue;
        }
        for bit in 0..8 {
            if byte & (1 << bit) != 0 {
                codes.push((byte_idx * 8 + bit) as u16);
            }
        }
    }
    codes
}

/// Key-related capabilities of an opened device.
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// Whether the device emits EV_KEY events at all.
    pub has_ev_key: bool,
    /// Key and button codes the device claims to support.
    pub supported_keys: Vec<u16>,
}

impl DeviceCapabilities {
    pub fn new(has_ev_key: bool, supported_keys: Vec<u16>) -> Self {
        Self {
            has_ev_key,
            supported_keys,
        }
    }

    /// Check if a specific key code is supported
    pub fn supports_key(&self, key_code: u16) -> bool {
        self.supported_keys.contains(&key_code)
    }

    /// Create a HashSet from supported keys for O(1) lookups
    pub fn key_set(&self) -> HashSet<u16> {
        self.supported_keys.iter().copied().collect()
    }
}

// QWERTY row key codes: Q, W, E, R, T, Y
const QWERTY_CODES: &[u16] = &[16, 17, 18, 19, 20, 21];

// Representative A-Z and SPACE codes for keyboard detection
const A_Z_SPACE_CODES: &[u16] = &[57, 30, 44]; // SPACE, A, Z

/// Determine if a device is a keyboard based on its capabilities.
///
/// A device counts as a keyboard if it emits EV_KEY events, the full QWERTY
/// row (Q, W, E, R, T, Y) is present, and the representative A, Z and SPACE
/// codes are present. Mice and gamepads report buttons but fail the
/// letter-row checks.
pub fn is_keyboard(capabilities: &DeviceCapabilities) -> bool {
    if !capabilities.has_ev_key {
        return false;
    }

    let key_set: HashSet<u16> = capabilities.key_set();

    let qwerty_present = QWERTY_CODES.iter().all(|code| key_set.contains(code));
    let az_present = A_Z_SPACE_CODES.iter().all(|code| key_set.contains(code));

    qwerty_present && az_present
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keyboard_caps() -> DeviceCapabilities {
        let mut keys = vec![
            0, // RESERVED
        ];

        keys.extend_from_slice(QWERTY_CODES);
        keys.extend_from_slice(A_Z_SPACE_CODES);

        // Some other common keys
        keys.extend_from_slice(&[2, 3, 4, 5, 6, 7, 8, 9, 10, 11]); // Numbers
        keys.extend_from_slice(&[14, 15, 28, 29, 42, 56]); // BACKSPACE, TAB, ENTER, CTRLs, SHIFT, ALT

        DeviceCapabilities::new(true, keys)
    }

    fn make_mouse_caps() -> DeviceCapabilities {
        // Mouse has BTN_LEFT, BTN_RIGHT but no letter keys
        DeviceCapabilities::new(
            true,
            vec![272, 273, 274], // BTN_LEFT, BTN_RIGHT, BTN_MIDDLE
        )
    }

    #[test]
    fn test_parse_bitmask_single_byte() {
        assert_eq!(parse_bitmask(&[0b0000_0010]), vec![1]);
        assert_eq!(parse_bitmask(&[0b1000_0001]), vec![0, 7]);
    }

    #[test]
    fn test_parse_bitmask_spans_bytes() {
        // Bit 0 of byte 2 is code 16 (KEY_Q).
        assert_eq!(parse_bitmask(&[0, 0, 0b0000_0001]), vec![16]);
        assert_eq!(parse_bitmask(&[0b0000_0010, 0, 0b0011_0000]), vec![1, 20, 21]);
    }

    #[test]
    fn test_parse_bitmask_empty() {
        assert!(parse_bitmask(&[]).is_empty());
        assert!(parse_bitmask(&[0, 0, 0, 0]).is_empty());
    }

    #[test]
    fn test_is_keyboard_with_full_keyboard() {
        let caps = make_keyboard_caps();
        assert!(is_keyboard(&caps));
    }

    #[test]
    fn test_is_keyboard_without_qwerty() {
        // A-Z representatives present but the QWERTY row missing
        let mut keys = vec![0];
        keys.extend_from_slice(A_Z_SPACE_CODES);
        keys.extend_from_slice(&[30, 31, 32, 33, 34, 35]);

        let caps = DeviceCapabilities::new(true, keys);
        assert!(!is_keyboard(&caps));
    }

    #[test]
    fn test_is_keyboard_without_az() {
        let mut keys = vec![0];
        keys.extend_from_slice(QWERTY_CODES);

        let caps = DeviceCapabilities::new(true, keys);
        assert!(!is_keyboard(&caps));
    }

    #[test]
    fn test_is_keyboard_with_no_ev_key() {
        let caps = DeviceCapabilities::new(false, vec![]);
        assert!(!is_keyboard(&caps));
    }

    #[test]
    fn test_is_keyboard_mouse_device() {
        let caps = make_mouse_caps();
        assert!(!is_keyboard(&caps));
    }

    #[test]
    fn test_device_capabilities_supports_key() {
        let caps = DeviceCapabilities::new(true, vec![16, 17, 18, 30, 57]);
        assert!(caps.supports_key(16)); // Q
        assert!(caps.supports_key(30)); // A
        assert!(!caps.supports_key(100)); // Not in list
    }

    #[test]
    fn test_device_capabilities_key_set() {
        let caps = DeviceCapabilities::new(true, vec![16, 17, 18]);
        let set = caps.key_set();
        assert_eq!(set.len(), 3);
        assert!(set.contains(&16));
        assert!(set.contains(&17));
        assert!(set.contains(&18));
    }
}
