//! Persisted settings record
//!
//! The static advance is the only value that survives a power cycle. It is
//! stored as a small postcard record with a magic number and a version so
//! that erased flash or an older layout is detected instead of misread.

use serde::{Deserialize, Serialize};

use super::types::StaticAdvance;

/// Magic number identifying a settings record ("SPKT")
pub const SETTINGS_MAGIC: u32 = 0x5350_4B54;

/// Current settings layout version
pub const SETTINGS_VERSION: u8 = 1;

/// Upper bound on the encoded record size
pub const MAX_SETTINGS_SIZE: usize = 16;

/// Settings codec errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Encoding failed (buffer too small)
    Serialize,
    /// Bytes are not a settings record
    Deserialize,
    /// Magic or version mismatch
    InvalidFormat,
    /// Stored static advance is outside 1..=359
    OutOfRange,
}

/// Raw on-flash layout
///
/// The advance is kept as a plain integer here so a corrupted value is
/// reported as [`SettingsError::OutOfRange`] rather than a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct SettingsRecord {
    magic: u32,
    version: u8,
    static_advance: u16,
}

/// Settings restored at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PersistedSettings {
    pub static_advance: StaticAdvance,
}

impl PersistedSettings {
    /// Current-version record holding `static_advance`
    pub const fn new(static_advance: StaticAdvance) -> Self {
        Self { static_advance }
    }

    /// Encode into `buf`, returning the used prefix
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], SettingsError> {
        let record = SettingsRecord {
            magic: SETTINGS_MAGIC,
            version: SETTINGS_VERSION,
            static_advance: self.static_advance.degrees(),
        };
        postcard::to_slice(&record, buf).map_err(|_| SettingsError::Serialize)
    }

    /// Decode and validate a stored record
    pub fn decode(bytes: &[u8]) -> Result<Self, SettingsError> {
        let record: SettingsRecord =
            postcard::from_bytes(bytes).map_err(|_| SettingsError::Deserialize)?;

        if record.magic != SETTINGS_MAGIC || record.version != SETTINGS_VERSION {
            return Err(SettingsError::InvalidFormat);
        }

        let static_advance =
            StaticAdvance::new(record.static_advance as i32).map_err(|_| SettingsError::OutOfRange)?;

        Ok(Self { static_advance })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(magic: u32, version: u8, static_advance: u16) -> ([u8; MAX_SETTINGS_SIZE], usize) {
        let record = SettingsRecord {
            magic,
            version,
            static_advance,
        };
        let mut buf = [0u8; MAX_SETTINGS_SIZE];
        let len = postcard::to_slice(&record, &mut buf).unwrap().len();
        (buf, len)
    }

    #[test]
    fn test_encode_decode() {
        let settings = PersistedSettings::new(StaticAdvance::new(12).unwrap());
        let mut buf = [0u8; MAX_SETTINGS_SIZE];
        let used = settings.encode(&mut buf).unwrap().len();

        assert!(used <= MAX_SETTINGS_SIZE);
        assert_eq!(PersistedSettings::decode(&buf[..used]), Ok(settings));
    }

    #[test]
    fn test_wrong_magic_rejected() {
        let (bytes, len) = raw(0xDEAD_BEEF, SETTINGS_VERSION, 36);
        assert_eq!(PersistedSettings::decode(&bytes[..len]), Err(SettingsError::InvalidFormat));
    }

    #[test]
    fn test_future_version_rejected() {
        let (bytes, len) = raw(SETTINGS_MAGIC, SETTINGS_VERSION + 1, 36);
        assert_eq!(PersistedSettings::decode(&bytes[..len]), Err(SettingsError::InvalidFormat));
    }

    #[test]
    fn test_out_of_range_advance_rejected() {
        let (bytes, len) = raw(SETTINGS_MAGIC, SETTINGS_VERSION, 0);
        assert_eq!(PersistedSettings::decode(&bytes[..len]), Err(SettingsError::OutOfRange));

        let (bytes, len) = raw(SETTINGS_MAGIC, SETTINGS_VERSION, 400);
        assert_eq!(PersistedSettings::decode(&bytes[..len]), Err(SettingsError::OutOfRange));
    }

    #[test]
    fn test_erased_flash_rejected() {
        assert!(PersistedSettings::decode(&[]).is_err());
        assert!(PersistedSettings::decode(&[0xFF; 4]).is_err());
    }

    #[test]
    fn test_small_buffer() {
        let settings = PersistedSettings::new(StaticAdvance::default());
        let mut buf = [0u8; 2];
        assert_eq!(settings.encode(&mut buf), Err(SettingsError::Serialize));
    }
}
