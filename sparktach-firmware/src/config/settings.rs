//! Static advance persistence

use defmt::*;

use sparktach_core::config::{
    PersistedSettings, SettingsError, StaticAdvance, MAX_SETTINGS_SIZE,
};
use sparktach_hal_rp2040::flash::{FlashError, FlashStorage};
use sparktach_hal_rp2040::{FlashStorageTrait, StorageKey};

/// Errors from loading or saving the settings record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum SettingsStoreError {
    /// Flash or storage layer failed
    Flash(FlashError),
    /// Record did not encode or decode
    Settings(SettingsError),
}

impl From<FlashError> for SettingsStoreError {
    fn from(e: FlashError) -> Self {
        SettingsStoreError::Flash(e)
    }
}

impl From<SettingsError> for SettingsStoreError {
    fn from(e: SettingsError) -> Self {
        SettingsStoreError::Settings(e)
    }
}

/// Load the persisted static advance
///
/// Returns `None` when nothing valid is stored. A corrupt storage map is
/// erased so the next save starts from a clean partition.
pub async fn load_static_advance(storage: &mut FlashStorage<'_>) -> Option<StaticAdvance> {
    match load_inner(storage).await {
        Ok(settings) => {
            info!(
                "Loaded static advance from flash: {}°",
                settings.static_advance.degrees()
            );
            Some(settings.static_advance)
        }
        Err(SettingsStoreError::Flash(FlashError::NotFound)) => {
            debug!("No settings in flash, using configured static advance");
            None
        }
        Err(SettingsStoreError::Flash(FlashError::Storage)) => {
            warn!("Settings partition corrupt, erasing");
            if let Err(e) = storage.erase_all().await {
                error!("Failed to erase settings partition: {:?}", e);
            }
            None
        }
        Err(e) => {
            warn!("Failed to load settings: {:?}, using configured static advance", e);
            None
        }
    }
}

async fn load_inner(
    storage: &mut FlashStorage<'_>,
) -> Result<PersistedSettings, SettingsStoreError> {
    let mut buf = [0u8; MAX_SETTINGS_SIZE];
    let len = storage.read(StorageKey::StaticAdvance, &mut buf).await?;
    Ok(PersistedSettings::decode(&buf[..len])?)
}

/// Write the static advance to flash, replacing the previous record
pub async fn save_static_advance(
    storage: &mut FlashStorage<'_>,
    static_advance: StaticAdvance,
) -> Result<(), SettingsStoreError> {
    let mut buf = [0u8; MAX_SETTINGS_SIZE];
    let bytes = PersistedSettings::new(static_advance).encode(&mut buf)?;
    storage.write(StorageKey::StaticAdvance, bytes).await?;
    Ok(())
}
