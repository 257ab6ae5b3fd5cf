//! Settings persistence task
//!
//! Owns the flash storage and writes each accepted static advance. The link
//! task only signals, so a slow flash write never delays a reply.

use defmt::*;

use sparktach_hal_rp2040::flash::FlashStorage;

use crate::channels::SETTINGS_SAVE;
use crate::config::settings::save_static_advance;

#[embassy_executor::task]
pub async fn settings_task(mut storage: FlashStorage<'static>) {
    info!("Settings task started");

    loop {
        let static_advance = SETTINGS_SAVE.wait().await;

        match save_static_advance(&mut storage, static_advance).await {
            Ok(()) => info!("Saved static advance {}°", static_advance.degrees()),
            Err(e) => error!("Failed to save static advance: {:?}", e),
        }
    }
}
