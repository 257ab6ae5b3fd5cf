//! Link UART transmit task
//!
//! Sends telemetry and command replies to the network bridge.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use sparktach_protocol::{LinkMessage, Telemetry, MAX_FRAME_SIZE};

use crate::channels::{REPLY_CHANNEL, TELEMETRY_CHANNEL};

#[embassy_executor::task]
pub async fn link_tx_task(mut tx: BufferedUartTx) {
    info!("Link TX task started");

    loop {
        let msg = match select(REPLY_CHANNEL.receive(), TELEMETRY_CHANNEL.receive()).await {
            Either::First(reply) => reply,
            Either::Second(sample) => {
                LinkMessage::Telemetry(Telemetry::new(sample.speed_rpm, sample.advance_deg))
            }
        };

        send_message(&mut tx, msg).await;
    }
}

async fn send_message(tx: &mut BufferedUartTx, msg: LinkMessage) {
    let frame = match msg.to_frame() {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Failed to build frame for {:?}: {:?}", msg, e);
            return;
        }
    };

    let mut buf = [0u8; MAX_FRAME_SIZE];
    match frame.encode(&mut buf) {
        Ok(len) => {
            if let Err(e) = tx.write_all(&buf[..len]).await {
                warn!("UART write error: {:?}", e);
            }
        }
        Err(e) => warn!("Failed to encode frame: {:?}", e),
    }
}
