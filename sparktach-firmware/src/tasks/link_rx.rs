//! Link UART receive task
//!
//! Parses control frames from the network bridge and applies them to the
//! timing engine.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use sparktach_protocol::{ControlCommand, FrameParser, LinkMessage};

use crate::channels::{REPLY_CHANNEL, SETTINGS_SAVE};
use crate::ENGINE;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

#[embassy_executor::task]
pub async fn link_rx_task(mut rx: BufferedUartRx) {
    info!("Link RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => match ControlCommand::from_frame(&frame) {
                            Ok(cmd) => handle_command(cmd),
                            Err(e) => warn!("Failed to parse command: {:?}", e),
                        },
                        Ok(None) => {}
                        Err(e) => warn!("Frame parse error: {:?}", e),
                    }
                }
            }
            Ok(_) => {}
            Err(e) => warn!("UART read error: {:?}", e),
        }
    }
}

fn handle_command(cmd: ControlCommand) {
    let reply = match cmd {
        ControlCommand::GetStaticAdvance => {
            LinkMessage::StaticAdvance(ENGINE.snapshot().static_advance.degrees())
        }
        ControlCommand::SetStaticAdvance(value) => {
            match ENGINE.set_static_advance(i32::from(value)) {
                Ok(accepted) => {
                    info!("Static advance set to {}°", accepted.degrees());
                    SETTINGS_SAVE.signal(accepted);
                    LinkMessage::StaticAdvance(accepted.degrees())
                }
                Err(e) => {
                    warn!("Rejected static advance {}: {:?}", value, e);
                    LinkMessage::Rejected(value)
                }
            }
        }
        ControlCommand::Ping => {
            trace!("PING received");
            LinkMessage::Pong
        }
    };

    if REPLY_CHANNEL.try_send(reply).is_err() {
        warn!("Reply channel full, dropping {:?}", reply);
    }
}
