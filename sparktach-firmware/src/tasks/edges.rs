//! Sensor edge tasks
//!
//! Both tasks run on the high-priority interrupt executor, so each edge
//! preempts the thread-mode tasks and is stamped within a few microseconds
//! of the GPIO interrupt. They only stamp and record: no logging, no
//! channels, no waiting on anything but the pin.

use embassy_time::Instant;

use sparktach_core::config::EdgePolarity;
use sparktach_core::timing::Micros;
use sparktach_hal_rp2040::edge::SensorInput;
use sparktach_hal_rp2040::{EdgeInput, EdgeTrigger};

use crate::ENGINE;

/// Map the configured polarity onto the HAL trigger
pub fn trigger_for(polarity: EdgePolarity) -> EdgeTrigger {
    match polarity {
        EdgePolarity::Rising => EdgeTrigger::Rising,
        EdgePolarity::Falling => EdgeTrigger::Falling,
        EdgePolarity::Both => EdgeTrigger::Both,
    }
}

fn now() -> Micros {
    Micros::from_uptime(Instant::now().as_micros())
}

/// Crank pickup edges
#[embassy_executor::task]
pub async fn pickup_edge_task(mut input: SensorInput) {
    loop {
        if input.wait_for_edge().await.is_ok() {
            ENGINE.on_pickup_edge(now());
        }
    }
}

/// Spark edges
#[embassy_executor::task]
pub async fn spark_edge_task(mut input: SensorInput) {
    loop {
        if input.wait_for_edge().await.is_ok() {
            ENGINE.on_spark_edge(now());
        }
    }
}
