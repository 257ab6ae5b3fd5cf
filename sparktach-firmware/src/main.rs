//! Sparktach - Ignition Timing Firmware
//!
//! Main firmware binary for RP2040 boards. Measures crank speed from a
//! once-per-revolution pickup, derives the spark advance from the coil
//! sense input, and streams both to a network bridge over UART.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use sparktach_core::config::{EngineConfig, StaticAdvance, DEFAULT_STALL_TIMEOUT_MS};
use sparktach_core::timing::{SharedEngine, TimingEngine, MIN_INTERVAL_US};
use sparktach_hal_rp2040::edge::sensor_input;
use sparktach_hal_rp2040::flash::FlashStorage;
use sparktach_hal_rp2040::pin_bank;

use crate::config::settings::load_static_advance;
use crate::tasks::edges::trigger_for;

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// Timing engine shared by the edge tasks and the thread-mode tasks
///
/// Replaced with the configured engine at boot, before any edge task runs.
pub static ENGINE: SharedEngine = SharedEngine::new(TimingEngine::new(
    MIN_INTERVAL_US,
    MIN_INTERVAL_US,
    DEFAULT_STALL_TIMEOUT_MS * 1_000,
    StaticAdvance::DEFAULT,
));

/// Executor for the edge tasks, preempting thread mode
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Sparktach firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let mut config = config::load_engine_config();

    // Persisted static advance wins over engine.toml
    let mut storage = FlashStorage::new(p.FLASH, p.DMA_CH0);
    if let Some(static_advance) = load_static_advance(&mut storage).await {
        config.static_advance = static_advance;
    }
    info!(
        "Engine config: pickup gpio{} {:?}, spark gpio{} {:?}, static advance {}°",
        config.pickup.pin,
        config.pickup.polarity,
        config.spark.pin,
        config.spark.polarity,
        config.static_advance.degrees()
    );

    ENGINE.reset(TimingEngine::from_config(&config));

    // UART0 (GPIO0/GPIO1) is the bridge link, so those pins stay out of the bank
    let mut bank = pin_bank!(p;
        2 => PIN_2, 3 => PIN_3, 4 => PIN_4, 5 => PIN_5, 6 => PIN_6, 7 => PIN_7,
        8 => PIN_8, 9 => PIN_9, 10 => PIN_10, 11 => PIN_11, 12 => PIN_12,
        13 => PIN_13, 14 => PIN_14, 15 => PIN_15, 16 => PIN_16, 17 => PIN_17,
        18 => PIN_18, 19 => PIN_19, 20 => PIN_20, 21 => PIN_21, 22 => PIN_22,
        26 => PIN_26, 27 => PIN_27, 28 => PIN_28,
    );

    if !bank.is_available(config.pickup.pin) || !bank.is_available(config.spark.pin) {
        let defaults = EngineConfig::default();
        warn!(
            "Sensor pins gpio{}/gpio{} unavailable, using gpio{}/gpio{}",
            config.pickup.pin, config.spark.pin, defaults.pickup.pin, defaults.spark.pin
        );
        config.pickup.pin = defaults.pickup.pin;
        config.spark.pin = defaults.spark.pin;
    }

    let pickup = sensor_input(
        unwrap!(bank.take(config.pickup.pin)),
        config.pickup.pull_up,
        trigger_for(config.pickup.polarity),
    );
    let spark = sensor_input(
        unwrap!(bank.take(config.spark.pin)),
        config.spark.pull_up,
        trigger_for(config.spark.polarity),
    );
    info!("Sensor inputs initialized");

    // Setup UART for the bridge link
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.telemetry.baud;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 64]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    info!("UART initialized at {} baud", config.telemetry.baud);

    // Edge tasks on the high-priority executor
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high_spawner.spawn(tasks::pickup_edge_task(pickup)).unwrap();
    high_spawner.spawn(tasks::spark_edge_task(spark)).unwrap();

    let publisher_config = tasks::PublisherConfig {
        interval_us: config.telemetry_interval_us(),
        stall_timeout_us: config.stall_timeout_us(),
    };

    spawner.spawn(tasks::publisher_task(publisher_config)).unwrap();
    spawner.spawn(tasks::link_rx_task(rx)).unwrap();
    spawner.spawn(tasks::link_tx_task(tx)).unwrap();
    spawner.spawn(tasks::settings_task(storage)).unwrap();

    info!("All tasks spawned, firmware running");
}
