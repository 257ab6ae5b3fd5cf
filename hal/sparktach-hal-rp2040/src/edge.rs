//! Edge-triggered sensor inputs on RP2040 GPIO

use embassy_rp::gpio::{AnyPin, Input, Pull};
use embassy_rp::Peri;
use sparktach_hal::edge::{EdgeTrigger, TriggeredInput};

/// Sensor input on an RP2040 pin
pub type SensorInput = TriggeredInput<Input<'static>>;

/// Configure a GPIO as a sensor input
///
/// The Schmitt trigger is always enabled; the edge filter in the timing
/// engine handles whatever ringing gets through.
pub fn sensor_input(pin: Peri<'static, AnyPin>, pull_up: bool, trigger: EdgeTrigger) -> SensorInput {
    let pull = if pull_up { Pull::Up } else { Pull::None };
    let mut input = Input::new(pin, pull);
    input.set_schmitt(true);
    TriggeredInput::new(input, trigger)
}
