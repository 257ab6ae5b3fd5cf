//! Config-driven GPIO allocation
//!
//! Sensor pin numbers come from `engine.toml`, so pins are handed out by
//! number at boot instead of by peripheral name.

use embassy_rp::gpio::AnyPin;
use embassy_rp::Peri;

/// Number of user GPIOs on the RP2040
pub const GPIO_COUNT: usize = 30;

/// Build a [`PinBank`] from the listed peripherals
///
/// Usage:
/// ```ignore
/// let mut bank = pin_bank!(p; 2 => PIN_2, 3 => PIN_3, 13 => PIN_13);
/// ```
#[macro_export]
macro_rules! pin_bank {
    ($p:expr; $($num:literal => $pin:ident),* $(,)?) => {{
        let mut pins: [Option<embassy_rp::Peri<'static, embassy_rp::gpio::AnyPin>>;
            $crate::pins::GPIO_COUNT] = [const { None }; $crate::pins::GPIO_COUNT];
        $( pins[$num] = Some(embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.$pin)); )*
        $crate::pins::PinBank::new(pins)
    }};
}

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken or never placed in the bank
    Unavailable,
}

/// GPIO pins available for config-driven assignment
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
}

impl PinBank {
    /// Bank over the pins the board leaves free, indexed by GPIO number
    pub fn new(pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT]) -> Self {
        Self { pins }
    }

    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        self.pins
            .get_mut(pin_num as usize)
            .ok_or(PinError::InvalidPin)?
            .take()
            .ok_or(PinError::Unavailable)
    }

    /// Check if a pin is available
    pub fn is_available(&self, pin_num: u8) -> bool {
        matches!(self.pins.get(pin_num as usize), Some(Some(_)))
    }
}
