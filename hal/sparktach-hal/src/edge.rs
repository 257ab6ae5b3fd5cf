//! Edge-triggered digital inputs
//!
//! Sensor inputs are configured with a trigger polarity. [`TriggeredInput`]
//! wraps any `embedded-hal-async` [`Wait`] pin and resolves once per
//! matching transition.

use embedded_hal::digital::ErrorType;
use embedded_hal_async::digital::Wait;

/// Transition that counts as an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeTrigger {
    /// Low to high
    Rising,
    /// High to low
    Falling,
    /// Either direction
    Both,
}

/// An input that can wait for its configured edge
pub trait EdgeInput {
    /// Error from the underlying pin
    type Error;

    /// Resolve on the next configured transition
    fn wait_for_edge(&mut self) -> impl core::future::Future<Output = Result<(), Self::Error>>;
}

/// A [`Wait`] pin paired with its trigger polarity
pub struct TriggeredInput<P> {
    pin: P,
    trigger: EdgeTrigger,
}

impl<P> TriggeredInput<P> {
    /// Wrap `pin`, waiting for `trigger` transitions
    pub fn new(pin: P, trigger: EdgeTrigger) -> Self {
        Self { pin, trigger }
    }
}

impl<P: Wait + ErrorType> EdgeInput for TriggeredInput<P> {
    type Error = P::Error;

    async fn wait_for_edge(&mut self) -> Result<(), Self::Error> {
        match self.trigger {
            EdgeTrigger::Rising => self.pin.wait_for_rising_edge().await,
            EdgeTrigger::Falling => self.pin.wait_for_falling_edge().await,
            EdgeTrigger::Both => self.pin.wait_for_any_edge().await,
        }
    }
}
