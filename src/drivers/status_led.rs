use core::convert::Infallible;

use embassy_stm32::gpio::Output;
use embassy_time::{Duration, Timer};

use crate::config::FAULT_BLINK_MS;
use crate::link::LinkIndicator;

/// On while a client is connected.
pub struct StatusLed {
    pin: Output<'static>,
}

impl StatusLed {
    pub fn new(pin: Output<'static>) -> Self {
        Self { pin }
    }

    /// Startup fault signal. Never returns.
    pub async fn blink_forever(mut self) -> Infallible {
        loop {
            self.pin.toggle();
            Timer::after(Duration::from_millis(FAULT_BLINK_MS)).await;
        }
    }
}

impl LinkIndicator for StatusLed {
    fn show(&mut self, connected: bool) {
        if connected {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }
}
