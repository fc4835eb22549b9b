pub mod frontend;
pub mod serial_link;
pub mod status_led;

pub use frontend::AnalogFrontend;
pub use serial_link::{SerialChannel, SerialLink};
pub use status_led::StatusLed;
