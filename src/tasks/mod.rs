#[cfg(target_os = "none")]
pub mod link_monitor;
pub mod sampler;
pub mod supervisor;
pub mod transmitter;

pub use sampler::{enqueue, Enqueued, Sampler, SignalFrontend};
pub use supervisor::Supervisor;
pub use transmitter::{Outcome, Transmitter};
