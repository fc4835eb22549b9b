#![cfg_attr(not(test), no_std)]

// Must come first so the other modules see its macros.
pub(crate) mod fmt;

#[cfg(target_os = "none")]
pub mod board;
pub mod config;
#[cfg(target_os = "none")]
pub mod drivers;
pub mod filter;
pub mod ipc;
pub mod link;
pub mod sample;
pub mod tasks;

#[cfg(target_os = "none")]
pub use board::Board;
pub use link::{LinkEvent, LinkState};
pub use sample::SampleReading;
