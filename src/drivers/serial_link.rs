//! HC-05 class serial Bluetooth module on USART1.
//!
//! The module bridges the SPP link to the UART transparently. Its STATE pin
//! is high while a client is connected.

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::mode::Async;
use embassy_stm32::usart::{RingBufferedUartRx, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

/// Outbound half, shared through a mutex by everything that writes lines.
pub type SerialChannel = Mutex<CriticalSectionRawMutex, UartTx<'static, Async>>;

pub struct SerialLink {
    pub tx: UartTx<'static, Async>,
    pub rx: RingBufferedUartRx<'static>,
    pub state: ExtiInput<'static>,
}
