use embassy_stm32::adc::{Adc, AdcChannel, SampleTime};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::usart::{Config as UsartConfig, ConfigError, Uart};
use embassy_stm32::{
    bind_interrupts,
    gpio::{Input, Level, Output, Pull, Speed},
    peripherals, rcc, usart, Config,
};

use crate::config::SERIAL_BAUDRATE;
use crate::drivers::{AnalogFrontend, SerialLink, StatusLed};

// ── IRQ table ─────────────────────────────────────────────
bind_interrupts!(pub struct Irqs {
    USART1 => usart::InterruptHandler<peripherals::USART1>;
});

static mut LINK_RX_DMA_BUF: [u8; 256] = [0; 256];

#[derive(Debug, defmt::Format)]
pub enum BoardError {
    Uart(ConfigError),
}

impl From<ConfigError> for BoardError {
    fn from(e: ConfigError) -> Self {
        Self::Uart(e)
    }
}

// ── Board struct ──────────────────────────────────────────
pub struct Board {
    pub frontend: AnalogFrontend,
    pub status_led: StatusLed,
    pub serial: SerialLink,
}

impl Board {
    /// Bring up clocks and pins. A failed serial link hands the status LED
    /// back so the caller can signal the fault.
    pub fn init() -> Result<Self, (StatusLed, BoardError)> {
        let mut config = Config::default();

        // HSI -> PLL -> 64MHz
        config.rcc.hsi = Some(rcc::Hsi {
            sys_div: rcc::HsiSysDiv::DIV1,
        });
        config.rcc.pll = Some(rcc::Pll {
            source: rcc::PllSource::HSI,    // 16MHz
            prediv: rcc::PllPreDiv::DIV2,   // 16MHz / 2 = 8MHz
            mul: rcc::PllMul::MUL16,        // 8MHz * 16 = 128MHz
            divp: None,
            divq: None,
            divr: Some(rcc::PllRDiv::DIV2), // 128MHz / 2 = 64MHz
        });
        config.rcc.sys = rcc::Sysclk::PLL1_R;
        let p = embassy_stm32::init(config);

        // Nucleo LD4
        let status_led = StatusLed::new(Output::new(p.PA5, Level::Low, Speed::Low));

        // ECG on PA0, PPG on PA1
        let mut adc = Adc::new(p.ADC1);
        adc.set_sample_time(SampleTime::CYCLES79_5);
        let ecg = p.PA0.degrade_adc();
        let ppg = p.PA1.degrade_adc();

        // Comparator outputs, driven push-pull by the analog board
        let r_peak = Input::new(p.PB0, Pull::None);
        let pulse_valley = Input::new(p.PB1, Pull::None);

        let frontend = AnalogFrontend::new(adc, ecg, ppg, r_peak, pulse_valley);

        let mut us_cfg = UsartConfig::default();
        us_cfg.baudrate = SERIAL_BAUDRATE;
        us_cfg.rx_pull = Pull::Up;

        let uart = match Uart::new(p.USART1, p.PC5, p.PC4, Irqs, p.DMA1_CH2, p.DMA1_CH3, us_cfg) {
            Ok(uart) => uart,
            Err(e) => return Err((status_led, e.into())),
        };
        let (tx, rx) = uart.split();

        // DMA-circular RX driver
        #[allow(static_mut_refs)]
        let rx = rx.into_ring_buffered(unsafe { &mut LINK_RX_DMA_BUF });

        // Module STATE pin, high while connected
        let state = ExtiInput::new(p.PB2, p.EXTI2, Pull::Down);

        Ok(Self {
            frontend,
            status_led,
            serial: SerialLink { tx, rx, state },
        })
    }
}
