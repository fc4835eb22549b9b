use embassy_stm32::adc::{Adc, AnyAdcChannel};
use embassy_stm32::gpio::Input;
use embassy_stm32::peripherals::ADC1;

use crate::tasks::SignalFrontend;

/// ECG/PPG analog frontend on ADC1 plus the two hysteresis comparator lines.
pub struct AnalogFrontend {
    adc: Adc<'static, ADC1>,
    ecg: AnyAdcChannel<ADC1>,
    ppg: AnyAdcChannel<ADC1>,
    r_peak: Input<'static>,
    pulse_valley: Input<'static>,
}

impl AnalogFrontend {
    pub fn new(
        adc: Adc<'static, ADC1>,
        ecg: AnyAdcChannel<ADC1>,
        ppg: AnyAdcChannel<ADC1>,
        r_peak: Input<'static>,
        pulse_valley: Input<'static>,
    ) -> Self {
        Self {
            adc,
            ecg,
            ppg,
            r_peak,
            pulse_valley,
        }
    }
}

impl SignalFrontend for AnalogFrontend {
    fn read_ecg(&mut self) -> i32 {
        i32::from(self.adc.blocking_read(&mut self.ecg))
    }

    fn read_ppg(&mut self) -> i32 {
        i32::from(self.adc.blocking_read(&mut self.ppg))
    }

    // Comparator outputs are debounced in hardware, read them as-is.
    fn r_peak(&mut self) -> bool {
        self.r_peak.is_high()
    }

    fn pulse_valley(&mut self) -> bool {
        self.pulse_valley.is_high()
    }
}
