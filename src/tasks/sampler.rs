use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{with_timeout, Duration, Instant, Timer};

use crate::config::Timings;
use crate::filter::SmoothingBank;
use crate::ipc::{PipelineStats, SampleSender};
use crate::sample::SampleReading;

/// Analog and digital pin readers. Each call returns one reading and never
/// blocks.
pub trait SignalFrontend {
    fn read_ecg(&mut self) -> i32;
    fn read_ppg(&mut self) -> i32;
    /// Hysteresis line from the ECG R-peak detector.
    fn r_peak(&mut self) -> bool;
    /// Hysteresis line from the PPG valley detector.
    fn pulse_valley(&mut self) -> bool;
}

impl<T: SignalFrontend + ?Sized> SignalFrontend for &mut T {
    fn read_ecg(&mut self) -> i32 {
        (**self).read_ecg()
    }
    fn read_ppg(&mut self) -> i32 {
        (**self).read_ppg()
    }
    fn r_peak(&mut self) -> bool {
        (**self).r_peak()
    }
    fn pulse_valley(&mut self) -> bool {
        (**self).pulse_valley()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Enqueued {
    Queued,
    Dropped,
}

/// Offer a reading to the queue for at most `timeout`; a full queue drops
/// the newest reading.
pub async fn enqueue<M: RawMutex>(
    queue: &SampleSender<'_, M>,
    reading: SampleReading,
    timeout: Duration,
) -> Enqueued {
    match with_timeout(timeout, queue.send(reading)).await {
        Ok(()) => Enqueued::Queued,
        Err(_) => Enqueued::Dropped,
    }
}

/// Periodic producer. Owns its filter bank, so a new sampler starts with
/// zeroed windows.
pub struct Sampler<F> {
    frontend: F,
    filters: SmoothingBank,
}

impl<F: SignalFrontend> Sampler<F> {
    pub fn new(frontend: F) -> Self {
        Self {
            frontend,
            filters: SmoothingBank::new(),
        }
    }

    /// Read, filter and stamp one period's reading.
    pub fn sample(&mut self, timestamp: u64) -> SampleReading {
        let raw_ecg = self.frontend.read_ecg();
        let raw_ppg = self.frontend.read_ppg();
        let (ecg, ppg) = self.filters.smooth(raw_ecg, raw_ppg);

        SampleReading {
            ecg,
            ppg,
            is_r_peak: self.frontend.r_peak(),
            is_pulse_valley: self.frontend.pulse_valley(),
            timestamp,
        }
    }

    pub async fn run<M: RawMutex>(
        &mut self,
        queue: SampleSender<'_, M>,
        stats: &PipelineStats,
        timings: &Timings,
    ) -> Infallible {
        info!(
            "Sampler started - sampling at {}ms intervals",
            timings.sample_period.as_millis()
        );
        let mut next_wake = Instant::now();
        let mut dropped = 0u32;

        loop {
            let reading = self.sample(Instant::now().as_millis());
            stats.record_produced();

            if enqueue(&queue, reading, timings.enqueue_timeout).await == Enqueued::Dropped {
                stats.record_dropped();
                dropped += 1;
                if dropped % 100 == 1 {
                    warn!("Sample queue full, dropped {} readings", dropped);
                }
            }

            // Deadline accumulates from the previous wake, not from `now`.
            next_wake += timings.sample_period;
            Timer::at(next_wake).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::SAMPLE_QUEUE_DEPTH;
    use crate::ipc::SampleQueue;
    use embassy_futures::block_on;
    use embassy_futures::select::{select, Either};
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    /// Ramp on both channels, digital lines toggling on alternating periods.
    #[derive(Default)]
    pub(crate) struct RampFrontend {
        pub period: i32,
    }

    impl SignalFrontend for RampFrontend {
        fn read_ecg(&mut self) -> i32 {
            self.period += 1;
            self.period * 100
        }
        fn read_ppg(&mut self) -> i32 {
            self.period * 10
        }
        fn r_peak(&mut self) -> bool {
            self.period % 2 == 0
        }
        fn pulse_valley(&mut self) -> bool {
            self.period % 2 == 1
        }
    }

    #[test]
    fn sample_smooths_analog_and_passes_digital_raw() {
        let mut sampler = Sampler::new(RampFrontend::default());

        let first = sampler.sample(7);
        assert_eq!(
            first,
            SampleReading {
                ecg: 20,
                ppg: 2,
                is_r_peak: false,
                is_pulse_valley: true,
                timestamp: 7,
            }
        );

        let second = sampler.sample(37);
        // (100 + 200) / 5 and (10 + 20) / 5
        assert_eq!((second.ecg, second.ppg), (60, 6));
        assert!(second.is_r_peak);
        assert!(!second.is_pulse_valley);
    }

    #[test]
    fn full_queue_drops_within_bounded_wait() {
        let queue = SampleQueue::<CriticalSectionRawMutex>::new();
        let sender = queue.sender();
        let mut sampler = Sampler::new(RampFrontend::default());
        for t in 0..SAMPLE_QUEUE_DEPTH as u64 {
            assert_eq!(
                block_on(enqueue(&sender, sampler.sample(t), Duration::from_millis(10))),
                Enqueued::Queued
            );
        }

        let start = Instant::now();
        let outcome = block_on(enqueue(&sender, sampler.sample(999), Duration::from_millis(10)));
        let waited = start.elapsed();

        assert_eq!(outcome, Enqueued::Dropped);
        assert!(waited >= Duration::from_millis(10));
        assert!(waited < Duration::from_secs(1));
        assert_eq!(queue.len(), SAMPLE_QUEUE_DEPTH);
        assert_eq!(queue.try_receive().unwrap().timestamp, 0);
    }

    #[test]
    fn run_produces_periodic_non_decreasing_readings() {
        let queue = SampleQueue::<CriticalSectionRawMutex>::new();
        let stats = PipelineStats::new();
        let timings = Timings {
            sample_period: Duration::from_millis(5),
            ..Timings::DEFAULT
        };
        let mut sampler = Sampler::new(RampFrontend::default());

        let outcome = block_on(select(
            sampler.run(queue.sender(), &stats, &timings),
            Timer::after(Duration::from_millis(100)),
        ));
        assert!(matches!(outcome, Either::Second(())));

        let readings: Vec<SampleReading> =
            core::iter::from_fn(|| queue.try_receive().ok()).collect();
        assert!(readings.len() >= 5, "only {} readings", readings.len());
        assert!(readings.len() <= 25, "{} readings", readings.len());
        assert!(readings.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(stats.snapshot().produced as usize, readings.len());
        assert_eq!(stats.snapshot().dropped, 0);
        // First period goes through a fresh filter.
        assert_eq!(readings[0].ecg, 20);
    }

    /// Blocks inside every ECG read, like a slow ADC conversion.
    struct SlowFrontend {
        inner: RampFrontend,
        read_time: std::time::Duration,
    }

    impl SignalFrontend for SlowFrontend {
        fn read_ecg(&mut self) -> i32 {
            std::thread::sleep(self.read_time);
            self.inner.read_ecg()
        }
        fn read_ppg(&mut self) -> i32 {
            self.inner.read_ppg()
        }
        fn r_peak(&mut self) -> bool {
            self.inner.r_peak()
        }
        fn pulse_valley(&mut self) -> bool {
            self.inner.pulse_valley()
        }
    }

    #[test]
    fn slow_reads_do_not_stretch_the_period() {
        const PERIOD_MS: u64 = 10;
        const PERIODS: u64 = 20;

        let queue = SampleQueue::<CriticalSectionRawMutex>::new();
        let stats = PipelineStats::new();
        let timings = Timings {
            sample_period: Duration::from_millis(PERIOD_MS),
            ..Timings::DEFAULT
        };
        let mut sampler = Sampler::new(SlowFrontend {
            inner: RampFrontend::default(),
            read_time: std::time::Duration::from_millis(4),
        });

        block_on(select(
            sampler.run(queue.sender(), &stats, &timings),
            Timer::after(Duration::from_millis(PERIOD_MS * PERIODS)),
        ));

        let stamps: Vec<u64> = core::iter::from_fn(|| queue.try_receive().ok())
            .map(|r| r.timestamp)
            .collect();
        let count = stamps.len() as u64;
        // Sleeping after each read would give about 14 readings here.
        assert!(
            (PERIODS - 1..=PERIODS + 1).contains(&count),
            "{} readings in {} periods",
            count,
            PERIODS
        );

        // Reading k is stamped at start + k periods, without accumulated lag.
        let first = stamps[0];
        for (k, stamp) in stamps.iter().enumerate() {
            let due = first + k as u64 * PERIOD_MS;
            assert!(*stamp >= due, "reading {} early: {} < {}", k, stamp, due);
            assert!(*stamp < due + PERIOD_MS, "reading {} late: {} vs {}", k, stamp, due);
        }
        for w in stamps.windows(2) {
            assert!(w[1] - w[0] <= 2 * PERIOD_MS, "gap {}", w[1] - w[0]);
        }
    }
}
