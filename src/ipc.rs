use embassy_sync::channel::{Channel, Receiver, Sender};
use portable_atomic::{AtomicU32, Ordering};

use crate::config::{LINK_EVENT_DEPTH, SAMPLE_QUEUE_DEPTH};
use crate::link::LinkEvent;
use crate::sample::SampleReading;

// sampler -> transmitter, single producer / single consumer
pub type SampleQueue<M> = Channel<M, SampleReading, SAMPLE_QUEUE_DEPTH>;
pub type SampleSender<'a, M> = Sender<'a, M, SampleReading, SAMPLE_QUEUE_DEPTH>;
pub type SampleReceiver<'a, M> = Receiver<'a, M, SampleReading, SAMPLE_QUEUE_DEPTH>;

// transport -> link event handler
pub type LinkEvents<M> = Channel<M, LinkEvent, LINK_EVENT_DEPTH>;
pub type LinkEventSender<'a, M> = Sender<'a, M, LinkEvent, LINK_EVENT_DEPTH>;
pub type LinkEventReceiver<'a, M> = Receiver<'a, M, LinkEvent, LINK_EVENT_DEPTH>;

/// Pipeline counters. Observability only, nothing reads them to decide.
pub struct PipelineStats {
    produced: AtomicU32,
    dropped: AtomicU32,
    sent: AtomicU32,
    gated: AtomicU32,
    channel_busy: AtomicU32,
    write_failed: AtomicU32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct StatsSnapshot {
    pub produced: u32,
    pub dropped: u32,
    pub sent: u32,
    pub gated: u32,
    pub channel_busy: u32,
    pub write_failed: u32,
}

impl PipelineStats {
    pub const fn new() -> Self {
        Self {
            produced: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            sent: AtomicU32::new(0),
            gated: AtomicU32::new(0),
            channel_busy: AtomicU32::new(0),
            write_failed: AtomicU32::new(0),
        }
    }

    pub fn record_produced(&self) {
        self.produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gated(&self) {
        self.gated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_channel_busy(&self) {
        self.channel_busy.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failed(&self) {
        self.write_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            produced: self.produced.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            gated: self.gated.load(Ordering::Relaxed),
            channel_busy: self.channel_busy.load(Ordering::Relaxed),
            write_failed: self.write_failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    fn reading(timestamp: u64) -> SampleReading {
        SampleReading {
            ecg: timestamp as i32,
            ppg: -(timestamp as i32),
            is_r_peak: timestamp % 3 == 0,
            is_pulse_valley: timestamp % 5 == 0,
            timestamp,
        }
    }

    #[test]
    fn queue_preserves_production_order() {
        let queue = SampleQueue::<CriticalSectionRawMutex>::new();
        let produced: Vec<SampleReading> = (0..SAMPLE_QUEUE_DEPTH as u64).map(reading).collect();

        for r in &produced {
            assert!(queue.try_send(*r).is_ok());
        }
        let received: Vec<SampleReading> =
            core::iter::from_fn(|| queue.try_receive().ok()).collect();

        assert_eq!(received, produced);
    }

    #[test]
    fn queue_capacity_is_fixed() {
        let queue = SampleQueue::<CriticalSectionRawMutex>::new();
        for t in 0..SAMPLE_QUEUE_DEPTH as u64 {
            queue.try_send(reading(t)).unwrap();
        }
        assert!(queue.is_full());
        assert!(queue.try_send(reading(999)).is_err());
        // Oldest stays at the head; the rejected newest is gone.
        assert_eq!(queue.try_receive().unwrap().timestamp, 0);
    }

    #[test]
    fn stats_snapshot_reflects_records() {
        let stats = PipelineStats::new();
        stats.record_produced();
        stats.record_produced();
        stats.record_dropped();
        stats.record_sent();
        stats.record_gated();
        stats.record_channel_busy();
        stats.record_write_failed();
        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                produced: 2,
                dropped: 1,
                sent: 1,
                gated: 1,
                channel_busy: 1,
                write_failed: 1,
            }
        );
    }
}
