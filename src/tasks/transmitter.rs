use core::convert::Infallible;

use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{with_timeout, Instant};
use embedded_io_async::Write;

use crate::config::Timings;
use crate::ipc::{PipelineStats, SampleReceiver};
use crate::link::LinkState;
use crate::sample::SampleReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Outcome {
    Sent,
    /// Not connected or transmission not enabled.
    Gated,
    /// Channel lock not acquired within its bounded wait.
    ChannelBusy,
    WriteFailed,
}

/// Queue consumer. Emits one line per reading over the shared channel when
/// the link gate is open.
pub struct Transmitter<'a, M: RawMutex, W> {
    link: &'a LinkState,
    channel: &'a Mutex<M, W>,
    stats: &'a PipelineStats,
    timings: Timings,
}

impl<'a, M: RawMutex, W: Write> Transmitter<'a, M, W> {
    pub fn new(
        link: &'a LinkState,
        channel: &'a Mutex<M, W>,
        stats: &'a PipelineStats,
        timings: Timings,
    ) -> Self {
        Self {
            link,
            channel,
            stats,
            timings,
        }
    }

    /// One transmission attempt. Nothing is retried or kept for later.
    pub async fn forward(&self, reading: &SampleReading) -> Outcome {
        if !self.link.may_transmit() {
            self.stats.record_gated();
            return Outcome::Gated;
        }

        let Ok(mut channel) = with_timeout(self.timings.channel_lock_timeout, self.channel.lock()).await
        else {
            trace!("Channel busy, skipping reading t={}", reading.timestamp);
            self.stats.record_channel_busy();
            return Outcome::ChannelBusy;
        };

        let line = reading.to_line();
        match channel.write_all(line.as_bytes()).await {
            Ok(()) => {
                self.stats.record_sent();
                Outcome::Sent
            }
            Err(_) => {
                debug!("Serial write failed, skipping reading t={}", reading.timestamp);
                self.stats.record_write_failed();
                Outcome::WriteFailed
            }
        }
    }

    pub async fn run(&self, queue: SampleReceiver<'_, M>) -> Infallible {
        info!("Transmitter started");
        let mut last_report = Instant::now();

        loop {
            // The bounded receive keeps the loop turning with an empty queue.
            if let Ok(reading) = with_timeout(self.timings.dequeue_timeout, queue.receive()).await {
                self.forward(&reading).await;
            }

            if last_report.elapsed() >= self.timings.stats_interval {
                let s = self.stats.snapshot();
                info!(
                    "Pipeline: produced={} dropped={} sent={} gated={} busy={} write_failed={}",
                    s.produced,
                    s.dropped,
                    s.sent,
                    s.gated,
                    s.channel_busy,
                    s.write_failed
                );
                last_report = Instant::now();
            }

            yield_now().await;
        }
    }
}
