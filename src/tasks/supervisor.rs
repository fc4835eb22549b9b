//! Session supervisor: recovery from link loss by reinitialization.
//!
//! A session owns the sample queue, the sampler (and with it the filter
//! windows) and runs sampler, transmitter and link handler side by side. A
//! disconnect ends the session, which tears all of them down; after the
//! settle delay the link state is reset and a fresh session starts. Nothing
//! is repaired in place.

use core::convert::Infallible;

use embassy_futures::select::{select3, Either3};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Timer;
use embedded_io_async::Write;

use crate::config::Timings;
use crate::ipc::{LinkEventReceiver, PipelineStats, SampleQueue, StatsSnapshot};
use crate::link::{LinkEventHandler, LinkIndicator, LinkSnapshot, LinkState};
use crate::tasks::{Sampler, SignalFrontend, Transmitter};

pub struct Supervisor<'a, M: RawMutex, F, I, W> {
    frontend: F,
    indicator: I,
    channel: &'a Mutex<M, W>,
    events: LinkEventReceiver<'a, M>,
    link: LinkState,
    stats: PipelineStats,
    timings: Timings,
    sessions: u32,
}

impl<'a, M, F, I, W> Supervisor<'a, M, F, I, W>
where
    M: RawMutex,
    F: SignalFrontend,
    I: LinkIndicator,
    W: Write,
{
    pub fn new(
        frontend: F,
        indicator: I,
        channel: &'a Mutex<M, W>,
        events: LinkEventReceiver<'a, M>,
        timings: Timings,
    ) -> Self {
        Self {
            frontend,
            indicator,
            channel,
            events,
            link: LinkState::new(),
            stats: PipelineStats::new(),
            timings,
            sessions: 0,
        }
    }

    pub fn link(&self) -> LinkSnapshot {
        self.link.snapshot()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Sessions started so far.
    pub fn sessions(&self) -> u32 {
        self.sessions
    }

    /// Run one session until the link is lost.
    pub async fn run_session(&mut self) {
        self.sessions += 1;
        info!("Session {} started, waiting for connection", self.sessions);

        let queue = SampleQueue::<M>::new();
        let mut sampler = Sampler::new(&mut self.frontend);
        let transmitter = Transmitter::new(&self.link, self.channel, &self.stats, self.timings);
        let mut handler = LinkEventHandler::new(&self.link, &mut self.indicator);

        match select3(
            sampler.run(queue.sender(), &self.stats, &self.timings),
            transmitter.run(queue.receiver()),
            handler.run(self.events),
        )
        .await
        {
            Either3::First(never) | Either3::Second(never) => match never {},
            Either3::Third(()) => {
                debug!("Session {} ended, {} readings discarded", self.sessions, queue.len());
            }
        }
    }

    /// Wait out the settle delay, then return to the boot state.
    pub async fn restart(&mut self) {
        Timer::after(self.timings.restart_settle).await;
        self.reinitialize();
    }

    fn reinitialize(&mut self) {
        self.link.reset();
        self.indicator.show(false);
        info!("Pipeline reinitialized");
    }

    pub async fn run(mut self) -> Infallible {
        loop {
            self.run_session().await;
            self.restart().await;
        }
    }
}

#[cfg(target_os = "none")]
pub type FirmwareSupervisor = Supervisor<
    'static,
    embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex,
    crate::drivers::AnalogFrontend,
    crate::drivers::StatusLed,
    embassy_stm32::usart::UartTx<'static, embassy_stm32::mode::Async>,
>;

#[cfg(target_os = "none")]
#[embassy_executor::task]
pub async fn supervisor_task(supervisor: FirmwareSupervisor) {
    match supervisor.run().await {}
}
