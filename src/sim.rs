//! Host stand-ins for the board: a synthetic biosignal frontend, stdout as
//! the serial link and a scripted client driving the command protocol.

use std::io::Write as _;

use cardio_link::ipc::LinkEventSender;
use cardio_link::link::{LinkEvent, LinkIndicator};
use cardio_link::tasks::{SignalFrontend, Supervisor};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Instant, Timer};
use embedded_io_async::{ErrorKind, ErrorType, Write};

const BEAT_MS: u64 = 800;
const PULSE_DELAY_MS: u64 = 220;
const BASELINE: i32 = 2048;

pub type ConsoleChannel = Mutex<CriticalSectionRawMutex, ConsoleLink>;

type HostSupervisor =
    Supervisor<'static, CriticalSectionRawMutex, SyntheticFrontend, ConsoleIndicator, ConsoleLink>;

/// 75 bpm heartbeat: a sharp QRS spike on ECG, a delayed sawtooth on PPG.
pub struct SyntheticFrontend {
    start: Instant,
    phase_ms: u64,
}

impl SyntheticFrontend {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            phase_ms: 0,
        }
    }

    fn pulse_phase(&self) -> u64 {
        (self.phase_ms + BEAT_MS - PULSE_DELAY_MS) % BEAT_MS
    }
}

impl SignalFrontend for SyntheticFrontend {
    fn read_ecg(&mut self) -> i32 {
        self.phase_ms = self.start.elapsed().as_millis() % BEAT_MS;
        let spike = match self.phase_ms {
            0..=40 => (self.phase_ms as i32) * 35,
            41..=80 => (80 - self.phase_ms as i32) * 35,
            _ => 0,
        };
        BASELINE + spike
    }

    fn read_ppg(&mut self) -> i32 {
        let phase = self.pulse_phase() as i32;
        // Fast systolic rise, slow diastolic decay.
        if phase < 150 {
            1500 + phase * 6
        } else {
            2400 - (phase - 150) * 900 / (BEAT_MS as i32 - 150)
        }
    }

    fn r_peak(&mut self) -> bool {
        (20..=60).contains(&self.phase_ms)
    }

    fn pulse_valley(&mut self) -> bool {
        self.pulse_phase() < 30
    }
}

pub struct ConsoleIndicator;

impl LinkIndicator for ConsoleIndicator {
    fn show(&mut self, connected: bool) {
        log::info!("Status LED {}", if connected { "on" } else { "off" });
    }
}

/// Serial link replaced by stdout.
pub struct ConsoleLink;

impl ErrorType for ConsoleLink {
    type Error = ErrorKind;
}

impl Write for ConsoleLink {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::stdout()
            .write_all(buf)
            .map_err(|_| ErrorKind::BrokenPipe)?;
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::stdout().flush().map_err(|_| ErrorKind::BrokenPipe)
    }
}

/// Connect, stream, pause, stream, disconnect; then again after the restart.
#[embassy_executor::task]
pub async fn scripted_client_task(events: LinkEventSender<'static, CriticalSectionRawMutex>) {
    let script: [(u64, LinkEvent); 6] = [
        (500, LinkEvent::Connected),
        (300, LinkEvent::data(b"1")),
        (2_000, LinkEvent::data(b"0")),
        (500, LinkEvent::data(b"?")),
        (500, LinkEvent::data(b"1")),
        (2_000, LinkEvent::Disconnected),
    ];

    loop {
        for (delay_ms, event) in script.iter().cloned() {
            Timer::after(Duration::from_millis(delay_ms)).await;
            events.send(event).await;
        }
        Timer::after(Duration::from_secs(2)).await;
    }
}

#[embassy_executor::task]
pub async fn supervisor_task(supervisor: HostSupervisor) {
    match supervisor.run().await {}
}
