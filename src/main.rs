#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
use {defmt_rtt as _, panic_probe as _};

#[cfg(not(target_os = "none"))]
mod sim;

use cardio_link::config::Timings;
use cardio_link::ipc::LinkEvents;
use cardio_link::tasks::Supervisor;
use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use static_cell::StaticCell;

static LINK_EVENTS: LinkEvents<CriticalSectionRawMutex> = LinkEvents::new();

#[cfg(target_os = "none")]
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    use cardio_link::drivers::SerialChannel;
    use cardio_link::tasks::link_monitor::link_monitor_task;
    use cardio_link::tasks::supervisor::supervisor_task;
    use cardio_link::Board;
    use defmt::{error, info};

    static SERIAL_TX: StaticCell<SerialChannel> = StaticCell::new();

    info!("Starting cardio-link acquisition firmware");
    let board = match Board::init() {
        Ok(board) => board,
        Err((led, e)) => {
            error!("Serial link initialization failed: {:?}", e);
            match led.blink_forever().await {}
        }
    };

    let serial = board.serial;
    let channel: &'static SerialChannel = SERIAL_TX.init(Mutex::new(serial.tx));
    let supervisor = Supervisor::new(
        board.frontend,
        board.status_led,
        channel,
        LINK_EVENTS.receiver(),
        Timings::DEFAULT,
    );

    if let Err(e) = spawner.spawn(link_monitor_task(
        serial.state,
        serial.rx,
        LINK_EVENTS.sender(),
    )) {
        error!("Link monitor spawn failed: {:?}", e);
        return;
    }
    if let Err(e) = spawner.spawn(supervisor_task(supervisor)) {
        error!("Supervisor spawn failed: {:?}", e);
        return;
    }
    info!("Serial link initialized, waiting for connection...");
}

/// Host build: the same pipeline over a synthetic frontend, lines on stdout.
#[cfg(not(target_os = "none"))]
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    use log::{error, info};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    static CONSOLE: StaticCell<sim::ConsoleChannel> = StaticCell::new();

    info!("Starting cardio-link host simulation");
    let channel: &'static sim::ConsoleChannel = CONSOLE.init(Mutex::new(sim::ConsoleLink));
    let supervisor = Supervisor::new(
        sim::SyntheticFrontend::new(),
        sim::ConsoleIndicator,
        channel,
        LINK_EVENTS.receiver(),
        Timings::DEFAULT,
    );

    if let Err(e) = spawner.spawn(sim::scripted_client_task(LINK_EVENTS.sender())) {
        error!("Client script spawn failed: {:?}", e);
        return;
    }
    if let Err(e) = spawner.spawn(sim::supervisor_task(supervisor)) {
        error!("Supervisor spawn failed: {:?}", e);
    }
}
