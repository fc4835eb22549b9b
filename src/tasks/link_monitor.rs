//! Transport side of the link: turns the module's STATE pin and received
//! bytes into [`LinkEvent`]s for the supervisor.

use embassy_executor::task;
use embassy_futures::select::{select3, Either3};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::usart::RingBufferedUartRx;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Timer};

use crate::config::LINK_PAYLOAD_MAX;
use crate::ipc::LinkEventSender;
use crate::link::LinkEvent;

// Level re-check in case an edge fell between the check and the EXTI arm.
const STATE_POLL: Duration = Duration::from_millis(100);

#[task]
pub async fn link_monitor_task(
    mut state: ExtiInput<'static>,
    mut rx: RingBufferedUartRx<'static>,
    events: LinkEventSender<'static, CriticalSectionRawMutex>,
) {
    info!("Link monitor started");
    let mut connected = false;
    let mut buf = [0u8; LINK_PAYLOAD_MAX];

    loop {
        if state.is_high() != connected {
            connected = !connected;
            let event = if connected {
                LinkEvent::Connected
            } else {
                LinkEvent::Disconnected
            };
            events.send(event).await;
            continue;
        }

        match select3(
            state.wait_for_any_edge(),
            rx.read(&mut buf),
            Timer::after(STATE_POLL),
        )
        .await
        {
            Either3::First(()) | Either3::Third(()) => {}
            Either3::Second(Ok(0)) => {}
            Either3::Second(Ok(n)) => events.send(LinkEvent::data(&buf[..n])).await,
            Either3::Second(Err(e)) => warn!("Serial RX error: {:?}", e),
        }
    }
}
