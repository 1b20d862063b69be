//! Periodic polling of a [`HardwareMonitor`].
//!
//! All updates run on a single current-thread runtime, so a node is never
//! updated concurrently.

use std::ops::ControlFlow;
use std::time::Instant;

use tokio::sync::broadcast;
use tokio::time::{interval, Duration, MissedTickBehavior};

use super::hardware::HardwareReport;
use super::monitor::HardwareMonitor;

/// Update `monitor` every `period` and hand each report to `on_report`
/// until it breaks or `shutdown` fires. Returns the number of polls made.
pub async fn poll_loop<F>(
    monitor: &mut HardwareMonitor,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
    mut on_report: F,
) -> u64
where
    F: FnMut(&[HardwareReport]) -> ControlFlow<()>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut polls = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let started = Instant::now();
                monitor.update();
                polls += 1;
                log::trace!("Poll {} took {:?}", polls, started.elapsed());

                if on_report(&monitor.report()).is_break() {
                    break;
                }
            }
            _ = shutdown.recv() => {
                log::debug!("Polling stopped after {} polls", polls);
                break;
            }
        }
    }

    polls
}

/// Run [`poll_loop`] to completion on a fresh current-thread runtime.
pub fn run_blocking<F>(
    monitor: &mut HardwareMonitor,
    period: Duration,
    shutdown: broadcast::Receiver<()>,
    on_report: F,
) -> anyhow::Result<u64>
where
    F: FnMut(&[HardwareReport]) -> ControlFlow<()>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    Ok(runtime.block_on(poll_loop(monitor, period, shutdown, on_report)))
}

/// Shutdown channel whose sender fires on Ctrl-C.
pub fn ctrlc_shutdown() -> anyhow::Result<(broadcast::Sender<()>, broadcast::Receiver<()>)> {
    let (tx, rx) = broadcast::channel::<()>(1);
    let handler_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = handler_tx.send(());
    })?;
    Ok((tx, rx))
}
