//! Background timer that notices local-midnight rollovers.

use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::NaiveDate;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::Result;
use crate::utils::time::until_next_midnight;

#[derive(Default)]
struct TimerState {
    stopped: bool,
    woken: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<TimerState>,
    signal: Condvar,
}

/// Sleeps until the next local midnight, then calls back if the date moved.
///
/// The callback receives the new date. When the process was suspended across
/// several midnights it still fires once; consumers rescan history rather than
/// assume a single day elapsed.
pub struct DayRolloverTimer {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl DayRolloverTimer {
    pub fn start<F>(clock: Arc<dyn Clock>, on_rollover: F) -> Result<Self>
    where
        F: Fn(NaiveDate) + Send + 'static,
    {
        let shared = Arc::new(Shared::default());
        let worker = Arc::clone(&shared);
        let tracked = clock.today();

        let handle = std::thread::Builder::new()
            .name("day-rollover".into())
            .spawn(move || run(&worker, clock.as_ref(), tracked, on_rollover))?;

        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// Re-check the date now instead of waiting for midnight, e.g. on resume.
    pub fn wake(&self) {
        self.shared.state.lock().woken = true;
        self.shared.signal.notify_one();
    }

    pub fn stop(&mut self) {
        self.shared.state.lock().stopped = true;
        self.shared.signal.notify_one();

        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("Day rollover thread panicked");
        }
    }
}

impl Drop for DayRolloverTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<F>(shared: &Shared, clock: &dyn Clock, mut tracked: NaiveDate, on_rollover: F)
where
    F: Fn(NaiveDate),
{
    debug!(%tracked, "Day rollover timer started");

    loop {
        let wait = until_next_midnight(clock.now());
        {
            let mut state = shared.state.lock();
            if !state.stopped && !state.woken {
                shared.signal.wait_for(&mut state, wait);
            }
            if state.stopped {
                break;
            }
            state.woken = false;
        }

        let today = clock.today();
        if today != tracked {
            info!(from = %tracked, to = %today, "Day changed");
            tracked = today;
            on_rollover(today);
        }
    }

    debug!("Day rollover timer stopped");
}
