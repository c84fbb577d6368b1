//! Cancellable periodic poll trigger.

use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};

/// Delay between status checks of a running job.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// At most one interval is alive at a time. Ticks never pile up: a slow poll pushes
/// the next tick back instead of firing a burst.
pub(crate) struct PollTimer {
    period: Duration,
    interval: Option<Interval>,
}

impl PollTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Start ticking; the first tick fires one period from now. Restarting resets the phase.
    pub fn start(&mut self) {
        let mut iv = interval_at(Instant::now() + self.period, self.period);
        iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(iv);
    }

    pub fn cancel(&mut self) {
        self.interval = None;
    }

    pub fn is_active(&self) -> bool {
        self.interval.is_some()
    }

    /// Start or cancel so the timer runs exactly when `should_run` holds.
    pub fn sync(&mut self, should_run: bool) {
        match (should_run, self.is_active()) {
            (true, false) => self.start(),
            (false, true) => self.cancel(),
            _ => {}
        }
    }

    /// Wait for the next tick. Pends forever while cancelled, so it is safe in `select!`.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(iv) => {
                iv.tick().await;
            }
            None => futures::future::pending::<()>().await,
        }
    }
}

impl Default for PollTimer {
    fn default() -> Self {
        Self::new(POLL_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_period() {
        let mut t = PollTimer::new(Duration::from_secs(2));
        t.start();
        let before = Instant::now();
        t.tick().await;
        let first = before.elapsed();
        assert!(first >= Duration::from_secs(2) && first < Duration::from_secs(3));
        t.tick().await;
        assert!(before.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let mut t = PollTimer::default();
        t.start();
        t.cancel();
        assert!(!t.is_active());
        let fired = tokio::time::timeout(Duration::from_secs(60), t.tick()).await;
        assert!(fired.is_err());
    }

    #[test]
    fn sync_follows_the_flag() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let mut t = PollTimer::default();
            t.sync(true);
            assert!(t.is_active());
            t.sync(true);
            assert!(t.is_active());
            t.sync(false);
            assert!(!t.is_active());
        });
    }
}
