//! Periodic triggers, such as the background reload of the feed
//!
//! A trigger only signals that its period has elapsed. Whatever it triggers is responsible for
//! checking, at the time it fires, whether it should actually run.
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::{task::AbortHandle, time::MissedTickBehavior};
use tracing::trace;

pub type Callback = Box<dyn FnMut() + Send + 'static>;

pub trait Scheduler {
    /// Call `callback` every `period`, starting one period from now
    fn on_interval(&mut self, period: Duration, callback: Callback) -> IntervalHandle;
}

/// Returned by [Scheduler::on_interval]. Dropping the handle does not stop the interval; call
/// [IntervalHandle::cancel].
#[derive(Debug)]
pub struct IntervalHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl IntervalHandle {
    fn new(cancelled: Arc<AtomicBool>, abort: Option<AbortHandle>) -> Self {
        Self { cancelled, abort }
    }

    pub fn cancel(self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(abort) = self.abort {
            abort.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Runs intervals as tasks on the current tokio runtime
#[derive(Debug, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn on_interval(&mut self, period: Duration, mut callback: Callback) -> IntervalHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                trace!(?period, "interval fired");
                callback();
            }
        });
        IntervalHandle::new(cancelled, Some(task.abort_handle()))
    }
}

struct ManualTimer {
    period: Duration,
    next: Duration,
    callback: Callback,
    cancelled: Arc<AtomicBool>,
}

/// A scheduler driven by a virtual clock that only moves when told to
#[derive(Default)]
pub struct ManualScheduler {
    now: Duration,
    timers: Vec<ManualTimer>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward, firing every interval that comes due in chronological order.
    /// Returns the number of callbacks that ran.
    pub fn advance(&mut self, by: Duration) -> usize {
        let target = self.now + by;
        let mut fired = 0;
        self.timers
            .retain(|t| !t.cancelled.load(Ordering::SeqCst) && !t.period.is_zero());
        loop {
            let Some(timer) = self
                .timers
                .iter_mut()
                .filter(|t| !t.cancelled.load(Ordering::SeqCst) && t.next <= target)
                .min_by_key(|t| t.next)
            else {
                break;
            };
            self.now = timer.next;
            timer.next += timer.period;
            (timer.callback)();
            fired += 1;
        }
        self.now = target;
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn on_interval(&mut self, period: Duration, callback: Callback) -> IntervalHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.timers.push(ManualTimer {
            period,
            next: self.now + period,
            callback,
            cancelled: cancelled.clone(),
        });
        IntervalHandle::new(cancelled, None)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use test_log::test;

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (
            count,
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_manual_scheduler() {
        let mut sched = ManualScheduler::new();
        let (count, cb) = counter();
        let handle = sched.on_interval(Duration::from_secs(15), cb);

        assert_eq!(sched.advance(Duration::from_secs(14)), 0);
        assert_eq!(sched.advance(Duration::from_secs(1)), 1);
        assert_eq!(sched.advance(Duration::from_secs(45)), 3);
        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert_eq!(sched.now(), Duration::from_secs(60));

        handle.cancel();
        assert_eq!(sched.advance(Duration::from_secs(60)), 0);
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_manual_scheduler_order() {
        let mut sched = ManualScheduler::new();
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        for (name, secs) in [("slow", 10), ("fast", 4)] {
            let log = log.clone();
            sched.on_interval(
                Duration::from_secs(secs),
                Box::new(move || log.lock().expect("poisoned").push(name)),
            );
        }
        assert_eq!(sched.advance(Duration::from_secs(12)), 4);
        assert_eq!(
            *log.lock().expect("poisoned"),
            vec!["fast", "fast", "slow", "fast"]
        );
    }

    #[test(tokio::test(start_paused = true))]
    async fn test_tokio_scheduler() {
        let mut sched = TokioScheduler;
        let (count, cb) = counter();
        let handle = sched.on_interval(Duration::from_secs(15), cb);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
