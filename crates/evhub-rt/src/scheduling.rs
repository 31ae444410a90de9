//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Runtime helpers supporting the refresh driver."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::time::Duration;

use evhub_common::metrics::{JitterSummary, LoopTimingReporter};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("timer '{0}' requires a non-zero period")]
    ZeroPeriod(String),
    #[error("timer '{0}' is already running")]
    AlreadyRunning(String),
}

/// Async rate limiter with a fixed cadence.
///
/// The first tick completes one full period after construction; late ticks
/// are delayed rather than fired in a burst.
#[derive(Debug)]
pub struct RateLimiter {
    interval: tokio::time::Interval,
}

impl RateLimiter {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub async fn tick(&mut self) -> Instant {
        self.interval.tick().await
    }
}

/// Outcome of a timer run, returned by [`PeriodicTimer::stop`].
#[derive(Debug, Clone)]
pub struct TimerReport {
    pub label: String,
    pub ticks: u64,
    pub jitter: Option<JitterSummary>,
}

#[derive(Debug)]
struct RunningTimer {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<TimerReport>,
}

/// Repeating timer with an explicit lifecycle.
///
/// `start` spawns the tick loop, `stop` halts and joins it. Dropping a
/// running timer aborts the loop, so the timer never outlives its owner.
#[derive(Debug)]
pub struct PeriodicTimer {
    label: String,
    period: Duration,
    running: Option<RunningTimer>,
}

impl PeriodicTimer {
    pub fn new(label: impl Into<String>, period: Duration) -> Result<Self, SchedulerError> {
        let label = label.into();
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod(label));
        }
        Ok(Self {
            label,
            period,
            running: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// Spawn the tick loop on the current tokio runtime. `on_tick` receives
    /// the 1-based tick number.
    pub fn start<F>(&mut self, mut on_tick: F) -> Result<(), SchedulerError>
    where
        F: FnMut(u64) + Send + 'static,
    {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning(self.label.clone()));
        }
        // A loop that died on its own leaves a finished handle behind.
        self.running = None;
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let label = self.label.clone();
        let period = self.period;
        let task = tokio::spawn(async move {
            let mut limiter = RateLimiter::new(period);
            let reporter = LoopTimingReporter::new(period);
            let mut ticks: u64 = 0;
            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    instant = limiter.tick() => {
                        ticks += 1;
                        reporter.record_tick_at(instant.into_std());
                        on_tick(ticks);
                    }
                }
            }
            debug!(timer = %label, ticks, "timer loop exited");
            TimerReport {
                label,
                ticks,
                jitter: reporter.histogram().summary(),
            }
        });
        info!(timer = %self.label, period_ms = self.period.as_millis() as u64, "timer started");
        self.running = Some(RunningTimer { stop_tx, task });
        Ok(())
    }

    /// Halt the tick loop and wait for it to exit. Returns `None` when the
    /// timer was not running or its loop panicked.
    pub async fn stop(&mut self) -> Option<TimerReport> {
        let running = self.running.take()?;
        let _ = running.stop_tx.send(true);
        match running.task.await {
            Ok(report) => {
                info!(timer = %report.label, ticks = report.ticks, "timer stopped");
                Some(report)
            }
            Err(err) => {
                error!(timer = %self.label, error = %err, "timer task join error");
                None
            }
        }
    }

    /// Cancel the tick loop without waiting for it.
    pub fn abort(&mut self) {
        if let Some(running) = self.running.take() {
            running.task.abort();
            debug!(timer = %self.label, "timer aborted");
        }
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    fn counting_timer(label: &str, period_ms: u64) -> (PeriodicTimer, Arc<AtomicU64>) {
        let mut timer = PeriodicTimer::new(label, Duration::from_millis(period_ms)).unwrap();
        let count = Arc::new(AtomicU64::new(0));
        let counter = count.clone();
        timer
            .start(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        (timer, count)
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_full_period() {
        let (mut timer, count) = counting_timer("dashboard", 3000);
        sleep(Duration::from_millis(2999)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        sleep(Duration::from_millis(3000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        let report = timer.stop().await.unwrap();
        assert_eq!(report.ticks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_further_ticks() {
        let (mut timer, count) = counting_timer("dashboard", 1000);
        sleep(Duration::from_millis(3500)).await;
        assert!(timer.is_running());
        let report = timer.stop().await.unwrap();
        assert_eq!(report.ticks, 3);
        assert!(!timer.is_running());
        sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(timer.stop().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_running_timer_cancels_it() {
        let (timer, count) = counting_timer("chart", 1000);
        drop(timer);
        sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timers_run_on_independent_cadences() {
        let (mut fast, fast_count) = counting_timer("dashboard", 3000);
        let (mut slow, slow_count) = counting_timer("chart", 10_000);
        sleep(Duration::from_millis(30_500)).await;
        assert_eq!(fast_count.load(Ordering::SeqCst), 10);
        assert_eq!(slow_count.load(Ordering::SeqCst), 3);
        fast.stop().await;
        slow.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop_is_allowed_but_double_start_is_not() {
        let (mut timer, _count) = counting_timer("dashboard", 1000);
        assert_eq!(
            timer.start(|_| {}),
            Err(SchedulerError::AlreadyRunning("dashboard".into()))
        );
        timer.stop().await;
        timer.start(|_| {}).unwrap();
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(timer.stop().await.unwrap().ticks, 1);
    }

    #[test]
    fn zero_period_is_rejected() {
        assert_eq!(
            PeriodicTimer::new("chart", Duration::ZERO).unwrap_err(),
            SchedulerError::ZeroPeriod("chart".into())
        );
    }
}
