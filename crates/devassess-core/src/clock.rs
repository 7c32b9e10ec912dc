//! Wall-clock arithmetic and the assessment countdown.
//!
//! Remaining time is always recomputed from the stored start timestamp and
//! the time limit; nothing here keeps a mutable counter, so a reload never
//! drifts from wall-clock time.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Milliseconds since `started_at`, clamped at zero when the start lies in
/// the future (clock skew).
pub fn elapsed_millis(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - started_at).num_milliseconds().max(0)
}

/// Whole seconds since `started_at`, never negative.
pub fn elapsed_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (elapsed_millis(started_at, now) / 1000) as u64
}

/// Whole seconds left of a `time_limit_minutes` budget started at `started_at`.
pub fn remaining_seconds(
    started_at: DateTime<Utc>,
    time_limit_minutes: u32,
    now: DateTime<Utc>,
) -> u64 {
    let limit_ms = i64::from(time_limit_minutes) * 60 * 1000;
    let remaining_ms = (limit_ms - elapsed_millis(started_at, now)).max(0);
    (remaining_ms / 1000) as u64
}

/// Render seconds as `HH:MM:SS`; `None` renders as `--:--:--`.
pub fn format_hms(seconds: Option<u64>) -> String {
    match seconds {
        None => "--:--:--".to_string(),
        Some(total) => {
            let hours = total / 3600;
            let minutes = (total % 3600) / 60;
            let secs = total % 60;
            format!("{hours:02}:{minutes:02}:{secs:02}")
        }
    }
}

/// Periodic recomputation of the remaining time.
pub struct Countdown;

impl Countdown {
    /// Spawn a countdown on the current tokio runtime.
    ///
    /// `on_tick` receives the remaining seconds on every tick (the first tick
    /// fires immediately). When the remaining time reaches zero `on_expire`
    /// is awaited once and the task ends.
    pub fn spawn<T, E, Fut>(
        clock: Arc<dyn Clock>,
        started_at: DateTime<Utc>,
        time_limit_minutes: u32,
        period: Duration,
        mut on_tick: T,
        on_expire: E,
    ) -> CountdownHandle
    where
        T: FnMut(u64) + Send + 'static,
        E: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let remaining = remaining_seconds(started_at, time_limit_minutes, clock.now());
                on_tick(remaining);
                if remaining == 0 {
                    tracing::info!("assessment time limit reached");
                    on_expire().await;
                    break;
                }
            }
        });

        CountdownHandle { task: Some(task) }
    }
}

/// Owner of a running countdown. Dropping it stops the countdown.
pub struct CountdownHandle {
    task: Option<JoinHandle<()>>,
}

impl CountdownHandle {
    /// Stop the countdown without firing `on_expire`.
    pub fn cancel(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Wait until the countdown ends, either by expiring or by cancellation.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn remaining_after_five_of_ten_minutes() {
        let now = Utc::now();
        let started = now - chrono::Duration::minutes(5);
        let remaining = remaining_seconds(started, 10, now);
        assert!((270..=300).contains(&remaining), "got {remaining}");
    }

    #[test]
    fn remaining_is_monotonic_over_time() {
        let started = at("2025-03-01T10:00:00Z");
        let a = remaining_seconds(started, 10, at("2025-03-01T10:05:00Z"));
        let b = remaining_seconds(started, 10, at("2025-03-01T10:05:01Z"));
        let c = remaining_seconds(started, 10, at("2025-03-01T10:06:30Z"));
        assert_eq!(a, 300);
        assert!(b < a && c < b);
    }

    #[test]
    fn future_start_clamps_elapsed_to_zero() {
        let now = at("2025-03-01T10:00:00Z");
        let started = at("2025-03-01T12:00:00Z");
        assert_eq!(elapsed_seconds(started, now), 0);
        assert_eq!(remaining_seconds(started, 10, now), 600);
    }

    #[test]
    fn remaining_floors_to_whole_seconds_and_stops_at_zero() {
        let started = at("2025-03-01T10:00:00Z");
        let now = started + chrono::Duration::milliseconds(59_500);
        assert_eq!(remaining_seconds(started, 1, now), 0);
        let now = started + chrono::Duration::milliseconds(58_999);
        assert_eq!(remaining_seconds(started, 1, now), 1);
        assert_eq!(remaining_seconds(started, 1, at("2025-03-02T00:00:00Z")), 0);
    }

    #[test]
    fn format_hms_pads_fields() {
        assert_eq!(format_hms(Some(0)), "00:00:00");
        assert_eq!(format_hms(Some(59)), "00:00:59");
        assert_eq!(format_hms(Some(3_661)), "01:01:01");
        assert_eq!(format_hms(Some(36_000)), "10:00:00");
        assert_eq!(format_hms(None), "--:--:--");
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_expires_once() {
        let clock = Arc::new(ManualClock::new(at("2025-03-01T10:00:58Z")));
        let started = at("2025-03-01T10:00:00Z");
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let expirations = Arc::new(AtomicU32::new(0));

        let tick_clock = Arc::clone(&clock);
        let tick_log = Arc::clone(&ticks);
        let expired = Arc::clone(&expirations);
        let handle = Countdown::spawn(
            clock.clone(),
            started,
            1,
            Duration::from_secs(1),
            move |remaining| {
                tick_log.lock().unwrap().push(remaining);
                tick_clock.advance(chrono::Duration::seconds(1));
            },
            move || async move {
                expired.fetch_add(1, Ordering::SeqCst);
            },
        );

        handle.join().await;
        assert_eq!(*ticks.lock().unwrap(), vec![2, 1, 0]);
        assert_eq!(expirations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_countdown_stops_ticking() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(at("2025-03-01T10:00:00Z")));
        let ticks = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&ticks);

        let handle = Countdown::spawn(
            clock,
            at("2025-03-01T10:00:00Z"),
            60,
            Duration::from_secs(1),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            || async {},
        );

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        handle.cancel();
        let seen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
        assert!(handle.is_finished());
    }
}
