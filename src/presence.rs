//! Simulated "students online" counter shown in the status line
//!
//! Purely cosmetic. It drifts randomly and never touches the request flow.

use rand::Rng;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Initial value
pub const START_COUNT: u32 = 128;
/// Lowest value the counter may show
pub const FLOOR: u32 = 80;
/// Largest step in either direction per tick
pub const MAX_STEP: i32 = 2;
/// Default tick period
pub const TICK_PERIOD: Duration = Duration::from_secs(4);

/// Random-walk counter with a floor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnlineCounter {
    value: u32,
}

impl Default for OnlineCounter {
    fn default() -> Self {
        Self { value: START_COUNT }
    }
}

impl OnlineCounter {
    /// Counter at the start value
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Applies one step, clamped to `[-MAX_STEP, MAX_STEP]`, and returns the new value
    ///
    /// # Examples
    ///
    /// ```
    /// use mathgenius::presence::OnlineCounter;
    ///
    /// let mut counter = OnlineCounter::new();
    /// assert_eq!(counter.step(2), 130);
    /// assert_eq!(counter.step(-2), 128);
    /// ```
    pub fn step(&mut self, delta: i32) -> u32 {
        let delta = delta.clamp(-MAX_STEP, MAX_STEP);
        let next = (self.value as i64 + delta as i64).max(FLOOR as i64);
        self.value = next as u32;
        self.value
    }

    /// Applies one random step
    pub fn tick(&mut self) -> u32 {
        let delta = rand::rng().random_range(-MAX_STEP..=MAX_STEP);
        self.step(delta)
    }
}

/// Runs the counter on an interval task
///
/// Returns the receiving side of the published value plus the task handle.
/// The task stops once every receiver is dropped.
pub fn spawn_ticker(period: Duration) -> (watch::Receiver<u32>, JoinHandle<()>) {
    let mut counter = OnlineCounter::new();
    let (tx, rx) = watch::channel(counter.value());

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let value = counter.tick();
            if tx.send(value).is_err() {
                tracing::debug!("Presence ticker stopped: no receivers");
                break;
            }
        }
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_starts_at_start_count() {
        assert_eq!(OnlineCounter::new().value(), 128);
    }

    #[test]
    fn test_step_is_clamped() {
        let mut counter = OnlineCounter::new();
        assert_eq!(counter.step(50), 130);
        assert_eq!(counter.step(-50), 128);
    }

    #[test]
    fn test_floor_holds() {
        let mut counter = OnlineCounter::new();
        for _ in 0..100 {
            counter.step(-2);
        }
        assert_eq!(counter.value(), FLOOR);
    }

    #[test]
    fn test_random_ticks_stay_in_bounds() {
        let mut counter = OnlineCounter::new();
        let mut previous = counter.value();
        for _ in 0..500 {
            let value = counter.tick();
            assert!(value >= FLOOR);
            assert!((value as i64 - previous as i64).abs() <= MAX_STEP as i64);
            previous = value;
        }
    }

    #[tokio::test]
    async fn test_ticker_publishes_values() {
        let (mut rx, handle) = spawn_ticker(Duration::from_millis(5));
        assert_eq!(*rx.borrow(), START_COUNT);
        rx.changed().await.unwrap();
        assert!(*rx.borrow() >= FLOOR);
        drop(rx);
        handle.await.unwrap();
    }
}
