//! A repeating timer for cooperative tasks.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::Result;

/// A repeating timer that fires on multiples of its period, measured from
/// construction. If ticks have been missed, each missed tick fires
/// immediately on the next [`Interval::tick`] call until the timer has
/// caught up with the real time grid. Single-owner; not thread-safe.
#[derive(Debug)]
pub struct Interval {
    period: Duration,
    deadline: Instant,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: Instant::now() + period,
        }
    }

    /// Completes when the next period in the interval has been reached.
    pub async fn tick(&mut self) -> Result<()> {
        tokio::time::sleep_until(self.deadline).await;

        // Advance by exactly one period so missed ticks fire back to back.
        self.deadline += self.period;

        Ok(())
    }

    /// Re-arm the timer to expire one period after the current time.
    pub fn reset(&mut self) {
        self.deadline = Instant::now() + self.period;
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_on_the_period_grid() {
        let start = Instant::now();
        let mut interval = Interval::new(Duration::from_millis(100));

        interval.tick().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(100));

        interval.tick().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn missed_ticks_fire_in_rapid_succession() {
        let start = Instant::now();
        let mut interval = Interval::new(Duration::from_millis(100));

        tokio::time::advance(Duration::from_millis(250)).await;

        // Two deadlines have already passed; both resolve without waiting.
        interval.tick().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(250));
        interval.tick().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(250));

        // The third tick resynchronises to the grid.
        interval.tick().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_rearms_from_now() {
        let start = Instant::now();
        let mut interval = Interval::new(Duration::from_millis(100));

        interval.tick().await.unwrap();
        tokio::time::advance(Duration::from_millis(50)).await;
        interval.reset();

        interval.tick().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_ticks_immediately() {
        let start = Instant::now();
        let mut interval = Interval::new(Duration::ZERO);

        interval.tick().await.unwrap();
        interval.tick().await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn reports_period() {
        let interval = Interval::new(Duration::from_secs(60));
        assert_eq!(interval.period(), Duration::from_secs(60));
    }
}
