//! Minimum spacing between outbound requests to the TrainingPeaks API.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default spacing between requests.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(150);

/// Process-wide request pacing.
///
/// Share one instance (behind an `Arc`) between every caller that talks to
/// the remote service. The lock is held while sleeping, so concurrent callers
/// queue up and are released one interval apart.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(MIN_REQUEST_INTERVAL)
    }
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request may be sent, then mark it as sent.
    ///
    /// The first call returns immediately. The timestamp is recorded before
    /// returning, so pacing holds even if the caller's request is later
    /// cancelled.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let delay = self.min_interval - elapsed;
                tracing::trace!(delay_ms = delay.as_millis() as u64, "throttling request");
                tokio::time::sleep(delay).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const INTERVAL: Duration = Duration::from_millis(100);

    fn near_instant(d: Duration) -> bool {
        d < Duration::from_millis(50)
    }

    #[tokio::test]
    async fn first_call_does_not_wait() {
        let throttle = Throttle::new(INTERVAL);
        let start = Instant::now();
        throttle.wait().await;
        assert!(near_instant(start.elapsed()));
    }

    #[tokio::test]
    async fn immediate_second_call_is_delayed() {
        let throttle = Throttle::new(INTERVAL);
        throttle.wait().await;

        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() >= INTERVAL.mul_f64(0.9));
    }

    #[tokio::test]
    async fn spaced_calls_are_not_delayed() {
        let throttle = Throttle::new(INTERVAL);
        throttle.wait().await;

        tokio::time::sleep(INTERVAL + Duration::from_millis(50)).await;

        let start = Instant::now();
        throttle.wait().await;
        assert!(near_instant(start.elapsed()));
    }

    #[tokio::test]
    async fn rapid_calls_are_each_throttled() {
        let throttle = Throttle::new(INTERVAL);
        let start = Instant::now();
        for _ in 0..4 {
            throttle.wait().await;
        }
        // first is instant, the next three wait
        assert!(start.elapsed() >= (INTERVAL * 3).mul_f64(0.9));
    }

    #[tokio::test]
    async fn concurrent_callers_are_serialized() {
        let throttle = Arc::new(Throttle::new(INTERVAL));
        let start = Instant::now();

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let throttle = throttle.clone();
                tokio::spawn(async move {
                    throttle.wait().await;
                    Instant::now()
                })
            })
            .collect();

        let mut released = Vec::new();
        for task in tasks {
            released.push(task.await.unwrap());
        }
        released.sort();

        assert!(start.elapsed() >= (INTERVAL * 2).mul_f64(0.9));
        for pair in released.windows(2) {
            assert!(pair[1] - pair[0] >= INTERVAL.mul_f64(0.9));
        }
    }

    #[tokio::test]
    async fn waiting_does_not_block_other_tasks() {
        let throttle = Arc::new(Throttle::new(Duration::from_millis(300)));
        throttle.wait().await;

        let paced = {
            let throttle = throttle.clone();
            tokio::spawn(async move { throttle.wait().await })
        };

        // Runs while the paced task is asleep inside the throttle.
        let start = Instant::now();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(start.elapsed() < Duration::from_millis(200));

        paced.await.unwrap();
    }
}
