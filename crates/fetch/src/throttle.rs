//! Request throttle and abort signal.
//!
//! The throttle keeps a rolling request counter and the instant of the last
//! request. A gap longer than the window resets the counter; whenever the
//! counter sits on a positive multiple of the batch size, the next request
//! first waits out the cooldown. That wait is the only cancellable
//! suspension point of a catalog run.

use std::time::Duration;
use studbook_config::ThrottleConfig;
use studbook_core::error::FetchError;
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tracing::info;

// ── Abort signal ──────────────────────────────────────────────────────────

/// Owner side of an abort signal.
#[derive(Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Create a handle together with its first signal.
    pub fn new() -> (Self, AbortSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, AbortSignal { rx: Some(rx) })
    }

    /// Another signal observing this handle.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: Some(self.tx.subscribe()),
        }
    }

    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

/// Observer side of an abort signal. The default signal never fires.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl AbortSignal {
    pub fn never() -> Self {
        Self::default()
    }

    pub fn is_aborted(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once the handle aborts. Pends forever if it never does,
    /// including when the handle is dropped without aborting.
    pub async fn aborted(&self) {
        if let Some(rx) = &self.rx {
            let mut rx = rx.clone();
            if rx.wait_for(|aborted| *aborted).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

// ── Throttle ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ThrottleState {
    count: u32,
    last: Option<Instant>,
}

/// Batch/cooldown request throttle shared by every fetch of a client.
#[derive(Debug)]
pub struct Throttle {
    batch_size: u32,
    cooldown: Duration,
    window: Duration,
    state: Mutex<ThrottleState>,
}

impl Throttle {
    pub fn new(batch_size: u32, cooldown: Duration, window: Duration) -> Self {
        Self {
            batch_size,
            cooldown,
            window,
            state: Mutex::new(ThrottleState::default()),
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(
            config.batch_size,
            Duration::from_secs(config.cooldown_secs),
            Duration::from_secs(config.window_secs),
        )
    }

    /// Reserve the next request slot, waiting out a cooldown if it is due.
    ///
    /// The slot is counted under the lock, so concurrent callers each see a
    /// distinct count and exactly one of them lands on the batch boundary.
    /// Returns [`FetchError::Aborted`] if `abort` fires during a cooldown.
    pub async fn wait_turn(&self, abort: &AbortSignal) -> Result<(), FetchError> {
        let cooldown_due = {
            let mut state = self.state.lock().await;
            if state.last.is_some_and(|last| last.elapsed() > self.window) {
                state.count = 0;
            }
            let due = self.batch_size > 0 && state.count > 0 && state.count % self.batch_size == 0;
            state.count = state.count.saturating_add(1);
            state.last = Some(Instant::now());
            due
        };

        if cooldown_due {
            info!(
                cooldown_secs = self.cooldown.as_secs(),
                "Request batch complete, cooling down"
            );
            tokio::select! {
                biased;
                _ = abort.aborted() => return Err(FetchError::Aborted),
                _ = tokio::time::sleep(self.cooldown) => {}
            }
        }
        Ok(())
    }

    /// Stamp the completion of a request, whatever its outcome.
    pub async fn record(&self) {
        self.state.lock().await.last = Some(Instant::now());
    }

    /// Requests counted in the current window.
    pub async fn request_count(&self) -> u32 {
        self.state.lock().await.count
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::from_config(&ThrottleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn issue(throttle: &Throttle, n: usize) {
        for _ in 0..n {
            throttle.wait_turn(&AbortSignal::never()).await.unwrap();
            throttle.record().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_batch_runs_without_cooldown() {
        let throttle = Throttle::new(15, Duration::from_secs(15), Duration::from_secs(60));
        let start = Instant::now();
        issue(&throttle, 15).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(throttle.request_count().await, 15);
    }

    #[tokio::test(start_paused = true)]
    async fn sixteenth_request_waits_for_cooldown() {
        let throttle = Throttle::new(15, Duration::from_secs(15), Duration::from_secs(60));
        issue(&throttle, 15).await;

        let start = Instant::now();
        issue(&throttle, 1).await;
        assert!(start.elapsed() >= Duration::from_secs(15));

        // The next cooldown lands after request 30, not 16.
        let start = Instant::now();
        issue(&throttle, 14).await;
        assert!(start.elapsed() < Duration::from_secs(15));
    }

    async fn issue_one(throttle: &Throttle) -> Instant {
        throttle.wait_turn(&AbortSignal::never()).await.unwrap();
        let sent = Instant::now();
        tokio::task::yield_now().await;
        throttle.record().await;
        sent
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_batch_across_boundary_still_cools_down() {
        let throttle = Throttle::new(15, Duration::from_secs(15), Duration::from_secs(60));
        issue(&throttle, 14).await;
        let start = Instant::now();

        // Requests 15, 16 and 17 in flight together.
        let (a, b, c) = tokio::join!(
            issue_one(&throttle),
            issue_one(&throttle),
            issue_one(&throttle)
        );
        assert_eq!(throttle.request_count().await, 17);
        let waited: Vec<Duration> = [a, b, c].iter().map(|sent| *sent - start).collect();
        assert_eq!(waited.iter().filter(|d| **d >= Duration::from_secs(15)).count(), 1);

        // 13 more complete the second batch without another pause...
        let before = Instant::now();
        issue(&throttle, 13).await;
        assert!(before.elapsed() < Duration::from_secs(15));
        assert_eq!(throttle.request_count().await, 30);

        // ...and request 31 waits again.
        let before = Instant::now();
        issue(&throttle, 1).await;
        assert!(before.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_gap_resets_counter() {
        let throttle = Throttle::new(15, Duration::from_secs(15), Duration::from_secs(60));
        issue(&throttle, 15).await;
        tokio::time::advance(Duration::from_secs(61)).await;

        let start = Instant::now();
        throttle.wait_turn(&AbortSignal::never()).await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(throttle.request_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_cancels_cooldown() {
        let throttle = Throttle::new(2, Duration::from_secs(15), Duration::from_secs(60));
        issue(&throttle, 2).await;

        let (handle, signal) = AbortHandle::new();
        handle.abort();
        let result = throttle.wait_turn(&signal).await;
        assert!(matches!(result, Err(FetchError::Aborted)));
    }

    #[tokio::test(start_paused = true)]
    async fn abort_outside_cooldown_is_ignored() {
        let throttle = Throttle::new(15, Duration::from_secs(15), Duration::from_secs(60));
        let (handle, signal) = AbortHandle::new();
        handle.abort();
        assert!(signal.is_aborted());
        assert!(throttle.wait_turn(&signal).await.is_ok());
    }

    #[test]
    fn never_signal_is_not_aborted() {
        assert!(!AbortSignal::never().is_aborted());
        let (handle, _signal) = AbortHandle::new();
        assert!(!handle.signal().is_aborted());
    }
}
