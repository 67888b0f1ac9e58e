//! Cancellable periodic ticker on the tokio runtime.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::error::{DispatchError, DispatchResult};

/// Tick handler verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    Stop,
}

/// Owns one ticking task. Dropping the handle stops the task.
#[derive(Debug)]
pub struct TickerHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Ask the task to stop. No tick starts after this returns.
    pub fn cancel(mut self) {
        self.stop();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        self.task.abort();
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn a task calling `on_tick` every `period` until it returns
/// [`TickFlow::Stop`] or the handle is cancelled.
///
/// The first call happens one full period after spawning. Needs an ambient
/// tokio runtime; without one this returns [`DispatchError::NoRuntime`].
pub fn spawn_ticker<F>(period: Duration, mut on_tick: F) -> DispatchResult<TickerHandle>
where
    F: FnMut(u64) -> TickFlow + Send + 'static,
{
    let runtime = Handle::try_current().map_err(|_| DispatchError::NoRuntime)?;
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

    let task = runtime.spawn(async move {
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately.
        ticks.tick().await;

        let mut count = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = &mut cancel_rx => break,
                _ = ticks.tick() => {
                    count += 1;
                    if on_tick(count) == TickFlow::Stop {
                        break;
                    }
                }
            }
        }
        debug!(ticks = count, "ticker stopped");
    });

    Ok(TickerHandle {
        cancel: Some(cancel_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    #[test]
    fn test_requires_runtime() {
        let result = spawn_ticker(Duration::from_millis(10), |_| TickFlow::Continue);
        assert!(matches!(result, Err(DispatchError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_until_handler_stops() {
        let seen = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&seen);
        let handle = spawn_ticker(Duration::from_secs(1), move |n| {
            counter.store(n, Ordering::SeqCst);
            if n == 3 { TickFlow::Stop } else { TickFlow::Continue }
        })
        .unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let seen = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&seen);
        let handle = spawn_ticker(Duration::from_secs(1), move |n| {
            counter.store(n, Ordering::SeqCst);
            TickFlow::Continue
        })
        .unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        handle.cancel();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
