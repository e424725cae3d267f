//! # Debounce and Throttle
//!
//! Timer primitives for the session controller, built on `tokio::time`.
//!
//! - [`Debouncer`]: every `schedule` call cancels the pending timer and arms
//!   a new one. Only the last call's action runs, once the delay passes with
//!   no further calls.
//! - [`Throttle`]: coalesces values pushed within one window. At most one
//!   sink call per window, always with the most recent value (trailing edge).
//!
//! Both must be used from inside a tokio runtime.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs the most recently scheduled action after a quiet period
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Re-arm the timer with a new action
    ///
    /// Once the timer fires the action runs as its own task, so neither a
    /// later `schedule` nor `cancel` interrupts an action already running.
    pub fn schedule<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(action());
        });

        if let Some(previous) = lock(&self.pending).replace(timer) {
            previous.abort();
        }
    }

    /// Drop the pending action, if any; returns whether one was waiting
    pub fn cancel(&self) -> bool {
        match lock(&self.pending).take() {
            Some(timer) => {
                let waiting = !timer.is_finished();
                timer.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.pending)
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

type Sink<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

struct ThrottleState<T> {
    latest: Option<T>,
    timer: Option<JoinHandle<()>>,
}

/// Trailing-edge throttle: latest value wins
pub struct Throttle<T> {
    window: Duration,
    state: Arc<Mutex<ThrottleState<T>>>,
    sink: Sink<T>,
}

impl<T: Send + 'static> Throttle<T> {
    pub fn new<F, Fut>(window: Duration, sink: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            window,
            state: Arc::new(Mutex::new(ThrottleState {
                latest: None,
                timer: None,
            })),
            sink: Arc::new(move |value| -> BoxFuture<'static, ()> { Box::pin(sink(value)) }),
        }
    }

    /// Record a value; it is delivered when the current window closes
    pub fn push(&self, value: T) {
        let mut state = lock(&self.state);
        state.latest = Some(value);
        if state.timer.as_ref().is_some_and(|timer| !timer.is_finished()) {
            return;
        }

        let window = self.window;
        let shared = self.state.clone();
        let sink = self.sink.clone();
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let value = {
                let mut state = lock(&shared);
                state.timer = None;
                state.latest.take()
            };
            if let Some(value) = value {
                sink(value).await;
            }
        }));
    }

    /// Discard the pending value and stop the timer
    pub fn cancel(&self) {
        let mut state = lock(&self.state);
        state.latest = None;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }
}

impl<T> Drop for Throttle<T> {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.state).timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_debounce_runs_last_action_once() {
        let debouncer = Debouncer::new(Duration::from_millis(1500));
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(0));

        for i in 1..=5 {
            let calls = calls.clone();
            let last = last.clone();
            debouncer.schedule(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                *last.lock().unwrap() = i;
            });
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*last.lock().unwrap(), 5);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_cancel() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        debouncer.schedule(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(debouncer.is_pending());
        assert!(debouncer.cancel());
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!debouncer.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_latest_value_wins() {
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = delivered.clone();
        let throttle = Throttle::new(Duration::from_millis(150), move |offset: usize| {
            let sink = sink.clone();
            async move { sink.lock().unwrap().push(offset) }
        });

        for offset in 0..10 {
            throttle.push(offset);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        // 0..=9 over 100ms all land in the first window
        assert_eq!(*delivered.lock().unwrap(), vec![9]);

        throttle.push(42);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*delivered.lock().unwrap(), vec![9, 42]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_cancel_discards_pending() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let sink = delivered.clone();
        let throttle = Throttle::new(Duration::from_millis(150), move |_: usize| {
            let sink = sink.clone();
            async move {
                sink.fetch_add(1, Ordering::SeqCst);
            }
        });

        throttle.push(1);
        throttle.cancel();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }
}
