//! Single-shot step timer.

use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// At most one pending step timeout.
///
/// Setting a timer aborts the previous one before the new one is armed, so
/// only the latest callback can fire. Must be used inside a tokio runtime.
#[derive(Debug, Default)]
pub struct StepTimer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl StepTimer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer. `None` or zero clears it without arming a new one.
    pub fn set<F>(&self, timeout_ms: Option<u64>, on_timeout: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        let timeout_ms = match timeout_ms {
            Some(ms) if ms > 0 => ms,
            _ => return,
        };

        tracing::debug!(timeout_ms, "step timer armed");
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
            tracing::debug!(timeout_ms, "step timer fired");
            on_timeout();
        }));
    }

    /// Cancel the pending timer, if any.
    pub fn clear(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }

    /// Whether a timer is armed and has not fired yet.
    pub fn is_pending(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for StepTimer {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<u64>>>, impl Fn(u64) -> Box<dyn FnOnce() + Send>) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let f = fired.clone();
        let make = move |tag: u64| {
            let f = f.clone();
            Box::new(move || f.lock().unwrap().push(tag)) as Box<dyn FnOnce() + Send>
        };
        (fired, make)
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_set_replaces_first() {
        let timer = StepTimer::new();
        let (fired, make) = recorder();

        timer.set(Some(1000), make(1000));
        timer.set(Some(3000), make(3000));

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(fired.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(*fired.lock().unwrap(), vec![3000]);
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels() {
        let timer = StepTimer::new();
        let (fired, make) = recorder();

        timer.set(Some(1000), make(1));
        assert!(timer.is_pending());
        timer.clear();

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert!(fired.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_or_absent_means_no_timer() {
        let timer = StepTimer::new();
        let (fired, make) = recorder();

        timer.set(Some(1000), make(1));
        timer.set(Some(0), make(2));
        assert!(!timer.is_pending());
        timer.set(None, make(3));

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert!(fired.lock().unwrap().is_empty());
    }
}
