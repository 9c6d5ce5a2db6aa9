//! Cancel-and-replace timer for search input.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Default quiet period before a search is sent.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Runs the most recently scheduled action once input has been quiet for
/// the configured period. Scheduling again aborts the pending action.
///
/// Must be used from inside a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    pub fn schedule<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let quiet = self.quiet;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            action.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Runs = Arc<Mutex<Vec<String>>>;

    fn record(runs: &Runs, value: &str) -> impl Future<Output = ()> + Send + 'static {
        let runs = runs.clone();
        let value = value.to_string();
        async move {
            runs.lock().unwrap().push(value);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_input_collapses_into_one_run() {
        let runs = Runs::default();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        for value in ["t", "ta", "tab"] {
            debouncer.schedule(record(&runs, value));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(runs.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(*runs.lock().unwrap(), vec!["tab".to_string()]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_each_run() {
        let runs = Runs::default();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.schedule(record(&runs, "first"));
        tokio::time::sleep(Duration::from_millis(600)).await;
        debouncer.schedule(record(&runs, "second"));
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(
            *runs.lock().unwrap(),
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_run() {
        let runs = Runs::default();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.schedule(record(&runs, "gone"));
        assert!(debouncer.is_pending());
        debouncer.cancel();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(runs.lock().unwrap().is_empty());
        assert!(!debouncer.is_pending());
    }
}
