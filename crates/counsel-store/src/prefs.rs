use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use counsel_types::ChatMode;

/// UI preferences persisted between sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorePrefs {
    pub chat_mode: ChatMode,
    pub web_search: bool,
    pub show_suggestions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_thread_id: Option<String>,
}

/// Where preferences get written (local storage, a settings endpoint, a
/// test capture).
pub trait PrefsSink: Send + Sync {
    fn persist(&self, prefs: StorePrefs);
}

/// Trailing-edge debouncer: only the last call within the window fires.
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedule `action` after the delay; a newer call cancels it.
    pub fn call(&self, action: impl FnOnce() + Send + 'static) {
        let scheduled = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) == scheduled {
                action();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn only_the_last_scheduled_call_fires() {
        let fired: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let debouncer = Debouncer::new(Duration::from_millis(100));

        for i in 0..3 {
            let fired = Arc::clone(&fired);
            debouncer.call(move || fired.lock().unwrap().push(i));
            // The spawned sleep registers on first poll; yield before
            // moving the paused clock.
            tokio::task::yield_now().await;
            tokio::time::advance(Duration::from_millis(10)).await;
        }
        tokio::time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;

        assert_eq!(*fired.lock().unwrap(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_calls_all_fire() {
        let fired: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let debouncer = Debouncer::new(Duration::from_millis(50));

        for i in 0..2 {
            let fired = Arc::clone(&fired);
            debouncer.call(move || fired.lock().unwrap().push(i));
            tokio::task::yield_now().await;
            tokio::time::advance(Duration::from_millis(100)).await;
            tokio::task::yield_now().await;
        }

        assert_eq!(*fired.lock().unwrap(), vec![0, 1]);
    }
}
