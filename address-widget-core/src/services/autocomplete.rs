//! Debounced autocomplete suggestions

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::CoreResult;
use crate::types::{RefItem, WidgetConfig};

/// Fetches suggestions for a term
pub type SuggestionFetcher<T> =
    Arc<dyn Fn(String) -> BoxFuture<'static, CoreResult<Vec<T>>> + Send + Sync>;

/// Visible suggestion list
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestions<T> {
    pub term: String,
    pub items: Vec<T>,
    /// Whether the list is displayed
    pub active: bool,
}

impl<T> Default for Suggestions<T> {
    fn default() -> Self {
        Self {
            term: String::new(),
            items: Vec::new(),
            active: false,
        }
    }
}

/// Debounces input and publishes the suggestions of the latest term
///
/// Each input cancels the pending timer. A fetch that is already in flight is not cancelled;
/// its response is dropped if a newer input arrived meanwhile. Must be used within a Tokio
/// runtime.
pub struct AutocompleteDebouncer<T> {
    fetcher: SuggestionFetcher<T>,
    min_chars: usize,
    delay: Duration,
    generation: Arc<AtomicU64>,
    timer: Mutex<Option<JoinHandle<()>>>,
    suggestions: Arc<watch::Sender<Suggestions<T>>>,
}

impl<T: Clone + Send + Sync + 'static> AutocompleteDebouncer<T> {
    /// Minimum length and quiet period come from the widget configuration.
    pub fn new(fetcher: SuggestionFetcher<T>, config: &WidgetConfig) -> Self {
        let (suggestions, _) = watch::channel(Suggestions::default());
        Self {
            fetcher,
            min_chars: config.minimum_chars_for_auto_complete,
            delay: Duration::from_millis(config.minimum_time_for_auto_complete_repeat),
            generation: Arc::new(AtomicU64::new(0)),
            timer: Mutex::new(None),
            suggestions: Arc::new(suggestions),
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Register new input. Returns whether a fetch was scheduled.
    pub fn on_input(&self, term: &str) -> bool {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let scheduled = term.chars().count() >= self.min_chars;

        let next = scheduled.then(|| {
            let term = term.to_string();
            let delay = self.delay;
            let fetcher = Arc::clone(&self.fetcher);
            let latest = Arc::clone(&self.generation);
            let suggestions = Arc::clone(&self.suggestions);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                // Detached so that a newer input cannot abort it.
                tokio::spawn(async move {
                    let result = fetcher(term.clone()).await;
                    if latest.load(Ordering::SeqCst) != generation {
                        log::debug!("Dropping stale suggestions for {term:?}");
                        return;
                    }
                    match result {
                        Ok(items) => suggestions.send_modify(|s| {
                            s.active = !items.is_empty();
                            s.items = items;
                            s.term = term;
                        }),
                        Err(e) => log::warn!("Suggestion fetch for {term:?} failed: {e}"),
                    }
                });
            })
        });

        let previous = {
            let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *timer, next)
        };
        if let Some(previous) = previous {
            previous.abort();
        }
        if !scheduled {
            self.hide();
        }
        scheduled
    }

    /// Hide the list (click outside, selection).
    pub fn hide(&self) {
        self.suggestions.send_if_modified(|s| std::mem::replace(&mut s.active, false));
    }

    pub fn current(&self) -> Suggestions<T> {
        self.suggestions.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Suggestions<T>> {
        self.suggestions.subscribe()
    }
}

impl<T> Drop for AutocompleteDebouncer<T> {
    fn drop(&mut self) {
        let timer = self.timer.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = timer.take() {
            timer.abort();
        }
    }
}

/// Local case-insensitive filtering on the display name.
pub fn filter_suggestions<'a>(values: &'a [RefItem], term: &str) -> Vec<&'a RefItem> {
    let term = term.trim().to_lowercase();
    values
        .iter()
        .filter(|item| {
            let label = if item.display_name.is_empty() {
                &item.name
            } else {
                &item.display_name
            };
            label.to_lowercase().contains(&term)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use futures::FutureExt;

    type Calls = Arc<Mutex<Vec<String>>>;

    /// Fetcher echoing the term; terms starting with "slow" take five seconds.
    fn echo_fetcher(calls: Calls) -> SuggestionFetcher<String> {
        Arc::new(move |term: String| {
            let calls = Arc::clone(&calls);
            async move {
                calls.lock().unwrap().push(term.clone());
                if term.starts_with("slow") {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                if term.contains("fail") {
                    return Err(CoreError::NetworkError("offline".to_string()));
                }
                Ok(vec![format!("{term} 1"), format!("{term} 2")])
            }
            .boxed()
        })
    }

    fn debouncer(calls: &Calls) -> AutocompleteDebouncer<String> {
        AutocompleteDebouncer::new(echo_fetcher(Arc::clone(calls)), &WidgetConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn burst_issues_single_fetch() {
        let calls = Calls::default();
        let debouncer = debouncer(&calls);

        assert!(debouncer.on_input("Via"));
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(debouncer.on_input("Via R"));
        assert!(debouncer.on_input("Via Ro"));
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(*calls.lock().unwrap(), vec!["Via Ro"]);
        let current = debouncer.current();
        assert_eq!(current.term, "Via Ro");
        assert!(current.active);
        assert_eq!(current.items.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn short_terms_do_not_fetch() {
        let calls = Calls::default();
        let debouncer = debouncer(&calls);

        assert!(!debouncer.on_input("Vi"));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn short_term_cancels_pending_fetch() {
        let calls = Calls::default();
        let debouncer = debouncer(&calls);

        debouncer.on_input("Via");
        debouncer.on_input("V");
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_is_dropped() {
        let calls = Calls::default();
        let debouncer = debouncer(&calls);

        debouncer.on_input("slow street");
        tokio::time::sleep(Duration::from_millis(1100)).await;
        debouncer.on_input("fast street");
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(debouncer.current().term, "fast street");

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(debouncer.current().term, "fast street");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_keeps_previous_list() {
        let calls = Calls::default();
        let debouncer = debouncer(&calls).with_delay(Duration::from_millis(200));

        debouncer.on_input("Roma");
        tokio::time::sleep(Duration::from_millis(300)).await;
        debouncer.on_input("Roma fail");
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(debouncer.current().term, "Roma");
    }

    #[tokio::test(start_paused = true)]
    async fn hide_deactivates_list() {
        let calls = Calls::default();
        let debouncer = debouncer(&calls).with_min_chars(1);
        let mut rx = debouncer.subscribe();

        debouncer.on_input("R");
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(rx.borrow_and_update().active);

        debouncer.hide();
        assert!(rx.has_changed().unwrap());
        assert!(!debouncer.current().active);
    }

    #[test]
    fn filters_case_insensitively() {
        let values = vec![
            RefItem::new("1", "RM", "Roma"),
            RefItem::new("2", "MI", "Milano"),
            RefItem::new("3", "ROV", ""),
        ];
        let names: Vec<&str> = filter_suggestions(&values, "ro")
            .into_iter()
            .map(|item| item.id.as_str())
            .collect();
        assert_eq!(names, vec!["1", "3"]);
        assert_eq!(filter_suggestions(&values, "").len(), 3);
    }
}
