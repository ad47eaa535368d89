//! Click-outside subscriptions
//!
//! Floating parts of the widget (suggestion lists, pop-ups) close when a click lands outside
//! them. Each subscription lives as long as its [`BackdropGuard`].

use std::sync::{Arc, Mutex, PoisonError, Weak};

type Handler = Arc<dyn Fn() + Send + Sync>;

struct Subscription {
    id: u64,
    owner: String,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

/// Registry of click-outside handlers shared by one widget
#[derive(Clone, Default)]
pub struct BackdropListeners {
    registry: Arc<Mutex<Registry>>,
}

impl BackdropListeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `handler` on every click outside `owner` until the guard is dropped.
    #[must_use = "the subscription ends when the guard is dropped"]
    pub fn subscribe(
        &self,
        owner: impl Into<String>,
        handler: impl Fn() + Send + Sync + 'static,
    ) -> BackdropGuard {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.subscriptions.push(Subscription {
            id,
            owner: owner.into(),
            handler: Arc::new(handler),
        });
        BackdropGuard {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver a click on `target` (`None` for the page background).
    ///
    /// Returns the number of handlers called.
    pub fn dispatch_click(&self, target: Option<&str>) -> usize {
        // Handlers run outside the lock so they may subscribe or drop guards.
        let handlers: Vec<Handler> = {
            let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry
                .subscriptions
                .iter()
                .filter(|s| Some(s.owner.as_str()) != target)
                .map(|s| Arc::clone(&s.handler))
                .collect()
        };
        for handler in &handlers {
            handler();
        }
        handlers.len()
    }

    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscriptions
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes its subscription when dropped
pub struct BackdropGuard {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Drop for BackdropGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .subscriptions
                .retain(|s| s.id != self.id);
        }
    }
}
