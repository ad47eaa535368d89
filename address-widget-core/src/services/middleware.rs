//! Loader / error-display wrapping of collaborator calls

use std::future::Future;
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};

/// Busy indicator shown while an action runs
pub trait LoaderIndicator: Send + Sync {
    fn show(&self, action: &str);
    fn hide(&self, action: &str);
}

/// Surface for failed actions (toast, banner...)
pub trait ErrorReporter: Send + Sync {
    fn report(&self, action: &str, error: &CoreError);
}

/// Reporter that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorReporter;

impl ErrorReporter for LogErrorReporter {
    fn report(&self, action: &str, error: &CoreError) {
        if error.is_expected() {
            log::warn!("{action} failed: {error}");
        } else {
            log::error!("{action} failed: {error}");
        }
    }
}

/// Hides the loader on every exit path, including cancellation.
struct LoaderGuard<'a> {
    loader: &'a dyn LoaderIndicator,
    action: &'static str,
}

impl<'a> LoaderGuard<'a> {
    fn show(loader: &'a dyn LoaderIndicator, action: &'static str) -> Self {
        loader.show(action);
        Self { loader, action }
    }
}

impl Drop for LoaderGuard<'_> {
    fn drop(&mut self) {
        self.loader.hide(self.action);
    }
}

/// Explicit wrapper around collaborator calls
///
/// Shows the loader (when one is configured) for the duration of the call and hands failures
/// to the error reporter before returning them unchanged.
#[derive(Clone)]
pub struct ActionMiddleware {
    loader: Option<Arc<dyn LoaderIndicator>>,
    errors: Arc<dyn ErrorReporter>,
}

impl ActionMiddleware {
    #[must_use]
    pub fn new(loader: Option<Arc<dyn LoaderIndicator>>, errors: Arc<dyn ErrorReporter>) -> Self {
        Self { loader, errors }
    }

    /// No loader, errors are logged.
    #[must_use]
    pub fn silent() -> Self {
        Self::new(None, Arc::new(LogErrorReporter))
    }

    /// Same error reporting, no loader.
    #[must_use]
    pub fn without_loader(&self) -> Self {
        Self {
            loader: None,
            errors: Arc::clone(&self.errors),
        }
    }

    pub async fn run<T, F>(&self, action: &'static str, call: F) -> CoreResult<T>
    where
        F: Future<Output = CoreResult<T>> + Send,
    {
        let guard = self
            .loader
            .as_deref()
            .map(|loader| LoaderGuard::show(loader, action));
        let result = call.await;
        drop(guard);

        if let Err(e) = &result {
            self.errors.report(action, e);
        }
        result
    }
}

impl Default for ActionMiddleware {
    fn default() -> Self {
        Self::silent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl LoaderIndicator for Recorder {
        fn show(&self, action: &str) {
            self.events.lock().unwrap().push(format!("show {action}"));
        }
        fn hide(&self, action: &str) {
            self.events.lock().unwrap().push(format!("hide {action}"));
        }
    }

    impl ErrorReporter for Recorder {
        fn report(&self, action: &str, error: &CoreError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error {action}: {error}"));
        }
    }

    fn middleware_for(recorder: &Arc<Recorder>) -> ActionMiddleware {
        let loader: Arc<dyn LoaderIndicator> = recorder.clone();
        ActionMiddleware::new(Some(loader), recorder.clone())
    }

    #[tokio::test]
    async fn loader_wraps_successful_call() {
        let recorder = Arc::new(Recorder::default());
        let middleware = middleware_for(&recorder);

        let value = middleware.run("load", async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
        assert_eq!(recorder.events(), vec!["show load", "hide load"]);
    }

    #[tokio::test]
    async fn failure_hides_loader_then_reports() {
        let recorder = Arc::new(Recorder::default());
        let middleware = middleware_for(&recorder);

        let result: CoreResult<()> = middleware
            .run("create", async { Err(CoreError::service("create", "503")) })
            .await;
        assert!(result.is_err());
        assert_eq!(
            recorder.events(),
            vec![
                "show create",
                "hide create",
                "error create: Service error: create - 503"
            ]
        );
    }

    #[tokio::test]
    async fn without_loader_keeps_reporter() {
        let recorder = Arc::new(Recorder::default());
        let middleware = middleware_for(&recorder).without_loader();

        let _: CoreResult<()> = middleware
            .run("validate", async { Err(CoreError::NoCandidate) })
            .await;
        assert_eq!(
            recorder.events(),
            vec!["error validate: No candidate address available"]
        );
    }
}
