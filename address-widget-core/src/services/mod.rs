//! Service layer

mod autocomplete;
mod geolocation_service;
mod middleware;
mod reference_data_service;
mod validation_workflow;

pub use autocomplete::{filter_suggestions, AutocompleteDebouncer, SuggestionFetcher, Suggestions};
pub use geolocation_service::{GeoAddressService, PlaceResolution};
pub use middleware::{ActionMiddleware, ErrorReporter, LoaderIndicator, LogErrorReporter};
pub use reference_data_service::ReferenceDataService;
pub use validation_workflow::{
    AttemptToken, Disambiguation, NoopListener, PendingConfirmation, SaveOutcome,
    ValidateOnlyOutcome, ValidationWorkflow, WorkflowListener,
};

use std::sync::Arc;

use crate::traits::{AddressManagementApi, AppStore, NoopTagging, PlacesApi, TaggingSink};

/// Service context holding every collaborator
///
/// The host creates this context and injects its collaborator implementations.
pub struct ServiceContext {
    /// Address management backend
    pub address_api: Arc<dyn AddressManagementApi>,
    /// Places / geocoding provider
    pub places_api: Arc<dyn PlacesApi>,
    /// Shared application store
    pub app_store: Arc<dyn AppStore>,
    /// Analytics
    pub tagging: Arc<dyn TaggingSink>,
    /// Loader and error display around collaborator calls
    pub middleware: ActionMiddleware,
}

impl ServiceContext {
    /// Create a service context
    #[must_use]
    pub fn new(
        address_api: Arc<dyn AddressManagementApi>,
        places_api: Arc<dyn PlacesApi>,
        app_store: Arc<dyn AppStore>,
    ) -> Self {
        Self {
            address_api,
            places_api,
            app_store,
            tagging: Arc::new(NoopTagging),
            middleware: ActionMiddleware::silent(),
        }
    }

    #[must_use]
    pub fn with_tagging(mut self, tagging: Arc<dyn TaggingSink>) -> Self {
        self.tagging = tagging;
        self
    }

    #[must_use]
    pub fn with_middleware(mut self, middleware: ActionMiddleware) -> Self {
        self.middleware = middleware;
        self
    }
}
