//! Platform-agnostic widget host for the address widget.
//!
//! Provides `AddressWidget` (one widget instance and its services), `AddressWidgetBuilder`
//! (adapter injection) and `OutcomeDispatcher` (navigation outcomes raised by the widget).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use serde::Deserialize;
use uuid::Uuid;

use address_widget_core::error::{CoreError, CoreResult};
use address_widget_core::form_validations::{
    DefaultMessages, FieldErrors, FormValidations, MessageFormatter,
};
use address_widget_core::modal::{
    BackdropGuard, BackdropListeners, ModalEvent, ModalStore, ResolveContext,
};
use address_widget_core::services::{
    ActionMiddleware, AutocompleteDebouncer, ErrorReporter, GeoAddressService, LoaderIndicator,
    LogErrorReporter, NoopListener, PlaceResolution, ReferenceDataService, SaveOutcome,
    ServiceContext, SuggestionFetcher, ValidationWorkflow, WorkflowListener,
};
use address_widget_core::traits::{
    AddressManagementApi, AppStore, FormDataSource, InMemoryAppStore, NoopTagging, PlacesApi,
    StoreKey, TaggingSink, PAGE_ORDER_SUMMARY,
};
use address_widget_core::types::{
    AddressRecord, Coordinates, DisplayMode, Prediction, WidgetConfig,
};
use address_widget_core::views::{FormKind, FormLayout, FormView, WidgetView};

/// Debounce of the single-line geolocation input
const GEO_AUTOCOMPLETE_DELAY: Duration = Duration::from_millis(200);

// ===== Outcomes =====

/// Navigation outcomes the widget raises towards the host page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetOutcome {
    /// "Change" was clicked in View mode
    ChangeAddressClicked,
    EditInstallationAddress,
    InstallationAddressEditComplete,
}

/// Receives widget outcomes.
///
/// Use `NoopOutcomes` when the host page does not navigate on them.
pub trait OutcomeDispatcher: Send + Sync {
    fn dispatch(&self, outcome: WidgetOutcome);
}

/// Ignores every outcome.
pub struct NoopOutcomes;

impl OutcomeDispatcher for NoopOutcomes {
    fn dispatch(&self, _outcome: WidgetOutcome) {}
}

// ===== Props =====

/// Per-instance inputs supplied by the embedding page
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetProps {
    /// Address to load in View / Edit mode
    pub address_id: Option<String>,
    /// Address to show in View / Edit mode when no id is given
    pub address_details: Option<AddressRecord>,
    /// Render the single-line places form instead of the standard one
    pub use_geolocation: bool,
    /// Device position used to prefill a new address
    pub location: Option<Coordinates>,
    pub is_mobile_flow: bool,
    pub is_from_delivery_section: bool,
}

/// Result of [`AddressWidget::submit`] and [`AddressWidget::submit_manual`]
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Inline errors, keyed by form key; nothing was sent
    Invalid(FieldErrors),
    Saved(SaveOutcome),
}

// ===== Widget =====

/// One mounted address widget.
///
/// Holds the `ServiceContext`, the form state and every service of the instance. Hosts
/// construct it through `AddressWidgetBuilder`, then call `mount` once.
pub struct AddressWidget {
    /// Instance id, also the owner of its backdrop subscriptions
    pub instance_id: Uuid,
    pub ctx: Arc<ServiceContext>,
    pub config: Arc<WidgetConfig>,
    pub form: Arc<FormView>,
    /// Manual-entry form shown inside the disambiguation modal
    pub manual_form: FormView,
    pub workflow: ValidationWorkflow,
    pub reference_data: ReferenceDataService,
    pub geo: Arc<GeoAddressService>,
    pub validations: FormValidations,
    pub backdrop: BackdropListeners,
    autocomplete: Option<Arc<AutocompleteDebouncer<Prediction>>>,
    outcomes: Arc<dyn OutcomeDispatcher>,
    props: Mutex<WidgetProps>,
    display_mode: Mutex<DisplayMode>,
    show_street_number: AtomicBool,
    subscriptions: Mutex<Vec<BackdropGuard>>,
    mounted: AtomicBool,
}

impl AddressWidget {
    /// Load reference data and the initial address.
    ///
    /// Reference data and load-by-id failures are returned. A failed geolocation prefill is
    /// only logged. Mounting twice is a no-op.
    pub async fn mount(&self) -> CoreResult<()> {
        if self.mounted.swap(true, Ordering::SeqCst) {
            log::debug!("Widget {} already mounted", self.instance_id);
            return Ok(());
        }
        let mode = self.display_mode();
        log::info!("Mounting address widget {} in {mode:?} mode", self.instance_id);

        // 1. Reference data
        self.reference_data.load_countries().await?;
        let default_country = self.config.default_country.clone();
        if mode == DisplayMode::New {
            self.workflow
                .set_address_details(AddressRecord::with_country(&default_country));
        }
        self.reference_data.load_states(&default_country).await?;

        // 2. Initial address
        let props = self.props();
        match mode {
            DisplayMode::View
            | DisplayMode::Edit
            | DisplayMode::ViewInstallationAddress
            | DisplayMode::EditInstallationAddress => {
                if let Some(address_id) = props.address_id.as_deref() {
                    let address = self
                        .ctx
                        .middleware
                        .run(
                            "load_address_details",
                            self.ctx.address_api.load_address_details(address_id),
                        )
                        .await?;
                    self.workflow.set_address_details(address);
                } else if let Some(address) = props.address_details {
                    self.workflow.set_address_details(address);
                }
            }
            DisplayMode::New if self.config.enable_geolocation => {
                if let Some(location) = props.location {
                    self.prefill_from_location(location).await;
                }
            }
            _ => {}
        }

        // 3. Floating suggestion list closes on clicks elsewhere
        if let Some(autocomplete) = &self.autocomplete {
            let autocomplete = Arc::clone(autocomplete);
            let guard = self
                .backdrop
                .subscribe(self.suggestions_owner(), move || autocomplete.hide());
            self.lock_subscriptions().push(guard);
        }
        Ok(())
    }

    async fn prefill_from_location(&self, location: Coordinates) {
        match self.geo.address_at(location).await {
            Ok(address) => {
                log::debug!("Geolocation address: {address:?}");
                self.workflow.set_address_details(address);
            }
            Err(e) => log::error!("Geolocation prefill failed: {e}"),
        }
    }

    /// Reset the modal's manual-entry / click-to-call phases and release subscriptions.
    pub fn unmount(&self) {
        self.workflow.modal().dispatch(ModalEvent::Unmounted);
        self.lock_subscriptions().clear();
        if let Some(autocomplete) = &self.autocomplete {
            autocomplete.hide();
        }
        self.mounted.store(false, Ordering::SeqCst);
    }

    // ===== Views =====

    /// View for the current display mode
    pub async fn view(&self) -> WidgetView {
        let reference = self.reference_data.snapshot().await;
        let address = self.workflow.current_address().unwrap_or_default();
        WidgetView::for_mode(
            self.display_mode(),
            &self.config,
            self.props().use_geolocation,
            &address,
            &reference,
        )
    }

    pub fn display_mode(&self) -> DisplayMode {
        *self
            .display_mode
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn default_country(&self) -> &str {
        &self.config.default_country
    }

    /// Whether the user changed the address since the modal opened
    pub fn address_has_changed(&self) -> bool {
        self.workflow.modal().snapshot().address_has_changed
    }

    /// Whether the geolocation form must ask for a street number
    pub fn show_street_number(&self) -> bool {
        self.show_street_number.load(Ordering::SeqCst)
    }

    fn form_kind(&self) -> FormKind {
        if self.props().use_geolocation {
            FormKind::Geo
        } else {
            FormKind::Standard
        }
    }

    // ===== User actions =====

    /// Check the form inline, then validate and save it.
    pub async fn submit(&self) -> CoreResult<SubmitOutcome> {
        let kind = self.form_kind();
        let layout = FormLayout::new(kind, &self.config);
        let errors = self.form.validate(&self.validations, &layout);
        if !errors.is_empty() {
            log::debug!("Form has {} invalid field(s)", errors.len());
            return Ok(SubmitOutcome::Invalid(errors));
        }
        let address = self.form.address(kind);
        let outcome = self.workflow.validate_and_save(Some(address)).await?;
        Ok(SubmitOutcome::Saved(outcome))
    }

    /// Check the modal's manual form inline, then validate and save it.
    ///
    /// An invalid manual form leaves the modal and any pending confirmation untouched.
    pub async fn submit_manual(&self) -> CoreResult<SubmitOutcome> {
        let layout = FormLayout::new(FormKind::Manual, &self.config);
        let errors = self.manual_form.validate(&self.validations, &layout);
        if !errors.is_empty() {
            log::debug!("Manual form has {} invalid field(s)", errors.len());
            return Ok(SubmitOutcome::Invalid(errors));
        }
        let outcome = self
            .workflow
            .submit_manual_form(&self.manual_form.values())
            .await?;
        Ok(SubmitOutcome::Saved(outcome))
    }

    /// Store the selected province, clear the city and load the province's cities.
    pub async fn select_state(&self, state_id: &str) -> CoreResult<()> {
        self.form.select_state(state_id);
        self.reference_data
            .load_city(state_id, &self.config.default_country)
            .await?;
        Ok(())
    }

    /// Apply the chosen autocomplete prediction to the form.
    pub async fn select_place(&self, place_id: &str) -> CoreResult<PlaceResolution> {
        if let Some(autocomplete) = &self.autocomplete {
            autocomplete.hide();
        }
        let resolution = self.geo.resolve_place(place_id).await?;
        if let PlaceResolution::Resolved {
            updates,
            show_street_number,
        } = &resolution
        {
            self.form.update_fields(updates.clone());
            self.show_street_number
                .store(*show_street_number, Ordering::SeqCst);
        }
        Ok(resolution)
    }

    /// Forward autocomplete input. Returns whether a lookup was scheduled.
    pub fn autocomplete_input(&self, term: &str) -> bool {
        self.autocomplete
            .as_ref()
            .is_some_and(|autocomplete| autocomplete.on_input(term))
    }

    pub fn autocomplete(&self) -> Option<&Arc<AutocompleteDebouncer<Prediction>>> {
        self.autocomplete.as_ref()
    }

    /// Deliver a page click; `target` is the owner id of the clicked element, if any.
    pub fn click(&self, target: Option<&str>) -> usize {
        self.backdrop.dispatch_click(target)
    }

    /// Owner id of the suggestion list
    pub fn suggestions_owner(&self) -> String {
        format!("{}:suggestions", self.instance_id)
    }

    /// "Change" in View mode: switch to Edit with the current address.
    pub fn on_change_click(&self) {
        *self
            .display_mode
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = DisplayMode::Edit;
        if let Some(address) = self.workflow.current_address() {
            self.workflow.set_address_details(address);
        }
        self.outcomes.dispatch(WidgetOutcome::ChangeAddressClicked);
    }

    /// New address details from the embedding page; ignored when unchanged.
    pub fn set_address_details_prop(&self, address: Option<AddressRecord>) {
        let changed = {
            let mut props = self.lock_props();
            if props.address_details == address {
                false
            } else {
                props.address_details.clone_from(&address);
                true
            }
        };
        if changed {
            self.workflow
                .set_address_details(address.unwrap_or_default());
        }
    }

    // ===== Installation address =====

    /// Start editing the installation address. Only the order summary page may do so.
    pub async fn begin_installation_address_edit(&self, page: &str) -> CoreResult<bool> {
        if page != PAGE_ORDER_SUMMARY {
            log::debug!("Installation address edit ignored on page {page}");
            return Ok(false);
        }
        self.ctx
            .app_store
            .set(StoreKey::InstallationAddressEditMode, serde_json::Value::Bool(true))
            .await?;
        self.outcomes.dispatch(WidgetOutcome::EditInstallationAddress);
        Ok(true)
    }

    pub async fn finish_installation_address_edit(&self) -> CoreResult<()> {
        self.ctx
            .app_store
            .remove(StoreKey::InstallationAddressEditMode)
            .await?;
        self.outcomes
            .dispatch(WidgetOutcome::InstallationAddressEditComplete);
        Ok(())
    }

    pub async fn is_installation_address_edit(&self) -> CoreResult<bool> {
        let value = self
            .ctx
            .app_store
            .get(StoreKey::InstallationAddressEditMode)
            .await?;
        Ok(value
            .as_ref()
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false))
    }

    fn props(&self) -> WidgetProps {
        self.lock_props().clone()
    }

    fn lock_props(&self) -> std::sync::MutexGuard<'_, WidgetProps> {
        self.props.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscriptions(&self) -> std::sync::MutexGuard<'_, Vec<BackdropGuard>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// ===== Builder =====

/// Builder for constructing an `AddressWidget` with host-specific adapters.
///
/// # Required adapters
/// - `address_api`: address management backend
/// - `places_api`: places / geocoding provider
///
/// # Optional
/// - `app_store`: defaults to `InMemoryAppStore`
/// - `tagging`: defaults to `NoopTagging`
/// - `error_reporter`: defaults to `LogErrorReporter`
/// - `loader`, `listener`, `outcomes`, `messages`, `config`, `props`
pub struct AddressWidgetBuilder {
    address_api: Option<Arc<dyn AddressManagementApi>>,
    places_api: Option<Arc<dyn PlacesApi>>,
    app_store: Option<Arc<dyn AppStore>>,
    tagging: Option<Arc<dyn TaggingSink>>,
    loader: Option<Arc<dyn LoaderIndicator>>,
    error_reporter: Option<Arc<dyn ErrorReporter>>,
    listener: Option<Arc<dyn WorkflowListener>>,
    outcomes: Option<Arc<dyn OutcomeDispatcher>>,
    messages: Option<Arc<dyn MessageFormatter>>,
    config: WidgetConfig,
    props: WidgetProps,
}

impl AddressWidgetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            address_api: None,
            places_api: None,
            app_store: None,
            tagging: None,
            loader: None,
            error_reporter: None,
            listener: None,
            outcomes: None,
            messages: None,
            config: WidgetConfig::default(),
            props: WidgetProps::default(),
        }
    }

    #[must_use]
    pub fn address_api(mut self, api: Arc<dyn AddressManagementApi>) -> Self {
        self.address_api = Some(api);
        self
    }

    #[must_use]
    pub fn places_api(mut self, api: Arc<dyn PlacesApi>) -> Self {
        self.places_api = Some(api);
        self
    }

    #[must_use]
    pub fn app_store(mut self, store: Arc<dyn AppStore>) -> Self {
        self.app_store = Some(store);
        self
    }

    #[must_use]
    pub fn tagging(mut self, tagging: Arc<dyn TaggingSink>) -> Self {
        self.tagging = Some(tagging);
        self
    }

    #[must_use]
    pub fn loader(mut self, loader: Arc<dyn LoaderIndicator>) -> Self {
        self.loader = Some(loader);
        self
    }

    #[must_use]
    pub fn error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = Some(reporter);
        self
    }

    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn WorkflowListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    #[must_use]
    pub fn outcomes(mut self, outcomes: Arc<dyn OutcomeDispatcher>) -> Self {
        self.outcomes = Some(outcomes);
        self
    }

    #[must_use]
    pub fn messages(mut self, messages: Arc<dyn MessageFormatter>) -> Self {
        self.messages = Some(messages);
        self
    }

    #[must_use]
    pub fn config(mut self, config: WidgetConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn props(mut self, props: WidgetProps) -> Self {
        self.props = props;
        self
    }

    /// Build the `AddressWidget`.
    ///
    /// # Errors
    /// Returns `CoreError::ValidationError` if required adapters are missing, or
    /// `CoreError::ConfigError` if the configuration is inconsistent.
    pub fn build(self) -> CoreResult<AddressWidget> {
        let address_api = self
            .address_api
            .ok_or_else(|| CoreError::ValidationError("address_api is required".to_string()))?;
        let places_api = self
            .places_api
            .ok_or_else(|| CoreError::ValidationError("places_api is required".to_string()))?;
        self.config.validate()?;

        let app_store = self
            .app_store
            .unwrap_or_else(|| Arc::new(InMemoryAppStore::new()));
        let tagging = self.tagging.unwrap_or_else(|| Arc::new(NoopTagging));
        let errors = self
            .error_reporter
            .unwrap_or_else(|| Arc::new(LogErrorReporter));
        let ctx = Arc::new(
            ServiceContext::new(address_api, places_api, app_store)
                .with_tagging(tagging)
                .with_middleware(ActionMiddleware::new(self.loader, errors)),
        );

        let config = Arc::new(self.config);
        let messages = self.messages.unwrap_or_else(|| Arc::new(DefaultMessages));
        let validations = FormValidations::new(&config, messages.as_ref());

        let form = Arc::new(FormView::new());
        let form_source: Arc<dyn FormDataSource> = form.clone();
        let flow = ResolveContext {
            is_mobile_flow: self.props.is_mobile_flow,
            is_from_delivery_section: self.props.is_from_delivery_section,
        };
        let workflow = ValidationWorkflow::new(
            Arc::clone(&ctx),
            Arc::clone(&config),
            form_source,
            Arc::new(ModalStore::new()),
        )
        .with_listener(self.listener.unwrap_or_else(|| Arc::new(NoopListener)))
        .with_flow(flow);

        let reference_data = ReferenceDataService::new(Arc::clone(&ctx));
        let geo = Arc::new(GeoAddressService::new(Arc::clone(&ctx)));
        let autocomplete = (config.address_auto_complete || self.props.use_geolocation).then(|| {
            let debouncer = AutocompleteDebouncer::new(prediction_fetcher(&geo), &config);
            let debouncer = if self.props.use_geolocation {
                debouncer.with_delay(GEO_AUTOCOMPLETE_DELAY)
            } else {
                debouncer
            };
            Arc::new(debouncer)
        });

        let instance_id = Uuid::new_v4();
        log::debug!("Built address widget {instance_id}");
        Ok(AddressWidget {
            instance_id,
            ctx,
            display_mode: Mutex::new(config.display_mode),
            config,
            form,
            manual_form: FormView::new(),
            workflow,
            reference_data,
            geo,
            validations,
            backdrop: BackdropListeners::new(),
            autocomplete,
            outcomes: self.outcomes.unwrap_or_else(|| Arc::new(NoopOutcomes)),
            props: Mutex::new(self.props),
            show_street_number: AtomicBool::new(false),
            subscriptions: Mutex::new(Vec::new()),
            mounted: AtomicBool::new(false),
        })
    }
}

impl Default for AddressWidgetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn prediction_fetcher(geo: &Arc<GeoAddressService>) -> SuggestionFetcher<Prediction> {
    let geo = Arc::clone(geo);
    Arc::new(move |term: String| {
        let geo = Arc::clone(&geo);
        async move { geo.predictions(&term).await }.boxed()
    })
}
