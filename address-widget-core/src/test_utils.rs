//! Test helpers
//!
//! Mock collaborators and factory functions for service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::services::{ServiceContext, WorkflowListener};
use crate::traits::{FormDataSource, InMemoryAppStore, PlacesApi, TagEvent, TaggingSink};
use crate::traits::AddressManagementApi;
use crate::types::{
    AddressRecord, Coordinates, FormValues, PlaceDetails, Prediction, RefItem, ValidationResult,
};

// ===== MockAddressApi =====

/// Scripted validate response, optionally delayed
pub struct ScriptedValidation {
    pub result: CoreResult<ValidationResult>,
    pub delay: Option<Duration>,
}

pub struct MockAddressApi {
    countries: RwLock<Vec<RefItem>>,
    states: RwLock<HashMap<String, Vec<RefItem>>>,
    cities: RwLock<Vec<RefItem>>,
    stored: RwLock<HashMap<String, AddressRecord>>,
    validations: Mutex<VecDeque<ScriptedValidation>>,
    /// Returned by `create_address` when set
    create_error: RwLock<Option<String>>,
    pub calls: Mutex<Vec<String>>,
    pub validated: Mutex<Vec<AddressRecord>>,
    pub created: Mutex<Vec<AddressRecord>>,
}

impl MockAddressApi {
    pub fn new() -> Self {
        Self {
            countries: RwLock::new(vec![
                RefItem::new("IT", "IT", "Italia"),
                RefItem::new("FR", "FR", "France"),
            ]),
            states: RwLock::new(HashMap::from([(
                "IT".to_string(),
                vec![
                    RefItem::new("RM", "RM", "Roma"),
                    RefItem::new("MI", "MI", "Milano"),
                ],
            )])),
            cities: RwLock::new(vec![RefItem::new("ROMA", "ROMA", "Roma")]),
            stored: RwLock::new(HashMap::new()),
            validations: Mutex::new(VecDeque::new()),
            create_error: RwLock::new(None),
            calls: Mutex::new(Vec::new()),
            validated: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn push_validation(&self, result: ValidationResult) {
        self.push_scripted(Ok(result), None);
    }

    pub fn push_delayed_validation(&self, result: ValidationResult, delay: Duration) {
        self.push_scripted(Ok(result), Some(delay));
    }

    pub fn push_validation_error(&self, message: &str) {
        self.push_scripted(Err(CoreError::service("validate_address", message)), None);
    }

    fn push_scripted(&self, result: CoreResult<ValidationResult>, delay: Option<Duration>) {
        self.validations
            .lock()
            .unwrap()
            .push_back(ScriptedValidation { result, delay });
    }

    pub async fn set_create_error(&self, err: Option<String>) {
        *self.create_error.write().await = err;
    }

    pub async fn store(&self, id: &str, address: AddressRecord) {
        self.stored.write().await.insert(id.to_string(), address);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(name)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AddressManagementApi for MockAddressApi {
    async fn load_countries(&self) -> CoreResult<Vec<RefItem>> {
        self.record("load_countries".to_string());
        Ok(self.countries.read().await.clone())
    }

    async fn load_states(&self, country_id: &str) -> CoreResult<Vec<RefItem>> {
        self.record(format!("load_states {country_id}"));
        Ok(self
            .states
            .read()
            .await
            .get(country_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn load_city(&self, state_id: &str, country_id: &str) -> CoreResult<Vec<RefItem>> {
        self.record(format!("load_city {state_id} {country_id}"));
        Ok(self.cities.read().await.clone())
    }

    async fn validate_address(&self, address: &AddressRecord) -> CoreResult<ValidationResult> {
        self.record("validate_address".to_string());
        self.validated.lock().unwrap().push(address.clone());
        let scripted = self.validations.lock().unwrap().pop_front();
        let Some(scripted) = scripted else {
            return Ok(ValidationResult::accepted(address.clone()));
        };
        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        scripted.result
    }

    async fn create_address(&self, address: &AddressRecord) -> CoreResult<AddressRecord> {
        self.record("create_address".to_string());
        if let Some(ref msg) = *self.create_error.read().await {
            return Err(CoreError::service("create_address", msg.clone()));
        }
        let mut created = self.created.lock().unwrap();
        created.push(address.clone());
        Ok(AddressRecord {
            id: Some(format!("addr-{}", created.len())),
            ..address.clone()
        })
    }

    async fn load_address_details(&self, address_id: &str) -> CoreResult<AddressRecord> {
        self.record(format!("load_address_details {address_id}"));
        self.stored
            .read()
            .await
            .get(address_id)
            .cloned()
            .ok_or_else(|| CoreError::AddressNotFound(address_id.to_string()))
    }
}

// ===== MockPlacesApi =====

pub struct MockPlacesApi {
    predictions: RwLock<Vec<Prediction>>,
    details: RwLock<HashMap<String, PlaceDetails>>,
    reverse: RwLock<PlaceDetails>,
    pub reverse_calls: Mutex<Vec<Coordinates>>,
}

impl MockPlacesApi {
    pub fn new() -> Self {
        Self {
            predictions: RwLock::new(Vec::new()),
            details: RwLock::new(HashMap::new()),
            reverse: RwLock::new(PlaceDetails::default()),
            reverse_calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn set_predictions(&self, predictions: Vec<Prediction>) {
        *self.predictions.write().await = predictions;
    }

    pub async fn add_place(&self, place_id: &str, details: PlaceDetails) {
        self.details
            .write()
            .await
            .insert(place_id.to_string(), details);
    }

    pub async fn set_reverse(&self, details: PlaceDetails) {
        *self.reverse.write().await = details;
    }
}

#[async_trait]
impl PlacesApi for MockPlacesApi {
    async fn get_places_predictions(&self, term: &str) -> CoreResult<Vec<Prediction>> {
        let term = term.to_lowercase();
        Ok(self
            .predictions
            .read()
            .await
            .iter()
            .filter(|p| p.description.to_lowercase().contains(&term))
            .cloned()
            .collect())
    }

    async fn get_place_details(&self, place_id: &str) -> CoreResult<PlaceDetails> {
        self.details
            .read()
            .await
            .get(place_id)
            .cloned()
            .ok_or_else(|| CoreError::PlaceNotFound(place_id.to_string()))
    }

    async fn get_address_details_reverse_geocode(
        &self,
        location: Coordinates,
    ) -> CoreResult<PlaceDetails> {
        self.reverse_calls.lock().unwrap().push(location);
        Ok(self.reverse.read().await.clone())
    }
}

// ===== Form / listener / tagging =====

#[derive(Default)]
pub struct MockForm {
    values: Mutex<FormValues>,
}

impl MockForm {
    pub fn with_values(values: serde_json::Value) -> Self {
        Self {
            values: Mutex::new(values.as_object().cloned().unwrap_or_default()),
        }
    }
}

impl FormDataSource for MockForm {
    fn values(&self) -> FormValues {
        self.values.lock().unwrap().clone()
    }

    fn update_fields(&self, updates: FormValues) {
        self.values.lock().unwrap().extend(updates);
    }
}

#[derive(Default)]
pub struct RecordingListener {
    pub events: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl WorkflowListener for RecordingListener {
    fn on_address_created(&self, address: &AddressRecord) {
        self.events.lock().unwrap().push(format!(
            "created {}",
            address.id.as_deref().unwrap_or("-")
        ));
    }

    fn on_check_availability(&self) {
        self.events
            .lock()
            .unwrap()
            .push("check_availability".to_string());
    }

    fn on_address_details_changed(&self, address: &AddressRecord) {
        self.events.lock().unwrap().push(format!(
            "details {}",
            address.street.as_deref().unwrap_or("-")
        ));
    }

    fn on_horizontal_popup(&self, visible: bool) {
        self.events
            .lock()
            .unwrap()
            .push(format!("horizontal_popup {visible}"));
    }
}

#[derive(Default)]
pub struct RecordingTagging {
    pub events: Mutex<Vec<TagEvent>>,
}

impl TaggingSink for RecordingTagging {
    fn tag(&self, event: TagEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ===== Factories =====

pub struct TestContext {
    pub ctx: Arc<ServiceContext>,
    pub address_api: Arc<MockAddressApi>,
    pub places_api: Arc<MockPlacesApi>,
    pub tagging: Arc<RecordingTagging>,
}

/// `ServiceContext` wired to the mocks
pub fn create_test_context() -> TestContext {
    let address_api = Arc::new(MockAddressApi::new());
    let places_api = Arc::new(MockPlacesApi::new());
    let tagging = Arc::new(RecordingTagging::default());
    let ctx = ServiceContext::new(
        address_api.clone(),
        places_api.clone(),
        Arc::new(InMemoryAppStore::new()),
    )
    .with_tagging(tagging.clone());
    TestContext {
        ctx: Arc::new(ctx),
        address_api,
        places_api,
        tagging,
    }
}

pub fn via_roma() -> AddressRecord {
    AddressRecord {
        street: Some("Via Roma".to_string()),
        street_number: Some("12".to_string()),
        city: Some("Roma".to_string()),
        state_or_province: Some("RM".to_string()),
        postal_code: Some("00100".to_string()),
        country: Some("IT".to_string()),
        ..AddressRecord::default()
    }
}
