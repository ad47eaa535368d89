//! Address management service abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{AddressRecord, RefItem, ValidationResult};

/// Address management backend
///
/// Owns reference data, address validation and address persistence. The transport is up to
/// the host; errors surface as [`crate::CoreError::ServiceError`] and are never retried.
#[async_trait]
pub trait AddressManagementApi: Send + Sync {
    /// Countries available for selection
    async fn load_countries(&self) -> CoreResult<Vec<RefItem>>;

    /// States / provinces of one country
    ///
    /// # Arguments
    /// * `country_id` - Country code
    async fn load_states(&self, country_id: &str) -> CoreResult<Vec<RefItem>>;

    /// Cities of one state
    ///
    /// # Arguments
    /// * `state_id` - State / province code
    /// * `country_id` - Country code
    async fn load_city(&self, state_id: &str, country_id: &str) -> CoreResult<Vec<RefItem>>;

    /// Validate an address and return the normalized candidates
    async fn validate_address(&self, address: &AddressRecord) -> CoreResult<ValidationResult>;

    /// Persist an accepted address; the returned record carries the server-assigned id
    async fn create_address(&self, address: &AddressRecord) -> CoreResult<AddressRecord>;

    /// Load a stored address
    ///
    /// # Arguments
    /// * `address_id` - Address ID
    async fn load_address_details(&self, address_id: &str) -> CoreResult<AddressRecord>;
}
