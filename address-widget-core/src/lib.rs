//! Address Widget Core Library
//!
//! Provides the core logic of the postal-address widget, including:
//! - Address formatting and parsing (`formatter`)
//! - Form field constraints (`form_validations`)
//! - The validation / disambiguation workflow (`services::ValidationWorkflow`)
//! - Modal state and display-mode resolution (`modal`)
//! - Reference data, geolocation and autocomplete services (`services`)
//! - Form layouts and form state (`views`)
//!
//! This library is UI-toolkit independent. Every external service (address management,
//! places, app store, tagging) is abstracted through traits and injected by the host.

pub mod error;
pub mod form_validations;
pub mod formatter;
pub mod modal;
pub mod services;
pub mod traits;
pub mod types;
pub mod views;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::ServiceContext;
pub use traits::{AddressManagementApi, AppStore, FormDataSource, PlacesApi, TaggingSink};
