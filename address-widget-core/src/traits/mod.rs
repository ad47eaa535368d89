//! Collaborator ports consumed by the widget

mod address_management;
mod app_store;
mod form_data;
mod places;
mod tagging;

pub use address_management::AddressManagementApi;
pub use app_store::{AppStore, InMemoryAppStore, StoreKey, PAGE_ORDER_SUMMARY};
pub use form_data::FormDataSource;
pub use places::PlacesApi;
pub use tagging::{NoopTagging, TagEvent, TaggingSink};
