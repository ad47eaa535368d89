//! Type definitions

mod address;
mod config;
mod places;
mod reference;
mod validation;

pub use address::{AddressRecord, FormValues};
pub use config::{DisplayMode, WidgetConfig};
pub use places::{component_type, AddressComponent, Coordinates, PlaceDetails, Prediction};
pub use reference::{RefItem, ReferenceData, StatesByCountry};
pub use validation::{AddressStatus, ErrorCode, ValidationResult};
