//! Places / geocoding provider types

use serde::{Deserialize, Serialize};

/// Component type tags used by the places provider
pub mod component_type {
    pub const POSTAL_CODE: &str = "postal_code";
    pub const CITY: &str = "administrative_area_level_3";
    pub const CITY_LOCALITY: &str = "locality";
    pub const STATE_PROVINCE: &str = "administrative_area_level_2";
    pub const STREET: &str = "route";
    pub const STREET_NUMBER: &str = "street_number";
}

/// Geographic coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Autocomplete prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub place_id: String,
    pub description: String,
}

/// One typed component of a geocoded address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponent {
    #[serde(default)]
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    pub fn new(short_name: impl Into<String>, types: &[&str]) -> Self {
        let short_name = short_name.into();
        Self {
            long_name: short_name.clone(),
            short_name,
            types: types.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    pub fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}

/// Place details (also the shape of reverse-geocode responses)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub location: Option<Coordinates>,
}

impl PlaceDetails {
    /// Short name of the first component tagged `kind`.
    ///
    /// When nothing matches, falls back to the first component tagged `alternate`.
    pub fn component(&self, kind: &str, alternate: Option<&str>) -> Option<&str> {
        self.address_components
            .iter()
            .find(|c| c.has_type(kind))
            .or_else(|| {
                alternate.and_then(|alt| self.address_components.iter().find(|c| c.has_type(alt)))
            })
            .map(|c| c.short_name.as_str())
    }
}
