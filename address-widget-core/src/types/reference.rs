//! Reference data (countries / states / cities)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A code + display name pair from a reference list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefItem {
    /// Internal id (countries are matched on it)
    #[serde(default)]
    pub id: String,
    /// Code (states are matched on it)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

impl RefItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: display_name.into(),
        }
    }
}

/// States keyed by country code
pub type StatesByCountry = HashMap<String, Vec<RefItem>>;

/// Cached reference data of one widget
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceData {
    pub countries: Vec<RefItem>,
    pub states: StatesByCountry,
    pub cities: Vec<RefItem>,
}
