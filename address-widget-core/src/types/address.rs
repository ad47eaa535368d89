//! Address record type definitions

use serde::{Deserialize, Serialize};

/// Raw form values as produced by the form layer.
///
/// Either a nested `{"address": {...}}` object or flat dotted keys (`"address.street"`).
pub type FormValues = serde_json::Map<String, serde_json::Value>;

/// Normalized structured address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    /// Server-assigned id (only after create)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_or_province: Option<String>,

    /// Display name of the state, when the form carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_state_or_province: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_box: Option<String>,

    /// Italian sub-locality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frazione: Option<String>,

    /// Full single-line address as returned by providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// Display lines 1-3 produced by line splitting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address1: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address2: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address3: Option<String>,
}

impl AddressRecord {
    /// Address carrying only a country code (New mode seed).
    #[must_use]
    pub fn with_country(country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            ..Self::default()
        }
    }

    /// Replace the mailbox with the one the user typed in the form.
    #[must_use]
    pub fn merge_mail_box(mut self, mail_box: Option<String>) -> Self {
        self.mail_box = mail_box;
        self
    }

    /// Whether the record has no street (the widget treats it as empty).
    pub fn is_blank(&self) -> bool {
        self.street.as_deref().is_none_or(str::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_with_missing_fields() {
        let json = r#"{"street":"Via Roma","streetNumber":"12","stateOrProvince":"RM"}"#;
        let address: AddressRecord = serde_json::from_str(json).unwrap();
        assert_eq!(address.street.as_deref(), Some("Via Roma"));
        assert_eq!(address.street_number.as_deref(), Some("12"));
        assert_eq!(address.state_or_province.as_deref(), Some("RM"));
        assert!(address.city.is_none());
    }

    #[test]
    fn merge_mail_box_overrides_candidate_value() {
        let candidate = AddressRecord {
            mail_box: Some("old".to_string()),
            ..AddressRecord::default()
        };
        let merged = candidate.merge_mail_box(Some("B7".to_string()));
        assert_eq!(merged.mail_box.as_deref(), Some("B7"));
    }

    #[test]
    fn blank_when_street_missing_or_empty() {
        assert!(AddressRecord::default().is_blank());
        assert!(AddressRecord::with_country("IT").is_blank());
        let address = AddressRecord {
            street: Some("Main St".to_string()),
            ..AddressRecord::default()
        };
        assert!(!address.is_blank());
    }
}
