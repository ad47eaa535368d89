//! Widget configuration

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Widget operating mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayMode {
    View,
    #[default]
    New,
    Edit,
    None,
    NewInstallationAddress,
    EditInstallationAddress,
    ViewInstallationAddress,
    Serviceability,
}

impl DisplayMode {
    /// Modes in which the postal code must have an exact length.
    pub fn requires_exact_postal_code(self) -> bool {
        matches!(self, Self::Serviceability | Self::NewInstallationAddress)
    }
}

/// Behavior parameters of one widget instance.
///
/// Supplied once per instance and read-only for the session. Every field has a default, so a
/// partial JSON document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct WidgetConfig {
    pub display_mode: DisplayMode,
    pub show_submit: bool,
    pub create_address_upon_submit: bool,
    pub show_change_link_in_view_mode: bool,

    // ===== Field visibility =====
    pub show_address_line2: bool,
    pub show_address_line3: bool,
    pub show_city: bool,
    pub show_state: bool,
    pub show_postal_code: bool,
    pub show_country: bool,
    pub show_mailbox: bool,
    pub show_frazione: bool,

    // ===== Mandatory fields =====
    pub validate_mandatory_city: bool,
    pub validate_mandatory_country: bool,
    pub validate_mandatory_state: bool,
    pub validate_mandatory_postal_code: bool,

    // ===== Length limits =====
    pub address_line1_max_chars: usize,
    pub address_line2_max_chars: usize,
    pub address_line3_max_chars: usize,
    pub street_number_max_chars: usize,
    pub mail_box_chars: usize,
    pub postal_code_max_chars: usize,
    pub postal_code_length_for_validation: usize,

    // ===== Autocomplete =====
    pub address_auto_complete: bool,
    pub minimum_chars_for_auto_complete: usize,
    /// Debounce interval in milliseconds
    pub minimum_time_for_auto_complete_repeat: u64,

    // ===== Disambiguation modal =====
    pub min_number_of_address_results_to_display: usize,
    pub max_number_of_address_results_to_display: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctc_url_for_manual: Option<String>,

    // ===== Workflow =====
    pub force_validate: bool,
    pub new_horizontal_design: bool,
    pub enable_geolocation: bool,

    pub default_country: String,
    pub address_details_separator: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::New,
            show_submit: true,
            create_address_upon_submit: false,
            show_change_link_in_view_mode: true,
            show_address_line2: true,
            show_address_line3: true,
            show_city: true,
            show_state: true,
            show_postal_code: true,
            show_country: true,
            show_mailbox: false,
            show_frazione: false,
            validate_mandatory_city: true,
            validate_mandatory_country: true,
            validate_mandatory_state: false,
            validate_mandatory_postal_code: true,
            address_line1_max_chars: 50,
            address_line2_max_chars: 50,
            address_line3_max_chars: 50,
            street_number_max_chars: 20,
            mail_box_chars: 10,
            postal_code_max_chars: 5,
            postal_code_length_for_validation: 5,
            address_auto_complete: false,
            minimum_chars_for_auto_complete: 3,
            minimum_time_for_auto_complete_repeat: 1000,
            min_number_of_address_results_to_display: 5,
            max_number_of_address_results_to_display: 30,
            ctc_url_for_manual: None,
            force_validate: false,
            new_horizontal_design: false,
            enable_geolocation: false,
            default_country: "IT".to_string(),
            address_details_separator: ",".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Parse a (possibly partial) camelCase JSON document and validate it.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject limits that cannot work together.
    pub fn validate(&self) -> CoreResult<()> {
        if self.address_line1_max_chars == 0 {
            return Err(CoreError::ConfigError(
                "addressLine1MaxChars must be greater than 0".to_string(),
            ));
        }
        if self.min_number_of_address_results_to_display
            > self.max_number_of_address_results_to_display
        {
            return Err(CoreError::ConfigError(format!(
                "minNumberOfAddressResultsToDisplay ({}) exceeds maxNumberOfAddressResultsToDisplay ({})",
                self.min_number_of_address_results_to_display,
                self.max_number_of_address_results_to_display
            )));
        }
        if self.address_details_separator.is_empty() {
            return Err(CoreError::ConfigError(
                "addressDetailsSeparator cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Enabled display lines (line 1 is always on).
    pub fn enabled_address_lines(&self) -> usize {
        1 + usize::from(self.show_address_line2) + usize::from(self.show_address_line3)
    }
}
