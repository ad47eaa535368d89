//! Address form field constraints
//!
//! A fixed catalog of per-field rules, extended by the mandatory-field flags and display mode
//! of the widget configuration. Every rule carries a localized message and an error category.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::formatter::value_to_string;
use crate::types::{FormValues, WidgetConfig};

/// Error category attached to each rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    MissingMandatory,
    FormatValidation,
}

/// Localized message lookup
///
/// `key` identifies the message; `args` are substituted into `{name}` placeholders.
pub trait MessageFormatter: Send + Sync {
    fn format(&self, key: &str, args: &[(&str, String)]) -> String;
}

/// Built-in English messages
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMessages;

impl DefaultMessages {
    fn template(key: &str) -> &str {
        match key {
            "address_line_1_label" => "Address",
            "address_line_2_label" => "Address line 2",
            "address_line_3_label" => "Address line 3",
            "road_street_other" => "Road, street or other",
            "street_number" => "Street number",
            "street_number_manual" => "Street number",
            "address_details_title_part_2" => "Full address",
            "province" => "Province",
            "city" | "address_city_label" => "City",
            "postal_code" | "address_postalCode_label" => "Postal code",
            "address_country_label" => "Country",
            "address_state_label" => "State",
            "mail_box" => "Mailbox",
            "address_line_1_validation_presence" => "Please enter an address",
            "address_line_1_validation_max_length" => {
                "Address cannot exceed {maxLength} characters"
            }
            "address_line_2_validation_max_length" => {
                "Address line 2 cannot exceed {maxLength} characters"
            }
            "address_line_3_validation_max_length" => {
                "Address line 3 cannot exceed {maxLength} characters"
            }
            "street_number_validation_presence" => "Please enter a street number",
            "street_number_validation_length" => {
                "Street number cannot exceed {maxLength} characters"
            }
            "full_address_validation_presence" => "Please enter the full address",
            "province_validation_presence" => "Please select a province",
            "city_validation_presence" => "Please enter a city",
            "country_validation_presence" => "Please select a country",
            "state_validation_presence" => "Please select a state",
            "postal_code_validation_presence" | "postalCode_validation_presence" => {
                "Please enter a postal code"
            }
            "postal_code_validation_max_length" => {
                "Postal code must be {maxLength} characters"
            }
            "postal_code_validation_length" => "Postal code must be {length} characters",
            "mail_box_validation_max_length" => "Mailbox cannot exceed {maxLength} characters",
            other => other,
        }
    }
}

impl MessageFormatter for DefaultMessages {
    fn format(&self, key: &str, args: &[(&str, String)]) -> String {
        args.iter()
            .fold(Self::template(key).to_string(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}

/// Message reported when a rule is violated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMessage {
    pub id: &'static str,
    pub message: String,
    pub field_label: String,
    pub error_category: ErrorCategory,
}

/// A single constraint, measured in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Presence,
    MaxLength(usize),
    MinLength(usize),
    ExactLength(usize),
}

impl Constraint {
    /// Length constraints only apply to non-empty values.
    fn is_satisfied_by(self, value: Option<&str>) -> bool {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        match (self, value) {
            (Self::Presence, v) => v.is_some(),
            (_, None) => true,
            (Self::MaxLength(max), Some(v)) => v.chars().count() <= max,
            (Self::MinLength(min), Some(v)) => v.chars().count() >= min,
            (Self::ExactLength(len), Some(v)) => v.chars().count() == len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub constraint: Constraint,
    pub message: RuleMessage,
}

/// All rules of one field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    pub rules: Vec<Rule>,
}

impl ConstraintSet {
    /// Messages of every violated rule, in declaration order
    pub fn check(&self, value: Option<&str>) -> Vec<&RuleMessage> {
        self.rules
            .iter()
            .filter(|rule| !rule.constraint.is_satisfied_by(value))
            .map(|rule| &rule.message)
            .collect()
    }

    pub fn is_mandatory(&self) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.constraint == Constraint::Presence)
    }

    fn with(mut self, constraint: Constraint, message: RuleMessage) -> Self {
        self.rules.push(Rule {
            constraint,
            message,
        });
        self
    }
}

/// Violations per form key
pub type FieldErrors = BTreeMap<String, Vec<RuleMessage>>;

/// Builds rule messages through a [`MessageFormatter`].
struct Catalog<'a> {
    messages: &'a dyn MessageFormatter,
}

impl Catalog<'_> {
    fn message(
        &self,
        id: &'static str,
        label_key: &str,
        category: ErrorCategory,
        args: &[(&str, String)],
    ) -> RuleMessage {
        RuleMessage {
            id,
            message: self.messages.format(id, args),
            field_label: self.messages.format(label_key, &[]),
            error_category: category,
        }
    }

    fn presence(&self, id: &'static str, label_key: &str) -> RuleMessage {
        self.message(id, label_key, ErrorCategory::MissingMandatory, &[])
    }

    fn too_long(&self, id: &'static str, label_key: &str, max: usize) -> RuleMessage {
        self.message(
            id,
            label_key,
            ErrorCategory::FormatValidation,
            &[("maxLength", max.to_string())],
        )
    }
}

/// Field name → constraints for one widget configuration
#[derive(Debug, Clone)]
pub struct FormValidations {
    validations: HashMap<&'static str, ConstraintSet>,
}

impl FormValidations {
    pub fn new(config: &WidgetConfig, messages: &dyn MessageFormatter) -> Self {
        let catalog = Catalog { messages };
        let mut validations = Self::basic_validations(config, &catalog);
        validations.extend(Self::additional_validations(config, &catalog));
        Self { validations }
    }

    fn basic_validations(
        config: &WidgetConfig,
        catalog: &Catalog<'_>,
    ) -> HashMap<&'static str, ConstraintSet> {
        use Constraint::{MaxLength, MinLength, Presence};

        let street_number = config.street_number_max_chars;
        let line1 = config.address_line1_max_chars;
        let postal = config.postal_code_max_chars;
        let mut validations = HashMap::new();

        validations.insert(
            "addressLine1",
            ConstraintSet::default()
                .with(
                    Presence,
                    catalog.presence("address_line_1_validation_presence", "address_line_1_label"),
                )
                .with(
                    MaxLength(line1),
                    catalog.too_long(
                        "address_line_1_validation_max_length",
                        "address_line_1_label",
                        line1,
                    ),
                ),
        );
        validations.insert(
            "addressLine2",
            ConstraintSet::default().with(
                MaxLength(config.address_line2_max_chars),
                catalog.too_long(
                    "address_line_2_validation_max_length",
                    "address_line_2_label",
                    config.address_line2_max_chars,
                ),
            ),
        );
        validations.insert(
            "addressLine3",
            ConstraintSet::default().with(
                MaxLength(config.address_line3_max_chars),
                catalog.too_long(
                    "address_line_3_validation_max_length",
                    "address_line_3_label",
                    config.address_line3_max_chars,
                ),
            ),
        );
        validations.insert(
            "addressLineManual",
            ConstraintSet::default()
                .with(
                    Presence,
                    catalog.presence("address_line_1_validation_presence", "road_street_other"),
                )
                .with(
                    MaxLength(line1),
                    catalog.too_long(
                        "address_line_1_validation_max_length",
                        "road_street_other",
                        line1,
                    ),
                ),
        );
        for (field, label) in [
            ("streetNumber", "street_number"),
            ("streetNumberManual", "street_number_manual"),
        ] {
            validations.insert(
                field,
                ConstraintSet::default()
                    .with(
                        Presence,
                        catalog.presence("street_number_validation_presence", label),
                    )
                    .with(
                        MaxLength(street_number),
                        catalog.too_long(
                            "street_number_validation_length",
                            label,
                            street_number,
                        ),
                    ),
            );
        }
        validations.insert(
            "fulladdress",
            ConstraintSet::default().with(
                Presence,
                catalog.presence(
                    "full_address_validation_presence",
                    "address_details_title_part_2",
                ),
            ),
        );
        validations.insert(
            "province",
            ConstraintSet::default().with(
                Presence,
                catalog.presence("province_validation_presence", "province"),
            ),
        );
        validations.insert(
            "cityL9",
            ConstraintSet::default()
                .with(Presence, catalog.presence("city_validation_presence", "city")),
        );
        validations.insert(
            "postalCodeL9",
            ConstraintSet::default()
                .with(
                    Presence,
                    catalog.presence("postal_code_validation_presence", "postal_code"),
                )
                .with(
                    MaxLength(postal),
                    catalog.too_long(
                        "postal_code_validation_max_length",
                        "address_postalCode_label",
                        postal,
                    ),
                )
                .with(
                    MinLength(postal),
                    catalog.too_long(
                        "postal_code_validation_max_length",
                        "address_postalCode_label",
                        postal,
                    ),
                ),
        );
        validations.insert(
            "mailBox",
            ConstraintSet::default().with(
                MaxLength(config.mail_box_chars),
                catalog.too_long(
                    "mail_box_validation_max_length",
                    "mail_box",
                    config.mail_box_chars,
                ),
            ),
        );
        validations
    }

    /// Rules driven by the mandatory flags and the display mode.
    ///
    /// The exact-length postal code rule replaces the mandatory postal code rule.
    fn additional_validations(
        config: &WidgetConfig,
        catalog: &Catalog<'_>,
    ) -> HashMap<&'static str, ConstraintSet> {
        let mut validations = HashMap::new();
        let mandatory = [
            (
                config.validate_mandatory_city,
                "city",
                "city_validation_presence",
                "address_city_label",
            ),
            (
                config.validate_mandatory_country,
                "country",
                "country_validation_presence",
                "address_country_label",
            ),
            (
                config.validate_mandatory_state,
                "state",
                "state_validation_presence",
                "address_state_label",
            ),
            (
                config.validate_mandatory_postal_code,
                "postalCode",
                "postalCode_validation_presence",
                "address_postalCode_label",
            ),
        ];
        for (enabled, field, id, label) in mandatory {
            if enabled {
                validations.insert(
                    field,
                    ConstraintSet::default().with(Constraint::Presence, catalog.presence(id, label)),
                );
            }
        }

        if config.display_mode.requires_exact_postal_code() {
            let length = config.postal_code_length_for_validation;
            validations.insert(
                "postalCode",
                ConstraintSet::default().with(
                    Constraint::ExactLength(length),
                    catalog.message(
                        "postal_code_validation_length",
                        "postal_code_validation_length",
                        ErrorCategory::FormatValidation,
                        &[("length", length.to_string())],
                    ),
                ),
            );
        }
        validations
    }

    /// Constraints of one field, if the field has any
    pub fn get_validations_for_field(&self, field_name: &str) -> Option<&ConstraintSet> {
        self.validations.get(field_name)
    }

    /// Check form values against the constraints of each mapped field.
    ///
    /// `fields` pairs a constraint field name with the form key holding its value. Only keys
    /// with at least one violation are returned.
    pub fn validate_form(&self, values: &FormValues, fields: &[(&str, &str)]) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for (field_name, form_key) in fields {
            let Some(constraints) = self.get_validations_for_field(field_name) else {
                continue;
            };
            let value = values.get(*form_key).and_then(value_to_string);
            let violated: Vec<RuleMessage> = constraints
                .check(value.as_deref())
                .into_iter()
                .cloned()
                .collect();
            if !violated.is_empty() {
                log::debug!("Field {form_key} failed {} rule(s)", violated.len());
                errors.insert((*form_key).to_string(), violated);
            }
        }
        errors
    }
}
