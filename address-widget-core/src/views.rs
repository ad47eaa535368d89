//! Form views
//!
//! UI-toolkit independent models of the widget's views: which fields a form shows and which
//! constraints apply to them, the live form values, and the single review line of View mode.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::form_validations::{FieldErrors, FormValidations};
use crate::formatter::{
    address_to_form_fields, form_fields_to_address, form_key, format_address,
    manual_form_fields_to_address,
};
use crate::traits::FormDataSource;
use crate::types::{AddressRecord, DisplayMode, FormValues, ReferenceData, WidgetConfig};

const STREET_NUMBER_MANUAL: &str = "address.streetNumberManual";
const POSTAL_CODE_MANUAL: &str = "address.postalCode1";

/// Which address form is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    /// Street / number / province / city / postal code
    Standard,
    /// Single autocomplete line backed by the places service
    Geo,
    /// Manual entry inside the disambiguation modal
    Manual,
}

/// One rendered field: the constraint set that guards it and the form key holding its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub constraint: &'static str,
    pub form_key: &'static str,
}

const fn field(constraint: &'static str, form_key: &'static str) -> FieldSpec {
    FieldSpec {
        constraint,
        form_key,
    }
}

/// Fields of one form, in display order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormLayout {
    pub kind: FormKind,
    pub fields: Vec<FieldSpec>,
}

impl FormLayout {
    pub fn new(kind: FormKind, config: &WidgetConfig) -> Self {
        let mut fields = match kind {
            FormKind::Standard => vec![
                field("addressLine1", form_key::STREET),
                field("streetNumber", form_key::STREET_NUMBER),
                field("mailBox", form_key::MAIL_BOX),
                field("province", form_key::STATE_OR_PROVINCE),
                field("cityL9", form_key::CITY),
                field("postalCodeL9", form_key::POSTAL_CODE),
            ],
            FormKind::Geo => vec![
                field("fulladdress", form_key::FULL_ADDRESS),
                field("streetNumber", form_key::STREET_NUMBER),
                field("mailBox", form_key::MAIL_BOX),
            ],
            FormKind::Manual => vec![
                field("addressLineManual", form_key::STREET),
                field("streetNumberManual", STREET_NUMBER_MANUAL),
                field("province", form_key::STATE_OR_PROVINCE),
                field("cityL9", form_key::CITY),
                field("postalCodeL9", POSTAL_CODE_MANUAL),
                field("mailBox", form_key::MAIL_BOX),
                field("frazione", form_key::FRAZIONE),
            ],
        };
        fields.retain(|f| match f.form_key {
            form_key::MAIL_BOX => config.show_mailbox,
            form_key::FRAZIONE => config.show_frazione,
            _ => true,
        });
        Self { kind, fields }
    }

    /// `(constraint, form key)` pairs for [`FormValidations::validate_form`]
    pub fn validation_pairs(&self) -> Vec<(&'static str, &'static str)> {
        self.fields
            .iter()
            .map(|f| (f.constraint, f.form_key))
            .collect()
    }

    pub fn contains(&self, form_key: &str) -> bool {
        self.fields.iter().any(|f| f.form_key == form_key)
    }
}

/// Top-level view for a display mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetView {
    Create {
        layout: FormLayout,
        show_submit: bool,
    },
    Review {
        line: String,
        show_change_link: bool,
    },
    Hidden,
}

impl WidgetView {
    /// Pick the view for `mode`.
    ///
    /// The review line is the address' own formatted line when present, otherwise it is
    /// rebuilt from its fields.
    pub fn for_mode(
        mode: DisplayMode,
        config: &WidgetConfig,
        use_geolocation: bool,
        address: &AddressRecord,
        reference: &ReferenceData,
    ) -> Self {
        match mode {
            DisplayMode::None => Self::Hidden,
            DisplayMode::View | DisplayMode::ViewInstallationAddress => {
                let line = address
                    .formatted_address
                    .clone()
                    .filter(|line| !line.is_empty())
                    .unwrap_or_else(|| {
                        format_address(address, &reference.countries, &reference.states, config)
                    });
                Self::Review {
                    line,
                    show_change_link: config.show_change_link_in_view_mode,
                }
            }
            DisplayMode::New
            | DisplayMode::Edit
            | DisplayMode::NewInstallationAddress
            | DisplayMode::EditInstallationAddress
            | DisplayMode::Serviceability => {
                let kind = if use_geolocation {
                    FormKind::Geo
                } else {
                    FormKind::Standard
                };
                Self::Create {
                    layout: FormLayout::new(kind, config),
                    show_submit: config.show_submit,
                }
            }
        }
    }
}

/// Called with the full form values after every change
pub type ChangeHook = Arc<dyn Fn(&FormValues) + Send + Sync>;

/// Live values of an address form
#[derive(Default)]
pub struct FormView {
    values: Mutex<FormValues>,
    on_change: Option<ChangeHook>,
}

impl FormView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward every edit to `hook`.
    #[must_use]
    pub fn with_change_hook(mut self, hook: ChangeHook) -> Self {
        self.on_change = Some(hook);
        self
    }

    /// Replace all values with the fields of `address`.
    pub fn initialize_from(&self, address: &AddressRecord, omit_frazione: bool) {
        let values = address_to_form_fields(address, omit_frazione);
        *self.lock() = values;
        self.notify();
    }

    /// A single user edit
    pub fn set_field(&self, form_key: &str, value: impl Into<Value>) {
        self.lock().insert(form_key.to_string(), value.into());
        self.notify();
    }

    pub fn field(&self, form_key: &str) -> Option<Value> {
        self.lock().get(form_key).cloned()
    }

    /// A new province invalidates the city.
    pub fn select_state(&self, state_id: &str) {
        {
            let mut values = self.lock();
            values.insert(
                form_key::STATE_OR_PROVINCE.to_string(),
                Value::String(state_id.to_string()),
            );
            values.insert(form_key::CITY.to_string(), Value::String(String::new()));
        }
        self.notify();
    }

    pub fn clear(&self) {
        self.lock().clear();
        self.notify();
    }

    /// Address currently described by the form
    pub fn address(&self, kind: FormKind) -> AddressRecord {
        let values = self.values();
        match kind {
            FormKind::Manual => manual_form_fields_to_address(&values),
            FormKind::Standard | FormKind::Geo => form_fields_to_address(&values),
        }
    }

    pub fn validate(&self, validations: &FormValidations, layout: &FormLayout) -> FieldErrors {
        validations.validate_form(&self.values(), &layout.validation_pairs())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FormValues> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        if let Some(hook) = &self.on_change {
            let values = self.values();
            hook(&values);
        }
    }
}

impl FormDataSource for FormView {
    fn values(&self) -> FormValues {
        self.lock().clone()
    }

    fn update_fields(&self, updates: FormValues) {
        if updates.is_empty() {
            return;
        }
        self.lock().extend(updates);
        self.notify();
    }
}
