//! Address formatting and parsing
//!
//! Pure conversions between raw form values, structured `AddressRecord`s and display lines.
//! None of these functions fail: malformed or empty input degrades to an empty record or line.

use serde_json::Value;

use crate::types::{AddressRecord, FormValues, RefItem, StatesByCountry, ValidationResult, WidgetConfig};

/// Form key of every structured field (`address.<field>`).
pub mod form_key {
    pub const STREET: &str = "address.street";
    pub const STREET_NUMBER: &str = "address.streetNumber";
    pub const MAIL_BOX: &str = "address.mailBox";
    pub const CITY: &str = "address.city";
    pub const STATE_OR_PROVINCE: &str = "address.stateOrProvince";
    pub const POSTAL_CODE: &str = "address.postalCode";
    pub const FRAZIONE: &str = "address.frazione";
    pub const FULL_ADDRESS: &str = "address.fulladdress";
}

/// Which reference-list field a code is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefMatch {
    Id,
    Name,
}

pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn to_value(value: Option<&String>) -> Value {
    value.map_or(Value::Null, |v| Value::String(v.clone()))
}

/// Reads `name` from the nested `address` object, then from the flat `address.<name>` key.
fn manual_field(values: &FormValues, name: &str) -> Option<String> {
    values
        .get("address")
        .and_then(Value::as_object)
        .and_then(|nested| nested.get(name))
        .or_else(|| values.get(&format!("address.{name}")))
        .and_then(value_to_string)
}

/// Convert form field values into an address record.
///
/// The nested `address` object is used when it carries a street; otherwise the flat dotted
/// keys are read. A manual street number overrides the standard one and brings the alternate
/// postal code (`postalCode1`) with it.
pub fn form_fields_to_address(values: &FormValues) -> AddressRecord {
    if values.is_empty() {
        return AddressRecord::default();
    }

    let nested = values
        .get("address")
        .and_then(Value::as_object)
        .filter(|obj| {
            obj.get("street")
                .and_then(value_to_string)
                .is_some_and(|s| !s.is_empty())
        });

    let field = |name: &str| -> Option<String> {
        match nested {
            Some(obj) => obj.get(name).and_then(value_to_string),
            None => values.get(&format!("address.{name}")).and_then(value_to_string),
        }
    };

    let state_or_province = field("stateOrProvince");
    let display_state_or_province = field("displayStateOrProvince")
        .filter(|s| !s.is_empty())
        .or_else(|| state_or_province.clone());

    let mut address = AddressRecord {
        street: field("street"),
        street_number: field("streetNumber"),
        city: field("city"),
        state_or_province,
        display_state_or_province,
        postal_code: field("postalCode"),
        mail_box: field("mailBox"),
        frazione: field("frazione"),
        formatted_address: field("fulladdress"),
        ..AddressRecord::default()
    };

    if let Some(manual_number) = manual_field(values, "streetNumberManual").filter(|s| !s.is_empty())
    {
        address.street_number = Some(manual_number);
        address.postal_code = manual_field(values, "postalCode1");
    }

    address
}

/// Convert the values of the manual-entry form into an address record.
///
/// The street number always comes from the manual street-number field. The postal code is
/// read from `postalCode1`, falling back to `postalCode`.
pub fn manual_form_fields_to_address(values: &FormValues) -> AddressRecord {
    if values.is_empty() {
        return AddressRecord::default();
    }
    AddressRecord {
        street: manual_field(values, "street"),
        street_number: manual_field(values, "streetNumberManual"),
        mail_box: manual_field(values, "mailBox"),
        city: manual_field(values, "city"),
        state_or_province: manual_field(values, "stateOrProvince"),
        postal_code: manual_field(values, "postalCode1")
            .filter(|s| !s.is_empty())
            .or_else(|| manual_field(values, "postalCode")),
        frazione: manual_field(values, "frazione"),
        ..AddressRecord::default()
    }
}

/// Convert an address record into flat form values (inverse of [`form_fields_to_address`]).
pub fn address_to_form_fields(address: &AddressRecord, omit_frazione: bool) -> FormValues {
    let mut values = FormValues::new();
    values.insert(form_key::STREET.to_string(), to_value(address.street.as_ref()));
    values.insert(
        form_key::STREET_NUMBER.to_string(),
        to_value(address.street_number.as_ref()),
    );
    values.insert(form_key::MAIL_BOX.to_string(), to_value(address.mail_box.as_ref()));
    values.insert(form_key::CITY.to_string(), to_value(address.city.as_ref()));
    values.insert(
        form_key::STATE_OR_PROVINCE.to_string(),
        to_value(address.state_or_province.as_ref()),
    );
    values.insert(
        form_key::POSTAL_CODE.to_string(),
        to_value(address.postal_code.as_ref()),
    );
    if !omit_frazione {
        values.insert(form_key::FRAZIONE.to_string(), to_value(address.frazione.as_ref()));
    }
    values.insert(
        form_key::FULL_ADDRESS.to_string(),
        to_value(address.formatted_address.as_ref()),
    );
    values
}

/// `errorCode` is `0` or `"0"`.
pub fn is_address_valid(result: &ValidationResult) -> bool {
    result.error_code.is_accepted()
}

/// Not valid, and exactly one candidate was returned.
pub fn is_single_candidate(result: &ValidationResult) -> bool {
    !is_address_valid(result) && result.candidate_count() == 1
}

/// Decode `code` through a reference list, falling back to the raw code.
pub fn display_value(code: &str, list: &[RefItem], match_on: RefMatch) -> String {
    list.iter()
        .find(|item| match match_on {
            RefMatch::Id => item.id == code,
            RefMatch::Name => item.name == code,
        })
        .map(|item| item.display_name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(code)
        .to_string()
}

fn country_code<'a>(address: &'a AddressRecord, config: &'a WidgetConfig) -> Option<&'a str> {
    non_empty(address.country.as_deref()).or_else(|| non_empty(Some(config.default_country.as_str())))
}

fn state_display(
    state: &str,
    country: Option<&str>,
    states_by_country: &StatesByCountry,
) -> String {
    let list = country
        .and_then(|c| states_by_country.get(c))
        .map_or(&[][..], Vec::as_slice);
    display_value(state, list, RefMatch::Name)
}

/// Format an address into a single display line.
///
/// Field order: street, street number, postal code, city, state/province, country. Segments
/// are joined by the configured separator plus a space; empty segments and segments whose
/// `show_*` flag is off are skipped. State and country are decoded through the reference
/// lists. An address without a street formats to an empty string.
pub fn format_address(
    address: &AddressRecord,
    countries: &[RefItem],
    states_by_country: &StatesByCountry,
    config: &WidgetConfig,
) -> String {
    let Some(street) = non_empty(address.street.as_deref()) else {
        return String::new();
    };
    let separator = &config.address_details_separator;
    let mut line = street.to_string();
    let mut push = |segment: &str| {
        line.push_str(separator);
        line.push(' ');
        line.push_str(segment);
    };

    if let Some(number) = non_empty(address.street_number.as_deref()) {
        push(number);
    }
    if let Some(postal_code) = non_empty(address.postal_code.as_deref()) {
        if config.show_postal_code {
            push(postal_code);
        }
    }
    if let Some(city) = non_empty(address.city.as_deref()) {
        if config.show_city {
            push(city);
        }
    }
    let country = country_code(address, config);
    if let Some(state) = non_empty(address.state_or_province.as_deref()) {
        if config.show_state {
            push(&state_display(state, country, states_by_country));
        }
    }
    if let Some(country) = country {
        if config.show_country {
            push(&display_value(country, countries, RefMatch::Id));
        }
    }
    line
}

/// Distribute leftover address tokens across display lines 1-3.
///
/// Everything lands in line 1 when it is the only enabled line, or when the joined text is
/// longer than the enabled lines' combined budget (overflow is tolerated, never truncated).
/// Otherwise tokens are partitioned in order, each line taking `ceil(left / lines_left)`.
pub fn split_address_lines(
    mut address: AddressRecord,
    remaining: &[String],
    config: &WidgetConfig,
    separator: &str,
) -> AddressRecord {
    let joined = remaining.join(separator);
    let (line2, line3) = (config.show_address_line2, config.show_address_line3);

    let budget = config
        .address_line1_max_chars
        .saturating_add(if line2 { config.address_line2_max_chars } else { 0 })
        .saturating_add(if line3 { config.address_line3_max_chars } else { 0 });

    if (!line2 && !line3) || joined.chars().count() > budget {
        address.formatted_address1 = Some(joined);
        return address;
    }

    let lines = config.enabled_address_lines();
    let total = remaining.len();
    let size1 = total.div_ceil(lines);
    address.formatted_address1 = Some(remaining[..size1].join(separator));

    if lines == 2 {
        let rest = Some(remaining[size1..].join(separator));
        if line2 {
            address.formatted_address2 = rest;
        } else {
            address.formatted_address3 = rest;
        }
    } else {
        let size2 = size1 + (total - size1).div_ceil(lines - 1);
        address.formatted_address2 = Some(remaining[size1..size2].join(separator));
        address.formatted_address3 = Some(remaining[size2..].join(separator));
    }
    address
}

/// Split an autocomplete provider address into structured fields and display lines.
///
/// The provider's full address is split on the configured separator; tokens equal to the
/// already-structured city / state / postal code / country (or their display names) are
/// dropped, and the rest is spread across lines 1-3. Structured fields win over the provider
/// record when merging back.
pub fn parse_autocomplete_address(
    address: &AddressRecord,
    countries: &[RefItem],
    states_by_country: &StatesByCountry,
    config: &WidgetConfig,
) -> AddressRecord {
    let separator = format!("{} ", config.address_details_separator);
    let formatted = address.formatted_address.as_deref().unwrap_or_default();

    let mut structured: Vec<String> = [
        &address.city,
        &address.state_or_province,
        &address.postal_code,
        &address.country,
    ]
    .into_iter()
    .filter_map(Clone::clone)
    .collect();
    if let Some(state) = non_empty(address.state_or_province.as_deref()) {
        structured.push(state_display(
            state,
            non_empty(address.country.as_deref()),
            states_by_country,
        ));
    }
    if let Some(country) = non_empty(address.country.as_deref()) {
        structured.push(display_value(country, countries, RefMatch::Id));
    }

    let remaining: Vec<String> = formatted
        .split(separator.as_str())
        .filter(|token| !token.is_empty() && !structured.iter().any(|s| s == token))
        .map(str::to_string)
        .collect();

    let lines = AddressRecord {
        formatted_address1: Some(String::new()),
        formatted_address2: Some(String::new()),
        formatted_address3: Some(String::new()),
        ..AddressRecord::default()
    };
    let lines = split_address_lines(lines, &remaining, config, &separator);

    AddressRecord {
        formatted_address1: lines.formatted_address1,
        formatted_address2: lines.formatted_address2,
        formatted_address3: lines.formatted_address3,
        ..address.clone()
    }
}

/// Field-wise equality used to skip re-validation when nothing changed.
pub fn is_equal_address(a: &AddressRecord, b: &AddressRecord) -> bool {
    a.city == b.city
        && a.frazione == b.frazione
        && a.street_number == b.street_number
        && a.mail_box == b.mail_box
        && a.postal_code == b.postal_code
        && a.state_or_province == b.state_or_province
        && a.street == b.street
        && a.external_id == b.external_id
}
