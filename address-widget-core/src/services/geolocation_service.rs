//! Geolocation-assisted address entry
//!
//! Turns a places prediction into form field updates. When the place lacks a street number or
//! postal code, the postal code and city are taken from a reverse geocode of its location.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::formatter::form_key;
use crate::services::ServiceContext;
use crate::types::{component_type, AddressRecord, Coordinates, FormValues, PlaceDetails, Prediction};

/// Outcome of resolving a selected prediction
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceResolution {
    /// The place has no street (`ADDR_TOO_BROAD`)
    TooBroad,
    Resolved {
        /// Form fields to merge into the form
        updates: FormValues,
        /// The street number has to be typed by the user
        show_street_number: bool,
    },
}

fn text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |v| Value::String(v.to_string()))
}

fn upper(value: Option<&str>) -> Value {
    text(value.map(str::to_uppercase).as_deref())
}

fn city_of(details: &PlaceDetails) -> Option<&str> {
    details.component(component_type::CITY_LOCALITY, Some(component_type::CITY))
}

pub struct GeoAddressService {
    ctx: Arc<ServiceContext>,
}

impl GeoAddressService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Predictions for the text typed in the full-address field
    pub async fn predictions(&self, term: &str) -> CoreResult<Vec<Prediction>> {
        if term.trim().is_empty() {
            return Err(CoreError::ValidationError("ADDR_MISSING".to_string()));
        }
        self.ctx
            .middleware
            .without_loader()
            .run(
                "get_places_predictions",
                self.ctx.places_api.get_places_predictions(term),
            )
            .await
    }

    /// Resolve a selected prediction into form field updates.
    pub async fn resolve_place(&self, place_id: &str) -> CoreResult<PlaceResolution> {
        let details = self
            .ctx
            .middleware
            .run(
                "get_place_details",
                self.ctx.places_api.get_place_details(place_id),
            )
            .await?;

        let Some(street) = details.component(component_type::STREET, None) else {
            log::warn!("Place {place_id} has no street component");
            return Ok(PlaceResolution::TooBroad);
        };

        let mut updates = FormValues::new();
        updates.insert(form_key::STREET_NUMBER.to_string(), Value::String(String::new()));
        updates.insert(form_key::FRAZIONE.to_string(), Value::Null);
        updates.insert(form_key::STREET.to_string(), upper(Some(street)));
        updates.insert(form_key::CITY.to_string(), upper(city_of(&details)));
        updates.insert(
            form_key::STATE_OR_PROVINCE.to_string(),
            upper(details.component(component_type::STATE_PROVINCE, None)),
        );
        updates.insert(
            form_key::FULL_ADDRESS.to_string(),
            Value::String(details.formatted_address.clone()),
        );

        let postal_code = details.component(component_type::POSTAL_CODE, None);
        let street_number = details.component(component_type::STREET_NUMBER, None);

        if let (Some(postal_code), Some(street_number)) = (postal_code, street_number) {
            updates.insert(form_key::POSTAL_CODE.to_string(), text(Some(postal_code)));
            updates.insert(form_key::STREET_NUMBER.to_string(), text(Some(street_number)));
            return Ok(PlaceResolution::Resolved {
                updates,
                show_street_number: false,
            });
        }

        if let Some(street_number) = street_number {
            updates.insert(form_key::STREET_NUMBER.to_string(), text(Some(street_number)));
        }

        match details.location {
            Some(location) => {
                let reverse = self.reverse_geocode(location).await?;
                updates.insert(
                    form_key::POSTAL_CODE.to_string(),
                    text(reverse.component(component_type::POSTAL_CODE, None)),
                );
                updates.insert(form_key::CITY.to_string(), upper(city_of(&reverse)));
            }
            None => log::warn!("Place {place_id} has no location, postal code left empty"),
        }

        Ok(PlaceResolution::Resolved {
            updates,
            show_street_number: street_number.is_none(),
        })
    }

    /// Address at `location`, used to prefill a new address from the device position.
    pub async fn address_at(&self, location: Coordinates) -> CoreResult<AddressRecord> {
        let details = self.reverse_geocode(location).await?;
        let own = |kind: &str| details.component(kind, None).map(str::to_string);
        Ok(AddressRecord {
            street: own(component_type::STREET),
            street_number: own(component_type::STREET_NUMBER),
            city: city_of(&details).map(str::to_string),
            state_or_province: own(component_type::STATE_PROVINCE),
            postal_code: own(component_type::POSTAL_CODE),
            formatted_address: Some(details.formatted_address.clone())
                .filter(|f| !f.is_empty()),
            ..AddressRecord::default()
        })
    }

    async fn reverse_geocode(&self, location: Coordinates) -> CoreResult<PlaceDetails> {
        self.ctx
            .middleware
            .run(
                "get_address_details_reverse_geocode",
                self.ctx
                    .places_api
                    .get_address_details_reverse_geocode(location),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_context;
    use crate::types::AddressComponent;
    use serde_json::json;

    const ROME: Coordinates = Coordinates {
        lat: 41.9,
        lng: 12.5,
    };

    fn place(components: Vec<AddressComponent>) -> PlaceDetails {
        PlaceDetails {
            address_components: components,
            formatted_address: "Via del Corso, Roma RM, Italia".to_string(),
            location: Some(ROME),
        }
    }

    #[tokio::test]
    async fn empty_term_is_rejected() {
        let test = create_test_context();
        let service = GeoAddressService::new(test.ctx.clone());
        assert!(matches!(
            service.predictions("  ").await,
            Err(CoreError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn predictions_come_from_provider() {
        let test = create_test_context();
        test.places_api
            .set_predictions(vec![Prediction {
                place_id: "p1".to_string(),
                description: "Via del Corso, Roma".to_string(),
            }])
            .await;
        let service = GeoAddressService::new(test.ctx.clone());
        assert_eq!(service.predictions("corso").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn place_without_route_is_too_broad() {
        let test = create_test_context();
        test.places_api
            .add_place(
                "p1",
                place(vec![AddressComponent::new("Roma", &[component_type::CITY_LOCALITY])]),
            )
            .await;
        let service = GeoAddressService::new(test.ctx.clone());
        assert_eq!(
            service.resolve_place("p1").await.unwrap(),
            PlaceResolution::TooBroad
        );
    }

    #[tokio::test]
    async fn complete_place_needs_no_reverse_geocode() {
        let test = create_test_context();
        test.places_api
            .add_place(
                "p1",
                place(vec![
                    AddressComponent::new("Via del Corso", &[component_type::STREET]),
                    AddressComponent::new("10", &[component_type::STREET_NUMBER]),
                    AddressComponent::new("00186", &[component_type::POSTAL_CODE]),
                    AddressComponent::new("Roma", &[component_type::CITY_LOCALITY]),
                    AddressComponent::new("rm", &[component_type::STATE_PROVINCE]),
                ]),
            )
            .await;
        let service = GeoAddressService::new(test.ctx.clone());

        let PlaceResolution::Resolved {
            updates,
            show_street_number,
        } = service.resolve_place("p1").await.unwrap()
        else {
            panic!("expected Resolved");
        };
        assert!(!show_street_number);
        assert_eq!(updates[form_key::STREET], json!("VIA DEL CORSO"));
        assert_eq!(updates[form_key::CITY], json!("ROMA"));
        assert_eq!(updates[form_key::STATE_OR_PROVINCE], json!("RM"));
        assert_eq!(updates[form_key::POSTAL_CODE], json!("00186"));
        assert_eq!(updates[form_key::STREET_NUMBER], json!("10"));
        assert!(test.places_api.reverse_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_number_falls_back_to_reverse_geocode() {
        let test = create_test_context();
        test.places_api
            .add_place(
                "p1",
                place(vec![
                    AddressComponent::new("Via del Corso", &[component_type::STREET]),
                    AddressComponent::new("Roma", &[component_type::CITY]),
                ]),
            )
            .await;
        test.places_api
            .set_reverse(place(vec![
                AddressComponent::new("00187", &[component_type::POSTAL_CODE]),
                AddressComponent::new("Roma Centro", &[component_type::CITY_LOCALITY]),
            ]))
            .await;
        let service = GeoAddressService::new(test.ctx.clone());

        let PlaceResolution::Resolved {
            updates,
            show_street_number,
        } = service.resolve_place("p1").await.unwrap()
        else {
            panic!("expected Resolved");
        };
        assert!(show_street_number);
        assert_eq!(updates[form_key::STREET_NUMBER], json!(""));
        assert_eq!(updates[form_key::POSTAL_CODE], json!("00187"));
        assert_eq!(updates[form_key::CITY], json!("ROMA CENTRO"));
        assert_eq!(*test.places_api.reverse_calls.lock().unwrap(), vec![ROME]);
    }

    #[tokio::test]
    async fn unknown_place_propagates() {
        let test = create_test_context();
        let service = GeoAddressService::new(test.ctx.clone());
        assert!(matches!(
            service.resolve_place("nope").await,
            Err(CoreError::PlaceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn address_at_maps_components() {
        let test = create_test_context();
        test.places_api
            .set_reverse(place(vec![
                AddressComponent::new("Via del Corso", &[component_type::STREET]),
                AddressComponent::new("10", &[component_type::STREET_NUMBER]),
                AddressComponent::new("Roma", &[component_type::CITY]),
            ]))
            .await;
        let service = GeoAddressService::new(test.ctx.clone());

        let address = service.address_at(ROME).await.unwrap();
        assert_eq!(address.street.as_deref(), Some("Via del Corso"));
        assert_eq!(address.street_number.as_deref(), Some("10"));
        assert_eq!(address.city.as_deref(), Some("Roma"));
        assert!(address.postal_code.is_none());
    }
}
