//! Places provider abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{Coordinates, PlaceDetails, Prediction};

/// Places / geocoding provider used by geolocation-assisted entry
#[async_trait]
pub trait PlacesApi: Send + Sync {
    /// Autocomplete predictions for free text
    async fn get_places_predictions(&self, term: &str) -> CoreResult<Vec<Prediction>>;

    /// Details of one prediction
    ///
    /// # Arguments
    /// * `place_id` - `Prediction::place_id`
    async fn get_place_details(&self, place_id: &str) -> CoreResult<PlaceDetails>;

    /// Address at a location
    async fn get_address_details_reverse_geocode(
        &self,
        location: Coordinates,
    ) -> CoreResult<PlaceDetails>;
}
