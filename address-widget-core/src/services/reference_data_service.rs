//! Reference data service (countries / states / cities)

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::CoreResult;
use crate::services::ServiceContext;
use crate::types::{RefItem, ReferenceData};

/// Loads reference lists once and serves them from cache
pub struct ReferenceDataService {
    ctx: Arc<ServiceContext>,
    cache: RwLock<ReferenceData>,
}

impl ReferenceDataService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            ctx,
            cache: RwLock::new(ReferenceData::default()),
        }
    }

    /// Countries, loaded on first use
    pub async fn load_countries(&self) -> CoreResult<Vec<RefItem>> {
        {
            let cache = self.cache.read().await;
            if !cache.countries.is_empty() {
                return Ok(cache.countries.clone());
            }
        }
        let countries = self
            .ctx
            .middleware
            .run("load_countries", self.ctx.address_api.load_countries())
            .await?;
        log::debug!("Loaded {} countries", countries.len());
        self.cache.write().await.countries.clone_from(&countries);
        Ok(countries)
    }

    /// States of `country_id`, cached per country
    pub async fn load_states(&self, country_id: &str) -> CoreResult<Vec<RefItem>> {
        if let Some(states) = self.cache.read().await.states.get(country_id) {
            return Ok(states.clone());
        }
        let states = self
            .ctx
            .middleware
            .run("load_states", self.ctx.address_api.load_states(country_id))
            .await?;
        log::debug!("Loaded {} states for {country_id}", states.len());
        self.cache
            .write()
            .await
            .states
            .insert(country_id.to_string(), states.clone());
        Ok(states)
    }

    /// Cities of a state; replaces the previous city list
    pub async fn load_city(&self, state_id: &str, country_id: &str) -> CoreResult<Vec<RefItem>> {
        let cities = self
            .ctx
            .middleware
            .run(
                "load_city",
                self.ctx.address_api.load_city(state_id, country_id),
            )
            .await?;
        self.cache.write().await.cities.clone_from(&cities);
        Ok(cities)
    }

    pub async fn snapshot(&self) -> ReferenceData {
        self.cache.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_context;

    #[tokio::test]
    async fn countries_are_loaded_once() {
        let test = create_test_context();
        let service = ReferenceDataService::new(test.ctx.clone());

        let first = service.load_countries().await.unwrap();
        let second = service.load_countries().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(test.address_api.call_count("load_countries"), 1);
    }

    #[tokio::test]
    async fn states_are_cached_per_country() {
        let test = create_test_context();
        let service = ReferenceDataService::new(test.ctx.clone());

        assert_eq!(service.load_states("IT").await.unwrap().len(), 2);
        assert!(service.load_states("FR").await.unwrap().is_empty());
        service.load_states("IT").await.unwrap();
        assert_eq!(test.address_api.call_count("load_states"), 2);

        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.states.len(), 2);
    }

    #[tokio::test]
    async fn cities_replace_previous_list() {
        let test = create_test_context();
        let service = ReferenceDataService::new(test.ctx.clone());

        service.load_city("RM", "IT").await.unwrap();
        service.load_city("RM", "IT").await.unwrap();
        assert_eq!(test.address_api.call_count("load_city"), 2);
        assert_eq!(service.snapshot().await.cities.len(), 1);
    }
}
