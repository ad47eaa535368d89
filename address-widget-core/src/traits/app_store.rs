//! Application data store abstract Trait

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::CoreResult;

/// Page that may start an installation address edit
pub const PAGE_ORDER_SUMMARY: &str = "OrderSummary";

/// Keys the widget reads from / writes to the shared store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    InstallationAddressEditMode,
}

impl StoreKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InstallationAddressEditMode => "installationAddressEditMode",
        }
    }
}

/// Key-value store shared with the rest of the host application
#[async_trait]
pub trait AppStore: Send + Sync {
    async fn get(&self, key: StoreKey) -> CoreResult<Option<Value>>;

    async fn set(&self, key: StoreKey, value: Value) -> CoreResult<()>;

    async fn remove(&self, key: StoreKey) -> CoreResult<()>;
}

/// In-memory store
///
/// Default implementation for hosts without a shared store.
#[derive(Clone, Default)]
pub struct InMemoryAppStore {
    values: Arc<RwLock<HashMap<&'static str, Value>>>,
}

impl InMemoryAppStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppStore for InMemoryAppStore {
    async fn get(&self, key: StoreKey) -> CoreResult<Option<Value>> {
        Ok(self.values.read().await.get(key.as_str()).cloned())
    }

    async fn set(&self, key: StoreKey, value: Value) -> CoreResult<()> {
        self.values.write().await.insert(key.as_str(), value);
        Ok(())
    }

    async fn remove(&self, key: StoreKey) -> CoreResult<()> {
        self.values.write().await.remove(key.as_str());
        Ok(())
    }
}
