//! Currency rate abstractions

use super::rates::RateTable;
use anyhow::Result;
use async_trait::async_trait;

/// Source of a complete rate table anchored to a fixed currency.
#[async_trait]
pub trait RateTableProvider: Send + Sync {
    async fn fetch_table(&self) -> Result<RateTable>;
}

#[async_trait]
impl<T: RateTableProvider + ?Sized> RateTableProvider for std::sync::Arc<T> {
    async fn fetch_table(&self) -> Result<RateTable> {
        (**self).fetch_table().await
    }
}
