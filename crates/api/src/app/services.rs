//! Storage wiring: picks the store backend and builds the service layer.

use std::sync::Arc;

use edugest_infra::{
    InMemorySchoolStore, PostgresSchoolStore, SchoolService, SchoolStore, ServiceSettings,
    StoreResult,
};

use crate::config::{ApiConfig, Persistence};

pub async fn build_services(config: &ApiConfig) -> StoreResult<SchoolService> {
    let store: Arc<dyn SchoolStore> = match &config.persistence {
        Persistence::Postgres {
            url,
            max_connections,
        } => build_persistent_store(url, *max_connections).await?,
        Persistence::InMemory => {
            tracing::info!("using in-memory stores; data is lost on restart");
            Arc::new(InMemorySchoolStore::new())
        }
    };
    Ok(SchoolService::new(store, config.services.clone()))
}

/// In-memory wiring (dev/test).
pub fn in_memory_services(settings: ServiceSettings) -> SchoolService {
    SchoolService::new(Arc::new(InMemorySchoolStore::new()), settings)
}

async fn build_persistent_store(
    url: &str,
    max_connections: u32,
) -> StoreResult<Arc<dyn SchoolStore>> {
    let store = PostgresSchoolStore::connect(url, max_connections).await?;
    store.migrate().await?;
    tracing::info!(max_connections, "connected to postgres; schema is up to date");
    Ok(Arc::new(store))
}
