//! Application services: the use cases behind every HTTP route.
//!
//! Each operation loads what it needs from the `SchoolStore`, lets the domain
//! type validate the change, and writes the result back. Reference checks
//! (does the room exist? is the subject in the grid?) live here because they
//! need the store; shape and range rules live in the domain crates.

mod academics;
mod billing;
mod enrollment;
mod saft;
mod staff;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use edugest_core::{DomainError, Page, PageRequest};
use edugest_saft::CompanyInfo;

use crate::error::StoreError;
use crate::store::{ListQuery, Record, Repository, SchoolStore};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(domain) => ServiceError::Domain(domain),
            other => ServiceError::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Deployment-specific inputs of the billing and export use cases.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Series prefix, e.g. `EDU` numbers invoices as `FT EDU2025/1`.
    pub invoice_prefix: String,
    pub company: CompanyInfo,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            invoice_prefix: "EDU".to_string(),
            company: CompanyInfo::development(),
        }
    }
}

#[derive(Clone)]
pub struct SchoolService {
    store: Arc<dyn SchoolStore>,
    settings: Arc<ServiceSettings>,
}

impl SchoolService {
    pub fn new(store: Arc<dyn SchoolStore>, settings: ServiceSettings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Load one record or fail with `<kind> not found`.
    pub async fn get<T: Record>(&self, id: T::Id) -> ServiceResult<T>
    where
        dyn SchoolStore: Repository<T>,
    {
        Repository::<T>::get(self.store.as_ref(), id)
            .await?
            .ok_or_else(|| DomainError::not_found(T::KIND).into())
    }

    /// One page of records; `query.page` defaults to the first page.
    pub async fn list<T: Record>(&self, mut query: ListQuery) -> ServiceResult<Page<T>>
    where
        dyn SchoolStore: Repository<T>,
    {
        let request = *query.page.get_or_insert_with(PageRequest::default);
        let (items, total) = Repository::<T>::list(self.store.as_ref(), &query).await?;
        Ok(Page::new(items, total, request))
    }

    /// Every matching record, unpaged.
    async fn all<T: Record>(&self, mut query: ListQuery) -> ServiceResult<Vec<T>>
    where
        dyn SchoolStore: Repository<T>,
    {
        query.page = None;
        let (items, _) = Repository::<T>::list(self.store.as_ref(), &query).await?;
        Ok(items)
    }

    async fn exists<T: Record>(&self, id: T::Id) -> ServiceResult<()>
    where
        dyn SchoolStore: Repository<T>,
    {
        self.get::<T>(id).await.map(|_| ())
    }

    async fn insert<T: Record>(&self, record: &T) -> ServiceResult<()>
    where
        dyn SchoolStore: Repository<T>,
    {
        Repository::<T>::insert(self.store.as_ref(), record).await?;
        Ok(())
    }

    async fn save<T: Record>(&self, record: &T) -> ServiceResult<()>
    where
        dyn SchoolStore: Repository<T>,
    {
        Repository::<T>::update(self.store.as_ref(), record).await?;
        Ok(())
    }

    async fn remove<T: Record>(&self, id: T::Id) -> ServiceResult<()>
    where
        dyn SchoolStore: Repository<T>,
    {
        Repository::<T>::delete(self.store.as_ref(), id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
