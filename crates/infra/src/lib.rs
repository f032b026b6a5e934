//! Infrastructure layer: persistence backends and the application services
//! that run every use case against them.

pub mod error;
pub mod services;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use services::{SchoolService, ServiceError, ServiceResult, ServiceSettings};
pub use store::{
    CascadeSummary, Filter, InMemorySchoolStore, ListQuery, PostgresSchoolStore, Record,
    Repository, SchoolStore,
};
