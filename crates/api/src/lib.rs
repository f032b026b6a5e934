//! HTTP API: configuration, authentication, routing and request/response
//! mapping for the school administration backend.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
