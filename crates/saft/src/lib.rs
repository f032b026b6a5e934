//! `edugest-saft`: SAFT-AO (Standard Audit File for Tax, Angola) export.
//!
//! Pure: the caller loads invoices, students and fee items; this crate chains
//! the document hashes and renders the audit file.

pub mod audit_file;
pub mod company;
pub mod hash;
pub mod xml;

pub use audit_file::{build_audit_file, AuditFileInput, SaftExport};
pub use company::CompanyInfo;
pub use hash::{chain_hashes, document_hash};
