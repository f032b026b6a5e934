//! `edugest-billing`: school fees and the invoices issued for them.
//!
//! Invoices are fiscal documents: they are numbered sequentially per series,
//! never deleted, and only ever cancelled. The SAFT-AO export reads them.

pub mod fee_item;
pub mod invoice;

pub use fee_item::{FeeItem, FeeItemPatch, NewFeeItem, TaxExemption};
pub use invoice::{
    Invoice, InvoiceDraft, InvoiceLine, InvoiceSeries, InvoiceStatus, NewInvoice, NewInvoiceLine,
};
