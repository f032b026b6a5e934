//! Document hash chain.
//!
//! Each invoice is signed with
//! `base64(SHA-256("{InvoiceDate};{SystemEntryDate};{InvoiceNo};{GrossTotal};{PreviousHash}"))`,
//! where `PreviousHash` is the hash of the preceding document of the same
//! series (empty for the first one).

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};

use edugest_billing::Invoice;
use edugest_core::{DomainError, DomainResult, InvoiceId, Money};

pub const SYSTEM_ENTRY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn document_hash(
    invoice_date: NaiveDate,
    system_entry: DateTime<Utc>,
    invoice_no: &str,
    gross_total: Money,
    previous_hash: &str,
) -> String {
    let message = format!(
        "{};{};{};{};{}",
        invoice_date.format("%Y-%m-%d"),
        system_entry.format(SYSTEM_ENTRY_FORMAT),
        invoice_no,
        gross_total,
        previous_hash
    );
    STANDARD.encode(Sha256::digest(message.as_bytes()))
}

/// Hash every invoice, chaining within each series in sequence order.
///
/// `invoices` must contain every document of each series from sequence 1
/// onwards; a gap would silently break the chain, so it is reported instead.
pub fn chain_hashes(invoices: &[Invoice]) -> DomainResult<HashMap<InvoiceId, String>> {
    let mut by_series: HashMap<&str, Vec<&Invoice>> = HashMap::new();
    for invoice in invoices {
        by_series.entry(invoice.series.as_str()).or_default().push(invoice);
    }

    let mut hashes = HashMap::with_capacity(invoices.len());
    for (series, mut docs) in by_series {
        docs.sort_by_key(|i| i.sequence);
        let mut previous = String::new();
        for (expected, doc) in (1u32..).zip(docs) {
            if doc.sequence != expected {
                return Err(DomainError::invariant(format!(
                    "series {series} is missing document {expected} (found {})",
                    doc.sequence
                )));
            }
            let hash = document_hash(
                doc.issue_date,
                doc.system_entry_at,
                &doc.number,
                doc.gross_total,
                &previous,
            );
            hashes.insert(doc.id, hash.clone());
            previous = hash;
        }
    }
    Ok(hashes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 15, 0).unwrap()
    }

    #[test]
    fn hash_is_base64_sha256_of_the_signed_message() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let hash = document_hash(date, entry(), "FT EDU2025/1", Money::from_minor(1_500_000), "");

        let expected = STANDARD.encode(Sha256::digest(
            b"2025-03-10;2025-03-10T09:15:00;FT EDU2025/1;15000.00;",
        ));
        assert_eq!(hash, expected);
        // A 32-byte digest encodes to 44 base64 chars.
        assert_eq!(hash.len(), 44);
    }

    #[test]
    fn previous_hash_changes_the_result() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let a = document_hash(date, entry(), "FT EDU2025/2", Money::from_minor(100), "");
        let b = document_hash(date, entry(), "FT EDU2025/2", Money::from_minor(100), "abc");
        assert_ne!(a, b);
    }
}
