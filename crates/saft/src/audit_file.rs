//! Audit file assembly: `AuditFile` with its Header, MasterFiles and SourceDocuments.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use edugest_billing::{FeeItem, Invoice, InvoiceStatus};
use edugest_core::{DomainError, DomainResult, FeeItemId, Money, StudentId, TaxRate};
use edugest_enrollment::Student;

use crate::{company::CompanyInfo, hash, xml::XmlWriter};

pub const NAMESPACE: &str = "urn:OECD:StandardAuditFile-Tax:AO_1.01_01";
pub const AUDIT_FILE_VERSION: &str = "1.01_01";
/// Generic taxpayer number for customers without a NIF.
pub const FINAL_CONSUMER_TAX_ID: &str = "999999999";
const UNKNOWN: &str = "Desconhecido";
const COUNTRY: &str = "AO";

pub struct AuditFileInput<'a> {
    pub company: &'a CompanyInfo,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Every invoice of each series touched by the period, from its first
    /// document up to `end_date`; earlier ones only feed the hash chain.
    pub invoices: &'a [Invoice],
    pub students: &'a HashMap<StudentId, Student>,
    pub fee_items: &'a HashMap<FeeItemId, FeeItem>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaftExport {
    pub file_name: String,
    pub xml: String,
    pub invoice_count: usize,
    pub total_credit: Money,
}

/// One audit file covers a single fiscal year.
pub fn validate_period(start: NaiveDate, end: NaiveDate) -> DomainResult<()> {
    if start > end {
        return Err(DomainError::validation("start_date must not be after end_date"));
    }
    if start.year() != end.year() {
        return Err(DomainError::validation(
            "start_date and end_date must fall in the same fiscal year",
        ));
    }
    Ok(())
}

pub fn build_audit_file(input: &AuditFileInput<'_>) -> DomainResult<SaftExport> {
    validate_period(input.start_date, input.end_date)?;
    let hashes = hash::chain_hashes(input.invoices)?;

    let mut in_period: Vec<&Invoice> = input
        .invoices
        .iter()
        .filter(|i| i.issue_date >= input.start_date && i.issue_date <= input.end_date)
        .collect();
    in_period.sort_by(|a, b| a.series.cmp(&b.series).then(a.sequence.cmp(&b.sequence)));

    let mut customers: BTreeMap<&str, &Student> = BTreeMap::new();
    let mut products: BTreeMap<&str, &str> = BTreeMap::new();
    let mut tax_rates: BTreeSet<TaxRate> = BTreeSet::new();
    for invoice in &in_period {
        let student = input
            .students
            .get(&invoice.student_id)
            .ok_or_else(|| DomainError::not_found(format!("student {}", invoice.student_id)))?;
        customers.insert(student.document_number.as_str(), student);
        for line in &invoice.lines {
            let description = input
                .fee_items
                .get(&line.fee_item_id)
                .map(|f| f.description.as_str())
                .unwrap_or(line.description.as_str());
            products.entry(line.product_code.as_str()).or_insert(description);
            tax_rates.insert(line.tax_rate);
        }
    }

    let total_credit = Money::total(
        in_period
            .iter()
            .filter(|i| i.status == InvoiceStatus::Normal)
            .map(|i| i.net_total),
    )?;

    let mut w = XmlWriter::new();
    w.open_with("AuditFile", &[("xmlns", NAMESPACE)]);
    write_header(&mut w, input);

    w.open("MasterFiles");
    for (customer_id, student) in &customers {
        write_customer(&mut w, customer_id, student);
    }
    for (code, description) in &products {
        w.open("Product")
            .leaf("ProductType", "S")
            .leaf("ProductCode", code)
            .leaf("ProductDescription", description)
            .leaf("ProductNumberCode", code)
            .close();
    }
    w.open("TaxTable");
    for rate in &tax_rates {
        let (code, description) = tax_code(*rate);
        w.open("TaxTableEntry")
            .leaf("TaxType", "IVA")
            .leaf("TaxCountryRegion", COUNTRY)
            .leaf("TaxCode", code)
            .leaf("Description", description)
            .leaf("TaxPercentage", rate)
            .close();
    }
    w.close(); // TaxTable
    w.close(); // MasterFiles

    w.open("SourceDocuments").open("SalesInvoices");
    w.leaf("NumberOfEntries", in_period.len())
        .leaf("TotalDebit", Money::ZERO)
        .leaf("TotalCredit", total_credit);
    for invoice in &in_period {
        let student = input
            .students
            .get(&invoice.student_id)
            .ok_or_else(|| DomainError::not_found(format!("student {}", invoice.student_id)))?;
        let hash = hashes
            .get(&invoice.id)
            .ok_or_else(|| DomainError::invariant(format!("no hash for {}", invoice.number)))?;
        write_invoice(&mut w, input.company, invoice, student, hash);
    }

    let xml = w.finish();
    Ok(SaftExport {
        file_name: format!(
            "SAFT_AO_{}_{}_{}.xml",
            input.company.tax_id,
            input.start_date.format("%Y%m%d"),
            input.end_date.format("%Y%m%d")
        ),
        xml,
        invoice_count: in_period.len(),
        total_credit,
    })
}

fn write_header(w: &mut XmlWriter, input: &AuditFileInput<'_>) {
    let c = input.company;
    w.open("Header")
        .leaf("AuditFileVersion", AUDIT_FILE_VERSION)
        .leaf("CompanyID", &c.tax_id)
        .leaf("TaxRegistrationNumber", &c.tax_id)
        .leaf("TaxAccountingBasis", "F")
        .leaf("CompanyName", &c.name);
    w.open("CompanyAddress")
        .leaf("AddressDetail", &c.address)
        .leaf("City", &c.city)
        .leaf("Country", COUNTRY)
        .close();
    w.leaf("FiscalYear", input.start_date.year())
        .leaf("StartDate", input.start_date)
        .leaf("EndDate", input.end_date)
        .leaf("CurrencyCode", "AOA")
        .leaf("DateCreated", input.generated_at.date_naive())
        .leaf("TaxEntity", "Global")
        .leaf("ProductCompanyTaxID", &c.tax_id)
        .leaf("SoftwareValidationNumber", &c.software_certificate)
        .leaf("ProductID", &c.product_id)
        .leaf("ProductVersion", &c.product_version)
        .close();
}

fn write_customer(w: &mut XmlWriter, customer_id: &str, student: &Student) {
    w.open("Customer")
        .leaf("CustomerID", customer_id)
        .leaf("AccountID", UNKNOWN)
        .leaf(
            "CustomerTaxID",
            student.tax_id.as_deref().unwrap_or(FINAL_CONSUMER_TAX_ID),
        )
        .leaf("CompanyName", &student.full_name);
    w.open("BillingAddress")
        .leaf("AddressDetail", student.address.as_deref().unwrap_or(UNKNOWN))
        .leaf("City", student.city.as_deref().unwrap_or(UNKNOWN))
        .leaf("Country", COUNTRY)
        .close();
    w.leaf("SelfBillingIndicator", 0).close();
}

fn write_invoice(w: &mut XmlWriter, company: &CompanyInfo, invoice: &Invoice, student: &Student, hash: &str) {
    w.open("Invoice").leaf("InvoiceNo", &invoice.number);
    w.open("DocumentStatus")
        .leaf("InvoiceStatus", invoice.status.saft_code())
        .leaf(
            "InvoiceStatusDate",
            invoice.status_changed_at.format(hash::SYSTEM_ENTRY_FORMAT),
        )
        .leaf_opt("Reason", invoice.cancel_reason.as_deref())
        .leaf("SourceID", &company.source_id)
        .leaf("SourceBilling", "P")
        .close();
    w.leaf("Hash", hash)
        .leaf("HashControl", 1)
        .leaf("Period", invoice.issue_date.month())
        .leaf("InvoiceDate", invoice.issue_date)
        .leaf("InvoiceType", "FT");
    w.open("SpecialRegimes")
        .leaf("SelfBillingIndicator", 0)
        .leaf("CashVATSchemeIndicator", 0)
        .leaf("ThirdPartiesBillingIndicator", 0)
        .close();
    w.leaf("SourceID", &company.source_id)
        .leaf(
            "SystemEntryDate",
            invoice.system_entry_at.format(hash::SYSTEM_ENTRY_FORMAT),
        )
        .leaf("CustomerID", &student.document_number);

    for line in &invoice.lines {
        let (code, _) = tax_code(line.tax_rate);
        w.open("Line")
            .leaf("LineNumber", line.line_no)
            .leaf("ProductCode", &line.product_code)
            .leaf("ProductDescription", &line.description)
            .leaf("Quantity", line.quantity)
            .leaf("UnitOfMeasure", "UN")
            .leaf("UnitPrice", line.unit_price)
            .leaf("TaxPointDate", invoice.issue_date)
            .leaf("Description", &line.description)
            .leaf("CreditAmount", line.net_amount);
        w.open("Tax")
            .leaf("TaxType", "IVA")
            .leaf("TaxCountryRegion", COUNTRY)
            .leaf("TaxCode", code)
            .leaf("TaxPercentage", line.tax_rate)
            .close();
        if let Some(exemption) = &line.exemption {
            w.leaf("TaxExemptionReason", &exemption.reason)
                .leaf("TaxExemptionCode", &exemption.code);
        }
        w.leaf("SettlementAmount", Money::ZERO).close();
    }

    w.open("DocumentTotals")
        .leaf("TaxPayable", invoice.tax_total)
        .leaf("NetTotal", invoice.net_total)
        .leaf("GrossTotal", invoice.gross_total)
        .close();
    w.close(); // Invoice
}

fn tax_code(rate: TaxRate) -> (&'static str, &'static str) {
    if rate.is_exempt() {
        ("ISE", "Isento")
    } else {
        ("NOR", "Taxa normal")
    }
}
