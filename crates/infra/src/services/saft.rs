use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{info, instrument};

use edugest_billing::FeeItem;
use edugest_core::{FeeItemId, StudentId};
use edugest_enrollment::Student;
use edugest_saft::audit_file::validate_period;
use edugest_saft::{build_audit_file, AuditFileInput, SaftExport};

use super::{SchoolService, ServiceResult};

impl SchoolService {
    /// Build the SAF-T (AO) audit file for invoices dated in `[start, end]`.
    ///
    /// Invoices of the same series issued before `start` are loaded too so
    /// the hash chain of the first exported document can be computed.
    #[instrument(skip(self), fields(invoices = tracing::field::Empty), err)]
    pub async fn export_saft(&self, start: NaiveDate, end: NaiveDate) -> ServiceResult<SaftExport> {
        validate_period(start, end)?;
        let invoices = self.store.invoices_in_series_until(start, end).await?;

        let mut students: HashMap<StudentId, Student> = HashMap::new();
        let mut fee_items: HashMap<FeeItemId, FeeItem> = HashMap::new();
        for invoice in invoices.iter().filter(|i| i.issue_date >= start) {
            if !students.contains_key(&invoice.student_id) {
                let student = self.get::<Student>(invoice.student_id).await?;
                students.insert(student.id, student);
            }
            for line in &invoice.lines {
                if fee_items.contains_key(&line.fee_item_id) {
                    continue;
                }
                // A fee item referenced by an invoice cannot be deleted.
                let item = self.get::<FeeItem>(line.fee_item_id).await?;
                fee_items.insert(item.id, item);
            }
        }

        let export = build_audit_file(&AuditFileInput {
            company: &self.settings.company,
            start_date: start,
            end_date: end,
            invoices: &invoices,
            students: &students,
            fee_items: &fee_items,
            generated_at: self.now(),
        })?;

        tracing::Span::current().record("invoices", export.invoice_count);
        info!(
            file_name = %export.file_name,
            total_credit = export.total_credit.minor(),
            "saft export generated"
        );
        Ok(export)
    }
}
