use tracing::{info, instrument};

use edugest_billing::{
    FeeItem, FeeItemPatch, Invoice, InvoiceDraft, InvoiceSeries, NewFeeItem, NewInvoice,
};
use edugest_core::{FeeItemId, InvoiceId};
use edugest_enrollment::Student;

use super::{SchoolService, ServiceResult};

impl SchoolService {
    pub async fn create_fee_item(&self, input: NewFeeItem) -> ServiceResult<FeeItem> {
        let item = FeeItem::create(input, self.now())?;
        self.insert(&item).await?;
        Ok(item)
    }

    /// Issued invoices keep their own copy of the price and tax rate.
    pub async fn update_fee_item(
        &self,
        id: FeeItemId,
        patch: FeeItemPatch,
    ) -> ServiceResult<FeeItem> {
        let mut item = self.get::<FeeItem>(id).await?;
        item.apply(patch, self.now())?;
        self.save(&item).await?;
        Ok(item)
    }

    /// Restricted: fails once an invoice line references the item.
    pub async fn delete_fee_item(&self, id: FeeItemId) -> ServiceResult<()> {
        self.remove::<FeeItem>(id).await
    }

    #[instrument(
        skip(self, input),
        fields(student_id = %input.student_id, invoice_number = tracing::field::Empty),
        err
    )]
    pub async fn issue_invoice(&self, input: NewInvoice) -> ServiceResult<Invoice> {
        let now = self.now();
        let student = self.get::<Student>(input.student_id).await?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in input.lines {
            let item = self.get::<FeeItem>(line.fee_item_id).await?;
            lines.push((line, item));
        }

        let draft = InvoiceDraft::build(&student, input.issue_date, &lines, now)?;
        let series = InvoiceSeries::for_date(&self.settings.invoice_prefix, draft.issue_date);
        let invoice = self.store.issue_invoice(draft, &series, now).await?;

        tracing::Span::current().record("invoice_number", invoice.number.as_str());
        info!(gross_total = invoice.gross_total.minor(), "invoice issued");
        Ok(invoice)
    }

    /// Invoices are never deleted; cancelling keeps the number in the series.
    #[instrument(skip(self, reason), err)]
    pub async fn cancel_invoice(&self, id: InvoiceId, reason: &str) -> ServiceResult<Invoice> {
        let mut invoice = self.get::<Invoice>(id).await?;
        invoice.cancel(reason, self.now())?;
        self.save(&invoice).await?;
        info!(number = %invoice.number, "invoice cancelled");
        Ok(invoice)
    }
}
