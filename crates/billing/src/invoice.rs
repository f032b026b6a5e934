use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use edugest_core::{
    text, DomainError, DomainResult, Entity, FeeItemId, InvoiceId, Money, StudentId, TaxRate, Timestamps,
};
use edugest_enrollment::Student;

use crate::{FeeItem, TaxExemption};

/// Invoice status lifecycle. Codes follow the tax file (`N` / `A`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Normal,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Normal => "normal",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(InvoiceStatus::Normal),
            "cancelled" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }

    /// SAFT-AO `InvoiceStatus` code.
    pub fn saft_code(&self) -> &'static str {
        match self {
            InvoiceStatus::Normal => "N",
            InvoiceStatus::Cancelled => "A",
        }
    }
}

/// Document series: one per prefix and calendar year, e.g. `FT EDU2025`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvoiceSeries {
    prefix: String,
    year: i32,
}

impl InvoiceSeries {
    pub fn new(prefix: &str, year: i32) -> Self {
        Self {
            prefix: prefix.trim().to_uppercase(),
            year,
        }
    }

    pub fn for_date(prefix: &str, date: NaiveDate) -> Self {
        Self::new(prefix, date.year())
    }

    pub fn name(&self) -> String {
        format!("FT {}{}", self.prefix, self.year)
    }

    pub fn number(&self, sequence: u32) -> String {
        format!("{}/{}", self.name(), sequence)
    }
}

/// One invoice line, priced from a fee item at issue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub line_no: u32,
    pub fee_item_id: FeeItemId,
    pub product_code: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub tax_rate: TaxRate,
    pub exemption: Option<TaxExemption>,
    pub net_amount: Money,
    pub tax_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewInvoiceLine {
    pub fee_item_id: FeeItemId,
    pub quantity: i64,
    /// Overrides the fee item description on the printed line.
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewInvoice {
    pub student_id: StudentId,
    /// Defaults to today.
    pub issue_date: Option<NaiveDate>,
    pub lines: Vec<NewInvoiceLine>,
}

/// A priced invoice that has not yet been given a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub student_id: StudentId,
    pub issue_date: NaiveDate,
    pub lines: Vec<InvoiceLine>,
    pub net_total: Money,
    pub tax_total: Money,
    pub gross_total: Money,
}

impl InvoiceDraft {
    /// `lines` pairs each requested line with its fee item.
    pub fn build(
        student: &Student,
        issue_date: Option<NaiveDate>,
        lines: &[(NewInvoiceLine, FeeItem)],
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("an invoice needs at least one line"));
        }
        let issue_date = issue_date.unwrap_or_else(|| now.date_naive());
        if issue_date > now.date_naive() {
            return Err(DomainError::validation("issue_date cannot be in the future"));
        }

        let mut priced = Vec::with_capacity(lines.len());
        for (idx, (request, fee)) in lines.iter().enumerate() {
            debug_assert_eq!(request.fee_item_id, fee.id);
            if request.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "line {}: quantity must be greater than zero",
                    idx + 1
                )));
            }
            let net_amount = fee.unit_price.times(request.quantity)?;
            priced.push(InvoiceLine {
                line_no: idx as u32 + 1,
                fee_item_id: fee.id,
                product_code: fee.code.clone(),
                description: text::optional(request.description.as_deref())
                    .unwrap_or_else(|| fee.description.clone()),
                quantity: request.quantity,
                unit_price: fee.unit_price,
                tax_rate: fee.tax_rate,
                exemption: fee.exemption.clone(),
                net_amount,
                tax_amount: fee.tax_rate.tax_on(net_amount),
            });
        }

        let net_total = Money::total(priced.iter().map(|l| l.net_amount))?;
        let tax_total = Money::total(priced.iter().map(|l| l.tax_amount))?;
        let gross_total = net_total.checked_add(tax_total)?;

        Ok(Self {
            student_id: student.id,
            issue_date,
            lines: priced,
            net_total,
            tax_total,
            gross_total,
        })
    }
}

/// Issued invoice (fiscal document).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub series: String,
    pub sequence: u32,
    pub number: String,
    pub student_id: StudentId,
    pub issue_date: NaiveDate,
    pub system_entry_at: DateTime<Utc>,
    pub lines: Vec<InvoiceLine>,
    pub net_total: Money,
    pub tax_total: Money,
    pub gross_total: Money,
    pub status: InvoiceStatus,
    pub status_changed_at: DateTime<Utc>,
    pub cancel_reason: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Invoice {
    /// Number a draft as the next document of `series`.
    ///
    /// `previous` is the last invoice issued in the series, if any. Documents
    /// within a series are chronological: the issue date may not go backwards.
    pub fn issue(
        draft: InvoiceDraft,
        series: &InvoiceSeries,
        previous: Option<(u32, NaiveDate)>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let sequence = match previous {
            Some((last_seq, last_date)) => {
                if draft.issue_date < last_date {
                    return Err(DomainError::invariant(format!(
                        "issue date {} precedes the last invoice of {} ({})",
                        draft.issue_date,
                        series.name(),
                        last_date
                    )));
                }
                last_seq + 1
            }
            None => 1,
        };

        Ok(Self {
            id: InvoiceId::new(),
            series: series.name(),
            sequence,
            number: series.number(sequence),
            student_id: draft.student_id,
            issue_date: draft.issue_date,
            system_entry_at: now,
            lines: draft.lines,
            net_total: draft.net_total,
            tax_total: draft.tax_total,
            gross_total: draft.gross_total,
            status: InvoiceStatus::Normal,
            status_changed_at: now,
            cancel_reason: None,
            timestamps: Timestamps::new(now),
        })
    }

    pub fn cancel(&mut self, reason: &str, now: DateTime<Utc>) -> DomainResult<()> {
        let reason = text::required("reason", reason)?;
        if self.status == InvoiceStatus::Cancelled {
            return Err(DomainError::invariant(format!(
                "invoice {} is already cancelled",
                self.number
            )));
        }
        self.status = InvoiceStatus::Cancelled;
        self.status_changed_at = now;
        self.cancel_reason = Some(reason);
        self.timestamps.touch(now);
        Ok(())
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;
    const KIND: &'static str = "invoice";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
