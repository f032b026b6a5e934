use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edugest_core::{text, DomainError, DomainResult, Entity, FeeItemId, Money, TaxRate, Timestamps};

/// Legal ground for charging no tax on a fee (e.g. code `M11`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxExemption {
    pub code: String,
    pub reason: String,
}

/// A billable fee (tuition, enrollment fee, certificate, ...).
///
/// Appears as a `Product` in the SAFT-AO master files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeItem {
    pub id: FeeItemId,
    pub code: String,
    pub description: String,
    pub unit_price: Money,
    pub tax_rate: TaxRate,
    pub exemption: Option<TaxExemption>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewFeeItem {
    pub code: String,
    pub description: String,
    /// Minor units (cêntimos).
    pub unit_price: i64,
    /// Basis points; 0 requires an exemption.
    #[serde(default)]
    pub tax_rate_bp: u32,
    pub tax_exemption_code: Option<String>,
    pub tax_exemption_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeeItemPatch {
    pub description: Option<String>,
    pub unit_price: Option<i64>,
    pub tax_rate_bp: Option<u32>,
    pub tax_exemption_code: Option<String>,
    pub tax_exemption_reason: Option<String>,
}

impl FeeItem {
    pub fn create(input: NewFeeItem, now: DateTime<Utc>) -> DomainResult<Self> {
        let tax_rate = TaxRate::from_basis_points(input.tax_rate_bp)?;
        Ok(Self {
            id: FeeItemId::new(),
            code: text::code("code", &input.code)?,
            description: text::required("description", &input.description)?,
            unit_price: validate_price(input.unit_price)?,
            tax_rate,
            exemption: exemption_for(
                tax_rate,
                input.tax_exemption_code.as_deref(),
                input.tax_exemption_reason.as_deref(),
            )?,
            timestamps: Timestamps::new(now),
        })
    }

    /// The code is immutable: it identifies the product in exported tax files.
    pub fn apply(&mut self, patch: FeeItemPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let description = patch
            .description
            .map(|d| text::required("description", &d))
            .transpose()?;
        let unit_price = patch.unit_price.map(validate_price).transpose()?;
        let tax_rate = match patch.tax_rate_bp {
            Some(bp) => TaxRate::from_basis_points(bp)?,
            None => self.tax_rate,
        };
        let exemption = if patch.tax_exemption_code.is_some() || patch.tax_exemption_reason.is_some() {
            exemption_for(
                tax_rate,
                patch.tax_exemption_code.as_deref(),
                patch.tax_exemption_reason.as_deref(),
            )?
        } else {
            let current = self.exemption.as_ref();
            exemption_for(
                tax_rate,
                current.map(|e| e.code.as_str()),
                current.map(|e| e.reason.as_str()),
            )?
        };

        if let Some(description) = description {
            self.description = description;
        }
        if let Some(unit_price) = unit_price {
            self.unit_price = unit_price;
        }
        self.tax_rate = tax_rate;
        self.exemption = exemption;
        self.timestamps.touch(now);
        Ok(())
    }
}

fn validate_price(minor: i64) -> DomainResult<Money> {
    if minor <= 0 {
        return Err(DomainError::validation("unit_price must be greater than zero"));
    }
    Ok(Money::from_minor(minor))
}

fn exemption_for(rate: TaxRate, code: Option<&str>, reason: Option<&str>) -> DomainResult<Option<TaxExemption>> {
    let code = text::optional(code);
    let reason = text::optional(reason);
    if !rate.is_exempt() {
        return Ok(None);
    }
    match (code, reason) {
        (Some(code), Some(reason)) => Ok(Some(TaxExemption {
            code: code.to_uppercase(),
            reason,
        })),
        _ => Err(DomainError::validation(
            "tax-exempt fees require tax_exemption_code and tax_exemption_reason",
        )),
    }
}

impl Entity for FeeItem {
    type Id = FeeItemId;
    const KIND: &'static str = "fee item";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuition() -> NewFeeItem {
        NewFeeItem {
            code: "PROP10".into(),
            description: "Propina 10ª classe".into(),
            unit_price: 1_500_000,
            tax_rate_bp: 0,
            tax_exemption_code: Some("m11".into()),
            tax_exemption_reason: Some("Isento nos termos da alínea f) do artigo 12.º do CIVA".into()),
        }
    }

    #[test]
    fn exempt_fee_keeps_exemption() {
        let fee = FeeItem::create(tuition(), Utc::now()).unwrap();
        assert!(fee.tax_rate.is_exempt());
        assert_eq!(fee.exemption.unwrap().code, "M11");
    }

    #[test]
    fn exempt_fee_without_reason_is_rejected() {
        let mut input = tuition();
        input.tax_exemption_reason = None;
        assert!(FeeItem::create(input, Utc::now()).is_err());
    }

    #[test]
    fn taxed_fee_drops_exemption() {
        let mut input = tuition();
        input.tax_rate_bp = 1400;
        let fee = FeeItem::create(input, Utc::now()).unwrap();
        assert_eq!(fee.exemption, None);
    }

    #[test]
    fn switching_to_exempt_requires_exemption() {
        let mut input = tuition();
        input.tax_rate_bp = 1400;
        input.tax_exemption_code = None;
        input.tax_exemption_reason = None;
        let mut fee = FeeItem::create(input, Utc::now()).unwrap();

        let patch = FeeItemPatch {
            tax_rate_bp: Some(0),
            ..Default::default()
        };
        assert!(fee.apply(patch, Utc::now()).is_err());
        assert_eq!(fee.tax_rate.basis_points(), 1400);
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let mut input = tuition();
        input.unit_price = 0;
        assert!(FeeItem::create(input, Utc::now()).is_err());
    }
}
