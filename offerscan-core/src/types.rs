use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

// ===== OFFER RECORDS =====
// An OfferRecord is created once, at ingestion, and never modified afterwards.
// `id` is the only identity: two records with the same id are the same offer.

/// Default for a missing summary text
pub const DEFAULT_TEXT: &str = "";
/// Default for missing offer terms (yields no rule)
pub const DEFAULT_DESCRIPTION: &str = "";
/// Default for a missing logo URL
pub const DEFAULT_LOGO: &str = "";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRecord {
    pub id: String,
    /// Short summary shown next to the offer (e.g. "Get ₹100 cashback")
    #[serde(default)]
    pub text: String,
    /// Full terms. The only input used when deriving a discount rule.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo: String,
    /// Bank codes (AXIS, HDFC, ...). Empty for universal / UPI style offers.
    #[serde(default)]
    pub banks: BTreeSet<String>,
    /// Payment instrument types. Only ever populated when `banks` is non-empty.
    #[serde(default)]
    pub instruments: BTreeSet<String>,
}

impl OfferRecord {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            text: DEFAULT_TEXT.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            logo: DEFAULT_LOGO.to_string(),
            banks: BTreeSet::new(),
            instruments: BTreeSet::new(),
        }
    }

    pub fn supports_bank(&self, bank_name: &str) -> bool {
        self.banks.contains(bank_name)
    }

    /// True when the offer records no instrument restriction at all
    pub fn is_instrument_agnostic(&self) -> bool {
        self.instruments.is_empty()
    }
}

// ===== RULES =====
// Rules are derived from `OfferRecord::description` on every query and never stored.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    Flat,
    Percentage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub kind: RuleKind,
    /// Rupee amount for FLAT, percentage value (0-100] for PERCENTAGE
    pub amount: f64,
    /// Upper bound on a percentage-derived discount
    pub cap: Option<f64>,
    /// Minimum purchase amount for the rule to apply
    pub min_order: Option<f64>,
}

impl Rule {
    pub fn flat(amount: f64) -> Self {
        Self {
            kind: RuleKind::Flat,
            amount,
            cap: None,
            min_order: None,
        }
    }

    pub fn percentage(amount: f64) -> Self {
        Self {
            kind: RuleKind::Percentage,
            amount,
            cap: None,
            min_order: None,
        }
    }

    pub fn with_cap(mut self, cap: f64) -> Self {
        self.cap = Some(cap);
        self
    }

    pub fn with_min_order(mut self, min_order: f64) -> Self {
        self.min_order = Some(min_order);
        self
    }

    pub fn min_order_met(&self, amount_to_pay: f64) -> bool {
        self.min_order.map_or(true, |min| amount_to_pay >= min)
    }
}

// ===== QUERIES =====

/// A validated discount query. Construct with [`DiscountQuery::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountQuery {
    amount_to_pay: f64,
    bank_name: String,
    payment_instrument: Option<String>,
}

impl DiscountQuery {
    pub fn new(
        amount_to_pay: f64,
        bank_name: &str,
        payment_instrument: Option<&str>,
    ) -> Result<Self, QueryError> {
        if !amount_to_pay.is_finite() {
            return Err(QueryError::NonFiniteAmount);
        }
        if amount_to_pay <= 0.0 {
            return Err(QueryError::NonPositiveAmount(amount_to_pay));
        }
        let bank_name = bank_name.trim();
        if bank_name.is_empty() {
            return Err(QueryError::EmptyBankName);
        }

        // A blank instrument is the same as no instrument filter
        let payment_instrument = payment_instrument
            .map(str::trim)
            .filter(|instrument| !instrument.is_empty())
            .map(str::to_string);

        Ok(Self {
            amount_to_pay,
            bank_name: bank_name.to_string(),
            payment_instrument,
        })
    }

    pub fn amount_to_pay(&self) -> f64 {
        self.amount_to_pay
    }

    pub fn bank_name(&self) -> &str {
        &self.bank_name
    }

    pub fn payment_instrument(&self) -> Option<&str> {
        self.payment_instrument.as_deref()
    }
}

// ===== RESULTS =====

/// Summary handed back to the ingestion caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub run_id: Uuid,
    /// Every well-formed offer entry found in the document
    pub identified_count: usize,
    /// Offers whose id was not yet known to the store
    pub new_count: usize,
    /// Entries dropped because they were malformed
    pub skipped_count: usize,
}

/// Discount computed for a single eligible candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDiscount {
    pub offer_id: String,
    pub rule: Option<Rule>,
    pub discount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_rejects_bad_amounts() {
        assert_eq!(
            DiscountQuery::new(-10.0, "AXIS", None),
            Err(QueryError::NonPositiveAmount(-10.0))
        );
        assert_eq!(
            DiscountQuery::new(0.0, "AXIS", None),
            Err(QueryError::NonPositiveAmount(0.0))
        );
        assert_eq!(
            DiscountQuery::new(f64::NAN, "AXIS", None),
            Err(QueryError::NonFiniteAmount)
        );
    }

    #[test]
    fn test_query_rejects_blank_bank() {
        assert_eq!(
            DiscountQuery::new(100.0, "   ", None),
            Err(QueryError::EmptyBankName)
        );
    }

    #[test]
    fn test_blank_instrument_means_no_filter() {
        let query = DiscountQuery::new(100.0, " HDFC ", Some("  ")).unwrap();
        assert_eq!(query.bank_name(), "HDFC");
        assert_eq!(query.payment_instrument(), None);
    }

    #[test]
    fn test_ingest_report_uses_camel_case() {
        let report = IngestReport {
            run_id: Uuid::nil(),
            identified_count: 3,
            new_count: 1,
            skipped_count: 0,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["identifiedCount"], 3);
        assert_eq!(json["newCount"], 1);
    }
}
