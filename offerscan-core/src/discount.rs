use crate::config::{DiscountConfig, InstrumentPolicy};
use crate::rules::RuleParser;
use crate::types::*;

/// Computes the best discount a query can get from a set of candidate offers.
///
/// Pure with respect to its inputs: candidates are re-filtered here even when
/// the store already filtered them, and rules are re-derived from each
/// description on every call.
pub struct DiscountEngine {
    parser: RuleParser,
    config: DiscountConfig,
}

impl Default for DiscountEngine {
    fn default() -> Self {
        Self::new(RuleParser::default(), DiscountConfig::default())
    }
}

impl DiscountEngine {
    pub fn new(parser: RuleParser, config: DiscountConfig) -> Self {
        Self { parser, config }
    }

    pub fn config(&self) -> &DiscountConfig {
        &self.config
    }

    pub fn is_eligible(&self, query: &DiscountQuery, offer: &OfferRecord) -> bool {
        // Bank-less offers are never reachable through a bank query
        if !offer.supports_bank(query.bank_name()) {
            return false;
        }
        match query.payment_instrument() {
            Some(instrument) => {
                offer.is_instrument_agnostic() || offer.instruments.contains(instrument)
            }
            None => match self.config.instrument_policy {
                InstrumentPolicy::IncludeRestricted => true,
                InstrumentPolicy::ExcludeRestricted => offer.is_instrument_agnostic(),
            },
        }
    }

    /// Discount `rule` grants on `amount_to_pay`
    pub fn apply_rule(&self, rule: &Rule, amount_to_pay: f64) -> f64 {
        match rule.kind {
            RuleKind::Percentage => {
                if self.config.min_order_applies_to_percentage && !rule.min_order_met(amount_to_pay) {
                    return 0.0;
                }
                // Scale the rate first so large amounts cannot overflow
                let discount = amount_to_pay * (rule.amount / 100.0);
                rule.cap.map_or(discount, |cap| discount.min(cap))
            }
            RuleKind::Flat => {
                if rule.min_order_met(amount_to_pay) {
                    rule.amount
                } else {
                    0.0
                }
            }
        }
    }

    /// Per-offer breakdown for every eligible candidate, in candidate order
    pub fn evaluate(&self, query: &DiscountQuery, candidates: &[OfferRecord]) -> Vec<OfferDiscount> {
        candidates
            .iter()
            .filter(|offer| self.is_eligible(query, offer))
            .map(|offer| {
                let rule = self.parser.parse(&offer.description);
                let discount = rule
                    .as_ref()
                    .map_or(0.0, |rule| self.apply_rule(rule, query.amount_to_pay()));
                OfferDiscount {
                    offer_id: offer.id.clone(),
                    rule,
                    discount,
                }
            })
            .collect()
    }

    /// Highest discount across all eligible candidates, 0.0 when none applies
    pub fn highest_discount(&self, query: &DiscountQuery, candidates: &[OfferRecord]) -> f64 {
        Self::best_of(&self.evaluate(query, candidates))
    }

    /// Highest finite discount in an already computed breakdown, 0.0 when empty
    pub fn best_of(breakdown: &[OfferDiscount]) -> f64 {
        breakdown
            .iter()
            .map(|d| d.discount)
            .filter(|d| d.is_finite())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(id: &str, banks: &[&str], instruments: &[&str], description: &str) -> OfferRecord {
        let mut record = OfferRecord::new(id);
        record.description = description.to_string();
        record.banks = banks.iter().map(|b| b.to_string()).collect();
        record.instruments = instruments.iter().map(|i| i.to_string()).collect();
        record
    }

    fn query(amount: f64, bank: &str, instrument: Option<&str>) -> DiscountQuery {
        DiscountQuery::new(amount, bank, instrument).unwrap()
    }

    fn engine_with_policy(policy: InstrumentPolicy) -> DiscountEngine {
        DiscountEngine::new(
            RuleParser::default(),
            DiscountConfig {
                instrument_policy: policy,
                ..DiscountConfig::default()
            },
        )
    }

    #[test]
    fn test_percentage_capped() {
        let engine = DiscountEngine::default();
        let offers = vec![offer("P", &["ICICI"], &[], "5% cashback up to ₹500")];

        assert_eq!(engine.highest_discount(&query(10000.0, "ICICI", None), &offers), 500.0);
        assert_eq!(engine.highest_discount(&query(5000.0, "ICICI", None), &offers), 250.0);
    }

    #[test]
    fn test_uncapped_percentage_on_huge_amount_stays_finite() {
        let engine = DiscountEngine::default();
        let offers = vec![offer("HALF", &["AXIS"], &[], "50% off")];
        let q = query(1e307, "AXIS", None);

        let breakdown = engine.evaluate(&q, &offers);
        assert_eq!(breakdown[0].discount, 5e306);
        assert_eq!(engine.highest_discount(&q, &offers), 5e306);
    }

    #[test]
    fn test_best_of_matches_highest_discount() {
        let engine = DiscountEngine::default();
        let offers = vec![
            offer("A", &["HDFC"], &[], "Flat ₹100 off"),
            offer("B", &["HDFC"], &[], "10% off up to ₹1500"),
        ];
        let q = query(12000.0, "HDFC", None);

        let breakdown = engine.evaluate(&q, &offers);
        assert_eq!(DiscountEngine::best_of(&breakdown), engine.highest_discount(&q, &offers));
        assert_eq!(DiscountEngine::best_of(&[]), 0.0);

        let broken = vec![OfferDiscount {
            offer_id: "NAN".to_string(),
            rule: None,
            discount: f64::NAN,
        }];
        assert_eq!(DiscountEngine::best_of(&broken), 0.0);
    }

    #[test]
    fn test_flat_threshold() {
        let engine = DiscountEngine::default();
        let offers = vec![offer("F", &["AXIS"], &[], "Flat ₹100 cashback. Min Order ₹5000")];

        assert_eq!(engine.highest_discount(&query(6000.0, "AXIS", None), &offers), 100.0);
        assert_eq!(engine.highest_discount(&query(5000.0, "AXIS", None), &offers), 100.0);
        assert_eq!(engine.highest_discount(&query(4000.0, "AXIS", None), &offers), 0.0);
    }

    #[test]
    fn test_best_offer_wins() {
        let engine = DiscountEngine::default();
        let offers = vec![
            offer("A", &["HDFC"], &[], "Flat ₹100 off"),
            offer("B", &["HDFC"], &[], "10% off up to ₹1500"),
            offer("C", &["HDFC"], &[], "No Cost EMI"),
            offer("D", &["AXIS"], &[], "Flat ₹5000 off"),
        ];

        let q = query(12000.0, "HDFC", None);
        assert_eq!(engine.highest_discount(&q, &offers), 1200.0);

        let breakdown = engine.evaluate(&q, &offers);
        let ids: Vec<_> = breakdown.iter().map(|d| d.offer_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(breakdown[2].rule, None);
        assert_eq!(breakdown[2].discount, 0.0);
    }

    #[test]
    fn test_unknown_bank_and_empty_candidates() {
        let engine = DiscountEngine::default();
        let offers = vec![offer("A", &["HDFC"], &[], "Flat ₹100 off")];

        assert_eq!(engine.highest_discount(&query(1000.0, "KOTAK", None), &offers), 0.0);
        assert_eq!(engine.highest_discount(&query(1000.0, "HDFC", None), &[]), 0.0);
    }

    #[test]
    fn test_bankless_offers_never_match_bank_queries() {
        let engine = DiscountEngine::default();
        let offers = vec![offer("UPI", &[], &[], "Flat ₹10 off")];
        assert_eq!(engine.highest_discount(&query(1000.0, "HDFC", None), &offers), 0.0);
    }

    #[test]
    fn test_instrument_filter() {
        let engine = DiscountEngine::default();
        let offers = vec![offer("C", &["AXIS"], &["CREDIT"], "Flat ₹300 off")];

        assert_eq!(engine.highest_discount(&query(1000.0, "AXIS", Some("EMI_OPTIONS")), &offers), 0.0);
        assert_eq!(engine.highest_discount(&query(1000.0, "AXIS", Some("CREDIT")), &offers), 300.0);
    }

    #[test]
    fn test_unrestricted_offer_matches_any_instrument() {
        let engine = DiscountEngine::default();
        let offers = vec![offer("U", &["AXIS"], &[], "Flat ₹300 off")];
        assert_eq!(engine.highest_discount(&query(1000.0, "AXIS", Some("DEBIT")), &offers), 300.0);
    }

    #[test]
    fn test_bank_only_query_include_policy() {
        let engine = engine_with_policy(InstrumentPolicy::IncludeRestricted);
        let offers = vec![offer("C", &["AXIS"], &["CREDIT"], "Flat ₹300 off")];
        assert_eq!(engine.highest_discount(&query(1000.0, "AXIS", None), &offers), 300.0);
    }

    #[test]
    fn test_bank_only_query_exclude_policy() {
        let engine = engine_with_policy(InstrumentPolicy::ExcludeRestricted);
        let offers = vec![
            offer("C", &["AXIS"], &["CREDIT"], "Flat ₹300 off"),
            offer("U", &["AXIS"], &[], "Flat ₹50 off"),
        ];
        assert_eq!(engine.highest_discount(&query(1000.0, "AXIS", None), &offers), 50.0);
    }

    #[test]
    fn test_min_order_on_percentage_is_opt_in() {
        let offers = vec![offer("P", &["SBI"], &[], "5% cashback upto ₹750. Min order ₹5000")];
        let q = query(3000.0, "SBI", None);

        assert_eq!(DiscountEngine::default().highest_discount(&q, &offers), 150.0);

        let strict = DiscountEngine::new(
            RuleParser::default(),
            DiscountConfig {
                min_order_applies_to_percentage: true,
                ..DiscountConfig::default()
            },
        );
        assert_eq!(strict.highest_discount(&q, &offers), 0.0);
        assert_eq!(strict.highest_discount(&query(20000.0, "SBI", None), &offers), 750.0);
    }

    #[test]
    fn test_repeated_calls_are_deterministic() {
        let engine = DiscountEngine::default();
        let offers = vec![
            offer("A", &["HDFC"], &["CREDIT"], "7% off up to ₹999"),
            offer("B", &["HDFC"], &[], "Flat ₹650 off. Min Order ₹8000"),
        ];
        let before = offers.clone();
        let q = query(9000.0, "HDFC", Some("CREDIT"));

        let first = engine.highest_discount(&q, &offers);
        for _ in 0..10 {
            assert_eq!(engine.highest_discount(&q, &offers), first);
        }
        assert_eq!(first, 650.0);
        assert_eq!(offers, before);
    }
}
