// JSON shapes printed by the CLI

use offerscan_core::{OfferDiscount, OfferRecord};
use serde_json::{json, Value};

pub fn highest_discount_json(amount: f64) -> Value {
    json!({ "highestDiscountAmount": amount })
}

pub fn explain_json(amount: f64, breakdown: &[OfferDiscount]) -> Value {
    json!({
        "highestDiscountAmount": amount,
        "candidates": breakdown,
    })
}

pub fn offer_listing_json(offers: &[OfferRecord]) -> Value {
    let offers: Vec<Value> = offers
        .iter()
        .map(|offer| {
            json!({
                "offerId": offer.id,
                "offerText": offer.text,
                "banks": offer.banks,
                "paymentInstruments": offer.instruments,
            })
        })
        .collect();

    json!({
        "total": offers.len(),
        "offers": offers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_shape() {
        let mut offer = OfferRecord::new("FPO001");
        offer.text = "Get ₹100 cashback".to_string();
        offer.banks.insert("AXIS".to_string());
        offer.instruments.insert("CREDIT".to_string());

        let listing = offer_listing_json(&[offer]);
        assert_eq!(listing["total"], 1);
        assert_eq!(listing["offers"][0]["offerId"], "FPO001");
        assert_eq!(listing["offers"][0]["banks"], json!(["AXIS"]));
        assert_eq!(listing["offers"][0]["paymentInstruments"], json!(["CREDIT"]));
    }

    #[test]
    fn test_discount_shape() {
        assert_eq!(highest_discount_json(500.0)["highestDiscountAmount"], 500.0);
    }
}
