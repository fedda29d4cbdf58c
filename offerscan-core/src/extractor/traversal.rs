// Bounded pre-order walk over a whole document.
//
// Uses an explicit worklist instead of recursion so hostile nesting cannot
// blow the stack; `max_depth` additionally bounds the work done.

use super::paths::{first_sequence, first_string, has_marker};
use crate::config::ExtractorConfig;
use serde_json::Value;
use std::collections::BTreeSet;

/// Everything of interest found during one walk
#[derive(Debug, Default)]
pub struct ScanHits<'a> {
    /// Offer-marked nodes that carry a non-empty offer list, in document order
    pub offer_nodes: Vec<&'a Value>,
    /// Instrument types from every instrument-marked node
    pub instrument_types: BTreeSet<String>,
    /// Containers at the depth limit whose children were not visited
    pub truncated: usize,
}

pub struct TreeScanner<'c> {
    config: &'c ExtractorConfig,
    collect_offers: bool,
}

impl<'c> TreeScanner<'c> {
    /// Scanner collecting both offer nodes and instrument types
    pub fn new(config: &'c ExtractorConfig) -> Self {
        Self {
            config,
            collect_offers: true,
        }
    }

    /// Scanner that only gathers instrument types, for when the offer list
    /// is already known
    pub fn instruments_only(config: &'c ExtractorConfig) -> Self {
        Self {
            config,
            collect_offers: false,
        }
    }

    pub fn scan<'a>(&self, root: &'a Value) -> ScanHits<'a> {
        let mut hits = ScanHits::default();
        let mut worklist: Vec<(&'a Value, usize)> = vec![(root, 0)];

        while let Some((node, depth)) = worklist.pop() {
            let children: Vec<&'a Value> = match node {
                Value::Object(map) => {
                    self.inspect(node, &mut hits);
                    map.values().collect()
                }
                Value::Array(items) => items.iter().collect(),
                _ => continue,
            };

            if children.is_empty() {
                continue;
            }
            if depth >= self.config.max_depth {
                hits.truncated += 1;
                continue;
            }
            // Reverse so the stack pops children in document order
            worklist.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }

        hits
    }

    fn inspect<'a>(&self, node: &'a Value, hits: &mut ScanHits<'a>) {
        let marker_field = &self.config.marker_field;

        if has_marker(node, marker_field, &self.config.offer_marker) {
            if self.collect_offers && first_sequence(node, &self.config.offer_list_paths).is_some() {
                hits.offer_nodes.push(node);
            }
        } else if has_marker(node, marker_field, &self.config.instrument_marker) {
            if let Some(instrument) = first_string(node, &self.config.instrument_type_paths) {
                hits.instrument_types.insert(instrument.trim().to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offer_node(id: &str) -> Value {
        json!({
            "type": "OFFER_LIST",
            "data": {"offerList": [{"offerDescription": {"id": id}}]}
        })
    }

    #[test]
    fn test_scan_finds_disjoint_regions_in_order() {
        let doc = json!({
            "a": {"deep": {"deeper": [offer_node("A1")]}},
            "b": [{"x": offer_node("B1")}, {"type": "PAYMENT_OPTION", "data": {"instrumentType": "CREDIT"}}],
            "c": {"type": "PAYMENT_OPTION", "instrumentType": "EMI_OPTIONS"}
        });
        let config = ExtractorConfig::default();
        let hits = TreeScanner::new(&config).scan(&doc);

        assert_eq!(hits.offer_nodes.len(), 2);
        assert_eq!(hits.offer_nodes[0]["data"]["offerList"][0]["offerDescription"]["id"], "A1");
        assert_eq!(hits.offer_nodes[1]["data"]["offerList"][0]["offerDescription"]["id"], "B1");
        assert_eq!(
            hits.instrument_types.into_iter().collect::<Vec<_>>(),
            vec!["CREDIT", "EMI_OPTIONS"]
        );
    }

    #[test]
    fn test_offer_marker_without_list_is_ignored() {
        let doc = json!([{"type": "OFFER_LIST", "data": {"offerList": []}}, {"type": "OFFER_LIST"}]);
        let config = ExtractorConfig::default();
        assert!(TreeScanner::new(&config).scan(&doc).offer_nodes.is_empty());
    }

    #[test]
    fn test_depth_guard_stops_descent() {
        let mut doc = offer_node("DEEP");
        for _ in 0..10 {
            doc = json!({ "wrap": doc });
        }
        let config = ExtractorConfig {
            max_depth: 5,
            ..ExtractorConfig::default()
        };
        let hits = TreeScanner::new(&config).scan(&doc);
        assert!(hits.offer_nodes.is_empty());
        assert_eq!(hits.truncated, 1);

        let config = ExtractorConfig::default();
        assert_eq!(TreeScanner::new(&config).scan(&doc).offer_nodes.len(), 1);
    }

    #[test]
    fn test_instruments_only_skips_offer_nodes() {
        let doc = json!({
            "offers": [offer_node("A1")],
            "pay": {"type": "PAYMENT_OPTION", "instrumentType": "CREDIT"}
        });
        let config = ExtractorConfig::default();
        let hits = TreeScanner::instruments_only(&config).scan(&doc);

        assert!(hits.offer_nodes.is_empty());
        assert_eq!(hits.instrument_types.into_iter().collect::<Vec<_>>(), vec!["CREDIT"]);
    }

    #[test]
    fn test_nesting_past_limit_is_truncated() {
        let mut doc = json!("leaf");
        for _ in 0..200 {
            doc = Value::Array(vec![doc]);
        }
        let config = ExtractorConfig::default();
        let hits = TreeScanner::new(&config).scan(&doc);
        assert_eq!(hits.truncated, 1);
    }
}
