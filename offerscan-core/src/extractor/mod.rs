//! Structural offer extraction
//!
//! Locates offer lists and payment instruments inside an arbitrarily nested
//! JSON document and normalizes each offer entry into an [`OfferRecord`].
//!
//! ## Strategy
//!
//! ```text
//! document
//!     ↓
//! [fast path]   probe known item-list locations from the root
//!     ↓ (none resolved)
//! [fallback]    bounded walk collecting every offer-marked node
//!               (with a fast path the walk only gathers instruments)
//!     ↓
//! offer entries ──normalize──> OfferRecord (+ document-wide instruments)
//! ```
//!
//! Instruments are not positionally tied to offers in the source documents,
//! so one instrument set is collected for the whole document and attached to
//! every offer that names at least one bank.

pub mod paths;
pub mod traversal;

use crate::config::ExtractorConfig;
use crate::types::*;
use paths::{first_identifier, first_sequence, first_string, has_marker, resolve, string_members};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};
use traversal::TreeScanner;

/// How the offer-bearing nodes were located
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ItemSource {
    /// A known item-list location resolved; holds the dotted path
    FastPath(String),
    /// No known location resolved, the whole document was searched
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    NotAMapping,
    MissingId,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAMapping => write!(f, "entry is not a mapping"),
            SkipReason::MissingId => write!(f, "entry has no usable id"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    /// Position of the entry among all offer entries of the document
    pub index: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    /// Normalized offers in document order. Duplicated ids are kept;
    /// deduplication belongs to the store.
    pub records: Vec<OfferRecord>,
    pub identified_count: usize,
    pub skipped: Vec<SkippedEntry>,
    pub source: ItemSource,
    /// Instrument types found anywhere in the document
    pub instruments: BTreeSet<String>,
}

impl Extraction {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

pub struct OfferExtractor {
    config: ExtractorConfig,
}

impl Default for OfferExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl OfferExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract every offer from `document`. Never fails: malformed entries
    /// are skipped and reported in [`Extraction::skipped`].
    pub fn extract(&self, document: &Value) -> Extraction {
        let fast_path = self.probe_fast_paths(document);

        // Instruments are document-wide, so a walk is always needed; offer nodes
        // are only collected when no fast path resolved
        let scanner = match fast_path {
            Some(_) => TreeScanner::instruments_only(&self.config),
            None => TreeScanner::new(&self.config),
        };
        let hits = scanner.scan(document);
        if hits.truncated > 0 {
            debug!(
                truncated = hits.truncated,
                max_depth = self.config.max_depth,
                "Depth limit reached while scanning document"
            );
        }

        let (source, offer_nodes) = match fast_path {
            Some((path, items)) => {
                debug!(path = %path, items = items.len(), "Fast path resolved");
                let nodes = items
                    .iter()
                    .filter(|item| self.is_offer_node(item))
                    .collect::<Vec<_>>();
                (ItemSource::FastPath(path), nodes)
            }
            None => {
                debug!(
                    offer_nodes = hits.offer_nodes.len(),
                    "No fast path resolved, using full document search"
                );
                (ItemSource::Fallback, hits.offer_nodes)
            }
        };

        let instruments = hits.instrument_types;
        let mut records = Vec::new();
        let mut skipped = Vec::new();

        let entries = offer_nodes
            .into_iter()
            .filter_map(|node| first_sequence(node, &self.config.offer_list_paths))
            .flatten();

        for (index, entry) in entries.enumerate() {
            match self.normalize_entry(entry, &instruments) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    warn!(index, %reason, "Skipping malformed offer entry");
                    skipped.push(SkippedEntry { index, reason });
                }
            }
        }

        info!(
            source = ?source,
            identified = records.len(),
            skipped = skipped.len(),
            instruments = instruments.len(),
            "Offer extraction finished"
        );

        Extraction {
            identified_count: records.len(),
            records,
            skipped,
            source,
            instruments,
        }
    }

    /// First known location that holds a non-empty item list
    fn probe_fast_paths<'a>(&self, document: &'a Value) -> Option<(String, &'a Vec<Value>)> {
        self.config.fast_paths.iter().find_map(|path| {
            resolve(document, path)?
                .as_array()
                .filter(|items| !items.is_empty())
                .map(|items| (path.clone(), items))
        })
    }

    fn is_offer_node(&self, node: &Value) -> bool {
        has_marker(node, &self.config.marker_field, &self.config.offer_marker)
            && first_sequence(node, &self.config.offer_list_paths).is_some()
    }

    fn normalize_entry(
        &self,
        entry: &Value,
        instruments: &BTreeSet<String>,
    ) -> Result<OfferRecord, SkipReason> {
        if !entry.is_object() {
            return Err(SkipReason::NotAMapping);
        }
        let id = first_identifier(entry, &self.config.id_paths).ok_or(SkipReason::MissingId)?;

        let mut record = OfferRecord::new(&id);
        record.text = first_string(entry, &self.config.text_paths)
            .unwrap_or(DEFAULT_TEXT)
            .to_string();
        record.description = first_string(entry, &self.config.description_paths)
            .unwrap_or(DEFAULT_DESCRIPTION)
            .to_string();
        record.logo = resolve(entry, &self.config.logo_path)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_LOGO)
            .to_string();
        record.banks = string_members(entry, &self.config.provider_path)
            .into_iter()
            .collect();

        // Bank-less (UPI style) offers never become instrument specific
        if !record.banks.is_empty() {
            record.instruments = instruments.clone();
        }

        Ok(record)
    }
}
