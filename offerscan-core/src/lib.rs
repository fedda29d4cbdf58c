// Offerscan Core Library
//
// Finds bank offers inside loosely structured JSON documents, normalizes them
// into flat records, and computes the largest discount a purchase can get.

pub mod types;
pub mod config;
pub mod error;
pub mod extractor;
pub mod rules;
pub mod discount;
pub mod storage;
pub mod processor;

// Re-export main types and functions for easy use
pub use types::*;
pub use config::OfferScanConfig;
pub use error::QueryError;
pub use extractor::{Extraction, ItemSource, OfferExtractor, SkipReason};
pub use rules::{RuleParser, TermKind};
pub use discount::DiscountEngine;
pub use storage::{FileStore, MemoryStore, OfferStore};
pub use processor::OfferProcessor;
