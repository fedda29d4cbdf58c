use crate::config::OfferScanConfig;
use crate::discount::DiscountEngine;
use crate::extractor::OfferExtractor;
use crate::rules::RuleParser;
use crate::storage::{FileStore, MemoryStore, OfferStore};
use crate::types::*;
use anyhow::Result;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span};
use uuid::Uuid;

/// Simple profiler that collects timings for processing steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        debug!(step = step_name, elapsed_us = elapsed.as_micros() as u64, "Step finished");
        self.timings.push((step_name.to_string(), elapsed));

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn total(&self) -> Duration {
        self.timings.iter().map(|(_, d)| *d).sum()
    }
}

pub struct OfferProcessor {
    extractor: OfferExtractor,
    engine: DiscountEngine,
    storage: Box<dyn OfferStore + Send + Sync>,
    profiling: bool,
}

impl OfferProcessor {
    /// Create OfferProcessor with full dependency injection
    pub fn new_with_dependencies(
        config: &OfferScanConfig,
        storage: Box<dyn OfferStore + Send + Sync>,
    ) -> Result<Self> {
        let parser = RuleParser::new(&config.rules)?;
        Ok(Self {
            extractor: OfferExtractor::new(config.extractor.clone()),
            engine: DiscountEngine::new(parser, config.discount.clone()),
            storage,
            profiling: false,
        })
    }

    /// Convenience constructor backed by the directory in `config.storage`
    pub fn new_file_backed(config: &OfferScanConfig) -> Result<Self> {
        let storage = Box::new(FileStore::new(&config.storage.dir)?);
        Self::new_with_dependencies(config, storage)
    }

    /// Convenience constructor with a throwaway in-memory store
    pub fn new_in_memory(config: &OfferScanConfig) -> Result<Self> {
        Self::new_with_dependencies(config, Box::new(MemoryStore::new()))
    }

    pub fn set_profiling(&mut self, enabled: bool) {
        self.profiling = enabled;
    }

    pub fn extractor(&self) -> &OfferExtractor {
        &self.extractor
    }

    pub fn engine(&self) -> &DiscountEngine {
        &self.engine
    }

    /// Extract offers from `document` and store the ones with unknown ids.
    ///
    /// Malformed entries only lower the identified count; storage failures
    /// abort the run.
    pub fn ingest(&mut self, document: &Value) -> Result<IngestReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("ingest", %run_id);
        let _guard = span.enter();

        let mut profiler = StepProfiler::new(self.profiling);
        let extraction = profiler.time_step("Extraction", || self.extractor.extract(document));

        let storage = &mut self.storage;
        let new_count = profiler.time_step("Store", || -> Result<usize> {
            let mut created = 0;
            for record in &extraction.records {
                if storage.exists(&record.id)? {
                    continue;
                }
                if storage.insert(record)? {
                    created += 1;
                }
            }
            Ok(created)
        })?;

        let report = IngestReport {
            run_id,
            identified_count: extraction.identified_count,
            new_count,
            skipped_count: extraction.skipped_count(),
        };

        info!(
            identified = report.identified_count,
            new = report.new_count,
            skipped = report.skipped_count,
            total_us = profiler.total().as_micros() as u64,
            "Ingestion finished"
        );
        Ok(report)
    }

    /// Highest discount available for `query`, 0.0 when nothing applies
    pub fn highest_discount(&self, query: &DiscountQuery) -> Result<f64> {
        let candidates = self
            .storage
            .query(query.bank_name(), query.payment_instrument())?;
        let discount = self.engine.highest_discount(query, &candidates);

        debug!(
            bank = query.bank_name(),
            instrument = query.payment_instrument().unwrap_or("-"),
            candidates = candidates.len(),
            discount,
            "Discount computed"
        );
        Ok(discount)
    }

    /// Per-offer breakdown behind [`OfferProcessor::highest_discount`]
    pub fn explain(&self, query: &DiscountQuery) -> Result<Vec<OfferDiscount>> {
        let candidates = self
            .storage
            .query(query.bank_name(), query.payment_instrument())?;
        Ok(self.engine.evaluate(query, &candidates))
    }

    pub fn list_offers(&self, skip: usize, limit: usize) -> Result<Vec<OfferRecord>> {
        self.storage.list(skip, limit)
    }

    pub fn clear_offers(&mut self) -> Result<usize> {
        let removed = self.storage.clear()?;
        info!(removed, "Offer store cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiler_disabled_records_nothing() {
        let mut profiler = StepProfiler::new(false);
        assert_eq!(profiler.time_step("noop", || 7), 7);
        assert!(profiler.timings().is_empty());
    }

    #[test]
    fn test_profiler_records_steps() {
        let mut profiler = StepProfiler::new(true);
        profiler.time_step("a", || ());
        profiler.time_step("b", || ());
        let names: Vec<_> = profiler.timings().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_rule_pattern_fails_construction() {
        let mut config = OfferScanConfig::default();
        config.rules.percentage = "[".to_string();
        assert!(OfferProcessor::new_in_memory(&config).is_err());
    }
}
