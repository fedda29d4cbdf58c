use crate::types::OfferRecord;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Version constants stamped on stored offers
pub mod versions {
    pub const EXTRACTOR_VERSION: &str = "1.0.0";
}

/// Persistence boundary for offer records.
///
/// Ids are the only identity: inserting a known id is a no-op.
pub trait OfferStore {
    fn exists(&self, id: &str) -> Result<bool>;

    /// Insert `record`, returning false when its id was already stored
    fn insert(&mut self, record: &OfferRecord) -> Result<bool>;

    /// Offers naming `bank_name`. With an instrument, only offers that are
    /// unrestricted or list that instrument.
    fn query(&self, bank_name: &str, instrument: Option<&str>) -> Result<Vec<OfferRecord>>;

    /// Stored offers in insertion order, paginated
    fn list(&self, skip: usize, limit: usize) -> Result<Vec<OfferRecord>>;

    /// Delete every stored offer, returning how many were removed
    fn clear(&mut self) -> Result<usize>;
}

/// Stored form of an offer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredOffer {
    pub record: OfferRecord,
    pub stored_at: DateTime<Utc>,
    pub extractor_version: String,
}

impl StoredOffer {
    pub fn new(record: OfferRecord) -> Self {
        Self {
            record,
            stored_at: Utc::now(),
            extractor_version: versions::EXTRACTOR_VERSION.to_string(),
        }
    }
}

fn matches_query(record: &OfferRecord, bank_name: &str, instrument: Option<&str>) -> bool {
    record.supports_bank(bank_name)
        && instrument.map_or(true, |instrument| {
            record.is_instrument_agnostic() || record.instruments.contains(instrument)
        })
}

/// File-based store: one JSON file per offer under `<dir>/offers`
pub struct FileStore {
    offers_dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: &str) -> Result<Self> {
        let offers_dir = Path::new(dir).join("offers");
        fs::create_dir_all(&offers_dir)
            .with_context(|| format!("Failed to create store directory {}", offers_dir.display()))?;

        Ok(Self { offers_dir })
    }

    // Ids come from untrusted documents, so they never appear in paths directly
    fn offer_path(&self, id: &str) -> PathBuf {
        self.offers_dir.join(format!("{}.json", calculate_id_hash(id)))
    }

    fn load_all(&self) -> Result<Vec<StoredOffer>> {
        let mut offers = Vec::new();
        for entry in fs::read_dir(&self.offers_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let json_str = fs::read_to_string(&path)?;
            let stored: StoredOffer = serde_json::from_str(&json_str).map_err(|e| {
                anyhow!("Failed to deserialize stored offer {}: {}", path.display(), e)
            })?;
            offers.push(stored);
        }

        offers.sort_by(|a, b| {
            a.stored_at
                .cmp(&b.stored_at)
                .then_with(|| a.record.id.cmp(&b.record.id))
        });
        Ok(offers)
    }
}

impl OfferStore for FileStore {
    fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.offer_path(id).exists())
    }

    fn insert(&mut self, record: &OfferRecord) -> Result<bool> {
        let path = self.offer_path(&record.id);
        if path.exists() {
            return Ok(false);
        }
        let json_str = serde_json::to_string_pretty(&StoredOffer::new(record.clone()))
            .map_err(|e| anyhow!("Failed to serialize offer {}: {}", record.id, e))?;
        fs::write(&path, json_str)?;
        Ok(true)
    }

    fn query(&self, bank_name: &str, instrument: Option<&str>) -> Result<Vec<OfferRecord>> {
        Ok(self
            .load_all()?
            .into_iter()
            .map(|stored| stored.record)
            .filter(|record| matches_query(record, bank_name, instrument))
            .collect())
    }

    fn list(&self, skip: usize, limit: usize) -> Result<Vec<OfferRecord>> {
        Ok(self
            .load_all()?
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|stored| stored.record)
            .collect())
    }

    fn clear(&mut self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.offers_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// In-memory store, insertion ordered. Used for one-shot runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    offers: Vec<StoredOffer>,
    ids: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

impl OfferStore for MemoryStore {
    fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.ids.contains(id))
    }

    fn insert(&mut self, record: &OfferRecord) -> Result<bool> {
        if !self.ids.insert(record.id.clone()) {
            return Ok(false);
        }
        self.offers.push(StoredOffer::new(record.clone()));
        Ok(true)
    }

    fn query(&self, bank_name: &str, instrument: Option<&str>) -> Result<Vec<OfferRecord>> {
        Ok(self
            .offers
            .iter()
            .map(|stored| &stored.record)
            .filter(|record| matches_query(record, bank_name, instrument))
            .cloned()
            .collect())
    }

    fn list(&self, skip: usize, limit: usize) -> Result<Vec<OfferRecord>> {
        Ok(self
            .offers
            .iter()
            .skip(skip)
            .take(limit)
            .map(|stored| stored.record.clone())
            .collect())
    }

    fn clear(&mut self) -> Result<usize> {
        let removed = self.offers.len();
        self.offers.clear();
        self.ids.clear();
        Ok(removed)
    }
}

/// SHA-256 hex of an offer id, used as its file name
pub fn calculate_id_hash(id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    format!("{:x}", hasher.finalize())
}
