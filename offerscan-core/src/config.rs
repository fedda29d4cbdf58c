use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

// Default value functions for serde
fn default_marker_field() -> String {
    "type".to_string()
}

fn default_offer_marker() -> String {
    "OFFER_LIST".to_string()
}

fn default_instrument_marker() -> String {
    "PAYMENT_OPTION".to_string()
}

fn default_fast_paths() -> Vec<String> {
    vec![
        "pageData.paymentOptions.items".to_string(),
        "paymentOptions.items".to_string(),
        "items".to_string(),
    ]
}

fn default_offer_list_paths() -> Vec<String> {
    vec![
        "data.offers.offerList".to_string(),
        "data.offerList".to_string(),
        "offers.offerList".to_string(),
        "offerList".to_string(),
    ]
}

fn default_instrument_type_paths() -> Vec<String> {
    vec!["data.instrumentType".to_string(), "instrumentType".to_string()]
}

fn default_id_paths() -> Vec<String> {
    vec![
        "offerDescription.id".to_string(),
        "id".to_string(),
        "offerId".to_string(),
    ]
}

fn default_text_paths() -> Vec<String> {
    vec![
        "offerText.text".to_string(),
        "offerText".to_string(),
        "text".to_string(),
    ]
}

fn default_description_paths() -> Vec<String> {
    vec![
        "offerDescription.text".to_string(),
        "description".to_string(),
        "offerDescription".to_string(),
    ]
}

fn default_provider_path() -> String {
    "provider".to_string()
}

fn default_logo_path() -> String {
    "logo".to_string()
}

fn default_max_depth() -> usize {
    64
}

fn default_percentage_pattern() -> String {
    r"(\d+(?:\.\d+)?)\s*%".to_string()
}

fn default_cap_pattern() -> String {
    r"(?i)\b(?:up\s*to|maximum|max\.?)\s*(?:of\s*)?(?:₹|\brs\.?|\binr)\s*(\d+(?:\.\d+)?)".to_string()
}

fn default_min_order_pattern() -> String {
    concat!(
        r"(?i)(?:\bmin(?:imum)?\.?\s*(?:order|purchase|transaction|booking|cart)(?:\s+(?:value|amount))?",
        r"|\b(?:orders?|purchases?|transactions?)\s+(?:above|over|of\s+at\s+least))",
        r"\s*(?:of\s*)?:?\s*(?:₹|\brs\.?|\binr)\s*(\d+(?:\.\d+)?)"
    )
    .to_string()
}

fn default_currency_pattern() -> String {
    r"(?i)(?:₹|\brs\.?|\binr)\s*(\d+(?:\.\d+)?)".to_string()
}

fn default_storage_dir() -> String {
    "offers".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferScanConfig {
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub rules: RulePatternConfig,
    #[serde(default)]
    pub discount: DiscountConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Where offers and payment instruments live inside an ingested document.
/// Paths are dotted key sequences tried in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Key holding the node marker ("type" in known documents)
    #[serde(default = "default_marker_field")]
    pub marker_field: String,
    /// Marker value of nodes carrying an offer list
    #[serde(default = "default_offer_marker")]
    pub offer_marker: String,
    /// Marker value of nodes carrying a payment instrument
    #[serde(default = "default_instrument_marker")]
    pub instrument_marker: String,
    /// Known locations of the item list, probed from the document root
    #[serde(default = "default_fast_paths")]
    pub fast_paths: Vec<String>,
    /// Locations of the offer list inside an offer-marked node
    #[serde(default = "default_offer_list_paths")]
    pub offer_list_paths: Vec<String>,
    /// Locations of the instrument type inside an instrument-marked node
    #[serde(default = "default_instrument_type_paths")]
    pub instrument_type_paths: Vec<String>,

    /// Field fallback chains inside a single offer entry
    #[serde(default = "default_id_paths")]
    pub id_paths: Vec<String>,
    #[serde(default = "default_text_paths")]
    pub text_paths: Vec<String>,
    #[serde(default = "default_description_paths")]
    pub description_paths: Vec<String>,
    #[serde(default = "default_provider_path")]
    pub provider_path: String,
    #[serde(default = "default_logo_path")]
    pub logo_path: String,

    /// Nodes nested deeper than this are not searched
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            marker_field: default_marker_field(),
            offer_marker: default_offer_marker(),
            instrument_marker: default_instrument_marker(),
            fast_paths: default_fast_paths(),
            offer_list_paths: default_offer_list_paths(),
            instrument_type_paths: default_instrument_type_paths(),
            id_paths: default_id_paths(),
            text_paths: default_text_paths(),
            description_paths: default_description_paths(),
            provider_path: default_provider_path(),
            logo_path: default_logo_path(),
            max_depth: default_max_depth(),
        }
    }
}

/// Regex patterns used to derive a rule from offer terms.
/// Each pattern must capture the numeric value in group 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulePatternConfig {
    /// "5%"
    #[serde(default = "default_percentage_pattern")]
    pub percentage: String,
    /// "up to ₹500", "maximum ₹1000"
    #[serde(default = "default_cap_pattern")]
    pub cap: String,
    /// "Min Order ₹5000", "orders above ₹2000"
    #[serde(default = "default_min_order_pattern")]
    pub min_order: String,
    /// Any currency amount: "₹100", "Rs. 100", "INR 100"
    #[serde(default = "default_currency_pattern")]
    pub currency: String,
}

impl Default for RulePatternConfig {
    fn default() -> Self {
        Self {
            percentage: default_percentage_pattern(),
            cap: default_cap_pattern(),
            min_order: default_min_order_pattern(),
            currency: default_currency_pattern(),
        }
    }
}

/// How offers restricted to specific instruments behave when a query names no instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentPolicy {
    /// Bank alone is enough; instrument-restricted offers stay eligible
    #[default]
    IncludeRestricted,
    /// Only offers without any instrument restriction are eligible
    ExcludeRestricted,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscountConfig {
    #[serde(default)]
    pub instrument_policy: InstrumentPolicy,
    /// Also enforce a parsed minimum order on percentage rules
    #[serde(default)]
    pub min_order_applies_to_percentage: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for the file-backed offer store
    #[serde(default = "default_storage_dir")]
    pub dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

impl OfferScanConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        let config: OfferScanConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {path}"))?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                warn!(path = p, error = %e, "Failed to load config, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
