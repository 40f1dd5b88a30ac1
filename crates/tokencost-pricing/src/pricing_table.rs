//! Per-model pricing table
//!
//! The table is built once at startup, either from the embedded price list
//! or from a user-supplied JSON file with the same shape, and is never
//! mutated afterwards. Callers share it behind an `Arc`.
//!
//! # Examples
//!
//! ```
//! use tokencost_pricing::PricingTable;
//!
//! let table = PricingTable::embedded().unwrap();
//! let entry = table.price_for("gpt-4o").unwrap();
//! assert_eq!(entry.input_price_per_million, 2.50);
//! assert!(table.price_for("not-a-real-model").is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokencost_core::error::{Result, TokenCostError};
use tokencost_core::types::ModelId;
use tracing::debug;

/// Embedded list prices, in USD per million tokens
const EMBEDDED_PRICING: &str = include_str!("../embedded/pricing.json");

/// Price points for one model, in USD per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricingEntry {
    /// Model these prices apply to
    pub model: ModelId,
    /// Cost per million prompt tokens
    pub input_price_per_million: f64,
    /// Cost per million completion tokens
    pub output_price_per_million: f64,
}

impl PricingEntry {
    /// Create an entry, rejecting negative or non-finite prices
    pub fn new(
        model: ModelId,
        input_price_per_million: f64,
        output_price_per_million: f64,
    ) -> Result<Self> {
        for (label, price) in [
            ("input", input_price_per_million),
            ("output", output_price_per_million),
        ] {
            if !price.is_finite() || price < 0.0 {
                return Err(TokenCostError::InvalidPricing(format!(
                    "{label} price for {model} must be a non-negative number, got {price}"
                )));
            }
        }

        Ok(Self {
            model,
            input_price_per_million,
            output_price_per_million,
        })
    }
}

/// Shape of one entry in a pricing JSON document
#[derive(Debug, Deserialize)]
struct RawPricing {
    input_per_million: f64,
    output_per_million: f64,
}

/// Authoritative price-per-model lookup
///
/// Start from [`PricingTable::embedded`] for the shipped list prices, or
/// from [`PricingTable::empty`] for a custom table.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingTable {
    entries: BTreeMap<ModelId, PricingEntry>,
}

impl PricingTable {
    /// Create a table with no entries, to be filled with [`with_entry`](Self::with_entry)
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Table built from the list prices shipped with tokencost
    pub fn embedded() -> Result<Self> {
        Self::from_json_str(EMBEDDED_PRICING)
    }

    /// Parse a pricing document
    ///
    /// The document is an object keyed by model identifier, each value
    /// holding `input_per_million` and `output_per_million`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, RawPricing> = serde_json::from_str(json)?;

        let mut table = Self::empty();
        for (name, pricing) in raw {
            let model: ModelId = name.parse()?;
            let entry =
                PricingEntry::new(model, pricing.input_per_million, pricing.output_per_million)?;
            table.insert(entry)?;
        }

        debug!("Loaded pricing for {} models", table.len());
        Ok(table)
    }

    /// Load a pricing document from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents).map_err(|e| match e {
            TokenCostError::Json(err) => {
                TokenCostError::Config(format!("{}: {err}", path.display()))
            }
            other => other,
        })
    }

    /// Add an entry, builder style
    pub fn with_entry(mut self, entry: PricingEntry) -> Result<Self> {
        self.insert(entry)?;
        Ok(self)
    }

    fn insert(&mut self, entry: PricingEntry) -> Result<()> {
        if self.entries.contains_key(&entry.model) {
            return Err(TokenCostError::InvalidPricing(format!(
                "duplicate pricing entry for {}",
                entry.model
            )));
        }
        self.entries.insert(entry.model, entry);
        Ok(())
    }

    /// Look up pricing by model identifier string
    ///
    /// # Errors
    ///
    /// Returns `UnknownModel` if the identifier is not a known model or the
    /// model has no entry in this table.
    pub fn price_for(&self, model_id: &str) -> Result<&PricingEntry> {
        let model: ModelId = model_id.parse()?;
        self.get(model)
            .ok_or_else(|| TokenCostError::UnknownModel(model_id.to_string()))
    }

    /// Look up pricing for an already-validated model
    pub fn get(&self, model: ModelId) -> Option<&PricingEntry> {
        self.entries.get(&model)
    }

    /// Entries in model declaration order
    pub fn entries(&self) -> impl Iterator<Item = &PricingEntry> {
        self.entries.values()
    }

    /// Number of priced models
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
