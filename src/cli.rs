//! CLI interface for tokencost
//!
//! # Example
//!
//! ```bash
//! # Show the pricing table
//! tokencost pricing
//!
//! # What would 10,000 conversations of ~800 tokens cost on gpt-4o?
//! tokencost project --avg-tokens 800 --conversations 10000 --model gpt-4o
//!
//! # Run the scripted conversations offline and export them
//! tokencost demo --model gpt-4o-mini --model gpt-4o --csv sessions.csv
//! ```

use crate::demo::DEMO_CONVERSATIONS;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokencost_core::error::Result;
use tokencost_core::types::ModelId;
use tokencost_pricing::PricingTable;
use tokencost_pricing::projection::DEFAULT_INPUT_RATIO;
use tracing::info;

/// Track and project token costs for chat completion APIs
#[derive(Parser, Debug, Clone)]
#[command(name = "tokencost")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show informational output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Pricing JSON file (defaults to <config dir>/tokencost/pricing.json, then built-in prices)
    #[arg(long, global = true, env = "TOKENCOST_PRICING_FILE")]
    pub pricing_file: Option<PathBuf>,

    /// Write recorded sessions to this CSV file
    #[arg(long, global = true)]
    pub csv: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show per-model prices
    Pricing,

    /// Estimate the cost of a hypothetical workload
    Project {
        /// Average tokens per conversation (prompt and completion together)
        #[arg(long)]
        avg_tokens: f64,

        /// Number of conversations
        #[arg(long)]
        conversations: u64,

        /// Model to price against
        #[arg(long, default_value = "gpt-4o-mini")]
        model: ModelId,

        /// Fraction of tokens that are prompt tokens
        #[arg(long, default_value_t = DEFAULT_INPUT_RATIO)]
        input_ratio: f64,

        /// Project onto every priced model instead of one
        #[arg(long, conflicts_with = "model")]
        all_models: bool,
    },

    /// Run scripted conversations and report their cost
    Demo {
        /// Models to run (repeatable)
        #[arg(long = "model", default_values = ["gpt-4o-mini", "gpt-4o"])]
        models: Vec<ModelId>,

        /// Call the real API using OPENAI_API_KEY instead of simulating
        #[arg(long)]
        live: bool,
    },

    /// Send one prompt to several models and compare cost
    Compare {
        /// Prompt to send
        #[arg(long)]
        prompt: String,

        /// Models to compare (repeatable)
        #[arg(long = "model", default_values = ["gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"])]
        models: Vec<ModelId>,

        /// Call the real API using OPENAI_API_KEY instead of simulating
        #[arg(long)]
        live: bool,
    },
}

/// Location of the per-user pricing override, if a config dir exists
pub fn default_pricing_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tokencost").join("pricing.json"))
}

/// Resolve the pricing table for this run
///
/// An explicit path must load. Otherwise the per-user file is used when it
/// exists, and the built-in prices when it does not.
pub fn load_pricing(explicit: Option<&Path>) -> Result<PricingTable> {
    if let Some(path) = explicit {
        info!("Loading pricing from {}", path.display());
        return PricingTable::from_json_file(path);
    }

    if let Some(path) = default_pricing_path().filter(|p| p.is_file()) {
        info!("Loading pricing from {}", path.display());
        return PricingTable::from_json_file(path);
    }

    info!("Using built-in pricing");
    PricingTable::embedded()
}

/// Number of calls a demo run will make
pub fn demo_call_count(models: &[ModelId]) -> usize {
    models.len() * DEMO_CONVERSATIONS.len()
}
