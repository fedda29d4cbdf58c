use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;

// Import from offerscan-core
use offerscan_core::{DiscountEngine, DiscountQuery, OfferProcessor, OfferScanConfig};

// Import CLI utilities
use offerscan::output::{explain_json, highest_discount_json, offer_listing_json};

#[derive(Parser)]
#[command(name = "offerscan")]
#[command(about = "Detect bank offers in payment-page JSON and compute the best discount")]
struct Args {
    /// Path to custom config file (YAML format)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Offer store directory (overrides storage.dir from the config)
    #[arg(short, long, global = true)]
    store: Option<String>,

    /// Enable debug logging, including per-step timings
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract offers from a JSON document and store the new ones
    Ingest {
        /// Path to the JSON document
        #[arg(short, long)]
        input: String,
    },
    /// Compute the highest discount for a purchase
    Discount {
        /// Amount to pay, in rupees
        #[arg(short, long)]
        amount: f64,

        /// Bank code (AXIS, HDFC, ...)
        #[arg(short, long)]
        bank: String,

        /// Payment instrument type (CREDIT, EMI_OPTIONS, ...)
        #[arg(short, long)]
        instrument: Option<String>,

        /// Include the per-offer breakdown
        #[arg(long)]
        explain: bool,
    },
    /// List stored offers
    List {
        /// Number of offers to skip
        #[arg(long, default_value_t = 0)]
        skip: usize,

        /// Maximum number of offers to print
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Delete every stored offer
    Clear,
    /// Print the effective configuration as YAML
    ShowConfig,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Load config using functional pattern
    let mut config = OfferScanConfig::load_with_fallback(args.config.as_deref());
    if let Some(store) = &args.store {
        config.storage.dir = store.clone();
    }

    if let Command::ShowConfig = args.command {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    let mut processor = OfferProcessor::new_file_backed(&config)?;
    processor.set_profiling(args.verbose);

    match args.command {
        Command::Ingest { input } => run_ingest(&mut processor, &input),
        Command::Discount {
            amount,
            bank,
            instrument,
            explain,
        } => run_discount(&processor, amount, &bank, instrument.as_deref(), explain),
        Command::List { skip, limit } => {
            let offers = processor.list_offers(skip, limit)?;
            println!("{}", serde_json::to_string_pretty(&offer_listing_json(&offers))?);
            Ok(())
        }
        Command::Clear => {
            let removed = processor.clear_offers()?;
            eprintln!("🗑️  Deleted {removed} offers from {}", config.storage.dir);
            Ok(())
        }
        Command::ShowConfig => Ok(()),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run_ingest(processor: &mut OfferProcessor, input: &str) -> Result<()> {
    if !Path::new(input).exists() {
        eprintln!("⚠️  Input document not found at: {input}");
        std::process::exit(1);
    }

    eprintln!("📄 Processing: {input}");
    let content =
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))?;
    let document: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("{input} is not valid JSON"))?;

    let report = processor.ingest(&document)?;
    eprintln!(
        "✅ Identified {} offers, {} new, {} skipped",
        report.identified_count, report.new_count, report.skipped_count
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_discount(
    processor: &OfferProcessor,
    amount: f64,
    bank: &str,
    instrument: Option<&str>,
    explain: bool,
) -> Result<()> {
    let query = match DiscountQuery::new(amount, bank, instrument) {
        Ok(query) => query,
        Err(e) => {
            eprintln!("❌ Invalid query: {e}");
            std::process::exit(2);
        }
    };

    let output = if explain {
        let breakdown = processor.explain(&query)?;
        explain_json(DiscountEngine::best_of(&breakdown), &breakdown)
    } else {
        highest_discount_json(processor.highest_discount(&query)?)
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
