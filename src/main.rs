//! tokencost - track and project token costs for chat completion APIs

use clap::Parser;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokencost::{
    PricingTable, ProjectionCalculator, ProjectionRequest, Result,
    cli::{Cli, Command, demo_call_count, load_pricing},
    client::{CompletionClient, OpenAiClient, SimulatedClient},
    demo::{ConversationOutcome, DEMO_CONVERSATIONS, compare_models, run_conversations},
    output::get_formatter,
    tracker::CostTracker,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn completion_client(live: bool) -> Result<Box<dyn CompletionClient>> {
    if live {
        info!("Using live chat completions API");
        Ok(Box::new(OpenAiClient::from_env()?))
    } else {
        info!("Using simulated completions");
        Ok(Box::new(SimulatedClient::new()))
    }
}

/// One status line per conversation, unless output is JSON
fn print_outcomes(outcomes: &[ConversationOutcome], json: bool) {
    if json {
        return;
    }
    for outcome in outcomes {
        match &outcome.result {
            Ok(session) => println!(
                "{} #{} {} on {}: {} tokens, ${:.6} ({}ms)",
                "✓".green(),
                session.id,
                outcome.description,
                outcome.model,
                session.usage.total_tokens,
                session.costs.total_cost,
                session.response_time_ms
            ),
            Err(e) => eprintln!(
                "{} {} on {}: {}",
                "✗".red(),
                outcome.description,
                outcome.model,
                e
            ),
        }
    }
    println!();
}

fn print_tracker_report(tracker: &CostTracker, json: bool, csv: Option<&Path>) -> Result<()> {
    let formatter = get_formatter(json);
    println!("{}", formatter.format_summary(&tracker.summary()));
    println!("{}", formatter.format_model_report(&tracker.report_by_model()));

    if let Some(path) = csv {
        std::fs::write(path, tracker.export_csv()?)?;
        info!("Wrote {} sessions to {}", tracker.session_count(), path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The --verbose flag raises the default level; RUST_LOG still wins.
    let default_filter = if cli.verbose {
        "tokencost=info"
    } else {
        "tokencost=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if !is_terminal::is_terminal(std::io::stdout()) || std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    let pricing: Arc<PricingTable> = Arc::new(load_pricing(cli.pricing_file.as_deref())?);

    match cli.command {
        Command::Pricing => {
            println!("{}", get_formatter(cli.json).format_pricing(&pricing));
        }

        Command::Project {
            avg_tokens,
            conversations,
            model,
            input_ratio,
            all_models,
        } => {
            let calculator = ProjectionCalculator::new(pricing);
            let request = ProjectionRequest::new(avg_tokens, conversations, model.as_str())
                .with_input_ratio(input_ratio);
            let projections = if all_models {
                calculator.project_all(&request)?
            } else {
                vec![calculator.project(&request)?]
            };
            println!("{}", get_formatter(cli.json).format_projections(&projections));
        }

        Command::Demo { models, live } => {
            info!(
                "Running {} scripted conversations on {} models",
                demo_call_count(&models),
                models.len()
            );
            let client = completion_client(live)?;
            let tracker = CostTracker::new(pricing);
            let outcomes =
                run_conversations(client.as_ref(), &tracker, &models, DEMO_CONVERSATIONS).await;
            print_outcomes(&outcomes, cli.json);
            print_tracker_report(&tracker, cli.json, cli.csv.as_deref())?;
        }

        Command::Compare {
            prompt,
            models,
            live,
        } => {
            let client = completion_client(live)?;
            let tracker = CostTracker::new(pricing);
            let outcomes = compare_models(client.as_ref(), &tracker, &models, &prompt).await;
            print_outcomes(&outcomes, cli.json);
            print_tracker_report(&tracker, cli.json, cli.csv.as_deref())?;
        }
    }

    Ok(())
}
