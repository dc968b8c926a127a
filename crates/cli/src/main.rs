mod echo;

use anyhow::{Context, bail};
use clap::Parser;
use owo_colors::OwoColorize;
use time::OffsetDateTime;
use url::Url;

use favea_core::{
    EventDraft, Extractor, ExtractorConfig, ReaderConfig, RobotsConfig, check_allowed,
    fetch_page_content, search_url_for_keyword,
};

use crate::echo::{print_banner, print_error, print_step, print_success};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Collect idol event and ticket deadline information from web pages
#[derive(Parser, Debug)]
#[command(name = "favea")]
#[command(author = "Favea Contributors")]
#[command(version = VERSION)]
#[command(about = "Collect idol event and ticket deadline info from web pages", long_about = None)]
struct Args {
    /// Direct http(s) URL to collect from, or a keyword to search for
    #[arg(value_name = "INPUT")]
    input: String,

    /// Print the extraction result as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Page rendering timeout in seconds
    #[arg(long, default_value = "60", value_name = "SECS")]
    timeout: u64,

    /// Reader (page rendering) service endpoint
    #[arg(long, value_name = "URL")]
    reader_endpoint: Option<String>,

    /// Chat-completions endpoint for the extraction model
    #[arg(long, value_name = "URL")]
    llm_endpoint: Option<String>,

    /// Model identifier
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,

    /// Enable verbose progress output
    #[arg(short, long)]
    verbose: bool,
}

/// A URL input is collected directly; anything else is treated as a keyword
/// and turned into a ticket-search URL.
fn resolve_target(input: &str) -> String {
    match Url::parse(input) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => input.to_string(),
        _ => search_url_for_keyword(input, OffsetDateTime::now_utc().year()),
    }
}

fn print_drafts(idol_name: &str, events: &[EventDraft]) {
    println!("{} {}", "Idol:".bold(), idol_name.bright_white());
    if events.is_empty() {
        println!("{}", "No events found on this page.".dimmed());
        return;
    }
    for event in events {
        println!();
        println!("{}", event.title.bold().bright_cyan());
        if let Some(date) = &event.event_date {
            println!("  {} {}", "When:".dimmed(), date);
        }
        if let Some(venue) = &event.venue {
            println!("  {} {}", "Where:".dimmed(), venue);
        }
        for deadline in &event.deadlines {
            let label = deadline.deadline_type.as_str();
            match &deadline.description {
                Some(desc) => println!("  {} {} ({desc})", format!("{label}:").dimmed(), deadline.end_at),
                None => println!("  {} {}", format!("{label}:").dimmed(), deadline.end_at),
            }
        }
        if let Some(source) = &event.source_url {
            println!("  {} {}", "Source:".dimmed(), source.underline());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        print_banner();
    }

    let target = resolve_target(&args.input);

    if args.verbose {
        print_step(1, 3, &format!("Checking robots.txt for {}", target.bright_white().underline()));
    }
    let decision = check_allowed(&target, &RobotsConfig::default()).await;
    if !decision.allowed {
        let reason = decision
            .reason
            .unwrap_or_else(|| "this site does not permit automated collection".to_string());
        print_error(&reason);
        bail!("collection denied by robots.txt");
    }

    if args.verbose {
        print_step(2, 3, "Fetching rendered page content");
    }
    let mut reader = ReaderConfig { timeout: args.timeout, ..ReaderConfig::default() };
    if let Some(endpoint) = args.reader_endpoint {
        reader.endpoint = endpoint;
    }
    let content = fetch_page_content(&target, &reader)
        .await
        .context("Failed to fetch page content")?;

    if args.verbose {
        print_step(3, 3, "Extracting event information");
    }
    let mut config =
        ExtractorConfig { api_key: std::env::var("LLM_API_KEY").ok(), ..ExtractorConfig::default() };
    if let Some(endpoint) = args.llm_endpoint {
        config.endpoint = endpoint;
    }
    if let Some(model) = args.model {
        config.model = model;
    }

    let extractor = Extractor::new(config);
    let mut result = extractor
        .extract(&content, &target)
        .await
        .context("Failed to extract event information")?;

    if args.verbose {
        print_success(&format!("Extracted {} event(s)", result.events.len()));
        eprintln!();
    }

    if args.json {
        result.raw_response = None;
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_drafts(&result.idol_name, &result.events);
    }

    Ok(())
}
