//! Sends one command to a vision service and prints the parsed response.
//!
//! Demonstrates:
//! - Building options from a `tcp://` URL
//! - Sending a command with lazy connect
//! - Listing scalar and array fields
//!
//! Usage:
//!   cargo run --example probe -- "tcp://127.0.0.1:5000?send=%0D&receive=%0D" TRIGGER
//!   cargo run --example probe -- tcp://10.0.0.12:2000 STATUS --debug

// ============================================================================
// Imports
// ============================================================================

use tracing_subscriber::EnvFilter;
use vision_link::{ClientOptions, ConnectionManager, Result};

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    endpoint: String,
    command: String,
    debug: bool,
}

impl Args {
    /// Parse command-line arguments.
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut positional = args.iter().filter(|a| !a.starts_with("--"));
        Self {
            endpoint: positional
                .next()
                .cloned()
                .unwrap_or_else(|| "tcp://127.0.0.1:5000".to_string()),
            command: positional.next().cloned().unwrap_or_else(|| "STATUS".to_string()),
            debug: args.iter().any(|a| a == "--debug"),
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "vision_link=debug"
    } else {
        "vision_link=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<()> {
    println!("=== Probe: {} ===\n", args.endpoint);

    let options = ClientOptions::from_url(&args.endpoint)?;
    let link = ConnectionManager::new(options)?;

    if !link.connect().await {
        println!("[Connect] Service unreachable, sending anyway");
    }

    println!("[Send] {}", args.command);
    let response = link.send_and_parse(&args.command).await?;
    println!("       raw: {response}\n");

    for key in response.keys() {
        println!("  {key} = {}", response.get_string(key)?);
    }
    for key in response.array_keys() {
        println!("  {key} = {:?}", response.get_string_array(key)?);
    }

    println!("\n{} scalar(s), {} array(s)", response.scalar_count(), response.array_count());

    link.disconnect();
    Ok(())
}
