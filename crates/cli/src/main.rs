//! Marigold CLI - checkout demo and pricing tools.
//!
//! # Usage
//!
//! ```bash
//! # Run a scripted checkout against the offline simulation
//! marigold demo
//!
//! # Same, paying cash on delivery
//! marigold demo --cod
//!
//! # Price a basket without checking out
//! marigold quote "Classic Tee:5999:2" "Slim Jeans:149900:1" -c WELCOME10
//! ```
//!
//! # Commands
//!
//! - `demo` - Drive a complete checkout (cart, coupon, address, payment,
//!   order) against the offline simulation
//! - `quote` - Compute totals for an ad-hoc basket

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "marigold")]
#[command(author, version, about = "Marigold CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted checkout against the offline simulation
    Demo {
        /// Pay cash on delivery instead of the simulated online payment
        #[arg(long)]
        cod: bool,
    },
    /// Price a basket without checking out
    Quote {
        /// Cart lines as `name:unit_price_minor:quantity`
        #[arg(required = true)]
        lines: Vec<String>,

        /// Coupon code to apply
        #[arg(short, long)]
        coupon: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing; CLI output goes through the subscriber
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marigold=info,marigold_checkout=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Demo { cod } => commands::demo::run(cod).await?,
        Commands::Quote { lines, coupon } => {
            commands::quote::run(&lines, coupon.as_deref()).await?;
        }
    }
    Ok(())
}
