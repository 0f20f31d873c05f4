//! Plaze CLI - market prices from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Latest price of a product (first listed plaza, or --plaza)
//! plaze price "Tomate chonto" --plaza Minorista
//!
//! # Price history and forecast
//! plaze history "Papa criolla" --months 24
//! plaze predict "Papa criolla" --months 6
//!
//! # Listings
//! plaze plazas --active
//! plaze products --filter tomate
//! ```
//!
//! Results are printed as YAML on stdout; diagnostics go through
//! `tracing` on stderr (`RUST_LOG=plaze_cli=debug,plaze_storefront=debug`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use plaze_storefront::api::PlazeClient;
use plaze_storefront::config::{ApiConfig, DEFAULT_API_URL, DEFAULT_CITY};
use plaze_storefront::session::MemorySessionStore;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "plaze")]
#[command(author, version, about = "Plaze market price tools")]
struct Cli {
    /// Plaze backend base URL
    #[arg(long, global = true, env = "PLAZE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// City for current-price lookups
    #[arg(long, global = true, env = "PLAZE_DEFAULT_CITY", default_value = DEFAULT_CITY)]
    city: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the latest price of a product (Ctrl+C cancels)
    Price {
        /// Product name
        product: String,

        /// Plaza name; defaults to the first plaza the backend lists
        #[arg(short, long)]
        plaza: Option<String>,
    },
    /// Price history of a product
    History {
        /// Product name
        product: String,

        /// Months of history (1-120)
        #[arg(short, long, default_value_t = 12)]
        months: u32,
    },
    /// Price forecast of a product
    Predict {
        /// Product name
        product: String,

        /// Months ahead (1-120)
        #[arg(short, long, default_value_t = 6)]
        months: u32,
    },
    /// List plazas
    Plazas {
        /// Only plazas currently operating
        #[arg(long)]
        active: bool,
    },
    /// List catalog products
    Products {
        /// Case-insensitive name filter
        #[arg(short, long)]
        filter: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env before parsing so env-backed flags see it
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plaze_cli=info,plaze_storefront=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ApiConfig::parse(&cli.api_url, &cli.city)?;
    let client = PlazeClient::new(&config)?;
    let store = MemorySessionStore::new();
    let api = client.with_session(&store);

    match cli.command {
        Commands::Price { product, plaza } => {
            commands::price::run(&api, &product, plaza.as_deref()).await
        }
        Commands::History { product, months } => {
            commands::trends::history(&api, &product, months).await
        }
        Commands::Predict { product, months } => {
            commands::trends::predict(&api, &product, months).await
        }
        Commands::Plazas { active } => commands::catalog::plazas(&api, active).await,
        Commands::Products { filter } => {
            commands::catalog::products(&api, filter.as_deref()).await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_with_plaza() {
        let cli = Cli::try_parse_from(["plaze", "price", "Tomate chonto", "--plaza", "Minorista"])
            .unwrap();
        match cli.command {
            Commands::Price { product, plaza } => {
                assert_eq!(product, "Tomate chonto");
                assert_eq!(plaza.as_deref(), Some("Minorista"));
            }
            _ => panic!("expected price command"),
        }
    }

    #[test]
    fn test_history_months_default() {
        let cli = Cli::try_parse_from(["plaze", "history", "Papa"]).unwrap();
        assert!(matches!(cli.command, Commands::History { months: 12, .. }));
    }

    #[test]
    fn test_api_url_flag() {
        let cli = Cli::try_parse_from([
            "plaze",
            "--api-url",
            "http://plaze.test:9000",
            "plazas",
            "--active",
        ])
        .unwrap();
        assert_eq!(cli.api_url, "http://plaze.test:9000");
        assert!(matches!(cli.command, Commands::Plazas { active: true }));
    }
}
