//! Grifon Sync CLI - push customers to PrestaShop stores.
//!
//! # Usage
//!
//! ```bash
//! # Hash a password for `password_hashed` (reads GRIFON_PASSWORD or stdin)
//! grifon-sync hash-password --cost 12
//!
//! # Sign a body the way the sync client does
//! grifon-sync sign --secret-env GRIFON_SECRET_SHOPA --body payload.json
//!
//! # Check a captured signature (timestamp must be within 300s of now)
//! grifon-sync verify --secret-env GRIFON_SECRET_SHOPA --timestamp 1767225600 \
//!     --signature 'abc...=' --body payload.json
//!
//! # Push a customer to every configured store
//! grifon-sync push --payload customer.json
//!
//! # Push a customer to selected stores
//! grifon-sync push --payload customer.yaml --store shopA --store shopB
//!
//! # List configured stores
//! grifon-sync stores
//! ```
//!
//! # Environment Variables
//!
//! - `GRIFON_SHOPS_FILE` - Shops directory file (default: `shops.yaml`)
//! - `GRIFON_SECRET_<STORE>` - Per-store shared secret override
//! - `GRIFON_LOG_JSON` - Emit JSON logs when set
//! - `RUST_LOG` - Log filter (default: `grifon_sync=info,grifon_sync_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "grifon-sync")]
#[command(author, version, about = "Grifon customer sync tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash a password as PHP-compatible `$2y$` bcrypt
    HashPassword {
        /// bcrypt cost factor
        #[arg(short, long, default_value_t = grifon_sync::password::DEFAULT_COST)]
        cost: u32,
    },
    /// Compute the `X-Grifon-Signature` for a body
    Sign {
        /// Environment variable holding the shared secret
        #[arg(short, long)]
        secret_env: String,

        /// Unix timestamp in seconds (default: now)
        #[arg(short, long)]
        timestamp: Option<i64>,

        /// File with the exact body bytes to sign
        #[arg(short, long)]
        body: PathBuf,
    },
    /// Verify an `X-Grifon-Signature` the way the store does
    Verify {
        /// Environment variable holding the shared secret
        #[arg(short, long)]
        secret_env: String,

        /// Unix timestamp the signature was made with
        #[arg(short, long)]
        timestamp: i64,

        /// Base64 signature to check
        #[arg(long)]
        signature: String,

        /// File with the exact body bytes
        #[arg(short, long)]
        body: PathBuf,

        /// Accepted clock skew in seconds
        #[arg(long, default_value_t = grifon_sync::signing::DEFAULT_MAX_SKEW_SECS)]
        max_skew: i64,

        /// Skip the timestamp window check
        #[arg(long)]
        ignore_skew: bool,
    },
    /// Sync a customer to one or more stores
    Push {
        /// Customer file (JSON or YAML)
        #[arg(short, long)]
        payload: PathBuf,

        /// Target store id, repeatable (default: all stores)
        #[arg(short, long = "store")]
        stores: Vec<String>,

        /// Shops directory file
        #[arg(long, env = "GRIFON_SHOPS_FILE", default_value = "shops.yaml")]
        shops: PathBuf,

        /// Environment variable holding the plaintext password, used when
        /// the file has no `password_hashed`
        #[arg(long)]
        password_env: Option<String>,
    },
    /// List configured stores
    Stores {
        /// Shops directory file
        #[arg(long, env = "GRIFON_SHOPS_FILE", default_value = "shops.yaml")]
        shops: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "grifon_sync=info,grifon_sync_cli=info".into());

    // Logs go to stderr; stdout carries command output only
    let json = std::env::var("GRIFON_LOG_JSON").is_ok();
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::HashPassword { cost } => commands::hash::run(cost)?,
        Commands::Sign {
            secret_env,
            timestamp,
            body,
        } => commands::sign::run(&secret_env, timestamp, &body).await?,
        Commands::Verify {
            secret_env,
            timestamp,
            signature,
            body,
            max_skew,
            ignore_skew,
        } => {
            let max_skew = (!ignore_skew).then_some(max_skew);
            commands::verify::run(&secret_env, timestamp, &signature, &body, max_skew).await?;
        }
        Commands::Push {
            payload,
            stores,
            shops,
            password_env,
        } => commands::push::run(&payload, &stores, &shops, password_env.as_deref()).await?,
        Commands::Stores { shops } => commands::stores::run(&shops)?,
    }
    Ok(())
}
