//! pharmagate - hospital staff gateway for a clinical registry

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use pharmagate::{
    config::Args,
    db::MongoClient,
    logging::{init_tracing, LogFormat},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_tracing(&args.log_level, LogFormat::parse(&args.log_format));

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  pharmagate - clinical staff gateway");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Registry: {}", args.registry_base_url);
    info!("Registry timeout: {} ms", args.registry_timeout_ms);
    info!("Safety settle delay: {} ms", args.safety_settle_ms);
    info!("MongoDB: {}", args.mongodb_uri);
    info!("======================================");

    // MongoDB is optional in dev mode only
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, continuing without): {}", e);
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let state = Arc::new(AppState::new(args, mongo).await?);

    server::run(state).await?;

    Ok(())
}
