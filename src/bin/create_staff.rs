//! create-staff - provision a staff account
//!
//! Usage:
//!   create-staff --username house --password Vicodin-4-Pain --role doctor
//!
//! Environment variables:
//!   MONGODB_URI - MongoDB connection URI (default: mongodb://localhost:27017)
//!   MONGODB_DB - Database name (default: pharmagate)

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use pharmagate::auth::{check_password_policy, hash_password, StaffRole};
use pharmagate::db::schemas::{StaffUserDoc, STAFF_USER_COLLECTION};
use pharmagate::db::{is_duplicate_key, MongoClient};
use pharmagate::logging::{init_tracing, LogFormat};

#[derive(Parser, Debug)]
#[command(name = "create-staff")]
#[command(about = "Create a pharmagate staff account")]
#[command(version)]
struct Args {
    /// Login name
    #[arg(long)]
    username: String,

    /// Plain-text password (hashed with argon2 before storage)
    #[arg(long, env = "STAFF_PASSWORD")]
    password: String,

    /// Role: doctor, pharmacist or admin
    #[arg(long, default_value = "doctor")]
    role: StaffRole,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "pharmagate")]
    mongodb_db: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing("info", LogFormat::Text);

    let args = Args::parse();

    if args.username.trim().is_empty() {
        bail!("username must not be empty");
    }
    check_password_policy(&args.username, &args.password)?;

    let mongo = MongoClient::new(&args.mongodb_uri, &args.mongodb_db)
        .await
        .context("connecting to MongoDB")?;
    let users = mongo
        .collection::<StaffUserDoc>(STAFF_USER_COLLECTION)
        .await
        .context("opening staff collection")?;

    let password_hash = hash_password(&args.password)?;
    let user = StaffUserDoc::new(args.username.clone(), password_hash, args.role);

    match users.insert_one(user).await {
        Ok(id) => {
            info!(username = %args.username, role = %args.role, id = %id, "Staff account created");
            Ok(())
        }
        Err(e) if is_duplicate_key(&e) => bail!("username '{}' already exists", args.username),
        Err(e) => Err(e.into()),
    }
}
