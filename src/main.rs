//! Curriculum migrator - flattens the document-store curriculum into
//! relational tables, or reads one path back as a nested tree.

mod curriculum;
mod firestore;
mod google_auth;
mod migrator;
mod reader;
mod store;
mod supabase;

#[cfg(test)]
mod memory;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "curriculum_migrator=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("migrate") => {
            let source = firestore::FirestoreClient::from_env()?;
            let target = supabase::SupabaseClient::from_env()?;

            let summary = migrator::migrate_curriculum(&source, &target).await?;
            info!(
                "Done: {} paths, {} subjects, {} lessons ({} skipped)",
                summary.paths, summary.subjects, summary.lessons, summary.skipped
            );
        }
        Some("read") => {
            let path_id = args
                .next()
                .ok_or_else(|| anyhow::anyhow!("Missing path id: read <path-id>"))?;
            let target = supabase::SupabaseClient::from_env()?;

            let trees = reader::read_path(&target, &path_id).await?;
            println!("{}", serde_json::to_string_pretty(&trees)?);
        }
        _ => {
            eprintln!("Usage: curriculum-migrator <migrate | read <path-id>>");
            std::process::exit(2);
        }
    }

    Ok(())
}
