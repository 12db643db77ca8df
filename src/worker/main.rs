/**
 * Sync Worker Entry Point
 *
 * Drains the offline submission queue once against the storefront API.
 * Intended for hosts that run the queue on disk outside the browser, e.g. a
 * kiosk shell or a scheduled job.
 */

#[cfg(feature = "worker")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use pgclosets_offline::offline::OfflineSyncManager;
    use pgclosets_offline::shared::SyncConfig;
    use pgclosets_offline::sync::SyncOutcome;

    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = SyncConfig::from_env()?;
    tracing::info!(
        api = config.base_url(),
        db = %config.database_path().display(),
        "Starting sync worker"
    );

    let manager = OfflineSyncManager::builder(config).build().await?;

    match manager.sync_now().await {
        SyncOutcome::Completed(report) => {
            println!(
                "delivered={} failed={} stuck={} store_errors={}",
                report.delivered, report.failed, report.stuck, report.store_errors
            );
        }
        outcome => println!("sync skipped: {:?}", outcome),
    }

    for submission in manager.stuck_submissions().await? {
        tracing::warn!(
            id = %submission.id,
            last_error = submission.last_error.as_deref().unwrap_or(""),
            "Submission needs manual intervention"
        );
    }

    println!("pending={}", manager.get_pending_submission_count().await?);
    Ok(())
}

#[cfg(not(feature = "worker"))]
fn main() {
    eprintln!("The sync worker requires the 'worker' feature to be enabled.");
    eprintln!("Run with: cargo run --bin sync-worker --features worker");
    std::process::exit(1);
}
