use std::sync::Arc;
use std::time::Duration;

use juspub::cards::TrelloBoard;
use juspub::channels::{ImapMailSource, Notifier, NullNotifier, TelegramNotifier};
use juspub::config::Config;
use juspub::extract::ExtractionOrchestrator;
use juspub::llm::create_provider;
use juspub::pipeline::PipelineCoordinator;
use juspub::special_list::SpecialList;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    eprintln!("🤖 juspub v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  See README for the JUSPUB_* environment variables.");
        std::process::exit(1);
    });

    // AI backend must answer before any batch runs.
    let provider = create_provider(&config.ai);
    let (ok, message) = provider.test_connection().await;
    if ok {
        tracing::info!("{message}");
    } else {
        eprintln!("Error: AI backend unavailable: {message}");
        std::process::exit(1);
    }

    // Notifier is optional; a silent run is fine.
    let notifier: Arc<dyn Notifier> = {
        let telegram = TelegramNotifier::new(config.telegram.clone());
        let (ok, message) = telegram.test_connection().await;
        if ok {
            tracing::info!("{message}");
            Arc::new(telegram)
        } else {
            tracing::warn!("{message}, notifications disabled");
            Arc::new(NullNotifier)
        }
    };

    let mut board = TrelloBoard::new(config.trello.clone());
    board.setup_labels().await;

    let special_list = SpecialList::load(&config.special_list_path);
    tracing::info!(entries = special_list.len(), "Special list loaded");

    let coordinator = PipelineCoordinator::new(
        Arc::new(ImapMailSource::new(config.imap.clone())),
        ExtractionOrchestrator::new(provider),
        Arc::new(board),
        Arc::clone(&notifier),
        special_list,
    )
    .with_inter_item_delay(config.inter_item_delay);

    let watch = std::env::args().any(|arg| arg == "--watch");
    if watch {
        run_watch(&coordinator, &notifier, config.watch_interval).await;
    } else if let Err(e) = coordinator.run_batch().await {
        tracing::error!(error = %e, "Batch failed");
        notifier.fatal_error(&e.to_string()).await;
        std::process::exit(1);
    }

    Ok(())
}

/// Run batches forever, pausing `interval` between them. Batch errors are
/// reported and the loop keeps going.
async fn run_watch(
    coordinator: &PipelineCoordinator,
    notifier: &Arc<dyn Notifier>,
    interval: Duration,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Watch mode started");
    loop {
        if let Err(e) = coordinator.run_batch().await {
            tracing::error!(error = %e, "Batch failed");
            notifier.fatal_error(&e.to_string()).await;
        }
        tracing::info!(secs = interval.as_secs(), "Sleeping until next batch");
        tokio::time::sleep(interval).await;
    }
}
