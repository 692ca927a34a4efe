// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use eth_mock_wallet::{
    api::router,
    config::Config,
    logging,
    notify::{NotificationQueue, NotificationWorker, SmtpMailer},
    oracle::PriceOracle,
    state::AppState,
    storage::LedgerStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    let provider_installed = rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok();

    let config = Config::from_env()?;
    logging::init(config.log_format);
    if !provider_installed {
        warn!("rustls crypto provider was already installed");
    }

    let store = LedgerStore::open(&config.database_path())?;
    let oracle = PriceOracle::new(
        config.price_api_url.clone(),
        config.price_cache_ttl,
        config.price_cache_grace,
    );

    let shutdown = CancellationToken::new();

    // Email notifications are optional; without credentials the queue drops everything
    let notifications = match &config.smtp {
        Some(smtp) => match SmtpMailer::new(smtp) {
            Ok(mailer) => {
                let (queue, receiver) = NotificationQueue::bounded(config.notify_queue_capacity);
                let worker = NotificationWorker::new(receiver, mailer);
                tokio::spawn(worker.run(shutdown.clone()));
                info!(server = %smtp.server, port = smtp.port, "Email notifications enabled");
                queue
            }
            Err(e) => {
                warn!(error = %e, "Invalid SMTP configuration, email notifications disabled");
                NotificationQueue::disabled()
            }
        },
        None => {
            info!("SMTP credentials not set, email notifications disabled");
            NotificationQueue::disabled()
        }
    };

    let state = AppState::new(store, oracle, notifications, config.initial_balance);
    let app = router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "ETH Mock Wallet server listening (docs at /docs)");

    let token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            token.cancel();
        })
        .await?;

    shutdown.cancel();
    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
