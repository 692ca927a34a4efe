// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Background notification worker.
//!
//! Drains the notification queue one message at a time. Delivery failures
//! are logged and never retried.
//!
//! ## Shutdown
//!
//! Stops when the `CancellationToken` fires or every queue sender is dropped.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{Mailer, Notification};

pub struct NotificationWorker<M> {
    receiver: mpsc::Receiver<Notification>,
    mailer: M,
}

impl<M: Mailer> NotificationWorker<M> {
    pub fn new(receiver: mpsc::Receiver<Notification>, mailer: M) -> Self {
        Self { receiver, mailer }
    }

    /// Run until cancelled or the queue closes.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(worker.run(shutdown.clone()));
    /// ```
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Notification worker starting");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Notification worker shutting down");
                    return;
                }
                next = self.receiver.recv() => match next {
                    Some(notification) => self.deliver(notification).await,
                    None => {
                        info!("Notification queue closed, worker exiting");
                        return;
                    }
                },
            }
        }
    }

    async fn deliver(&self, notification: Notification) {
        match self.mailer.send(&notification).await {
            Ok(()) => info!(
                to = %notification.to,
                subject = %notification.subject,
                "Notification sent"
            ),
            Err(e) => warn!(
                to = %notification.to,
                subject = %notification.subject,
                error = %e,
                "Notification delivery failed"
            ),
        }
    }
}
