// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Email Notifications
//!
//! Request handlers never talk to SMTP. They push a [`Notification`] onto a
//! bounded queue with [`NotificationQueue::enqueue`], which never blocks and
//! never fails the request; a [`NotificationWorker`] drains the queue in the
//! background and logs delivery failures.
//!
//! When SMTP credentials are not configured the queue is disabled and
//! enqueued messages are dropped with a debug log.

pub mod smtp;
pub mod worker;

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::WalletAddress;
use crate::storage::Transaction;

pub use smtp::{Mailer, SmtpMailer};
pub use worker::NotificationWorker;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid mailbox `{0}`")]
    Address(String),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// An email to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    /// HTML body
    pub body: String,
}

impl Notification {
    /// Welcome message sent after wallet creation.
    pub fn welcome(to: &str, address: &WalletAddress, balance: Decimal) -> Self {
        Self {
            to: to.to_string(),
            subject: "Welcome to ETH Mock Wallet!".to_string(),
            body: format!(
                "<h2>Welcome to ETH Mock Wallet!</h2>\
                 <p>Your wallet has been created successfully.</p>\
                 <p><strong>Address:</strong> {address}</p>\
                 <p><strong>Starting Balance:</strong> {} ETH</p>\
                 <p>You can now start sending and receiving ETH!</p>",
                balance.normalize()
            ),
        }
    }

    /// Confirmation for the sender of a completed transfer.
    pub fn sent(to: &str, tx: &Transaction) -> Self {
        Self {
            to: to.to_string(),
            subject: "Transaction Sent".to_string(),
            body: format!(
                "<h2>Transaction Successful</h2>\
                 <p>You have sent <strong>{} ETH</strong></p>\
                 <p><strong>To:</strong> {}</p>\
                 <p><strong>Transaction Hash:</strong> {}</p>\
                 <p><strong>ETH Price:</strong> {}</p>",
                tx.amount.round_dp(6).normalize(),
                tx.to_address,
                tx.tx_hash,
                format_price(tx),
            ),
        }
    }

    /// Notice for the recipient of a completed transfer.
    pub fn received(to: &str, tx: &Transaction) -> Self {
        Self {
            to: to.to_string(),
            subject: "ETH Received".to_string(),
            body: format!(
                "<h2>You've Received ETH!</h2>\
                 <p>You have received <strong>{} ETH</strong></p>\
                 <p><strong>From:</strong> {}</p>\
                 <p><strong>Transaction Hash:</strong> {}</p>\
                 <p><strong>ETH Price:</strong> {}</p>",
                tx.amount.round_dp(6).normalize(),
                tx.from_address,
                tx.tx_hash,
                format_price(tx),
            ),
        }
    }
}

fn format_price(tx: &Transaction) -> String {
    if tx.eth_usd_rate.is_zero() {
        "unavailable".to_string()
    } else {
        format!("${:.2}", tx.eth_usd_rate)
    }
}

/// Sending half of the notification queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: Option<mpsc::Sender<Notification>>,
}

impl NotificationQueue {
    /// Create a bounded queue and the receiver a worker should drain.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// A queue that drops everything (notifications not configured).
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Hand a notification to the worker without waiting.
    ///
    /// Returns whether the message was queued.
    pub fn enqueue(&self, notification: Notification) -> bool {
        let Some(sender) = &self.sender else {
            debug!(to = %notification.to, subject = %notification.subject, "Notifications disabled, dropping");
            return false;
        };

        match sender.try_send(notification) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(n)) => {
                warn!(to = %n.to, subject = %n.subject, "Notification queue full, dropping");
                false
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                warn!(to = %n.to, subject = %n.subject, "Notification worker stopped, dropping");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TxStatus;
    use chrono::Utc;

    fn addr(n: u8) -> WalletAddress {
        format!("0x{:040x}", n).parse().unwrap()
    }

    fn sample_tx(rate: i64) -> Transaction {
        Transaction {
            id: "id-1".into(),
            tx_hash: "0xabc".into(),
            seq: 0,
            from_address: addr(1),
            to_address: addr(2),
            amount: "1.5".parse().unwrap(),
            nonce: 0,
            eth_usd_rate: Decimal::from(rate),
            usd_value_at_time: Decimal::from(rate) * Decimal::from(3) / Decimal::from(2),
            price_degraded: rate == 0,
            status: TxStatus::Completed,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn enqueue_delivers_to_receiver() {
        let (queue, mut rx) = NotificationQueue::bounded(4);
        let n = Notification::welcome("a@example.com", &addr(1), Decimal::ONE_HUNDRED);
        assert!(queue.enqueue(n.clone()));
        assert_eq!(rx.try_recv().unwrap(), n);
    }

    #[test]
    fn full_queue_drops_without_blocking() {
        let (queue, _rx) = NotificationQueue::bounded(1);
        let n = Notification::welcome("a@example.com", &addr(1), Decimal::ONE);
        assert!(queue.enqueue(n.clone()));
        assert!(!queue.enqueue(n));
    }

    #[test]
    fn closed_and_disabled_queues_drop() {
        let (queue, rx) = NotificationQueue::bounded(1);
        drop(rx);
        let n = Notification::welcome("a@example.com", &addr(1), Decimal::ONE);
        assert!(!queue.enqueue(n.clone()));

        let disabled = NotificationQueue::disabled();
        assert!(!disabled.is_enabled());
        assert!(!disabled.enqueue(n));
    }

    #[test]
    fn transfer_messages_mention_parties_and_price() {
        let tx = sample_tx(2000);
        let sent = Notification::sent("a@example.com", &tx);
        assert_eq!(sent.subject, "Transaction Sent");
        assert!(sent.body.contains("1.5 ETH"));
        assert!(sent.body.contains(tx.to_address.as_str()));
        assert!(sent.body.contains("$2000.00"));

        let received = Notification::received("b@example.com", &sample_tx(0));
        assert!(received.body.contains(tx.from_address.as_str()));
        assert!(received.body.contains("unavailable"));
    }
}
