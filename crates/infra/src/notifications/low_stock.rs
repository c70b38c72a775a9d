//! The low-stock notification cycle.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use stockwatch_inventory::{LowStockEntry, StockItem};

use super::{NotificationSender, SendError, low_stock_message};
use crate::repository::{AdminRepository, RepositoryError, StockRepository};

/// A cycle could not read the data it needs. Delivery failures never end up here.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("failed to load {source_name}: {source}")]
    DataFetch {
        source_name: &'static str,
        #[source]
        source: RepositoryError,
    },
}

/// One recipient that could not be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryFailure {
    pub email: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub sent: usize,
    pub failures: Vec<DeliveryFailure>,
}

/// Result of one notification cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    NothingToNotify,
    NoRecipients,
    Delivered(DeliveryReport),
}

impl CycleOutcome {
    pub fn attempted(&self) -> usize {
        match self {
            CycleOutcome::Delivered(report) => report.attempted,
            _ => 0,
        }
    }

    pub fn sent(&self) -> usize {
        match self {
            CycleOutcome::Delivered(report) => report.sent,
            _ => 0,
        }
    }
}

/// Finds low-stock items and mails them to every opted-in admin.
///
/// Holds no state between cycles: every run re-reads stock and recipients.
#[derive(Clone)]
pub struct LowStockNotifier {
    stock: Arc<dyn StockRepository>,
    admins: Arc<dyn AdminRepository>,
    sender: Arc<dyn NotificationSender>,
}

impl LowStockNotifier {
    pub fn new(
        stock: Arc<dyn StockRepository>,
        admins: Arc<dyn AdminRepository>,
        sender: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            stock,
            admins,
            sender,
        }
    }

    pub async fn run_notification_cycle(&self) -> Result<CycleOutcome, NotifierError> {
        let items = self
            .stock
            .list_low_stock()
            .await
            .map_err(|source| NotifierError::DataFetch {
                source_name: "low-stock items",
                source,
            })?;
        if items.is_empty() {
            info!("no low-stock items found, skipping");
            return Ok(CycleOutcome::NothingToNotify);
        }

        let recipients = self
            .admins
            .list_notification_recipients()
            .await
            .map_err(|source| NotifierError::DataFetch {
                source_name: "notification recipients",
                source,
            })?;
        if recipients.is_empty() {
            info!(items = items.len(), "no admins with notifications enabled, skipping");
            return Ok(CycleOutcome::NoRecipients);
        }

        let entries: Vec<LowStockEntry> = items.iter().map(StockItem::low_stock_entry).collect();
        let mut report = DeliveryReport::default();

        for recipient in &recipients {
            report.attempted += 1;
            let delivery = match low_stock_message(recipient.greeting_name(), &entries) {
                Ok(message) => self.sender.send(&recipient.email, &message).await,
                Err(err) => Err(SendError::from(err)),
            };

            match delivery {
                Ok(()) => report.sent += 1,
                Err(err) => {
                    warn!(to = %recipient.email, error = %err, "failed to send low-stock notification");
                    report.failures.push(DeliveryFailure {
                        email: recipient.email.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            sent = report.sent,
            attempted = report.attempted,
            items = entries.len(),
            "low-stock notification cycle finished"
        );
        Ok(CycleOutcome::Delivered(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;

    use stockwatch_auth::{AdminAccount, AdminRole, PasswordHash, ProfileChange, SuperAdminGuard};
    use stockwatch_core::{AdminId, RecordStatus, StockItemId};
    use stockwatch_inventory::CreateStockItem;

    use crate::notifications::OutgoingMessage;
    use crate::repository::{InMemoryAdminRepository, InMemoryStockRepository, Recipient};

    #[derive(Default)]
    struct RecordingSender {
        fail_for: Option<String>,
        sent: Mutex<Vec<(String, OutgoingMessage)>>,
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        async fn send(&self, to: &str, message: &OutgoingMessage) -> Result<(), SendError> {
            if self.fail_for.as_deref() == Some(to) {
                return Err(SendError::Rejected("mailbox unavailable".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), message.clone()));
            Ok(())
        }
    }

    /// Admin repository that counts recipient queries and can be told to fail.
    struct ProbeAdmins {
        inner: InMemoryAdminRepository,
        recipient_queries: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl AdminRepository for ProbeAdmins {
        async fn insert(&self, account: AdminAccount) -> Result<AdminAccount, RepositoryError> {
            self.inner.insert(account).await
        }
        async fn find_by_id(&self, id: AdminId) -> Result<Option<AdminAccount>, RepositoryError> {
            self.inner.find_by_id(id).await
        }
        async fn find_active_by_email(
            &self,
            email: &str,
        ) -> Result<Option<AdminAccount>, RepositoryError> {
            self.inner.find_active_by_email(email).await
        }
        async fn list_active(&self) -> Result<Vec<AdminAccount>, RepositoryError> {
            self.inner.list_active().await
        }
        async fn list_notification_recipients(&self) -> Result<Vec<Recipient>, RepositoryError> {
            self.recipient_queries.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RepositoryError::Unavailable("admins offline".to_string()));
            }
            self.inner.list_notification_recipients().await
        }
        async fn count_active_supers(&self) -> Result<usize, RepositoryError> {
            self.inner.count_active_supers().await
        }
        async fn apply_profile_change(
            &self,
            target_id: AdminId,
            change: &ProfileChange,
            guard: Option<SuperAdminGuard>,
        ) -> Result<AdminAccount, RepositoryError> {
            self.inner.apply_profile_change(target_id, change, guard).await
        }
    }

    struct BrokenStock;

    #[async_trait]
    impl StockRepository for BrokenStock {
        async fn insert(&self, _item: StockItem) -> Result<StockItem, RepositoryError> {
            Err(RepositoryError::Unavailable("stock offline".to_string()))
        }
        async fn find_by_id(&self, _id: StockItemId) -> Result<Option<StockItem>, RepositoryError> {
            Err(RepositoryError::Unavailable("stock offline".to_string()))
        }
        async fn update(&self, _item: &StockItem) -> Result<(), RepositoryError> {
            Err(RepositoryError::Unavailable("stock offline".to_string()))
        }
        async fn list_active(&self) -> Result<Vec<StockItem>, RepositoryError> {
            Err(RepositoryError::Unavailable("stock offline".to_string()))
        }
        async fn list_low_stock(&self) -> Result<Vec<StockItem>, RepositoryError> {
            Err(RepositoryError::Unavailable("stock offline".to_string()))
        }
    }

    fn item(title: &str, quantity: i64) -> StockItem {
        StockItem::create(
            StockItemId::new(),
            CreateStockItem {
                title: title.to_string(),
                quantity,
                status: None,
                created_at: None,
                updated_at: None,
                owner_id: AdminId::new(),
                occurred_at: Utc::now(),
            },
        )
        .unwrap()
    }

    fn admin(email: &str, name: &str, notification: bool) -> AdminAccount {
        AdminAccount {
            id: AdminId::new(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: PasswordHash::from_encoded("hash"),
            status: RecordStatus::Active,
            role: AdminRole::Admin,
            notification,
        }
    }

    async fn stock_with(items: &[(&str, i64)]) -> Arc<InMemoryStockRepository> {
        let repo = Arc::new(InMemoryStockRepository::new());
        for (title, qty) in items {
            repo.insert(item(title, *qty)).await.unwrap();
        }
        repo
    }

    async fn admins_with(accounts: Vec<AdminAccount>, fail: bool) -> Arc<ProbeAdmins> {
        let inner = InMemoryAdminRepository::new();
        for account in accounts {
            inner.insert(account).await.unwrap();
        }
        Arc::new(ProbeAdmins {
            inner,
            recipient_queries: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test]
    async fn two_items_two_recipients_all_sent() {
        let stock = stock_with(&[("A", 3), ("B", 2), ("Plenty", 40)]).await;
        let admins = admins_with(
            vec![
                admin("u1@example.com", "U1", true),
                admin("u2@example.com", "", true),
            ],
            false,
        )
        .await;
        let sender = Arc::new(RecordingSender::default());

        let notifier = LowStockNotifier::new(stock, admins, sender.clone());
        let outcome = notifier.run_notification_cycle().await.unwrap();

        assert_eq!(outcome.attempted(), 2);
        assert_eq!(outcome.sent(), 2);

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        for (_, msg) in sent.iter() {
            assert_eq!(msg.subject, "[Action Required] Low stock items (2)");
            assert!(msg.text.contains("• A (qty: 3)"));
            assert!(msg.text.contains("• B (qty: 2)"));
            assert!(!msg.text.contains("Plenty"));
        }
        assert!(sent.iter().any(|(_, m)| m.text.starts_with("Hi there,")));
    }

    #[tokio::test]
    async fn no_low_stock_skips_recipient_query() {
        let stock = stock_with(&[("Plenty", 40)]).await;
        let admins = admins_with(vec![admin("u1@example.com", "U1", true)], false).await;
        let sender = Arc::new(RecordingSender::default());

        let notifier = LowStockNotifier::new(stock, admins.clone(), sender.clone());
        let outcome = notifier.run_notification_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::NothingToNotify);
        assert_eq!(admins.recipient_queries.load(Ordering::SeqCst), 0);
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_opted_in_admins() {
        let stock = stock_with(&[("A", 1)]).await;
        let admins = admins_with(vec![admin("u1@example.com", "U1", false)], false).await;
        let sender = Arc::new(RecordingSender::default());

        let outcome = LowStockNotifier::new(stock, admins, sender.clone())
            .run_notification_cycle()
            .await
            .unwrap();

        assert_eq!(outcome, CycleOutcome::NoRecipients);
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_abort_cycle() {
        let stock = stock_with(&[("A", 1)]).await;
        let admins = admins_with(
            vec![
                admin("u1@example.com", "U1", true),
                admin("bad@example.com", "Bad", true),
                admin("u3@example.com", "U3", true),
            ],
            false,
        )
        .await;
        let sender = Arc::new(RecordingSender {
            fail_for: Some("bad@example.com".to_string()),
            ..RecordingSender::default()
        });

        let outcome = LowStockNotifier::new(stock, admins, sender.clone())
            .run_notification_cycle()
            .await
            .unwrap();

        let CycleOutcome::Delivered(report) = outcome else {
            panic!("expected delivery report");
        };
        assert_eq!(report.attempted, 3);
        assert_eq!(report.sent, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].email, "bad@example.com");
        assert_eq!(sender.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn repeated_cycles_report_the_same_counts() {
        let stock = stock_with(&[("A", 1), ("B", 9)]).await;
        let admins = admins_with(
            vec![
                admin("u1@example.com", "U1", true),
                admin("u2@example.com", "U2", true),
            ],
            false,
        )
        .await;
        let notifier =
            LowStockNotifier::new(stock, admins, Arc::new(RecordingSender::default()));

        let first = notifier.run_notification_cycle().await.unwrap();
        let second = notifier.run_notification_cycle().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.sent(), 2);
    }

    #[tokio::test]
    async fn stock_fetch_failure_is_hard_failure() {
        let admins = admins_with(vec![admin("u1@example.com", "U1", true)], false).await;
        let notifier = LowStockNotifier::new(
            Arc::new(BrokenStock),
            admins.clone(),
            Arc::new(RecordingSender::default()),
        );

        let err = notifier.run_notification_cycle().await.unwrap_err();
        assert!(err.to_string().contains("stock offline"));
        assert_eq!(admins.recipient_queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn recipient_fetch_failure_is_hard_failure() {
        let stock = stock_with(&[("A", 1)]).await;
        let admins = admins_with(vec![], true).await;
        let notifier =
            LowStockNotifier::new(stock, admins, Arc::new(RecordingSender::default()));

        let err = notifier.run_notification_cycle().await.unwrap_err();
        assert!(matches!(err, NotifierError::DataFetch { .. }));
        assert!(err.to_string().contains("admins offline"));
    }
}
