//! In-memory repositories for dev and tests.
//!
//! Records live in a `BTreeMap` keyed by UUIDv7 ids, so listings come back
//! in insertion order. Every write happens under a single write lock.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use stockwatch_auth::{AdminAccount, ProfileChange, SuperAdminGuard};
use stockwatch_core::{AdminId, Entity, StockItemId};
use stockwatch_inventory::StockItem;

use super::{AdminRepository, Recipient, RepositoryError, StockRepository};

#[derive(Debug)]
struct Table<T: Entity>
where
    T::Id: Ord,
{
    rows: RwLock<BTreeMap<T::Id, T>>,
}

impl<T: Entity + Clone> Table<T>
where
    T::Id: Ord,
{
    fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<T::Id, T>>, RepositoryError> {
        self.rows
            .read()
            .map_err(|_| RepositoryError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<T::Id, T>>, RepositoryError> {
        self.rows
            .write()
            .map_err(|_| RepositoryError::Unavailable("lock poisoned".to_string()))
    }

    fn get(&self, id: T::Id) -> Result<Option<T>, RepositoryError> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn active_where(&self, pred: impl Fn(&T) -> bool) -> Result<Vec<T>, RepositoryError> {
        Ok(self
            .read()?
            .values()
            .filter(|row| row.is_active() && pred(row))
            .cloned()
            .collect())
    }
}

/// Admin accounts held in process memory.
#[derive(Debug)]
pub struct InMemoryAdminRepository {
    table: Table<AdminAccount>,
}

impl InMemoryAdminRepository {
    pub fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }
}

impl Default for InMemoryAdminRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn email_taken(
    rows: &BTreeMap<AdminId, AdminAccount>,
    email: &str,
    except: Option<AdminId>,
) -> bool {
    rows.values()
        .any(|a| a.email == email && Some(a.id) != except)
}

#[async_trait]
impl AdminRepository for InMemoryAdminRepository {
    async fn insert(&self, account: AdminAccount) -> Result<AdminAccount, RepositoryError> {
        let mut rows = self.table.write()?;
        if email_taken(&rows, &account.email, None) {
            return Err(RepositoryError::Conflict("Admin already exists".to_string()));
        }
        rows.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: AdminId) -> Result<Option<AdminAccount>, RepositoryError> {
        self.table.get(id)
    }

    async fn find_active_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AdminAccount>, RepositoryError> {
        Ok(self
            .table
            .active_where(|a| a.email == email)?
            .into_iter()
            .next())
    }

    async fn list_active(&self) -> Result<Vec<AdminAccount>, RepositoryError> {
        self.table.active_where(|_| true)
    }

    async fn list_notification_recipients(&self) -> Result<Vec<Recipient>, RepositoryError> {
        Ok(self
            .table
            .active_where(|a| a.notification)?
            .iter()
            .map(Recipient::from)
            .collect())
    }

    async fn count_active_supers(&self) -> Result<usize, RepositoryError> {
        Ok(self.table.active_where(|a| a.role.is_super())?.len())
    }

    async fn apply_profile_change(
        &self,
        target_id: AdminId,
        change: &ProfileChange,
        guard: Option<SuperAdminGuard>,
    ) -> Result<AdminAccount, RepositoryError> {
        let mut rows = self.table.write()?;

        if !rows.contains_key(&target_id) {
            return Err(RepositoryError::NotFound);
        }

        if let Some(guard) = guard {
            let active_supers = rows.values().filter(|a| a.is_active_super()).count();
            if !guard.permits(active_supers) {
                return Err(RepositoryError::LastSuperAdmin);
            }
        }

        if let Some(email) = &change.email {
            if email_taken(&rows, email, Some(target_id)) {
                return Err(RepositoryError::Conflict("Admin already exists".to_string()));
            }
        }

        let account = rows.get_mut(&target_id).ok_or(RepositoryError::NotFound)?;
        change.apply_to(account);
        Ok(account.clone())
    }
}

/// Stock items held in process memory.
#[derive(Debug)]
pub struct InMemoryStockRepository {
    table: Table<StockItem>,
}

impl InMemoryStockRepository {
    pub fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }
}

impl Default for InMemoryStockRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StockRepository for InMemoryStockRepository {
    async fn insert(&self, item: StockItem) -> Result<StockItem, RepositoryError> {
        self.table.write()?.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_by_id(&self, id: StockItemId) -> Result<Option<StockItem>, RepositoryError> {
        self.table.get(id)
    }

    async fn update(&self, item: &StockItem) -> Result<(), RepositoryError> {
        let mut rows = self.table.write()?;
        let slot = rows.get_mut(&item.id).ok_or(RepositoryError::NotFound)?;
        *slot = item.clone();
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<StockItem>, RepositoryError> {
        self.table.active_where(|_| true)
    }

    async fn list_low_stock(&self) -> Result<Vec<StockItem>, RepositoryError> {
        self.table.active_where(StockItem::is_low_stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockwatch_auth::{AdminRole, PasswordHash};
    use stockwatch_core::RecordStatus;
    use stockwatch_inventory::{CreateStockItem, UpdateStockItem};

    fn admin(email: &str, role: AdminRole, notification: bool) -> AdminAccount {
        AdminAccount {
            id: AdminId::new(),
            name: "Admin".to_string(),
            email: email.to_string(),
            password_hash: PasswordHash::from_encoded("hash"),
            status: RecordStatus::Active,
            role,
            notification,
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

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let repo = InMemoryAdminRepository::new();
        repo.insert(admin("a@example.com", AdminRole::Super, false))
            .await
            .unwrap();
        let err = repo
            .insert(admin("a@example.com", AdminRole::Admin, false))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn guarded_write_refuses_to_remove_last_super() {
        let repo = InMemoryAdminRepository::new();
        let only = repo
            .insert(admin("s@example.com", AdminRole::Super, false))
            .await
            .unwrap();

        let change = ProfileChange {
            role: Some(AdminRole::Admin),
            ..ProfileChange::default()
        };
        let guard = SuperAdminGuard { target_id: only.id };

        let err = repo
            .apply_profile_change(only.id, &change, Some(guard))
            .await
            .unwrap_err();
        assert_eq!(err, RepositoryError::LastSuperAdmin);

        let stored = repo.find_by_id(only.id).await.unwrap().unwrap();
        assert_eq!(stored.role, AdminRole::Super);
        assert_eq!(repo.count_active_supers().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn guarded_write_allows_demotion_with_another_super() {
        let repo = InMemoryAdminRepository::new();
        let a = repo
            .insert(admin("a@example.com", AdminRole::Super, false))
            .await
            .unwrap();
        repo.insert(admin("b@example.com", AdminRole::Super, false))
            .await
            .unwrap();

        let change = ProfileChange {
            status: Some(RecordStatus::Deleted),
            ..ProfileChange::default()
        };
        let updated = repo
            .apply_profile_change(a.id, &change, Some(SuperAdminGuard { target_id: a.id }))
            .await
            .unwrap();

        assert_eq!(updated.status, RecordStatus::Deleted);
        assert_eq!(repo.count_active_supers().await.unwrap(), 1);
        assert_eq!(repo.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn profile_change_rejects_taken_email() {
        let repo = InMemoryAdminRepository::new();
        let a = repo
            .insert(admin("a@example.com", AdminRole::Super, false))
            .await
            .unwrap();
        repo.insert(admin("b@example.com", AdminRole::Admin, false))
            .await
            .unwrap();

        let change = ProfileChange {
            email: Some("b@example.com".to_string()),
            ..ProfileChange::default()
        };
        let err = repo.apply_profile_change(a.id, &change, None).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_target_is_not_found() {
        let repo = InMemoryAdminRepository::new();
        let err = repo
            .apply_profile_change(AdminId::new(), &ProfileChange::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err, RepositoryError::NotFound);
    }

    #[tokio::test]
    async fn recipients_are_active_and_opted_in() {
        let repo = InMemoryAdminRepository::new();
        repo.insert(admin("in@example.com", AdminRole::Super, true))
            .await
            .unwrap();
        repo.insert(admin("out@example.com", AdminRole::Admin, false))
            .await
            .unwrap();
        let mut gone = admin("gone@example.com", AdminRole::Admin, true);
        gone.status = RecordStatus::Deleted;
        repo.insert(gone).await.unwrap();

        let recipients = repo.list_notification_recipients().await.unwrap();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].email, "in@example.com");
    }

    #[tokio::test]
    async fn deleted_login_lookup_misses() {
        let repo = InMemoryAdminRepository::new();
        let mut gone = admin("gone@example.com", AdminRole::Admin, false);
        gone.status = RecordStatus::Deleted;
        repo.insert(gone).await.unwrap();

        assert!(
            repo.find_active_by_email("gone@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn low_stock_excludes_deleted_and_plentiful() {
        let repo = InMemoryStockRepository::new();
        repo.insert(item("A", 3)).await.unwrap();
        repo.insert(item("Plenty", 50)).await.unwrap();
        repo.insert(item("Edge", 10)).await.unwrap();
        let mut deleted = repo.insert(item("Gone", 1)).await.unwrap();

        deleted
            .apply_update(&UpdateStockItem {
                title: None,
                quantity: None,
                status: Some(RecordStatus::Deleted),
                created_at: None,
                updated_at: None,
                actor_id: AdminId::new(),
                occurred_at: Utc::now(),
            })
            .unwrap();
        repo.update(&deleted).await.unwrap();

        let low: Vec<_> = repo
            .list_low_stock()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(low, vec!["A".to_string()]);
        assert_eq!(repo.list_active().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_unknown_item_is_not_found() {
        let repo = InMemoryStockRepository::new();
        let err = repo.update(&item("X", 1)).await.unwrap_err();
        assert_eq!(err, RepositoryError::NotFound);
    }
}
