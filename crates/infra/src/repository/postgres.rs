//! PostgreSQL adapters.
//!
//! `PgStore` owns the connection pool and implements both repository ports.
//! Queries are built at runtime (no compile-time database access needed).

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use stockwatch_auth::{AdminAccount, AdminRole, PasswordHash, ProfileChange, SuperAdminGuard};
use stockwatch_core::{AdminId, RecordStatus, StockItemId};
use stockwatch_inventory::{LOW_STOCK_THRESHOLD, StockItem};

use super::{AdminRepository, Recipient, RepositoryError, StockRepository};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS admins (
        id            UUID PRIMARY KEY,
        name          TEXT NOT NULL,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        status        SMALLINT NOT NULL DEFAULT 1 CHECK (status IN (0, 1)),
        role          TEXT NOT NULL DEFAULT 'admin' CHECK (role IN ('admin', 'super')),
        notification  BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stock_items (
        id         UUID PRIMARY KEY,
        title      TEXT NOT NULL,
        quantity   BIGINT NOT NULL CHECK (quantity >= 0),
        status     SMALLINT NOT NULL DEFAULT 1 CHECK (status IN (0, 1)),
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ,
        owner_id   UUID NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS stock_items_low_stock_idx ON stock_items (status, quantity)",
];

const ADMIN_COLUMNS: &str = "id, name, email, password_hash, status, role, notification";
const STOCK_COLUMNS: &str = "id, title, quantity, status, created_at, updated_at, owner_id";

/// Postgres-backed store for admins and stock items.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and make sure the tables exist.
    pub async fn connect(database_url: &str) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        info!("postgres store ready");
        Ok(store)
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn corrupt(what: &str, detail: impl core::fmt::Display) -> RepositoryError {
    RepositoryError::Unavailable(format!("corrupt {what}: {detail}"))
}

fn admin_from_row(row: &PgRow) -> Result<AdminAccount, RepositoryError> {
    let status: i16 = row.try_get("status")?;
    let role: String = row.try_get("role")?;

    Ok(AdminAccount {
        id: AdminId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: PasswordHash::from_encoded(row.try_get::<String, _>("password_hash")?),
        status: RecordStatus::try_from(status).map_err(|e| corrupt("admin status", e))?,
        role: role
            .parse::<AdminRole>()
            .map_err(|e| corrupt("admin role", e))?,
        notification: row.try_get("notification")?,
    })
}

fn stock_from_row(row: &PgRow) -> Result<StockItem, RepositoryError> {
    let status: i16 = row.try_get("status")?;
    let quantity: i64 = row.try_get("quantity")?;

    Ok(StockItem {
        id: StockItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        title: row.try_get("title")?,
        quantity: u32::try_from(quantity).map_err(|e| corrupt("stock quantity", e))?,
        status: RecordStatus::try_from(status).map_err(|e| corrupt("stock status", e))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        owner_id: AdminId::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
    })
}

fn status_code(status: RecordStatus) -> i16 {
    i16::from(status.code())
}

#[async_trait]
impl AdminRepository for PgStore {
    async fn insert(&self, account: AdminAccount) -> Result<AdminAccount, RepositoryError> {
        sqlx::query(
            "INSERT INTO admins (id, name, email, password_hash, status, role, notification) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::from(account.id))
        .bind(&account.name)
        .bind(&account.email)
        .bind(account.password_hash.as_str())
        .bind(status_code(account.status))
        .bind(account.role.as_str())
        .bind(account.notification)
        .execute(&self.pool)
        .await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: AdminId) -> Result<Option<AdminAccount>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1"))
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(admin_from_row).transpose()
    }

    async fn find_active_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AdminAccount>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1 AND status = 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(admin_from_row).transpose()
    }

    async fn list_active(&self) -> Result<Vec<AdminAccount>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE status = 1 ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(admin_from_row).collect()
    }

    async fn list_notification_recipients(&self) -> Result<Vec<Recipient>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT email, name FROM admins WHERE status = 1 AND notification = TRUE ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<Recipient, RepositoryError> {
                Ok(Recipient {
                    email: row.try_get("email")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn count_active_supers(&self) -> Result<usize, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE status = 1 AND role = 'super'")
                .fetch_one(&self.pool)
                .await?;
        usize::try_from(count).map_err(|e| corrupt("super admin count", e))
    }

    async fn apply_profile_change(
        &self,
        target_id: AdminId,
        change: &ProfileChange,
        guard: Option<SuperAdminGuard>,
    ) -> Result<AdminAccount, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the active supers first, in id order, so concurrent guarded
        // writes queue up behind each other instead of deadlocking.
        if let Some(guard) = guard {
            let supers = sqlx::query(
                "SELECT id FROM admins WHERE status = 1 AND role = 'super' ORDER BY id FOR UPDATE",
            )
            .fetch_all(&mut *tx)
            .await?;
            if !guard.permits(supers.len()) {
                tx.rollback().await?;
                return Err(RepositoryError::LastSuperAdmin);
            }
        }

        let row = sqlx::query(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1 FOR UPDATE"
        ))
        .bind(Uuid::from(target_id))
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Err(RepositoryError::NotFound);
        };

        let mut account = admin_from_row(&row)?;
        change.apply_to(&mut account);

        sqlx::query(
            "UPDATE admins SET email = $2, password_hash = $3, status = $4, role = $5, \
             notification = $6 WHERE id = $1",
        )
        .bind(Uuid::from(account.id))
        .bind(&account.email)
        .bind(account.password_hash.as_str())
        .bind(status_code(account.status))
        .bind(account.role.as_str())
        .bind(account.notification)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(account)
    }
}

#[async_trait]
impl StockRepository for PgStore {
    async fn insert(&self, item: StockItem) -> Result<StockItem, RepositoryError> {
        sqlx::query(
            "INSERT INTO stock_items (id, title, quantity, status, created_at, updated_at, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::from(item.id))
        .bind(&item.title)
        .bind(i64::from(item.quantity))
        .bind(status_code(item.status))
        .bind(item.created_at)
        .bind(item.updated_at)
        .bind(Uuid::from(item.owner_id))
        .execute(&self.pool)
        .await?;
        Ok(item)
    }

    async fn find_by_id(&self, id: StockItemId) -> Result<Option<StockItem>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock_items WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(stock_from_row).transpose()
    }

    async fn update(&self, item: &StockItem) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE stock_items SET title = $2, quantity = $3, status = $4, created_at = $5, \
             updated_at = $6, owner_id = $7 WHERE id = $1",
        )
        .bind(Uuid::from(item.id))
        .bind(&item.title)
        .bind(i64::from(item.quantity))
        .bind(status_code(item.status))
        .bind(item.created_at)
        .bind(item.updated_at)
        .bind(Uuid::from(item.owner_id))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<StockItem>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock_items WHERE status = 1 ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(stock_from_row).collect()
    }

    async fn list_low_stock(&self) -> Result<Vec<StockItem>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock_items WHERE status = 1 AND quantity < $1 ORDER BY id"
        ))
        .bind(i64::from(LOW_STOCK_THRESHOLD))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(stock_from_row).collect()
    }
}
