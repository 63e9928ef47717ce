use std::{collections::HashMap, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::DatabaseConfig,
    users::repo_types::{NewUser, UserRecord},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),
    #[error("malformed user id: {0}")]
    MalformedId(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a user whose password is already hashed. Assigns the id.
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError>;
    /// `Ok(None)` when no record has this id.
    async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn close(&self) {}
}

fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::from_str(id).map_err(|_| StoreError::MalformedId(id.to_string()))
}

fn into_record(user: NewUser) -> Result<UserRecord, StoreError> {
    if let Some(field) = user.missing_field() {
        return Err(StoreError::MissingField(field));
    }
    Ok(UserRecord {
        id: Uuid::new_v4(),
        name: user.name,
        email: user.email.unwrap_or_default(),
        password: user.password.unwrap_or_default(),
    })
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    /// Open the pool and apply the embedded migrations.
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await
            .context("connect to database")?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;
        info!("connected to database");
        Ok(Self { db })
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = into_record(user)?;
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, name, email, password)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.password)
        .fetch_one(&self.db)
        .await?;
        debug!(user_id = %user.id, "user row inserted");
        Ok(user)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let id = parse_id(id)?;
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, password
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn close(&self) {
        self.db.close().await;
        info!("database pool closed");
    }
}

/// Process-local store for tests and database-less development runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, UserRecord>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryUserStore {
    pub(crate) async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub(crate) async fn ids(&self) -> Vec<Uuid> {
        self.users.read().await.keys().copied().collect()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = into_record(user)?;
        self.users.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let id = parse_id(id)?;
        Ok(self.users.read().await.get(&id).cloned())
    }
}
