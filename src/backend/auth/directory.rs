/**
 * User Directory
 *
 * Registration lookups against the identity provider's user list. The
 * invite flow only needs to know whether an email belongs to a registered
 * principal; the directory also lets deployments and tests mirror accounts
 * into the local `users` table.
 */

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::shared::error::CollabError;
use crate::shared::invite::normalize_email;
use crate::shared::principal::Principal;

/// Registered user as mirrored locally
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID)
    pub id: Uuid,
    /// Normalized email address
    pub email: String,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
}

/// Lookup of registered principals by email
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Whether the normalized email belongs to a registered principal
    async fn is_registered(&self, email: &str) -> Result<bool, CollabError>;

    /// Record a principal as registered
    async fn register(&self, principal: &Principal) -> Result<(), CollabError>;
}

/// Process-local directory
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    users: Arc<RwLock<HashMap<String, Uuid>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn is_registered(&self, email: &str) -> Result<bool, CollabError> {
        let users = self.users.read().await;
        Ok(users.contains_key(&normalize_email(email)))
    }

    async fn register(&self, principal: &Principal) -> Result<(), CollabError> {
        let mut users = self.users.write().await;
        users.insert(principal.normalized_email(), principal.user_id);
        Ok(())
    }
}

/// PostgreSQL-backed directory over the `users` table
#[derive(Debug, Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, CollabError> {
        sqlx::query_as::<_, User>("SELECT id, email, created_at FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("[Auth] User lookup failed: {}", e);
                CollabError::transient("User lookup failed")
            })
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn is_registered(&self, email: &str) -> Result<bool, CollabError> {
        Ok(self.get_user_by_email(email).await?.is_some())
    }

    async fn register(&self, principal: &Principal) -> Result<(), CollabError> {
        sqlx::query(
            "INSERT INTO users (id, email, created_at) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(principal.user_id)
        .bind(principal.normalized_email())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("[Auth] User registration failed: {}", e);
            CollabError::transient("User registration failed")
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_directory_normalizes() {
        let directory = MemoryDirectory::new();
        let principal = Principal::new(Uuid::new_v4(), "Registered@Example.com");
        assert!(!directory.is_registered("registered@example.com").await.unwrap());

        directory.register(&principal).await.unwrap();
        assert!(directory.is_registered(" REGISTERED@example.com ").await.unwrap());
        assert!(!directory.is_registered("user@example.com").await.unwrap());
    }
}
