/**
 * PostgreSQL Note Store
 *
 * `sqlx` implementation of [`NoteStore`] against the schema in
 * `migrations/`. Idempotent inserts use `ON CONFLICT DO NOTHING` and read
 * the affected row count to tell `Inserted` from `AlreadyExists`.
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{InsertOutcome, NoteStore, StoreResult};
use crate::shared::error::CollabError;
use crate::shared::note::{Collaborator, Invite, Note, Role};

const NOTE_COLUMNS: &str =
    "n.id, n.content, n.owner_id, n.is_collaborative, n.password_hash, n.expires_at, n.created_at, n.updated_at";

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn store_error(context: &str, err: sqlx::Error) -> CollabError {
    tracing::error!("[Store] {} failed: {}", context, err);
    CollabError::transient(format!("{} failed", context))
}

fn note_from_row(row: &PgRow) -> Note {
    Note {
        id: row.get("id"),
        content: row.get("content"),
        owner_id: row.get("owner_id"),
        is_collaborative: row.get("is_collaborative"),
        password_hash: row.get("password_hash"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn collaborator_from_row(row: &PgRow) -> StoreResult<Collaborator> {
    let role: String = row.get("role");
    let role = Role::parse(&role)
        .ok_or_else(|| CollabError::transient(format!("Unknown collaborator role '{}'", role)))?;
    Ok(Collaborator {
        note_id: row.get("note_id"),
        user_id: row.get("user_id"),
        role,
    })
}

fn invite_from_row(row: &PgRow) -> Invite {
    Invite {
        id: row.get("id"),
        note_id: row.get("note_id"),
        email: row.get("email"),
        invited_by: row.get("invited_by"),
        created_at: row.get("created_at"),
    }
}

fn outcome(rows_affected: u64) -> InsertOutcome {
    if rows_affected > 0 {
        InsertOutcome::Inserted
    } else {
        InsertOutcome::AlreadyExists
    }
}

#[async_trait]
impl NoteStore for PgStore {
    async fn create_note(&self, note: &Note, owner: Option<&Collaborator>) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("create_note", e))?;

        sqlx::query(
            r#"
            INSERT INTO notes (id, content, owner_id, is_collaborative, password_hash, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(note.id)
        .bind(&note.content)
        .bind(note.owner_id)
        .bind(note.is_collaborative)
        .bind(&note.password_hash)
        .bind(note.expires_at)
        .bind(note.created_at)
        .bind(note.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("create_note", e))?;

        if let Some(owner) = owner {
            sqlx::query("INSERT INTO note_collaborators (note_id, user_id, role) VALUES ($1, $2, $3)")
                .bind(owner.note_id)
                .bind(owner.user_id)
                .bind(owner.role.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| store_error("create_note", e))?;
        }

        tx.commit().await.map_err(|e| store_error("create_note", e))?;
        Ok(())
    }

    async fn get_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        let row = sqlx::query(&format!("SELECT {} FROM notes n WHERE n.id = $1", NOTE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("get_note", e))?;
        Ok(row.as_ref().map(note_from_row))
    }

    async fn update_note_content(
        &self,
        id: Uuid,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE notes SET content = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(content)
            .bind(updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("update_note_content", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("delete_note", e))?;

        sqlx::query("DELETE FROM note_collaborators WHERE note_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| store_error("delete_note", e))?;
        sqlx::query("DELETE FROM note_invites WHERE note_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| store_error("delete_note", e))?;
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| store_error("delete_note", e))?;

        tx.commit().await.map_err(|e| store_error("delete_note", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_collaborator(&self, collaborator: &Collaborator) -> StoreResult<InsertOutcome> {
        let result = sqlx::query(
            "INSERT INTO note_collaborators (note_id, user_id, role) VALUES ($1, $2, $3)
             ON CONFLICT (note_id, user_id) DO NOTHING",
        )
        .bind(collaborator.note_id)
        .bind(collaborator.user_id)
        .bind(collaborator.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("insert_collaborator", e))?;
        Ok(outcome(result.rows_affected()))
    }

    async fn find_collaborator(&self, note_id: Uuid, user_id: Uuid) -> StoreResult<Option<Collaborator>> {
        let row = sqlx::query(
            "SELECT note_id, user_id, role FROM note_collaborators WHERE note_id = $1 AND user_id = $2",
        )
        .bind(note_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("find_collaborator", e))?;
        row.as_ref().map(collaborator_from_row).transpose()
    }

    async fn list_collaborators(&self, note_id: Uuid) -> StoreResult<Vec<Collaborator>> {
        let rows = sqlx::query(
            "SELECT note_id, user_id, role FROM note_collaborators WHERE note_id = $1
             ORDER BY (role <> 'owner'), user_id",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("list_collaborators", e))?;
        rows.iter().map(collaborator_from_row).collect()
    }

    async fn insert_invite(&self, invite: &Invite) -> StoreResult<InsertOutcome> {
        let result = sqlx::query(
            "INSERT INTO note_invites (id, note_id, email, invited_by, created_at) VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (note_id, email) DO NOTHING",
        )
        .bind(invite.id)
        .bind(invite.note_id)
        .bind(&invite.email)
        .bind(invite.invited_by)
        .bind(invite.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("insert_invite", e))?;
        Ok(outcome(result.rows_affected()))
    }

    async fn find_invite(&self, note_id: Uuid, email: &str) -> StoreResult<Option<Invite>> {
        let row = sqlx::query(
            "SELECT id, note_id, email, invited_by, created_at FROM note_invites WHERE note_id = $1 AND email = $2",
        )
        .bind(note_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("find_invite", e))?;
        Ok(row.as_ref().map(invite_from_row))
    }

    async fn delete_invite(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM note_invites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("delete_invite", e))?;
        Ok(())
    }

    async fn list_invites(&self, note_id: Uuid) -> StoreResult<Vec<Invite>> {
        let rows = sqlx::query(
            "SELECT id, note_id, email, invited_by, created_at FROM note_invites WHERE note_id = $1
             ORDER BY created_at DESC",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("list_invites", e))?;
        Ok(rows.iter().map(invite_from_row).collect())
    }

    async fn list_owned_notes(&self, user_id: Uuid) -> StoreResult<Vec<Note>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM notes n WHERE n.owner_id = $1 AND n.is_collaborative ORDER BY n.updated_at DESC",
            NOTE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("list_owned_notes", e))?;
        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn list_shared_notes(&self, user_id: Uuid) -> StoreResult<Vec<Note>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM notes n JOIN note_collaborators c ON c.note_id = n.id
             WHERE c.user_id = $1 ORDER BY n.updated_at DESC",
            NOTE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("list_shared_notes", e))?;
        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn list_invited_notes(&self, email: &str) -> StoreResult<Vec<Note>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM notes n JOIN note_invites i ON i.note_id = n.id
             WHERE i.email = $1 AND n.is_collaborative ORDER BY n.updated_at DESC",
            NOTE_COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("list_invited_notes", e))?;
        Ok(rows.iter().map(note_from_row).collect())
    }
}
