//! Mugshot storage.
//!
//! The store is a trait so the access engine and handlers can run against
//! Postgres in production and the in-memory implementation in tests.
//! Absence is modelled as `Ok(None)` / `Ok(false)`; only transport
//! failures become errors, so callers can tell "no profile" apart from
//! "lookup failed".

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::models::{Badge, CreateMugshot, Mugshot, UpdateMugshot};

#[async_trait]
pub trait MugshotStore: Send + Sync {
    /// Find a mugshot by owning user id.
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Mugshot>>;

    /// Profile existence check for the access decision.
    async fn exists_for_user(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.find_by_user_id(user_id).await?.is_some())
    }

    /// Insert a mugshot for a user. At most one per user; the unique
    /// constraint on user_id backstops concurrent creates.
    async fn insert(&self, user_id: Uuid, payload: &CreateMugshot) -> Result<Mugshot>;

    /// Owner-initiated update. Returns None when the user has no mugshot.
    async fn update_by_owner(
        &self,
        user_id: Uuid,
        payload: &UpdateMugshot,
    ) -> Result<Option<Mugshot>>;

    /// Administrative deletion. Returns true if a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// All visible mugshots, newest first.
    async fn list_visible(&self) -> Result<Vec<Mugshot>>;
}

/// Postgres-backed mugshot store.
pub struct PostgresMugshotStore {
    pool: sqlx::PgPool,
}

impl PostgresMugshotStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MugshotStore for PostgresMugshotStore {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Mugshot>> {
        sqlx::query_as::<_, Mugshot>("SELECT * FROM mugshots WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn exists_for_user(&self, user_id: Uuid) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM mugshots WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn insert(&self, user_id: Uuid, payload: &CreateMugshot) -> Result<Mugshot> {
        sqlx::query_as::<_, Mugshot>(
            "INSERT INTO mugshots (
                user_id,
                name,
                crime,
                note,
                image_url,
                product_url,
                social_handle
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(user_id)
        .bind(&payload.name)
        .bind(&payload.crime)
        .bind(&payload.note)
        .bind(&payload.image_url)
        .bind(&payload.product_url)
        .bind(&payload.social_handle)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn update_by_owner(
        &self,
        user_id: Uuid,
        payload: &UpdateMugshot,
    ) -> Result<Option<Mugshot>> {
        sqlx::query_as::<_, Mugshot>(
            "UPDATE mugshots SET
                name = COALESCE($2, name),
                crime = COALESCE($3, crime),
                note = COALESCE($4, note),
                image_url = COALESCE($5, image_url),
                product_url = COALESCE($6, product_url),
                social_handle = COALESCE($7, social_handle)
             WHERE user_id = $1
             RETURNING *",
        )
        .bind(user_id)
        .bind(&payload.name)
        .bind(&payload.crime)
        .bind(&payload.note)
        .bind(&payload.image_url)
        .bind(&payload.product_url)
        .bind(&payload.social_handle)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM mugshots WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_visible(&self) -> Result<Vec<Mugshot>> {
        sqlx::query_as::<_, Mugshot>("SELECT * FROM mugshots ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into)
    }
}

/// In-memory mugshot store for tests and local development.
pub struct MemoryMugshotStore {
    rows: RwLock<HashMap<Uuid, Mugshot>>,
}

impl MemoryMugshotStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryMugshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MugshotStore for MemoryMugshotStore {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Mugshot>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .find(|m| m.user_id == user_id)
            .cloned())
    }

    async fn insert(&self, user_id: Uuid, payload: &CreateMugshot) -> Result<Mugshot> {
        let mut rows = self.rows.write().unwrap();
        if rows.values().any(|m| m.user_id == user_id) {
            anyhow::bail!("mugshot already exists for user {user_id}");
        }
        let mugshot = Mugshot {
            id: Uuid::new_v4(),
            user_id,
            name: payload.name.clone(),
            crime: payload.crime.clone(),
            note: payload.note.clone(),
            image_url: payload.image_url.clone(),
            product_url: payload.product_url.clone(),
            social_handle: payload.social_handle.clone(),
            badge: Badge::Default.as_str().to_string(),
            created_at: chrono::Utc::now(),
        };
        rows.insert(mugshot.id, mugshot.clone());
        Ok(mugshot)
    }

    async fn update_by_owner(
        &self,
        user_id: Uuid,
        payload: &UpdateMugshot,
    ) -> Result<Option<Mugshot>> {
        let mut rows = self.rows.write().unwrap();
        let Some(mugshot) = rows.values_mut().find(|m| m.user_id == user_id) else {
            return Ok(None);
        };
        if let Some(name) = &payload.name {
            mugshot.name = name.clone();
        }
        if let Some(crime) = &payload.crime {
            mugshot.crime = crime.clone();
        }
        if let Some(note) = &payload.note {
            mugshot.note = Some(note.clone());
        }
        if let Some(image_url) = &payload.image_url {
            mugshot.image_url = Some(image_url.clone());
        }
        if let Some(product_url) = &payload.product_url {
            mugshot.product_url = Some(product_url.clone());
        }
        if let Some(social_handle) = &payload.social_handle {
            mugshot.social_handle = Some(social_handle.clone());
        }
        Ok(Some(mugshot.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.rows.write().unwrap().remove(&id).is_some())
    }

    async fn list_visible(&self) -> Result<Vec<Mugshot>> {
        let mut all: Vec<Mugshot> = self.rows.read().unwrap().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}
