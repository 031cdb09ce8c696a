//! Data access for the catalog.
//!
//! Everything the service persists goes through [`Repository`], a plain
//! synchronous interface returning owned records. Two backends implement it:
//! PostgreSQL (diesel, see [`postgres`]) and a process-local dataset
//! ([`MemoryRepository`]). [`Store`] hands out a repository for the duration
//! of one transaction.
//!
//! Every recipe, label and image operation takes the owning user's id, so a
//! caller can only ever reach its own rows.

mod memory;
mod postgres;

pub use memory::MemoryRepository;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use thiserror::Error;
use uuid::Uuid;

use crate::config::LabelMatch;
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::{Label, LabelKind, RecipeFields, RecipeImage, RecipeRow, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("in-memory store lock poisoned")]
    Poisoned,
}

pub trait Repository {
    // Users and tokens

    /// Fails with [`StoreError::Conflict`] when the email is already registered.
    fn insert_user(&mut self, email: &str, password_hash: &str) -> Result<User, StoreError>;
    fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;
    fn record_login(&mut self, user_id: i64, at: DateTime<Utc>) -> Result<(), StoreError>;
    fn insert_token(
        &mut self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    /// Active user owning an unexpired token.
    fn find_user_by_token(
        &mut self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError>;
    fn delete_token(&mut self, token_hash: &str) -> Result<bool, StoreError>;
    /// Drops every token that expired at or before `now`. Returns how many went.
    fn delete_expired_tokens(&mut self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    // Tags and ingredients

    fn find_label(
        &mut self,
        kind: LabelKind,
        owner: i64,
        id: i64,
    ) -> Result<Option<Label>, StoreError>;
    /// Case-insensitive lookup of `text` among the owner's labels. When several
    /// rows match, the oldest (lowest id) wins.
    fn find_label_by_text(
        &mut self,
        kind: LabelKind,
        owner: i64,
        text: &str,
        mode: LabelMatch,
    ) -> Result<Option<Label>, StoreError>;
    fn insert_label(&mut self, kind: LabelKind, owner: i64, text: &str)
        -> Result<Label, StoreError>;
    /// Owner's labels, text descending.
    fn list_labels(&mut self, kind: LabelKind, owner: i64) -> Result<Vec<Label>, StoreError>;
    fn rename_label(
        &mut self,
        kind: LabelKind,
        owner: i64,
        id: i64,
        text: &str,
    ) -> Result<Option<Label>, StoreError>;
    /// Also detaches the label from every recipe.
    fn delete_label(&mut self, kind: LabelKind, owner: i64, id: i64) -> Result<bool, StoreError>;

    // Recipes

    fn insert_recipe(&mut self, owner: i64, fields: &RecipeFields)
        -> Result<RecipeRow, StoreError>;
    fn find_recipe(&mut self, owner: i64, id: i64) -> Result<Option<RecipeRow>, StoreError>;
    /// Owner's recipes, newest id first.
    fn list_recipes(&mut self, owner: i64) -> Result<Vec<RecipeRow>, StoreError>;
    /// Overwrite the scalar columns of an existing row (matched on id and owner).
    fn save_recipe(&mut self, row: &RecipeRow) -> Result<RecipeRow, StoreError>;
    /// Removes the recipe and its associations; labels and images stay.
    fn delete_recipe(&mut self, owner: i64, id: i64) -> Result<bool, StoreError>;

    // Recipe <-> label associations

    /// `(recipe_id, label)` pairs for the given recipes, label id ascending.
    fn recipe_labels(
        &mut self,
        kind: LabelKind,
        recipe_ids: &[i64],
    ) -> Result<Vec<(i64, Label)>, StoreError>;
    fn clear_recipe_labels(&mut self, kind: LabelKind, recipe_id: i64) -> Result<(), StoreError>;
    /// No-op when the association already exists.
    fn attach_label(
        &mut self,
        kind: LabelKind,
        recipe_id: i64,
        label_id: i64,
    ) -> Result<(), StoreError>;

    // Images

    fn insert_image(
        &mut self,
        owner: i64,
        content_type: &str,
        data: &[u8],
    ) -> Result<Uuid, StoreError>;
    fn find_image(&mut self, owner: i64, id: Uuid) -> Result<Option<RecipeImage>, StoreError>;
}

/// Handle to the configured backend. Cheap to clone.
#[derive(Clone)]
pub enum Store {
    Postgres(DbPool),
    Memory(Arc<Mutex<MemoryRepository>>),
}

impl Store {
    pub fn postgres(pool: DbPool) -> Self {
        Store::Postgres(pool)
    }

    pub fn memory() -> Self {
        Store::Memory(Arc::new(Mutex::new(MemoryRepository::default())))
    }

    /// Run `f` inside a single transaction on a blocking worker thread.
    ///
    /// Any error rolls back everything `f` wrote.
    pub async fn transaction<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut dyn Repository) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.run_transaction(f))
            .await
            .map_err(|e| AppError::Internal(format!("storage worker failed: {}", e)))?
    }

    fn run_transaction<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut dyn Repository) -> Result<T, AppError>,
    {
        match self {
            Store::Postgres(pool) => {
                let mut pooled = pool.get().map_err(StoreError::from)?;
                let conn: &mut PgConnection = &mut pooled;
                conn.transaction(|conn| f(conn))
            }
            Store::Memory(data) => {
                let mut committed = data.lock().map_err(|_| StoreError::Poisoned)?;
                let mut draft = committed.clone();
                let value = f(&mut draft)?;
                *committed = draft;
                Ok(value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_transaction_rolls_back_on_error() {
        let store = Store::memory();

        let result: Result<(), AppError> = store
            .transaction(|repo| {
                repo.insert_user("a@example.com", "hash")?;
                Err(AppError::BadRequest("abort".to_string()))
            })
            .await;
        assert!(result.is_err());

        let found = store
            .transaction(|repo| Ok(repo.find_user_by_email("a@example.com")?))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_memory_transaction_commits_on_success() {
        let store = Store::memory();

        let user = store
            .transaction(|repo| Ok(repo.insert_user("b@example.com", "hash")?))
            .await
            .unwrap();

        let found = store
            .transaction(|repo| Ok(repo.find_user_by_email("b@example.com")?))
            .await
            .unwrap();
        assert_eq!(found, Some(user));
    }
}
