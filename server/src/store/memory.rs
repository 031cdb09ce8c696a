use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Repository, StoreError};
use crate::config::LabelMatch;
use crate::models::{Label, LabelKind, RecipeFields, RecipeImage, RecipeRow, User};

#[derive(Debug, Clone)]
struct StoredToken {
    token_hash: String,
    user_id: i64,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    users: i64,
    tags: i64,
    ingredients: i64,
    recipes: i64,
}

fn next(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

/// Whole dataset held in process memory.
///
/// Rows are kept in insertion order, which is also ascending id order.
/// Image rows are shared between clones, so a per-transaction copy never
/// duplicates blobs.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    users: Vec<User>,
    tokens: Vec<StoredToken>,
    tags: Vec<Label>,
    ingredients: Vec<Label>,
    recipes: Vec<RecipeRow>,
    recipe_tags: BTreeSet<(i64, i64)>,
    recipe_ingredients: BTreeSet<(i64, i64)>,
    images: Vec<Arc<RecipeImage>>,
    sequences: Sequences,
}

fn label_matches(existing: &str, text: &str, mode: LabelMatch) -> bool {
    let existing = existing.to_lowercase();
    let text = text.to_lowercase();
    match mode {
        LabelMatch::Exact => existing == text,
        LabelMatch::Contains => existing.contains(&text),
    }
}

impl MemoryRepository {
    fn labels(&self, kind: LabelKind) -> &Vec<Label> {
        match kind {
            LabelKind::Tag => &self.tags,
            LabelKind::Ingredient => &self.ingredients,
        }
    }

    fn labels_mut(&mut self, kind: LabelKind) -> &mut Vec<Label> {
        match kind {
            LabelKind::Tag => &mut self.tags,
            LabelKind::Ingredient => &mut self.ingredients,
        }
    }

    fn links(&self, kind: LabelKind) -> &BTreeSet<(i64, i64)> {
        match kind {
            LabelKind::Tag => &self.recipe_tags,
            LabelKind::Ingredient => &self.recipe_ingredients,
        }
    }

    fn links_mut(&mut self, kind: LabelKind) -> &mut BTreeSet<(i64, i64)> {
        match kind {
            LabelKind::Tag => &mut self.recipe_tags,
            LabelKind::Ingredient => &mut self.recipe_ingredients,
        }
    }

    fn next_label_id(&mut self, kind: LabelKind) -> i64 {
        match kind {
            LabelKind::Tag => next(&mut self.sequences.tags),
            LabelKind::Ingredient => next(&mut self.sequences.ingredients),
        }
    }
}

impl Repository for MemoryRepository {
    fn insert_user(&mut self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        if self.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!("user {}", email)));
        }
        let user = User {
            id: next(&mut self.sequences.users),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_active: true,
            is_staff: false,
            date_joined: Utc::now(),
            last_login: None,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.iter().find(|u| u.email == email).cloned())
    }

    fn record_login(&mut self, user_id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(user) = self.users.iter_mut().find(|u| u.id == user_id) {
            user.last_login = Some(at);
        }
        Ok(())
    }

    fn insert_token(
        &mut self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.tokens.iter().any(|t| t.token_hash == token_hash) {
            return Err(StoreError::Conflict("token".to_string()));
        }
        self.tokens.push(StoredToken {
            token_hash: token_hash.to_string(),
            user_id,
            expires_at,
        });
        Ok(())
    }

    fn find_user_by_token(
        &mut self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        let Some(token) = self
            .tokens
            .iter()
            .find(|t| t.token_hash == token_hash && t.expires_at > now)
        else {
            return Ok(None);
        };
        Ok(self
            .users
            .iter()
            .find(|u| u.id == token.user_id && u.is_active)
            .cloned())
    }

    fn delete_token(&mut self, token_hash: &str) -> Result<bool, StoreError> {
        let before = self.tokens.len();
        self.tokens.retain(|t| t.token_hash != token_hash);
        Ok(self.tokens.len() != before)
    }

    fn delete_expired_tokens(&mut self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let before = self.tokens.len();
        self.tokens.retain(|t| t.expires_at > now);
        Ok(before - self.tokens.len())
    }

    fn find_label(
        &mut self,
        kind: LabelKind,
        owner: i64,
        id: i64,
    ) -> Result<Option<Label>, StoreError> {
        Ok(self
            .labels(kind)
            .iter()
            .find(|l| l.id == id && l.user_id == owner)
            .cloned())
    }

    fn find_label_by_text(
        &mut self,
        kind: LabelKind,
        owner: i64,
        text: &str,
        mode: LabelMatch,
    ) -> Result<Option<Label>, StoreError> {
        Ok(self
            .labels(kind)
            .iter()
            .find(|l| l.user_id == owner && label_matches(&l.label, text, mode))
            .cloned())
    }

    fn insert_label(
        &mut self,
        kind: LabelKind,
        owner: i64,
        text: &str,
    ) -> Result<Label, StoreError> {
        let label = Label {
            id: self.next_label_id(kind),
            user_id: owner,
            label: text.to_string(),
        };
        self.labels_mut(kind).push(label.clone());
        Ok(label)
    }

    fn list_labels(&mut self, kind: LabelKind, owner: i64) -> Result<Vec<Label>, StoreError> {
        let mut labels: Vec<Label> = self
            .labels(kind)
            .iter()
            .filter(|l| l.user_id == owner)
            .cloned()
            .collect();
        labels.sort_by(|a, b| b.label.cmp(&a.label).then(b.id.cmp(&a.id)));
        Ok(labels)
    }

    fn rename_label(
        &mut self,
        kind: LabelKind,
        owner: i64,
        id: i64,
        text: &str,
    ) -> Result<Option<Label>, StoreError> {
        let Some(label) = self
            .labels_mut(kind)
            .iter_mut()
            .find(|l| l.id == id && l.user_id == owner)
        else {
            return Ok(None);
        };
        label.label = text.to_string();
        Ok(Some(label.clone()))
    }

    fn delete_label(&mut self, kind: LabelKind, owner: i64, id: i64) -> Result<bool, StoreError> {
        let labels = self.labels_mut(kind);
        let before = labels.len();
        labels.retain(|l| !(l.id == id && l.user_id == owner));
        let deleted = labels.len() != before;
        if deleted {
            self.links_mut(kind).retain(|&(_, label_id)| label_id != id);
        }
        Ok(deleted)
    }

    fn insert_recipe(
        &mut self,
        owner: i64,
        fields: &RecipeFields,
    ) -> Result<RecipeRow, StoreError> {
        let now = Utc::now();
        let row = RecipeRow {
            id: next(&mut self.sequences.recipes),
            user_id: owner,
            title: fields.title.clone(),
            description: fields.description.clone(),
            time_minutes: fields.time_minutes,
            price: fields.price,
            link: fields.link.clone(),
            image_id: None,
            created_at: now,
            updated_at: now,
        };
        self.recipes.push(row.clone());
        Ok(row)
    }

    fn find_recipe(&mut self, owner: i64, id: i64) -> Result<Option<RecipeRow>, StoreError> {
        Ok(self
            .recipes
            .iter()
            .find(|r| r.id == id && r.user_id == owner)
            .cloned())
    }

    fn list_recipes(&mut self, owner: i64) -> Result<Vec<RecipeRow>, StoreError> {
        Ok(self
            .recipes
            .iter()
            .rev()
            .filter(|r| r.user_id == owner)
            .cloned()
            .collect())
    }

    fn save_recipe(&mut self, row: &RecipeRow) -> Result<RecipeRow, StoreError> {
        let stored = self
            .recipes
            .iter_mut()
            .find(|r| r.id == row.id && r.user_id == row.user_id)
            .ok_or(StoreError::Database(diesel::result::Error::NotFound))?;
        *stored = RecipeRow {
            created_at: stored.created_at,
            ..row.clone()
        };
        Ok(stored.clone())
    }

    fn delete_recipe(&mut self, owner: i64, id: i64) -> Result<bool, StoreError> {
        let before = self.recipes.len();
        self.recipes.retain(|r| !(r.id == id && r.user_id == owner));
        let deleted = self.recipes.len() != before;
        if deleted {
            self.recipe_tags.retain(|&(recipe_id, _)| recipe_id != id);
            self.recipe_ingredients.retain(|&(recipe_id, _)| recipe_id != id);
        }
        Ok(deleted)
    }

    fn recipe_labels(
        &mut self,
        kind: LabelKind,
        recipe_ids: &[i64],
    ) -> Result<Vec<(i64, Label)>, StoreError> {
        let links = self.links(kind);
        let mut pairs: Vec<(i64, Label)> = self
            .labels(kind)
            .iter()
            .flat_map(|label| {
                recipe_ids
                    .iter()
                    .filter(move |&&recipe_id| links.contains(&(recipe_id, label.id)))
                    .map(move |&recipe_id| (recipe_id, label.clone()))
            })
            .collect();
        pairs.sort_by_key(|(recipe_id, label)| (label.id, *recipe_id));
        Ok(pairs)
    }

    fn clear_recipe_labels(&mut self, kind: LabelKind, recipe_id: i64) -> Result<(), StoreError> {
        self.links_mut(kind).retain(|&(id, _)| id != recipe_id);
        Ok(())
    }

    fn attach_label(
        &mut self,
        kind: LabelKind,
        recipe_id: i64,
        label_id: i64,
    ) -> Result<(), StoreError> {
        self.links_mut(kind).insert((recipe_id, label_id));
        Ok(())
    }

    fn insert_image(
        &mut self,
        owner: i64,
        content_type: &str,
        data: &[u8],
    ) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.images.push(Arc::new(RecipeImage {
            id,
            user_id: owner,
            content_type: content_type.to_string(),
            data: data.to_vec(),
            created_at: Utc::now(),
        }));
        Ok(id)
    }

    fn find_image(&mut self, owner: i64, id: Uuid) -> Result<Option<RecipeImage>, StoreError> {
        Ok(self
            .images
            .iter()
            .find(|i| i.id == id && i.user_id == owner)
            .map(|image| RecipeImage::clone(image)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn fields(title: &str) -> RecipeFields {
        RecipeFields {
            title: title.to_string(),
            description: None,
            time_minutes: 10,
            price: Decimal::new(500, 2),
            link: None,
        }
    }

    #[test]
    fn test_label_lookup_is_case_insensitive_and_owner_scoped() {
        let mut repo = MemoryRepository::default();
        let tag = repo.insert_label(LabelKind::Tag, 1, "Dinner").unwrap();

        let found = repo
            .find_label_by_text(LabelKind::Tag, 1, "dINNER", LabelMatch::Exact)
            .unwrap();
        assert_eq!(found, Some(tag));

        let other_owner = repo
            .find_label_by_text(LabelKind::Tag, 2, "Dinner", LabelMatch::Exact)
            .unwrap();
        assert!(other_owner.is_none());

        let ingredient = repo
            .find_label_by_text(LabelKind::Ingredient, 1, "Dinner", LabelMatch::Exact)
            .unwrap();
        assert!(ingredient.is_none());
    }

    #[test]
    fn test_label_lookup_modes() {
        let mut repo = MemoryRepository::default();
        repo.insert_label(LabelKind::Tag, 1, "Green Tea").unwrap();

        assert!(repo
            .find_label_by_text(LabelKind::Tag, 1, "tea", LabelMatch::Exact)
            .unwrap()
            .is_none());
        assert!(repo
            .find_label_by_text(LabelKind::Tag, 1, "tea", LabelMatch::Contains)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_list_labels_sorted_descending() {
        let mut repo = MemoryRepository::default();
        repo.insert_label(LabelKind::Tag, 1, "Vegan").unwrap();
        repo.insert_label(LabelKind::Tag, 1, "Dessert").unwrap();
        repo.insert_label(LabelKind::Tag, 1, "Spicy").unwrap();
        repo.insert_label(LabelKind::Tag, 2, "Zesty").unwrap();

        let titles: Vec<String> = repo
            .list_labels(LabelKind::Tag, 1)
            .unwrap()
            .into_iter()
            .map(|l| l.label)
            .collect();
        assert_eq!(titles, vec!["Vegan", "Spicy", "Dessert"]);
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut repo = MemoryRepository::default();
        let recipe = repo.insert_recipe(1, &fields("Soup")).unwrap();
        let tag = repo.insert_label(LabelKind::Tag, 1, "Warm").unwrap();

        repo.attach_label(LabelKind::Tag, recipe.id, tag.id).unwrap();
        repo.attach_label(LabelKind::Tag, recipe.id, tag.id).unwrap();

        let labels = repo.recipe_labels(LabelKind::Tag, &[recipe.id]).unwrap();
        assert_eq!(labels, vec![(recipe.id, tag)]);
    }

    #[test]
    fn test_delete_recipe_keeps_labels() {
        let mut repo = MemoryRepository::default();
        let recipe = repo.insert_recipe(1, &fields("Soup")).unwrap();
        let tag = repo.insert_label(LabelKind::Tag, 1, "Warm").unwrap();
        repo.attach_label(LabelKind::Tag, recipe.id, tag.id).unwrap();

        assert!(!repo.delete_recipe(2, recipe.id).unwrap());
        assert!(repo.delete_recipe(1, recipe.id).unwrap());

        assert!(repo.find_recipe(1, recipe.id).unwrap().is_none());
        assert_eq!(repo.find_label(LabelKind::Tag, 1, tag.id).unwrap(), Some(tag));
        assert!(repo.recipe_tags.is_empty());
    }

    #[test]
    fn test_delete_label_detaches_it() {
        let mut repo = MemoryRepository::default();
        let recipe = repo.insert_recipe(1, &fields("Soup")).unwrap();
        let tag = repo.insert_label(LabelKind::Tag, 1, "Warm").unwrap();
        repo.attach_label(LabelKind::Tag, recipe.id, tag.id).unwrap();

        assert!(repo.delete_label(LabelKind::Tag, 1, tag.id).unwrap());
        assert!(repo
            .recipe_labels(LabelKind::Tag, &[recipe.id])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_expired_token_does_not_resolve() {
        let mut repo = MemoryRepository::default();
        let user = repo.insert_user("a@example.com", "hash").unwrap();
        let now = Utc::now();
        repo.insert_token(user.id, "fresh", now + chrono::Duration::days(1))
            .unwrap();
        repo.insert_token(user.id, "stale", now - chrono::Duration::days(1))
            .unwrap();

        assert_eq!(repo.find_user_by_token("fresh", now).unwrap(), Some(user));
        assert!(repo.find_user_by_token("stale", now).unwrap().is_none());
        assert!(repo.find_user_by_token("unknown", now).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let mut repo = MemoryRepository::default();
        repo.insert_user("a@example.com", "hash").unwrap();
        assert!(matches!(
            repo.insert_user("a@example.com", "hash"),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_delete_expired_tokens() {
        let mut repo = MemoryRepository::default();
        let user = repo.insert_user("a@example.com", "hash").unwrap();
        let now = Utc::now();
        for i in 0..3 {
            repo.insert_token(user.id, &format!("stale-{}", i), now - chrono::Duration::days(1))
                .unwrap();
        }
        repo.insert_token(user.id, "fresh", now + chrono::Duration::days(1))
            .unwrap();

        assert_eq!(repo.delete_expired_tokens(now).unwrap(), 3);
        assert_eq!(repo.tokens.len(), 1);
        assert_eq!(repo.find_user_by_token("fresh", now).unwrap(), Some(user));
        assert_eq!(repo.delete_expired_tokens(now).unwrap(), 0);
    }

    #[test]
    fn test_clone_shares_image_blobs() {
        let mut repo = MemoryRepository::default();
        let id = repo.insert_image(1, "image/png", b"pixels").unwrap();

        let draft = repo.clone();
        assert!(Arc::ptr_eq(&repo.images[0], &draft.images[0]));

        let image = repo.find_image(1, id).unwrap().unwrap();
        assert_eq!(image.data, b"pixels");
        assert!(repo.find_image(2, id).unwrap().is_none());
    }
}
