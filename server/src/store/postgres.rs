use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Text;
use uuid::Uuid;

use super::{Repository, StoreError};
use crate::config::LabelMatch;
use crate::models::{
    Label, LabelKind, NewAuthToken, NewRecipe, NewRecipeImage, NewUser, RecipeChanges,
    RecipeFields, RecipeImage, RecipeRow, User,
};
use crate::schema::{auth_tokens, recipe_images, recipes, users};

diesel::define_sql_function!(fn lower(x: Text) -> Text);

/// Tags and ingredients live in identically shaped tables (`id`, `user_id`,
/// `label`) with identically shaped link tables (`recipe_id`, `label_id`).
/// Binds `$labels` and `$links` to the schema modules for `$kind`.
macro_rules! label_tables {
    ($kind:expr, $labels:ident, $links:ident => $body:expr) => {
        match $kind {
            LabelKind::Tag => {
                #[allow(unused_imports)]
                use crate::schema::recipe_tags as $links;
                #[allow(unused_imports)]
                use crate::schema::tags as $labels;
                $body
            }
            LabelKind::Ingredient => {
                #[allow(unused_imports)]
                use crate::schema::ingredients as $labels;
                #[allow(unused_imports)]
                use crate::schema::recipe_ingredients as $links;
                $body
            }
        }
    };
}

/// `ILIKE` pattern matching `text` anywhere, with wildcards in `text` escaped.
fn contains_pattern(text: &str) -> String {
    format!(
        "%{}%",
        text.replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    )
}

impl Repository for PgConnection {
    fn insert_user(&mut self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let new_user = NewUser {
            email,
            password_hash,
        };

        match diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(self)
        {
            Ok(user) => Ok(user),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(StoreError::Conflict(format!("user {}", email)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(self)
            .optional()?)
    }

    fn record_login(&mut self, user_id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        diesel::update(users::table.find(user_id))
            .set(users::last_login.eq(Some(at)))
            .execute(self)?;
        Ok(())
    }

    fn insert_token(
        &mut self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        diesel::insert_into(auth_tokens::table)
            .values(&NewAuthToken {
                token_hash,
                user_id,
                expires_at,
            })
            .execute(self)?;
        Ok(())
    }

    fn find_user_by_token(
        &mut self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        Ok(auth_tokens::table
            .inner_join(users::table)
            .filter(auth_tokens::token_hash.eq(token_hash))
            .filter(auth_tokens::expires_at.gt(now))
            .filter(users::is_active.eq(true))
            .select(User::as_select())
            .first(self)
            .optional()?)
    }

    fn delete_token(&mut self, token_hash: &str) -> Result<bool, StoreError> {
        let deleted = diesel::delete(auth_tokens::table.find(token_hash)).execute(self)?;
        Ok(deleted > 0)
    }

    fn delete_expired_tokens(&mut self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        Ok(
            diesel::delete(auth_tokens::table.filter(auth_tokens::expires_at.le(now)))
                .execute(self)?,
        )
    }

    fn find_label(
        &mut self,
        kind: LabelKind,
        owner: i64,
        id: i64,
    ) -> Result<Option<Label>, StoreError> {
        label_tables!(kind, labels, links => {
            Ok(labels::table
                .filter(labels::id.eq(id))
                .filter(labels::user_id.eq(owner))
                .select((labels::id, labels::user_id, labels::label))
                .first::<Label>(self)
                .optional()?)
        })
    }

    fn find_label_by_text(
        &mut self,
        kind: LabelKind,
        owner: i64,
        text: &str,
        mode: LabelMatch,
    ) -> Result<Option<Label>, StoreError> {
        label_tables!(kind, labels, links => {
            let query = labels::table
                .filter(labels::user_id.eq(owner))
                .select((labels::id, labels::user_id, labels::label))
                .order(labels::id.asc())
                .into_boxed();

            let query = match mode {
                LabelMatch::Exact => query.filter(lower(labels::label).eq(lower(text))),
                LabelMatch::Contains => query.filter(labels::label.ilike(contains_pattern(text))),
            };

            Ok(query.first::<Label>(self).optional()?)
        })
    }

    fn insert_label(
        &mut self,
        kind: LabelKind,
        owner: i64,
        text: &str,
    ) -> Result<Label, StoreError> {
        label_tables!(kind, labels, links => {
            Ok(diesel::insert_into(labels::table)
                .values((labels::user_id.eq(owner), labels::label.eq(text)))
                .returning((labels::id, labels::user_id, labels::label))
                .get_result::<Label>(self)?)
        })
    }

    fn list_labels(&mut self, kind: LabelKind, owner: i64) -> Result<Vec<Label>, StoreError> {
        label_tables!(kind, labels, links => {
            Ok(labels::table
                .filter(labels::user_id.eq(owner))
                .select((labels::id, labels::user_id, labels::label))
                .order((labels::label.desc(), labels::id.desc()))
                .load::<Label>(self)?)
        })
    }

    fn rename_label(
        &mut self,
        kind: LabelKind,
        owner: i64,
        id: i64,
        text: &str,
    ) -> Result<Option<Label>, StoreError> {
        label_tables!(kind, labels, links => {
            Ok(diesel::update(
                labels::table
                    .filter(labels::id.eq(id))
                    .filter(labels::user_id.eq(owner)),
            )
            .set(labels::label.eq(text))
            .returning((labels::id, labels::user_id, labels::label))
            .get_result::<Label>(self)
            .optional()?)
        })
    }

    fn delete_label(&mut self, kind: LabelKind, owner: i64, id: i64) -> Result<bool, StoreError> {
        // Link rows go with it via ON DELETE CASCADE.
        label_tables!(kind, labels, links => {
            let deleted = diesel::delete(
                labels::table
                    .filter(labels::id.eq(id))
                    .filter(labels::user_id.eq(owner)),
            )
            .execute(self)?;
            Ok(deleted > 0)
        })
    }

    fn insert_recipe(
        &mut self,
        owner: i64,
        fields: &RecipeFields,
    ) -> Result<RecipeRow, StoreError> {
        let new_recipe = NewRecipe {
            user_id: owner,
            title: &fields.title,
            description: fields.description.as_deref(),
            time_minutes: fields.time_minutes,
            price: fields.price,
            link: fields.link.as_deref(),
        };

        Ok(diesel::insert_into(recipes::table)
            .values(&new_recipe)
            .returning(RecipeRow::as_returning())
            .get_result(self)?)
    }

    fn find_recipe(&mut self, owner: i64, id: i64) -> Result<Option<RecipeRow>, StoreError> {
        Ok(recipes::table
            .filter(recipes::id.eq(id))
            .filter(recipes::user_id.eq(owner))
            .select(RecipeRow::as_select())
            .first(self)
            .optional()?)
    }

    fn list_recipes(&mut self, owner: i64) -> Result<Vec<RecipeRow>, StoreError> {
        Ok(recipes::table
            .filter(recipes::user_id.eq(owner))
            .select(RecipeRow::as_select())
            .order(recipes::id.desc())
            .load(self)?)
    }

    fn save_recipe(&mut self, row: &RecipeRow) -> Result<RecipeRow, StoreError> {
        Ok(diesel::update(
            recipes::table
                .filter(recipes::id.eq(row.id))
                .filter(recipes::user_id.eq(row.user_id)),
        )
        .set(RecipeChanges::from(row))
        .returning(RecipeRow::as_returning())
        .get_result(self)?)
    }

    fn delete_recipe(&mut self, owner: i64, id: i64) -> Result<bool, StoreError> {
        let deleted = diesel::delete(
            recipes::table
                .filter(recipes::id.eq(id))
                .filter(recipes::user_id.eq(owner)),
        )
        .execute(self)?;
        Ok(deleted > 0)
    }

    fn recipe_labels(
        &mut self,
        kind: LabelKind,
        recipe_ids: &[i64],
    ) -> Result<Vec<(i64, Label)>, StoreError> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        label_tables!(kind, labels, links => {
            Ok(links::table
                .inner_join(labels::table)
                .filter(links::recipe_id.eq_any(recipe_ids))
                .select((
                    links::recipe_id,
                    (labels::id, labels::user_id, labels::label),
                ))
                .order((labels::id.asc(), links::recipe_id.asc()))
                .load::<(i64, Label)>(self)?)
        })
    }

    fn clear_recipe_labels(&mut self, kind: LabelKind, recipe_id: i64) -> Result<(), StoreError> {
        label_tables!(kind, labels, links => {
            diesel::delete(links::table.filter(links::recipe_id.eq(recipe_id))).execute(self)?;
            Ok(())
        })
    }

    fn attach_label(
        &mut self,
        kind: LabelKind,
        recipe_id: i64,
        label_id: i64,
    ) -> Result<(), StoreError> {
        label_tables!(kind, labels, links => {
            diesel::insert_into(links::table)
                .values((links::recipe_id.eq(recipe_id), links::label_id.eq(label_id)))
                .on_conflict_do_nothing()
                .execute(self)?;
            Ok(())
        })
    }

    fn insert_image(
        &mut self,
        owner: i64,
        content_type: &str,
        data: &[u8],
    ) -> Result<Uuid, StoreError> {
        let new_image = NewRecipeImage {
            id: Uuid::new_v4(),
            user_id: owner,
            content_type,
            data,
        };

        Ok(diesel::insert_into(recipe_images::table)
            .values(&new_image)
            .returning(recipe_images::id)
            .get_result(self)?)
    }

    fn find_image(&mut self, owner: i64, id: Uuid) -> Result<Option<RecipeImage>, StoreError> {
        Ok(recipe_images::table
            .filter(recipe_images::id.eq(id))
            .filter(recipe_images::user_id.eq(owner))
            .select(RecipeImage::as_select())
            .first(self)
            .optional()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("tea"), "%tea%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern(""), "%%");
    }
}
