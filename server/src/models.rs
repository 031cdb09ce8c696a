use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::auth_tokens)]
pub struct NewAuthToken<'a> {
    pub token_hash: &'a str,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// The two kinds of free-text labels a recipe can carry.
///
/// Both are stored the same way (`id`, owner, text) in their own table, and
/// both are resolved with the same find-or-create rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Tag,
    Ingredient,
}

impl LabelKind {
    /// Name of the text field on the wire: tags have a `title`, ingredients a `name`.
    pub fn text_field(self) -> &'static str {
        match self {
            LabelKind::Tag => "title",
            LabelKind::Ingredient => "name",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LabelKind::Tag => "Tag",
            LabelKind::Ingredient => "Ingredient",
        }
    }
}

/// A tag or ingredient row. Selected positionally from either label table.
#[derive(Queryable, Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: i64,
    pub user_id: i64,
    pub label: String,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecipeRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub image_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scalar recipe fields, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeFields {
    pub title: String,
    pub description: Option<String>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipe<'a> {
    pub user_id: i64,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<&'a str>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(treat_none_as_null = true)]
pub struct RecipeChanges<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<&'a str>,
    pub image_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a RecipeRow> for RecipeChanges<'a> {
    fn from(row: &'a RecipeRow) -> Self {
        Self {
            title: &row.title,
            description: row.description.as_deref(),
            time_minutes: row.time_minutes,
            price: row.price,
            link: row.link.as_deref(),
            image_id: row.image_id,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::recipe_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecipeImage {
    pub id: Uuid,
    pub user_id: i64,
    pub content_type: String,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipe_images)]
pub struct NewRecipeImage<'a> {
    pub id: Uuid,
    pub user_id: i64,
    pub content_type: &'a str,
    pub data: &'a [u8],
}
