use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ApiError;

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Wire shape of a user; the password hash never leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPublic {
    pub email: String,
    pub name: String,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
}

/// Row shape shared by tags and ingredients.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attribute {
    pub id: i32,
    pub name: String,
}

/// A named, user-owned entity that can be linked to recipes through a join
/// table. Tags and ingredients only differ in table names, so everything
/// operating on them is generic over this trait.
pub trait OwnedAttribute {
    const TABLE: &'static str;
    const LINK_TABLE: &'static str;
    const LINK_COLUMN: &'static str;
    const FIELD: &'static str;
}

pub struct Tag;

impl OwnedAttribute for Tag {
    const TABLE: &'static str = "tags";
    const LINK_TABLE: &'static str = "recipe_tags";
    const LINK_COLUMN: &'static str = "tag_id";
    const FIELD: &'static str = "tags";
}

pub struct Ingredient;

impl OwnedAttribute for Ingredient {
    const TABLE: &'static str = "ingredients";
    const LINK_TABLE: &'static str = "recipe_ingredients";
    const LINK_COLUMN: &'static str = "ingredient_id";
    const FIELD: &'static str = "ingredients";
}

// Request payloads

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl RegisterUser {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub password: Option<String>,
}

impl ProfilePatch {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributePayload {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<AttributePayload>>,
    #[serde(default)]
    pub ingredients: Option<Vec<AttributePayload>>,
}

impl NewRecipe {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_title(&self.title)?;
        validate_time_minutes(self.time_minutes)?;
        validate_attribute_names("tags", self.tags.as_deref())?;
        validate_attribute_names("ingredients", self.ingredients.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Option<Vec<AttributePayload>>,
    pub ingredients: Option<Vec<AttributePayload>>,
}

impl RecipePatch {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(time_minutes) = self.time_minutes {
            validate_time_minutes(time_minutes)?;
        }
        validate_attribute_names("tags", self.tags.as_deref())?;
        validate_attribute_names("ingredients", self.ingredients.as_deref())?;
        Ok(())
    }
}

impl From<NewRecipe> for RecipePatch {
    /// A full update provides every writable field; omitted optional fields
    /// fall back to their defaults instead of being left untouched.
    fn from(payload: NewRecipe) -> Self {
        Self {
            title: Some(payload.title),
            time_minutes: Some(payload.time_minutes),
            price: Some(payload.price),
            description: Some(payload.description.unwrap_or_default()),
            link: Some(payload.link.unwrap_or_default()),
            tags: payload.tags,
            ingredients: payload.ingredients,
        }
    }
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(ApiError::validation("email", "Enter a valid email address."));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < 5 {
        return Err(ApiError::validation(
            "password",
            "Ensure this field has at least 5 characters.",
        ));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::validation("title", "This field may not be blank."));
    }
    Ok(())
}

fn validate_attribute_names(
    field: &str,
    items: Option<&[AttributePayload]>,
) -> Result<(), ApiError> {
    if let Some(items) = items {
        if items.iter().any(|item| item.name.trim().is_empty()) {
            return Err(ApiError::validation(field, "This field may not be blank."));
        }
    }
    Ok(())
}

fn validate_time_minutes(time_minutes: i32) -> Result<(), ApiError> {
    if time_minutes < 0 {
        return Err(ApiError::validation(
            "time_minutes",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    Ok(())
}

// Response shapes

/// Listing serializer; `description` and `image` only appear on the detail.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
}

impl RecipeSummary {
    pub fn new(recipe: Recipe, tags: Vec<Attribute>, ingredients: Vec<Attribute>) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags,
            ingredients,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
    pub description: String,
    pub image: Option<String>,
}

impl RecipeDetail {
    pub fn new(recipe: Recipe, tags: Vec<Attribute>, ingredients: Vec<Attribute>) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags,
            ingredients,
            description: recipe.description,
            image: recipe.image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_payload(password: &str) -> RegisterUser {
        RegisterUser {
            email: "test@eveil.com".to_string(),
            password: password.to_string(),
            name: "Test name".to_string(),
        }
    }

    #[test]
    fn register_accepts_valid_payload() {
        assert!(register_payload("test1234").validate().is_ok());
    }

    #[test]
    fn register_rejects_short_password() {
        let err = register_payload("test").validate().unwrap_err();
        match err {
            ApiError::Validation { field, .. } => assert_eq!(field, "password"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn register_rejects_invalid_email() {
        let mut payload = register_payload("test1234");
        payload.email = "not-an-email".to_string();
        let err = payload.validate().unwrap_err();
        match err {
            ApiError::Validation { field, .. } => assert_eq!(field, "email"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn new_recipe_rejects_negative_time() {
        let payload = NewRecipe {
            title: "Recipe title".to_string(),
            time_minutes: -1,
            price: Decimal::new(521, 2),
            description: None,
            link: None,
            tags: None,
            ingredients: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn recipe_patch_keeps_absent_fields_absent() {
        let patch: RecipePatch = serde_json::from_str(r#"{"title": "new title"}"#).unwrap();
        assert_eq!(patch.title.as_deref(), Some("new title"));
        assert!(patch.tags.is_none());
        assert!(patch.ingredients.is_none());
    }

    #[test]
    fn recipe_patch_distinguishes_empty_tag_list() {
        let patch: RecipePatch = serde_json::from_str(r#"{"tags": []}"#).unwrap();
        assert!(matches!(patch.tags.as_deref(), Some([])));
    }

    #[test]
    fn full_update_defaults_description_and_link() {
        let payload: NewRecipe = serde_json::from_str(
            r#"{"title": "Recipe title", "time_minutes": 22, "price": "5.21"}"#,
        )
        .unwrap();
        let patch = RecipePatch::from(payload);
        assert_eq!(patch.description.as_deref(), Some(""));
        assert_eq!(patch.link.as_deref(), Some(""));
        assert_eq!(patch.price, Some(Decimal::new(521, 2)));
    }

    #[test]
    fn nested_blank_tag_name_is_rejected() {
        let payload: NewRecipe = serde_json::from_str(
            r#"{"title": "Recipe title", "time_minutes": 22, "price": "5.21",
                "tags": [{"name": ""}]}"#,
        )
        .unwrap();
        let err = payload.validate().unwrap_err();
        match err {
            ApiError::Validation { field, .. } => assert_eq!(field, "tags"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn patch_rejects_blank_nested_ingredient_name() {
        let patch: RecipePatch =
            serde_json::from_str(r#"{"ingredients": [{"name": "  "}]}"#).unwrap();
        let err = patch.validate().unwrap_err();
        match err {
            ApiError::Validation { field, .. } => assert_eq!(field, "ingredients"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn user_serializes_without_password() {
        let user = User {
            id: 1,
            email: "test@eveil.com".to_string(),
            name: "Test name".to_string(),
            password: "hash".to_string(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
    }
}
