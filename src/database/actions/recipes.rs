use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    schema::{Ingredient, NewRecipe, Recipe, RecipePatch, Tag},
};

use super::attributes;

/// Lists the requester's recipes, most recent first. ID-list filters keep a
/// recipe when its tag/ingredient set intersects the requested ids; the
/// EXISTS form returns each matching recipe once regardless of how many of
/// the requested ids it carries.
pub async fn list_recipes(
    user_id: i32,
    tag_ids: Option<Vec<i32>>,
    ingredient_ids: Option<Vec<i32>>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Recipe>, ApiError> {
    let rows: Vec<Recipe> = match (tag_ids, ingredient_ids) {
        (Some(tag_ids), Some(ingredient_ids)) => {
            sqlx::query_as(
                "SELECT r.* FROM recipes r
                 WHERE r.user_id = $1
                 AND EXISTS (SELECT 1 FROM recipe_tags rt WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2))
                 AND EXISTS (SELECT 1 FROM recipe_ingredients ri WHERE ri.recipe_id = r.id AND ri.ingredient_id = ANY($3))
                 ORDER BY r.id DESC",
            )
            .bind(user_id)
            .bind(tag_ids)
            .bind(ingredient_ids)
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?
        }
        (Some(tag_ids), None) => {
            sqlx::query_as(
                "SELECT r.* FROM recipes r
                 WHERE r.user_id = $1
                 AND EXISTS (SELECT 1 FROM recipe_tags rt WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2))
                 ORDER BY r.id DESC",
            )
            .bind(user_id)
            .bind(tag_ids)
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?
        }
        (None, Some(ingredient_ids)) => {
            sqlx::query_as(
                "SELECT r.* FROM recipes r
                 WHERE r.user_id = $1
                 AND EXISTS (SELECT 1 FROM recipe_ingredients ri WHERE ri.recipe_id = r.id AND ri.ingredient_id = ANY($2))
                 ORDER BY r.id DESC",
            )
            .bind(user_id)
            .bind(ingredient_ids)
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?
        }
        (None, None) => {
            sqlx::query_as("SELECT * FROM recipes WHERE user_id = $1 ORDER BY id DESC")
                .bind(user_id)
                .fetch_all(pool)
                .await
                .map_err(|e| QueryError::from(e).into())?
        }
    };

    Ok(rows)
}

/// Detail lookup happens inside the owner-scoped set, so someone else's
/// recipe id resolves to `None` exactly like an unknown id.
pub async fn get_recipe(
    user_id: i32,
    id: i32,
    pool: &Pool<Postgres>,
) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Inserts the recipe, then reconciles the optional tag and ingredient
/// lists. Referenced names that don't exist yet for this user are created as
/// a side effect.
pub async fn create_recipe(
    user_id: i32,
    payload: NewRecipe,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe: Recipe = sqlx::query_as(
        "
        INSERT INTO recipes (user_id, title, description, time_minutes, price, link)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *;
    ",
    )
    .bind(user_id)
    .bind(&payload.title)
    .bind(payload.description.as_deref().unwrap_or(""))
    .bind(payload.time_minutes)
    .bind(payload.price)
    .bind(payload.link.as_deref().unwrap_or(""))
    .fetch_one(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if let Some(tags) = &payload.tags {
        attributes::reconcile::<Tag>(recipe.id, user_id, tags, pool).await?;
    }
    if let Some(ingredients) = &payload.ingredients {
        attributes::reconcile::<Ingredient>(recipe.id, user_id, ingredients, pool).await?;
    }

    Ok(recipe)
}

/// Partial update. Scalar fields fall back to their current value when
/// absent. A present `tags`/`ingredients` list (including an empty one)
/// clears the existing associations before reconciling; an absent list
/// leaves them untouched.
pub async fn update_recipe(
    user_id: i32,
    id: i32,
    patch: RecipePatch,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let row: Option<Recipe> = sqlx::query_as(
        "
        UPDATE recipes
        SET title = COALESCE($3, title),
            description = COALESCE($4, description),
            time_minutes = COALESCE($5, time_minutes),
            price = COALESCE($6, price),
            link = COALESCE($7, link)
        WHERE id = $1 AND user_id = $2
        RETURNING *;
    ",
    )
    .bind(id)
    .bind(user_id)
    .bind(&patch.title)
    .bind(&patch.description)
    .bind(patch.time_minutes)
    .bind(patch.price)
    .bind(&patch.link)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let recipe = row.ok_or(ApiError::NotFound)?;

    if let Some(tags) = &patch.tags {
        attributes::clear_links::<Tag>(recipe.id, pool).await?;
        attributes::reconcile::<Tag>(recipe.id, user_id, tags, pool).await?;
    }
    if let Some(ingredients) = &patch.ingredients {
        attributes::clear_links::<Ingredient>(recipe.id, pool).await?;
        attributes::reconcile::<Ingredient>(recipe.id, user_id, ingredients, pool).await?;
    }

    Ok(recipe)
}

pub async fn delete_recipe(user_id: i32, id: i32, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }

    Ok(())
}

pub async fn set_recipe_image(
    user_id: i32,
    id: i32,
    image: &str,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("UPDATE recipes SET image = $3 WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .bind(image)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }

    Ok(())
}
