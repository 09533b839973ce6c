//! Owner-scoped actions shared by tags and ingredients, generic over
//! [`OwnedAttribute`]. Table and column names come from trait constants, so
//! every query here is interpolated from compile-time strings only.

use sqlx::{Pool, Postgres};

use crate::{
    error::{is_unique_violation, ApiError, QueryError},
    schema::{Attribute, AttributePayload, OwnedAttribute},
};

/// Lists the requester's attributes by ascending name. With `assigned_only`
/// the set is restricted to attributes linked to at least one recipe;
/// DISTINCT keeps attributes linked to several recipes from repeating.
pub async fn list_attributes<A: OwnedAttribute>(
    user_id: i32,
    assigned_only: bool,
    pool: &Pool<Postgres>,
) -> Result<Vec<Attribute>, ApiError> {
    let rows: Vec<Attribute> = match assigned_only {
        true => sqlx::query_as(&format!(
            "SELECT DISTINCT a.id, a.name FROM {} a INNER JOIN {} l ON l.{} = a.id WHERE a.user_id = $1 ORDER BY a.name",
            A::TABLE,
            A::LINK_TABLE,
            A::LINK_COLUMN,
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?,
        false => sqlx::query_as(&format!(
            "SELECT id, name FROM {} WHERE user_id = $1 ORDER BY name",
            A::TABLE,
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?,
    };

    Ok(rows)
}

/// Renaming onto a name the owner already uses trips the `(user_id, name)`
/// unique index; that comes back as a field error, not a 500.
pub async fn update_attribute<A: OwnedAttribute>(
    user_id: i32,
    id: i32,
    name: &str,
    pool: &Pool<Postgres>,
) -> Result<Attribute, ApiError> {
    let row: Option<Attribute> = sqlx::query_as(&format!(
        "UPDATE {} SET name = $3 WHERE id = $1 AND user_id = $2 RETURNING id, name",
        A::TABLE,
    ))
    .bind(id)
    .bind(user_id)
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::validation("name", "This name is already in use.")
        } else {
            QueryError::from(e).into()
        }
    })?;

    row.ok_or(ApiError::NotFound)
}

/// Link rows cascade with the attribute row.
pub async fn delete_attribute<A: OwnedAttribute>(
    user_id: i32,
    id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE id = $1 AND user_id = $2",
        A::TABLE,
    ))
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

/// Looks up an attribute by (owner, name), inserting it when absent. The
/// unique index on (user_id, name) makes the insert race-free; on conflict
/// the fallback select finds the row the other writer created.
pub async fn get_or_create<A: OwnedAttribute>(
    user_id: i32,
    name: &str,
    pool: &Pool<Postgres>,
) -> Result<i32, ApiError> {
    let inserted: Option<(i32,)> = sqlx::query_as(&format!(
        "INSERT INTO {} (user_id, name) VALUES ($1, $2) ON CONFLICT (user_id, name) DO NOTHING RETURNING id",
        A::TABLE,
    ))
    .bind(user_id)
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if let Some((id,)) = inserted {
        return Ok(id);
    }

    let row: (i32,) = sqlx::query_as(&format!(
        "SELECT id FROM {} WHERE user_id = $1 AND name = $2",
        A::TABLE,
    ))
    .bind(user_id)
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row.0)
}

pub async fn attach<A: OwnedAttribute>(
    recipe_id: i32,
    attribute_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    sqlx::query(&format!(
        "INSERT INTO {} (recipe_id, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        A::LINK_TABLE,
        A::LINK_COLUMN,
    ))
    .bind(recipe_id)
    .bind(attribute_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn clear_links<A: OwnedAttribute>(
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    sqlx::query(&format!("DELETE FROM {} WHERE recipe_id = $1", A::LINK_TABLE))
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

/// Reconciles a payload list against a recipe: each name is resolved with
/// [`get_or_create`] scoped to the recipe's owner, then linked. Duplicate
/// names in the payload collapse to a single association.
pub async fn reconcile<A: OwnedAttribute>(
    recipe_id: i32,
    user_id: i32,
    items: &[AttributePayload],
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    for item in items {
        let attribute_id = get_or_create::<A>(user_id, &item.name, pool).await?;
        attach::<A>(recipe_id, attribute_id, pool).await?;
    }

    Ok(())
}

pub async fn list_links<A: OwnedAttribute>(
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<Vec<Attribute>, ApiError> {
    let rows: Vec<Attribute> = sqlx::query_as(&format!(
        "SELECT a.id, a.name FROM {} a INNER JOIN {} l ON l.{} = a.id WHERE l.recipe_id = $1 ORDER BY a.id",
        A::TABLE,
        A::LINK_TABLE,
        A::LINK_COLUMN,
    ))
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}
