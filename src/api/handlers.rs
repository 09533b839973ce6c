use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use sqlx::{Pool, Postgres};
use warp::{http::StatusCode, multipart::FormData, reject::Rejection, reply::Reply};

use crate::{
    actions::{attributes, recipes, users},
    config::Config,
    error::ApiError,
    media,
    schema::{
        AttributePayload, Ingredient, NewRecipe, OwnedAttribute, ProfilePatch, Recipe,
        RecipeDetail, RecipePatch, RecipeSummary, RegisterUser, Tag, TokenRequest, User,
        UserPublic,
    },
};

use super::params;

// User handlers

pub async fn register(
    payload: RegisterUser,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    payload.validate().map_err(ApiError::reject)?;

    let user = users::register_user(&payload.email, &payload.name, &payload.password, &pool)
        .await
        .map_err(ApiError::reject)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&UserPublic::from(user)),
        StatusCode::CREATED,
    ))
}

pub async fn token(payload: TokenRequest, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    if payload.password.is_empty() {
        return Err(
            ApiError::validation("non_field_errors", "Bad credentials informations.").reject(),
        );
    }

    let token = users::login_user(&payload.email, &payload.password, &pool)
        .await
        .map_err(ApiError::reject)?;

    Ok(warp::reply::json(&json!({ "token": token })))
}

pub async fn profile(user: User) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&UserPublic::from(user)))
}

pub async fn update_profile(
    user: User,
    patch: ProfilePatch,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    patch.validate().map_err(ApiError::reject)?;

    let user = users::update_profile(user.id, patch.name.as_deref(), patch.password.as_deref(), &pool)
        .await
        .map_err(ApiError::reject)?;

    Ok(warp::reply::json(&UserPublic::from(user)))
}

// Recipe handlers

async fn load_detail(recipe: Recipe, pool: &Pool<Postgres>) -> Result<RecipeDetail, ApiError> {
    let tags = attributes::list_links::<Tag>(recipe.id, pool).await?;
    let ingredients = attributes::list_links::<Ingredient>(recipe.id, pool).await?;

    Ok(RecipeDetail::new(recipe, tags, ingredients))
}

pub async fn list_recipes(
    user: User,
    query: HashMap<String, String>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let tag_ids = params::id_list_param(&query, "tags").map_err(ApiError::reject)?;
    let ingredient_ids =
        params::id_list_param(&query, "ingredients").map_err(ApiError::reject)?;

    let rows = recipes::list_recipes(user.id, tag_ids, ingredient_ids, &pool)
        .await
        .map_err(ApiError::reject)?;

    let mut summaries = Vec::with_capacity(rows.len());
    for recipe in rows {
        let tags = attributes::list_links::<Tag>(recipe.id, &pool)
            .await
            .map_err(ApiError::reject)?;
        let ingredients = attributes::list_links::<Ingredient>(recipe.id, &pool)
            .await
            .map_err(ApiError::reject)?;
        summaries.push(RecipeSummary::new(recipe, tags, ingredients));
    }

    Ok(warp::reply::json(&summaries))
}

pub async fn create_recipe(
    user: User,
    payload: NewRecipe,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    payload.validate().map_err(ApiError::reject)?;

    let recipe = recipes::create_recipe(user.id, payload, &pool)
        .await
        .map_err(ApiError::reject)?;
    let detail = load_detail(recipe, &pool).await.map_err(ApiError::reject)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&detail),
        StatusCode::CREATED,
    ))
}

pub async fn get_recipe(
    id: i32,
    user: User,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = recipes::get_recipe(user.id, id, &pool)
        .await
        .map_err(ApiError::reject)?
        .ok_or_else(|| ApiError::NotFound.reject())?;
    let detail = load_detail(recipe, &pool).await.map_err(ApiError::reject)?;

    Ok(warp::reply::json(&detail))
}

pub async fn patch_recipe(
    id: i32,
    user: User,
    patch: RecipePatch,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    patch.validate().map_err(ApiError::reject)?;

    let recipe = recipes::update_recipe(user.id, id, patch, &pool)
        .await
        .map_err(ApiError::reject)?;
    let detail = load_detail(recipe, &pool).await.map_err(ApiError::reject)?;

    Ok(warp::reply::json(&detail))
}

pub async fn put_recipe(
    id: i32,
    user: User,
    payload: NewRecipe,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    payload.validate().map_err(ApiError::reject)?;

    let recipe = recipes::update_recipe(user.id, id, RecipePatch::from(payload), &pool)
        .await
        .map_err(ApiError::reject)?;
    let detail = load_detail(recipe, &pool).await.map_err(ApiError::reject)?;

    Ok(warp::reply::json(&detail))
}

pub async fn delete_recipe(
    id: i32,
    user: User,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    recipes::delete_recipe(user.id, id, &pool)
        .await
        .map_err(ApiError::reject)?;

    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

/// Ownership is checked before the upload is touched; a bad payload fails
/// with a field error and leaves the recipe unchanged.
pub async fn upload_recipe_image(
    id: i32,
    user: User,
    form: FormData,
    config: Arc<Config>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    recipes::get_recipe(user.id, id, &pool)
        .await
        .map_err(ApiError::reject)?
        .ok_or_else(|| ApiError::NotFound.reject())?;

    let data = media::read_image_part(form).await.map_err(ApiError::reject)?;
    let reference = media::store_recipe_image(&config.media_root, &data)
        .await
        .map_err(ApiError::reject)?;

    recipes::set_recipe_image(user.id, id, &reference, &pool)
        .await
        .map_err(ApiError::reject)?;

    Ok(warp::reply::json(&json!({ "id": id, "image": reference })))
}

// Tag/ingredient handlers, generic over the attribute kind

pub async fn list_attributes<A: OwnedAttribute>(
    user: User,
    query: HashMap<String, String>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let assigned_only = params::assigned_only_param(&query).map_err(ApiError::reject)?;

    let rows = attributes::list_attributes::<A>(user.id, assigned_only, &pool)
        .await
        .map_err(ApiError::reject)?;

    Ok(warp::reply::json(&rows))
}

pub async fn update_attribute<A: OwnedAttribute>(
    id: i32,
    user: User,
    payload: AttributePayload,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name", "This field may not be blank.").reject());
    }

    let row = attributes::update_attribute::<A>(user.id, id, &payload.name, &pool)
        .await
        .map_err(ApiError::reject)?;

    Ok(warp::reply::json(&row))
}

pub async fn delete_attribute<A: OwnedAttribute>(
    id: i32,
    user: User,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    attributes::delete_attribute::<A>(user.id, id, &pool)
        .await
        .map_err(ApiError::reject)?;

    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}
