use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    authentication::cryptography::{generate_token, hash_password, verify_password},
    error::{ApiError, QueryError},
    schema::User,
};

pub async fn get_user_by_email(
    email: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Creates a user, storing the argon2 hash of their password. A duplicate
/// email surfaces as a field validation error, not a database error.
pub async fn register_user(
    email: &str,
    name: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<User, ApiError> {
    let password_hash =
        hash_password(password).map_err(|e| ApiError::Internal(format!("{e}")))?;

    let row: Option<User> = sqlx::query_as(
        "
        INSERT INTO users (email, name, password)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING RETURNING *;
    ",
    )
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    row.ok_or_else(|| ApiError::validation("email", "User with this email already exists."))
}

/// Verifies credentials and returns the user's bearer token, creating one on
/// first login. The token does not rotate between logins.
pub async fn login_user(
    email: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = get_user_by_email(email, pool).await?;
    let user = match user {
        Some(user) => user,
        None => {
            return Err(ApiError::validation(
                "non_field_errors",
                "Email or password is not correct.",
            ))
        }
    };

    let authenticated = verify_password(password, &user.password).unwrap_or(false);
    if !authenticated {
        return Err(ApiError::validation(
            "non_field_errors",
            "Email or password is not correct.",
        ));
    }

    let existing: Option<(String,)> = sqlx::query_as("SELECT token FROM auth_tokens WHERE user_id = $1")
        .bind(user.id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if let Some((token,)) = existing {
        return Ok(token);
    }

    let token = generate_token();
    sqlx::query("INSERT INTO auth_tokens (token, user_id, created_at) VALUES ($1, $2, $3)")
        .bind(&token)
        .bind(user.id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(token)
}

pub async fn get_user_by_token(
    token: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as(
        "
        SELECT u.*
        FROM users u
        INNER JOIN auth_tokens t ON t.user_id = u.id
        WHERE t.token = $1
    ",
    )
    .bind(token)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn update_profile(
    user_id: i32,
    name: Option<&str>,
    password: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<User, ApiError> {
    let password_hash = match password {
        Some(password) => {
            Some(hash_password(password).map_err(|e| ApiError::Internal(format!("{e}")))?)
        }
        None => None,
    };

    let row: Option<User> = sqlx::query_as(
        "
        UPDATE users
        SET name = COALESCE($2, name), password = COALESCE($3, password)
        WHERE id = $1
        RETURNING *;
    ",
    )
    .bind(user_id)
    .bind(name)
    .bind(password_hash)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    row.ok_or(ApiError::NotFound)
}
