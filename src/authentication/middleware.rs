use std::convert::Infallible;

use sqlx::{Pool, Postgres};
use warp::{reject::Rejection, Filter};

use crate::{database::actions::users, error::ApiError, schema::User};

pub fn with_pool(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (Pool<Postgres>,), Error = Infallible> + Clone {
    warp::any().map(move || pool.clone())
}

/// Resolves the `Authorization: Bearer <token>` header to the requesting
/// user. Missing header, malformed scheme and unknown token all reject with
/// the same 401.
pub fn with_identity(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (User,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_pool(pool))
        .and_then(|header: Option<String>, pool: Pool<Postgres>| async move {
            let token = match header.as_deref().and_then(parse_bearer) {
                Some(token) => token.to_string(),
                None => return Err(ApiError::AuthenticationRequired.reject()),
            };

            match users::get_user_by_token(&token, &pool).await {
                Ok(Some(user)) => Ok(user),
                Ok(None) => Err(ApiError::AuthenticationRequired.reject()),
                Err(e) => Err(e.reject()),
            }
        })
}

fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bearer_scheme_case_insensitively() {
        assert_eq!(parse_bearer("Bearer abc123"), Some("abc123"));
        assert_eq!(parse_bearer("bearer abc123"), Some("abc123"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(parse_bearer("Basic abc123"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("abc123"), None);
    }
}
