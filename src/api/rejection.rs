use std::convert::Infallible;

use serde_json::{json, Value};
use warp::{http::StatusCode, reject::Rejection, reply::Reply};

use crate::error::ApiError;

/// Maps rejections to the wire error format: validation failures are
/// field-keyed (`{"password": ["..."]}`), everything else is
/// `{"detail": "..."}`.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body): (StatusCode, Value) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, json!({ "detail": "Not found." }))
    } else if let Some(api) = err.find::<ApiError>() {
        match api {
            ApiError::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                json!({ "detail": api.to_string() }),
            ),
            ApiError::Validation { field, message } => {
                (StatusCode::BAD_REQUEST, json!({ field: [message] }))
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "detail": "Not found." })),
            ApiError::Internal(info) => {
                log::error!("internal error: {info}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "detail": "Internal server error." }),
                )
            }
        }
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            json!({ "detail": e.to_string() }),
        )
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (
            StatusCode::BAD_REQUEST,
            json!({ "detail": "Invalid query string." }),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "detail": "Method not allowed." }),
        )
    } else {
        log::error!("unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "detail": "Internal server error." }),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
