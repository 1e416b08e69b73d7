use sqlx::{Pool, Postgres};
use warp::http::HeaderValue;

use crate::{
    actions::tokens::find_token_user, constants::TOKEN_SCHEMES, error::ApiError, schema::Id,
};

/// The identity a request acts as once its token has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Id,
}

/// Extracts the key from `Token <key>` or `Bearer <key>`.
pub fn parse_authorization(header: &str) -> Result<&str, ApiError> {
    let mut parts = header.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(key), None)
            if TOKEN_SCHEMES
                .iter()
                .any(|known| scheme.eq_ignore_ascii_case(known)) =>
        {
            Ok(key)
        }
        (Some(scheme), None, None)
            if TOKEN_SCHEMES
                .iter()
                .any(|known| scheme.eq_ignore_ascii_case(known)) =>
        {
            Err(ApiError::Unauthenticated(
                "Invalid token header. No credentials provided.",
            ))
        }
        _ => Err(ApiError::Unauthenticated("Invalid token header.")),
    }
}

/// Header bytes outside visible ASCII can never form a key.
pub fn authorization_text(header: &HeaderValue) -> Result<&str, ApiError> {
    header.to_str().map_err(|_| {
        ApiError::Unauthenticated(
            "Invalid token header. Token string should not contain invalid characters.",
        )
    })
}

pub async fn resolve_session(
    header: Option<HeaderValue>,
    pool: &Pool<Postgres>,
) -> Result<SessionData, ApiError> {
    let header = header.ok_or(ApiError::Unauthenticated(
        "Authentication credentials were not provided.",
    ))?;
    let key = parse_authorization(authorization_text(&header)?)?;

    let user = find_token_user(key, pool)
        .await?
        .ok_or(ApiError::Unauthenticated("Invalid token."))?;

    if !user.is_active {
        return Err(ApiError::Unauthenticated("User inactive or deleted."));
    }

    Ok(SessionData { user_id: user.id })
}
