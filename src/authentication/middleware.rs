use std::convert::Infallible;

use sqlx::{Pool, Postgres};
use warp::{
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    reject::Rejection,
    Filter,
};

use super::token::{resolve_session, SessionData};

pub fn with_pool(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (Pool<Postgres>,), Error = Infallible> + Clone {
    warp::any().map(move || pool.clone())
}

/// Resolves the `Authorization` header into a [`SessionData`], rejecting with 401.
pub fn with_session(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::headers_cloned()
        .map(|headers: HeaderMap| headers.get(AUTHORIZATION).cloned())
        .and(with_pool(pool))
        .and_then(|header: Option<HeaderValue>, pool: Pool<Postgres>| async move {
            resolve_session(header, &pool)
                .await
                .map_err(Rejection::from)
        })
}
