use sqlx::{Pool, Postgres};

use crate::{
    authentication::cryptography::generate_access_token,
    error::ApiError,
    schema::{AuthToken, Id, User},
};

/// Returns the user's existing token, creating one on first login.
pub async fn get_or_create_token(user_id: Id, pool: &Pool<Postgres>) -> Result<String, ApiError> {
    let mut tr = pool.begin().await?;

    sqlx::query("INSERT INTO auth_tokens (key, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
        .bind(generate_access_token())
        .bind(user_id)
        .execute(&mut *tr)
        .await?;

    let token: AuthToken = sqlx::query_as("SELECT * FROM auth_tokens WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&mut *tr)
        .await?;

    tr.commit().await?;

    Ok(token.key)
}

pub async fn find_token_user(key: &str, pool: &Pool<Postgres>) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as(
        "
        SELECT u.*
        FROM auth_tokens t
        INNER JOIN users u ON u.id = t.user_id
        WHERE t.key = $1
    ",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
