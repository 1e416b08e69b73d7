use crate::{
    authentication::cryptography::{hash_password, verify_password},
    error::{is_unique_violation, ApiError},
    form::{Credentials, NewUser, UserChanges},
    schema::{Id, User},
};

use sqlx::{Pool, Postgres};

use super::tokens::get_or_create_token;

const EMAIL_TAKEN: &str = "user with this email already exists.";

pub async fn get_user(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Id) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Creates a user with the hashed version of their password.
/// A taken email is reported as a validation error on `email`.
pub async fn register_user(pool: &Pool<Postgres>, user: &NewUser) -> Result<User, ApiError> {
    let password = hash_password(&user.password)?;

    let row: Option<User> = sqlx::query_as(
        "
        INSERT INTO users (email, password, name)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING RETURNING *;
    ",
    )
    .bind(&user.email)
    .bind(password)
    .bind(&user.name)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(user) => {
            log::info!("Registered user {}", user.id);
            Ok(user)
        }
        None => Err(ApiError::field("email", EMAIL_TAKEN)),
    }
}

pub async fn update_user(
    pool: &Pool<Postgres>,
    user_id: Id,
    changes: &UserChanges,
) -> Result<User, ApiError> {
    let password = match &changes.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let row: Option<User> = sqlx::query_as(
        "
        UPDATE users SET
        email = COALESCE($2, email),
        name = COALESCE($3, name),
        password = COALESCE($4, password)
        WHERE id = $1
        RETURNING *
    ",
    )
    .bind(user_id)
    .bind(&changes.email)
    .bind(&changes.name)
    .bind(password)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::field("email", EMAIL_TAKEN)
        } else {
            ApiError::from(e)
        }
    })?;

    row.ok_or(ApiError::NotFound)
}

/// Checks the credentials and hands back the user's access token.
/// Unknown email, inactive account and wrong password all fail the same way.
pub async fn login_user(pool: &Pool<Postgres>, credentials: &Credentials) -> Result<String, ApiError> {
    let user = match get_user(pool, &credentials.email).await? {
        Some(user) if user.is_active => user,
        _ => return Err(ApiError::InvalidCredentials),
    };

    if !verify_password(&credentials.password, &user.password)? {
        return Err(ApiError::InvalidCredentials);
    }

    get_or_create_token(user.id, pool).await
}
