use serde_json::json;
use sqlx::{Pool, Postgres};
use warp::{http::StatusCode, reject::Rejection, reply, Filter, Reply};

use crate::{
    actions::users::{get_user_by_id, login_user, register_user, update_user},
    error::ApiError,
    form::{Credentials, FormData, NewUser, UserChanges},
    middleware::{with_pool, with_session},
    schema::UserProfile,
    token::SessionData,
};

use super::extract::{json_body, update_method};

pub fn routes(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let create = warp::path!("user" / "create")
        .and(warp::post())
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(create_user);

    let token = warp::path!("user" / "token")
        .and(warp::post())
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(create_token);

    let me = warp::path!("user" / "me");

    let retrieve = me
        .clone()
        .and(warp::get())
        .and(with_session(pool.clone()))
        .and(with_pool(pool.clone()))
        .and_then(retrieve_me);

    let update = me
        .and(update_method())
        .and(with_session(pool.clone()))
        .and(json_body())
        .and(with_pool(pool))
        .and_then(update_me);

    create.or(token).or(retrieve).or(update)
}

async fn create_user(data: FormData, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let user = NewUser::try_from(UserChanges::parse(data, false)?)?;
    let user = register_user(&pool, &user).await?;

    Ok(reply::with_status(
        reply::json(&UserProfile::from(&user)),
        StatusCode::CREATED,
    ))
}

async fn create_token(data: FormData, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let credentials = Credentials::parse(data)?;
    let token = login_user(&pool, &credentials).await?;

    Ok(reply::json(&json!({ "token": token })))
}

async fn retrieve_me(session: SessionData, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let user = get_user_by_id(&pool, session.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(reply::json(&UserProfile::from(&user)))
}

async fn update_me(
    partial: bool,
    session: SessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let changes = UserChanges::parse(data, partial)?;
    let user = update_user(&pool, session.user_id, &changes).await?;
    log::info!("Updated profile of user {}", user.id);

    Ok(reply::json(&UserProfile::from(&user)))
}
