use sqlx::{Pool, Postgres};
use warp::{http::StatusCode, reject::Rejection, reply, Filter, Reply};

use crate::{
    actions::labels::{create_label, delete_label, get_label, list_labels, update_label},
    filters::{LabelFilters, QueryParams},
    form::{FormData, LabelChanges, NewLabel},
    middleware::{with_pool, with_session},
    schema::{Id, LabelKind},
    token::SessionData,
};

use super::extract::{json_body, query_params, update_method};

/// `/recipe/{tags|ingredients}` and `/recipe/{tags|ingredients}/{id}`.
pub fn routes(
    kind: LabelKind,
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let with_kind = warp::any().map(move || kind);
    let collection = warp::path("recipe").and(warp::path(kind.field()));
    let item = collection.clone().and(warp::path::param::<Id>());

    let list = collection
        .clone()
        .and(warp::path::end())
        .and(warp::get())
        .and(with_kind.clone())
        .and(with_session(pool.clone()))
        .and(query_params())
        .and(with_pool(pool.clone()))
        .and_then(list);

    let create = collection
        .and(warp::path::end())
        .and(warp::post())
        .and(with_kind.clone())
        .and(with_session(pool.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(create);

    let retrieve = item
        .clone()
        .and(warp::path::end())
        .and(warp::get())
        .and(with_kind.clone())
        .and(with_session(pool.clone()))
        .and(with_pool(pool.clone()))
        .and_then(retrieve);

    let update = item
        .clone()
        .and(warp::path::end())
        .and(update_method())
        .and(with_kind.clone())
        .and(with_session(pool.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(update);

    let destroy = item
        .and(warp::path::end())
        .and(warp::delete())
        .and(with_kind)
        .and(with_session(pool.clone()))
        .and(with_pool(pool))
        .and_then(destroy);

    list.or(create).or(retrieve).or(update).or(destroy)
}

async fn list(
    kind: LabelKind,
    session: SessionData,
    query: QueryParams,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let filters = LabelFilters::from_query(&query)?;
    let labels = list_labels(kind, session.user_id, &filters, &pool).await?;

    Ok(reply::json(&labels))
}

async fn create(
    kind: LabelKind,
    session: SessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let label = NewLabel::try_from(LabelChanges::parse(data, false)?)?;
    let label = create_label(kind, session.user_id, &label.name, &pool).await?;

    Ok(reply::with_status(reply::json(&label), StatusCode::CREATED))
}

async fn retrieve(
    id: Id,
    kind: LabelKind,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let label = get_label(kind, session.user_id, id, &pool).await?;

    Ok(reply::json(&label))
}

async fn update(
    id: Id,
    partial: bool,
    kind: LabelKind,
    session: SessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let changes = LabelChanges::parse(data, partial)?;
    let label = update_label(kind, session.user_id, id, &changes, &pool).await?;

    Ok(reply::json(&label))
}

async fn destroy(
    id: Id,
    kind: LabelKind,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    delete_label(kind, session.user_id, id, &pool).await?;
    log::info!("User {} deleted {} {id}", session.user_id, kind.field());

    Ok(reply::with_status(reply::reply(), StatusCode::NO_CONTENT))
}
