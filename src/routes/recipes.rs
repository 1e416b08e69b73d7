use sqlx::{Pool, Postgres};
use warp::{http::StatusCode, reject::Rejection, reply, Filter, Reply};

use crate::{
    actions::recipes::{create_recipe, delete_recipe, get_recipe, list_recipes, update_recipe},
    filters::{QueryParams, RecipeFilters},
    form::{FormData, NewRecipe, RecipeChanges},
    middleware::{with_pool, with_session},
    schema::Id,
    token::SessionData,
};

use super::extract::{json_body, query_params, update_method};

pub fn routes(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let collection = warp::path!("recipe" / "recipes");
    let item = warp::path!("recipe" / "recipes" / Id);

    let list = collection
        .clone()
        .and(warp::get())
        .and(with_session(pool.clone()))
        .and(query_params())
        .and(with_pool(pool.clone()))
        .and_then(list);

    let create = collection
        .and(warp::post())
        .and(with_session(pool.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(create);

    let retrieve = item
        .clone()
        .and(warp::get())
        .and(with_session(pool.clone()))
        .and(with_pool(pool.clone()))
        .and_then(retrieve);

    let update = item
        .clone()
        .and(update_method())
        .and(with_session(pool.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(update);

    let destroy = item
        .and(warp::delete())
        .and(with_session(pool.clone()))
        .and(with_pool(pool))
        .and_then(destroy);

    list.or(create).or(retrieve).or(update).or(destroy)
}

async fn list(
    session: SessionData,
    query: QueryParams,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let filters = RecipeFilters::from_query(&query)?;
    let recipes = list_recipes(session.user_id, &filters, &pool).await?;

    Ok(reply::json(&recipes))
}

async fn create(
    session: SessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = NewRecipe::try_from(RecipeChanges::parse(data, false)?)?;
    let recipe = create_recipe(session.user_id, &recipe, &pool).await?;
    log::info!("User {} created recipe {}", session.user_id, recipe.recipe.id);

    Ok(reply::with_status(reply::json(&recipe), StatusCode::CREATED))
}

async fn retrieve(
    id: Id,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = get_recipe(session.user_id, id, &pool).await?;

    Ok(reply::json(&recipe))
}

async fn update(
    id: Id,
    partial: bool,
    session: SessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let changes = RecipeChanges::parse(data, partial)?;
    let recipe = update_recipe(session.user_id, id, &changes, &pool).await?;

    Ok(reply::json(&recipe))
}

async fn destroy(
    id: Id,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    delete_recipe(session.user_id, id, &pool).await?;
    log::info!("User {} deleted recipe {id}", session.user_id);

    Ok(reply::with_status(reply::reply(), StatusCode::NO_CONTENT))
}
