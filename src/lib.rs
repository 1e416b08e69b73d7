use std::convert::Infallible;

use sqlx::{Pool, Postgres};
use warp::{Filter, Reply};

mod database {
    pub mod actions;
    pub mod error;
    pub mod filters;
    pub mod form;
    pub mod schema;
}
mod authentication {
    pub mod cryptography;
    pub mod middleware;
    pub mod token;
}
mod routes {
    pub mod extract;
    pub mod labels;
    pub mod recipes;
    pub mod rejection;
    pub mod users;
}
pub mod config;
mod constants;

pub use authentication::*;
pub use constants::*;
pub use database::*;
pub use routes::rejection::handle_rejection;

use database::schema::LabelKind;

/// Every endpoint of the service, with rejections rendered as JSON.
pub fn api(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    routes::users::routes(pool.clone())
        .or(routes::recipes::routes(pool.clone()))
        .or(routes::labels::routes(LabelKind::Tag, pool.clone()))
        .or(routes::labels::routes(LabelKind::Ingredient, pool))
        .recover(handle_rejection)
}
