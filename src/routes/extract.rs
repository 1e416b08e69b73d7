use warp::{reject::Rejection, Filter};

use crate::{constants::MAX_BODY_BYTES, filters::QueryParams, form::FormData};

pub fn json_body() -> impl Filter<Extract = (FormData,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

pub fn query_params() -> impl Filter<Extract = (QueryParams,), Error = Rejection> + Clone {
    warp::query::<QueryParams>()
}

/// Matches PATCH or PUT and extracts whether the update is partial.
pub fn update_method() -> impl Filter<Extract = (bool,), Error = Rejection> + Clone {
    warp::patch()
        .map(|| true)
        .or(warp::put().map(|| false))
        .unify()
}
