use std::convert::Infallible;

use serde_json::{json, Value};
use warp::{
    body::BodyDeserializeError,
    http::StatusCode,
    reject::{
        InvalidHeader, InvalidQuery, LengthRequired, MethodNotAllowed, MissingHeader,
        PayloadTooLarge, Rejection, UnsupportedMediaType,
    },
    reply, Reply,
};

use crate::error::ApiError;

/// Renders every rejection as a JSON body with a matching status.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = render(&err);

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        log::error!("Request failed: {err:?}");
    }

    Ok(reply::with_status(reply::json(&body), status))
}

fn render(err: &Rejection) -> (StatusCode, Value) {
    if let Some(e) = err.find::<ApiError>() {
        return (e.status(), e.body());
    }

    if let Some(e) = err.find::<BodyDeserializeError>() {
        return (
            StatusCode::BAD_REQUEST,
            detail(&format!("JSON parse error - {e}")),
        );
    }

    if err.find::<InvalidQuery>().is_some() {
        return (StatusCode::BAD_REQUEST, detail("Invalid query string."));
    }

    if let Some(e) = err.find::<InvalidHeader>() {
        return (
            StatusCode::BAD_REQUEST,
            detail(&format!("Invalid \"{}\" header.", e.name())),
        );
    }

    if let Some(e) = err.find::<MissingHeader>() {
        return (
            StatusCode::BAD_REQUEST,
            detail(&format!("Missing \"{}\" header.", e.name())),
        );
    }

    if err.find::<LengthRequired>().is_some() {
        return (
            StatusCode::LENGTH_REQUIRED,
            detail("A Content-Length header is required."),
        );
    }

    if err.find::<PayloadTooLarge>().is_some() {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            detail("Request body is too large."),
        );
    }

    if err.find::<UnsupportedMediaType>().is_some() {
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            detail("Unsupported media type in request."),
        );
    }

    if err.is_not_found() {
        return (StatusCode::NOT_FOUND, detail("Not found."));
    }

    if err.find::<MethodNotAllowed>().is_some() {
        return (StatusCode::METHOD_NOT_ALLOWED, detail("Method not allowed."));
    }

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        detail("A server error occurred."),
    )
}

fn detail(message: &str) -> Value {
    json!({ "detail": message })
}
