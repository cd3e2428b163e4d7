use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::response::AppError;

/// `axum::Json<T>` whose rejection is an `AppError` envelope instead of plain text.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        axum::Json::<T>::from_request(req, state)
            .await
            .map(|axum::Json(value)| JsonBody(value))
            .map_err(json_rejection)
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match &rejection {
        JsonRejection::JsonDataError(e) => {
            tracing::warn!(error = %e, "JSON data deserialization failed");
        }
        JsonRejection::JsonSyntaxError(e) => {
            tracing::warn!(error = %e, "JSON syntax parsing failed");
        }
        JsonRejection::MissingJsonContentType(e) => {
            tracing::warn!(error = %e, "Missing or invalid JSON Content-Type");
        }
        other => {
            tracing::warn!(error = %other, "JSON body rejected");
        }
    }
    AppError::bad_request("INVALID_REQUEST_BODY", "Invalid request body")
}

/// `axum::extract::Query<T>` with an `AppError` rejection.
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| QueryParams(value))
            .map_err(|rejection: QueryRejection| {
                tracing::warn!(error = %rejection, "Query string rejected");
                AppError::bad_request("INVALID_QUERY", "Invalid query parameters")
            })
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Toggle {
        current: bool,
    }

    #[tokio::test]
    async fn malformed_json_maps_to_invalid_body() {
        let req = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"current\": \"yes\"}"))
            .unwrap();
        let err = match JsonBody::<Toggle>::from_request(req, &()).await {
            Ok(_) => panic!("expected rejection"),
            Err(e) => e,
        };
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_REQUEST_BODY");
    }

    #[tokio::test]
    async fn valid_json_is_extracted() {
        let req = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"current\": true}"))
            .unwrap();
        let JsonBody(toggle) = JsonBody::<Toggle>::from_request(req, &())
            .await
            .unwrap_or_else(|_| panic!("expected body"));
        assert!(toggle.current);
    }
}
