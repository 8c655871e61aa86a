use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use encore_auth_api::{AppResponse as ApiResponse, StatusCode as ApiStatusCode};
use serde::Serialize;

/// `encore_auth_api::AppResponse` côté serveur: statut axum et en-têtes en plus.
pub struct AppResponse<T> {
    inner: ApiResponse<T>,
    headers: Option<HeaderMap>,
}

impl<T> AppResponse<T>
where
    T: Serialize,
{
    pub fn new(inner: ApiResponse<T>) -> Self {
        Self {
            inner,
            headers: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Réponses portant un access token: jamais mises en cache
    pub fn no_store(self) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        self.with_headers(headers)
    }

    pub fn ok(data: T) -> Self {
        Self::new(ApiResponse::ok(data))
    }

    pub fn created(data: T) -> Self {
        Self::new(ApiResponse::created(data))
    }

    pub fn accepted(data: T) -> Self {
        Self::new(ApiResponse::accepted(data))
    }
}

fn convert_status(api_status: ApiStatusCode) -> StatusCode {
    match api_status {
        ApiStatusCode::Ok => StatusCode::OK,
        ApiStatusCode::Created => StatusCode::CREATED,
        ApiStatusCode::Accepted => StatusCode::ACCEPTED,
    }
}

impl<T> IntoResponse for AppResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let status = convert_status(self.inner.status);

        let mut response = (status, Json(self.inner.data)).into_response();

        if let Some(headers) = self.headers {
            response.headers_mut().extend(headers);
        }

        response
    }
}
