use serde::{Deserialize, Serialize};

/// Success statuses returned by encore-auth.
/// Kept free of axum so the crate builds for WASM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    Ok = 200,
    Created = 201,
    Accepted = 202,
}

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Successful payload plus the status it is served with.
///
/// ```rust
/// use encore_auth_api::{AppResponse, MessageResponse, StatusCode};
///
/// let response = AppResponse::accepted(MessageResponse::new("queued"));
/// assert_eq!(response.status, StatusCode::Accepted);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppResponse<T> {
    pub status: StatusCode,
    pub data: T,
}

impl<T> AppResponse<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        Self { status, data }
    }

    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::Ok, data)
    }

    pub fn created(data: T) -> Self {
        Self::new(StatusCode::Created, data)
    }

    pub fn accepted(data: T) -> Self {
        Self::new(StatusCode::Accepted, data)
    }
}
