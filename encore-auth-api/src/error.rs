use serde::{Deserialize, Serialize};

/// Corps de toute réponse en erreur; `error` est un code stable (`USER_EXISTS`, ...)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
