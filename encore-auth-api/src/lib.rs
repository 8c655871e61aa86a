//! Types JSON échangés avec encore-auth.
//!
//! Aucune dépendance serveur: le crate se compile aussi pour un client WASM.
//!
//! ```rust
//! use encore_auth_api::ProviderClaim;
//!
//! let claim: ProviderClaim = serde_json::from_str(
//!     r#"{"email":"a@x.com","profile_id":"g1","access_token":"t1"}"#,
//! ).unwrap();
//! assert!(claim.avatar_url.is_none());
//! ```

pub mod error;
pub mod requests;
pub mod responses;
pub mod result;

// Re-exports for convenient access
pub use error::ErrorResponse;
pub use requests::*;
pub use responses::*;
pub use result::{AppResponse, StatusCode};
