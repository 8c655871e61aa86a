pub mod extractors;
pub mod jwt;
pub mod locks;
pub mod mailer;
pub mod password;
pub mod reconcile;
pub mod services;
pub mod validation;
pub mod verifier;
