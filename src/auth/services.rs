// src/auth/services.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use encore_auth_api::{
    LocalLoginRequest, ProviderClaim, RegisterRequest, ResetPasswordRequest, SignInResponse,
    UserResponse,
};
use uuid::Uuid;

use crate::auth::jwt::JwtManager;
use crate::auth::mailer::{ResetMailer, ResetTicket};
use crate::auth::password::PasswordManager;
use crate::auth::reconcile::{IdentityReconciler, PartialCredential, ProviderLink};
use crate::auth::validation::{validate_email, validate_new_password};
use crate::auth::verifier::LocalVerifier;
use crate::db::models::user::{User, UserChanges};
use crate::db::store::UserStore;
use crate::error::AppError;

/// Fournisseurs OAuth acceptés
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    Facebook,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
        }
    }

    /// Traduit le claim normalisé en identifiants pour le slot du fournisseur.
    fn credential(self, claim: ProviderClaim) -> PartialCredential {
        let link = Some(ProviderLink {
            profile_id: claim.profile_id,
            access_token: claim.access_token,
        });
        let (google, facebook) = match self {
            Provider::Google => (link, None),
            Provider::Facebook => (None, link),
        };

        PartialCredential {
            username: claim.display_name,
            google,
            facebook,
            avatar_url: claim.avatar_url,
            ..PartialCredential::new(claim.email)
        }
    }
}

/// Paramètres du flux de réinitialisation
#[derive(Debug, Clone)]
pub struct ResetSettings {
    pub token_ttl: Duration,
    pub public_base_url: String,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    reconciler: IdentityReconciler,
    verifier: LocalVerifier,
    jwt_manager: JwtManager,
    mailer: Arc<dyn ResetMailer>,
    reset: ResetSettings,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        jwt_manager: JwtManager,
        mailer: Arc<dyn ResetMailer>,
        reset: ResetSettings,
    ) -> Self {
        Self {
            reconciler: IdentityReconciler::new(store.clone()),
            verifier: LocalVerifier::new(store.clone()),
            store,
            jwt_manager,
            mailer,
            reset,
        }
    }

    pub fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }

    /// Inscription locale.
    ///
    /// Un compte déjà ouvert via Google ou Facebook sur le même email reçoit
    /// simplement le slot password; un compte qui en possède déjà un est refusé.
    pub fn register(&self, request: RegisterRequest) -> Result<SignInResponse, AppError> {
        if request.email.is_empty()
            || request.username.trim().is_empty()
            || request.password.is_empty()
            || request.confirm.is_empty()
        {
            return Err(AppError::validation("All fields are required"));
        }
        validate_email(&request.email)?;
        validate_new_password(&request.password, &request.confirm)?;

        if let Some(existing) = self.store.find_by_email(&request.email)?
            && existing.password_hash.is_some()
        {
            return Err(AppError::UserAlreadyExists);
        }

        let password_hash = PasswordManager::hash(&request.password)?;
        let candidate = PartialCredential {
            username: Some(request.username),
            password_hash: Some(password_hash),
            ..PartialCredential::new(request.email)
        };

        // Le test ci-dessus est hors verrou: seul le hash réellement persisté fait foi
        let user = self.reconciler.reconcile(&candidate)?;
        if user.password_hash != candidate.password_hash {
            tracing::warn!(user_id = %user.id, "Concurrent registration lost, password already set");
            return Err(AppError::UserAlreadyExists);
        }
        tracing::info!(user_id = %user.id, "Local registration completed");
        self.sign_in_response(user)
    }

    /// Connexion email + mot de passe
    pub fn login(&self, request: &LocalLoginRequest) -> Result<SignInResponse, AppError> {
        let user = self
            .verifier
            .verify_local(&request.email, &request.password)?;
        tracing::info!(user_id = %user.id, "Local sign-in");
        self.sign_in_response(user)
    }

    /// Connexion via un fournisseur OAuth dont le handshake est déjà terminé.
    pub fn sign_in_with_provider(
        &self,
        provider: Provider,
        claim: ProviderClaim,
    ) -> Result<SignInResponse, AppError> {
        if claim.profile_id.trim().is_empty() || claim.access_token.trim().is_empty() {
            return Err(AppError::invalid_input(format!(
                "{} claim requires a profile id and an access token",
                provider.as_str()
            )));
        }

        let user = self.reconciler.reconcile(&provider.credential(claim))?;
        tracing::info!(user_id = %user.id, provider = provider.as_str(), "Provider sign-in");
        self.sign_in_response(user)
    }

    pub fn current_user(&self, user_id: Uuid) -> Result<UserResponse, AppError> {
        self.store
            .find_by_id(user_id)?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Émet un jeton de réinitialisation et le confie au mailer.
    pub fn request_password_reset(&self, email: &str) -> Result<ResetTicket, AppError> {
        validate_email(email)?;

        let user = self
            .store
            .find_by_email(email)?
            .ok_or_else(|| AppError::not_found("Email is not registered"))?;

        let ticket = ResetTicket {
            email: user.email,
            token: Uuid::new_v4().simple().to_string(),
            expires_at: Utc::now() + self.reset.token_ttl,
        };
        let changes = UserChanges {
            reset_token: Some(Some(ticket.token.clone())),
            reset_token_expires_at: Some(Some(ticket.expires_at)),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        self.store.update(&ticket.email, &changes)?;

        let reset_url = format!(
            "{}/auth/reset/{}",
            self.reset.public_base_url.trim_end_matches('/'),
            ticket.token
        );
        self.mailer.send(&ticket, &reset_url);
        Ok(ticket)
    }

    /// Retrouve le compte associé à un jeton encore valide.
    pub fn check_reset_token(&self, token: &str) -> Result<User, AppError> {
        let user = self
            .store
            .find_by_reset_token(token)?
            .ok_or(AppError::InvalidResetToken)?;

        match user.reset_token_expires_at {
            Some(expires_at) if expires_at > Utc::now() => Ok(user),
            _ => Err(AppError::InvalidResetToken),
        }
    }

    /// Remplace explicitement le mot de passe et consomme le jeton.
    pub fn reset_password(
        &self,
        token: &str,
        request: &ResetPasswordRequest,
    ) -> Result<User, AppError> {
        validate_new_password(&request.password, &request.confirm)?;
        self.check_reset_token(token)?;

        let changes = UserChanges {
            password_hash: Some(PasswordManager::hash(&request.password)?),
            reset_token: Some(None),
            reset_token_expires_at: Some(None),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        // Écriture conditionnée au jeton: un second appel concurrent ne trouve plus rien
        let updated = self
            .store
            .consume_reset_token(token, Utc::now(), &changes)?
            .ok_or(AppError::InvalidResetToken)?;
        tracing::info!(user_id = %updated.id, "Password reset completed");
        Ok(updated)
    }

    fn sign_in_response(&self, user: User) -> Result<SignInResponse, AppError> {
        let access_token = self.jwt_manager.issue_for(&user)?;
        Ok(SignInResponse {
            access_token,
            user: user.into(),
            expires_in: self.jwt_manager.expires_in(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::error::RepositoryError;
    use crate::db::memory::InMemoryUserStore;
    use crate::db::models::user::NewUser;
    use chrono::DateTime;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    /// Mailer de test: garde les tickets reçus.
    #[derive(Default)]
    pub(crate) struct RecordingMailer {
        pub(crate) sent: Mutex<Vec<(ResetTicket, String)>>,
    }

    impl ResetMailer for RecordingMailer {
        fn send(&self, ticket: &ResetTicket, reset_url: &str) {
            self.sent
                .lock()
                .unwrap()
                .push((ticket.clone(), reset_url.to_string()));
        }
    }

    pub(crate) fn service_with_ttl(ttl: Duration) -> (Arc<InMemoryUserStore>, AuthService) {
        let store = Arc::new(InMemoryUserStore::new());
        let service = AuthService::new(
            store.clone(),
            JwtManager::new("test_secret_for_auth_service", 1),
            Arc::new(RecordingMailer::default()),
            ResetSettings {
                token_ttl: ttl,
                public_base_url: "http://localhost:3000/".to_string(),
            },
        );
        (store, service)
    }

    pub(crate) fn service() -> (Arc<InMemoryUserStore>, AuthService) {
        service_with_ttl(Duration::milliseconds(360_000))
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            username: "alice".to_string(),
            password: "TestPassword123!".to_string(),
            confirm: "TestPassword123!".to_string(),
        }
    }

    fn google_claim(email: &str) -> ProviderClaim {
        ProviderClaim {
            email: email.to_string(),
            profile_id: "g1".to_string(),
            access_token: "t1".to_string(),
            avatar_url: Some("https://img/g.png".to_string()),
            display_name: Some("Alice G".to_string()),
        }
    }

    #[test]
    fn register_succeeds_with_valid_data() {
        let (store, service) = service();

        let response = service.register(register_request("a@x.com")).unwrap();

        assert_eq!(response.user.email, "a@x.com");
        assert!(response.user.linked.password);
        assert!(!response.access_token.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn register_fails_when_field_missing() {
        let (_, service) = service();
        let request = RegisterRequest {
            username: String::new(),
            ..register_request("a@x.com")
        };

        let result = service.register(request);
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn register_fails_when_confirmation_differs() {
        let (_, service) = service();
        let request = RegisterRequest {
            confirm: "Different123!".to_string(),
            ..register_request("a@x.com")
        };

        assert_eq!(
            service.register(request).unwrap_err(),
            AppError::PasswordMismatch
        );
    }

    #[test]
    fn register_fails_when_password_already_set() {
        let (_, service) = service();
        service.register(register_request("a@x.com")).unwrap();

        let result = service.register(register_request("a@x.com"));
        assert_eq!(result.unwrap_err(), AppError::UserAlreadyExists);
    }

    #[test]
    fn register_adds_password_to_provider_account() {
        let (store, service) = service();
        service
            .sign_in_with_provider(Provider::Google, google_claim("a@x.com"))
            .unwrap();

        let response = service.register(register_request("a@x.com")).unwrap();

        assert!(response.user.linked.password);
        assert!(response.user.linked.google);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn login_succeeds_after_register() {
        let (_, service) = service();
        service.register(register_request("a@x.com")).unwrap();

        let response = service
            .login(&LocalLoginRequest {
                email: "a@x.com".to_string(),
                password: "TestPassword123!".to_string(),
            })
            .unwrap();

        let claims = service
            .jwt_manager()
            .verify_token(&response.access_token)
            .unwrap();
        assert_eq!(claims.sub, response.user.id);
    }

    #[test]
    fn login_fails_with_wrong_password() {
        let (_, service) = service();
        service.register(register_request("a@x.com")).unwrap();

        let result = service.login(&LocalLoginRequest {
            email: "a@x.com".to_string(),
            password: "WrongPassword123!".to_string(),
        });
        assert_eq!(result.unwrap_err(), AppError::BadCredentials);
    }

    #[test]
    fn facebook_then_google_share_one_account() {
        let (store, service) = service();
        let facebook = ProviderClaim {
            profile_id: "f1".to_string(),
            access_token: "ft1".to_string(),
            ..google_claim("a@x.com")
        };

        let first = service
            .sign_in_with_provider(Provider::Facebook, facebook)
            .unwrap();
        let second = service
            .sign_in_with_provider(Provider::Google, google_claim("a@x.com"))
            .unwrap();

        assert_eq!(first.user.id, second.user.id);
        assert!(second.user.linked.facebook && second.user.linked.google);
        assert_eq!(second.user.username, "Alice G");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn provider_claim_without_token_is_rejected() {
        let (store, service) = service();
        let claim = ProviderClaim {
            access_token: String::new(),
            ..google_claim("a@x.com")
        };

        let result = service.sign_in_with_provider(Provider::Google, claim);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn current_user_returns_profile() {
        let (_, service) = service();
        let registered = service.register(register_request("a@x.com")).unwrap();

        let user = service.current_user(registered.user.id).unwrap();
        assert_eq!(user.email, "a@x.com");
    }

    #[test]
    fn current_user_unknown_id_is_not_found() {
        let (_, service) = service();
        let result = service.current_user(Uuid::new_v4());
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn reset_request_for_unknown_email_is_not_found() {
        let (_, service) = service();
        let result = service.request_password_reset("ghost@x.com");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn reset_flow_replaces_password_and_consumes_token() {
        let (store, service) = service();
        service.register(register_request("a@x.com")).unwrap();

        let ticket = service.request_password_reset("a@x.com").unwrap();
        assert_eq!(
            service.check_reset_token(&ticket.token).unwrap().email,
            "a@x.com"
        );

        let request = ResetPasswordRequest {
            password: "BrandNew456!".to_string(),
            confirm: "BrandNew456!".to_string(),
        };
        let updated = service.reset_password(&ticket.token, &request).unwrap();
        assert!(updated.reset_token.is_none());

        assert!(
            service
                .login(&LocalLoginRequest {
                    email: "a@x.com".to_string(),
                    password: "BrandNew456!".to_string(),
                })
                .is_ok()
        );
        assert_eq!(
            service.check_reset_token(&ticket.token).unwrap_err(),
            AppError::InvalidResetToken
        );
        assert!(store.find_by_reset_token(&ticket.token).unwrap().is_none());
    }

    #[test]
    fn reset_link_is_built_from_public_base_url() {
        let store = Arc::new(InMemoryUserStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let service = AuthService::new(
            store,
            JwtManager::new("secret", 1),
            mailer.clone(),
            ResetSettings {
                token_ttl: Duration::minutes(6),
                public_base_url: "https://encore.example/".to_string(),
            },
        );
        service
            .sign_in_with_provider(Provider::Google, google_claim("a@x.com"))
            .unwrap();

        let ticket = service.request_password_reset("a@x.com").unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].1,
            format!("https://encore.example/auth/reset/{}", ticket.token)
        );
    }

    #[test]
    fn expired_reset_token_is_rejected() {
        let (_, service) = service_with_ttl(Duration::zero());
        service.register(register_request("a@x.com")).unwrap();

        let ticket = service.request_password_reset("a@x.com").unwrap();

        assert_eq!(
            service.check_reset_token(&ticket.token).unwrap_err(),
            AppError::InvalidResetToken
        );
    }

    #[test]
    fn reset_with_short_password_is_rejected_before_token_lookup() {
        let (_, service) = service();
        let request = ResetPasswordRequest {
            password: "short".to_string(),
            confirm: "short".to_string(),
        };

        let result = service.reset_password("unknown-token", &request);
        assert!(matches!(result, Err(AppError::WeakPassword(_))));
    }

    /// Un autre inscrit pose son mot de passe juste après notre première lecture.
    #[derive(Default)]
    struct RegisterRaceStore {
        inner: InMemoryUserStore,
        raced: AtomicBool,
    }

    impl UserStore for RegisterRaceStore {
        fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                self.inner.insert(&NewUser {
                    email: email.to_string(),
                    username: "first".to_string(),
                    password_hash: Some(PasswordManager::hash("FirstPass999!").unwrap()),
                    ..Default::default()
                })?;
                return Ok(None);
            }
            self.inner.find_by_email(email)
        }

        fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
            self.inner.find_by_id(id)
        }

        fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
            self.inner.find_by_reset_token(token)
        }

        fn insert(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
            self.inner.insert(new_user)
        }

        fn update(&self, email: &str, changes: &UserChanges) -> Result<User, RepositoryError> {
            self.inner.update(email, changes)
        }

        fn consume_reset_token(
            &self,
            token: &str,
            now: DateTime<Utc>,
            changes: &UserChanges,
        ) -> Result<Option<User>, RepositoryError> {
            self.inner.consume_reset_token(token, now, changes)
        }
    }

    #[test]
    fn register_losing_race_to_another_password_is_rejected() {
        let store = Arc::new(RegisterRaceStore::default());
        let service = AuthService::new(
            store.clone(),
            JwtManager::new("test_secret_for_auth_service", 1),
            Arc::new(RecordingMailer::default()),
            ResetSettings {
                token_ttl: Duration::minutes(6),
                public_base_url: "http://localhost:3000".to_string(),
            },
        );

        let result = service.register(register_request("a@x.com"));

        assert_eq!(result.unwrap_err(), AppError::UserAlreadyExists);
        let stored = store.inner.find_by_email("a@x.com").unwrap().unwrap();
        let stored_hash = stored.password_hash.as_deref().unwrap();
        assert!(PasswordManager::verify("FirstPass999!", stored_hash).unwrap());
    }

    #[test]
    fn reset_token_cannot_be_used_twice() {
        let (_, service) = service();
        service.register(register_request("a@x.com")).unwrap();
        let ticket = service.request_password_reset("a@x.com").unwrap();
        let request = ResetPasswordRequest {
            password: "BrandNew456!".to_string(),
            confirm: "BrandNew456!".to_string(),
        };

        service.reset_password(&ticket.token, &request).unwrap();
        let again = service.reset_password(&ticket.token, &request);

        assert_eq!(again.unwrap_err(), AppError::InvalidResetToken);
    }

    #[test]
    fn concurrent_resets_with_one_token_have_a_single_winner() {
        let (_, service) = service();
        service.register(register_request("a@x.com")).unwrap();
        let ticket = service.request_password_reset("a@x.com").unwrap();

        let results: Vec<Result<User, AppError>> = thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let service = &service;
                    let token = ticket.token.as_str();
                    s.spawn(move || {
                        let password = format!("Concurrent{i}Pass!");
                        service.reset_password(
                            token,
                            &ResetPasswordRequest {
                                confirm: password.clone(),
                                password,
                            },
                        )
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| *e == AppError::InvalidResetToken)
        );
    }
}
