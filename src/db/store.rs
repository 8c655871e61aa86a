use chrono::{DateTime, Utc};

use crate::db::error::RepositoryError;
use crate::db::models::user::{NewUser, User, UserChanges};
use uuid::Uuid;

/// Persistance des comptes utilisateurs, indexés par email.
///
/// Les implémentations doivent garantir l'unicité de l'email: un `insert`
/// concurrent sur un email déjà présent échoue avec
/// [`RepositoryError::UniqueViolation`].
pub trait UserStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;

    fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepositoryError>;

    fn insert(&self, new_user: &NewUser) -> Result<User, RepositoryError>;

    /// Met à jour l'utilisateur identifié par `email` et retourne l'état persisté.
    /// Échoue avec `NotFound` si aucun compte ne correspond.
    fn update(&self, email: &str, changes: &UserChanges) -> Result<User, RepositoryError>;

    /// Applique `changes` au compte dont le jeton vaut `token` et expire après `now`,
    /// en une seule opération atomique. `None` si aucun compte ne correspond
    /// (jeton inconnu, expiré ou déjà consommé).
    fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
        changes: &UserChanges,
    ) -> Result<Option<User>, RepositoryError>;
}
