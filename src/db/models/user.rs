use crate::db::schema::users;
use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable, Queryable, Selectable};
use encore_auth_api::{LinkedCredentials, UserResponse};
use uuid::Uuid;

#[derive(Insertable, Debug, Clone, Default)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: Option<String>,
    pub google_profile_id: Option<String>,
    pub google_access_token: Option<String>,
    pub facebook_profile_id: Option<String>,
    pub facebook_access_token: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: Option<String>,
    pub google_profile_id: Option<String>,
    pub google_access_token: Option<String>,
    pub facebook_profile_id: Option<String>,
    pub facebook_access_token: Option<String>,
    pub avatar_url: Option<String>,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn linked(&self) -> LinkedCredentials {
        LinkedCredentials {
            password: self.password_hash.is_some(),
            google: self.google_profile_id.is_some(),
            facebook: self.facebook_profile_id.is_some(),
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            linked: user.linked(),
            id: user.id,
            email: user.email,
            username: user.username,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
        }
    }
}

/// Mise à jour partielle d'un utilisateur: `None` laisse la colonne intacte.
/// Les champs du reset sont doublement optionnels pour pouvoir les remettre à NULL.
#[derive(AsChangeset, Debug, Clone, Default, PartialEq, Eq)]
#[diesel(table_name = users)]
pub struct UserChanges {
    pub password_hash: Option<String>,
    pub google_profile_id: Option<String>,
    pub google_access_token: Option<String>,
    pub facebook_profile_id: Option<String>,
    pub facebook_access_token: Option<String>,
    pub avatar_url: Option<String>,
    pub reset_token: Option<Option<String>>,
    pub reset_token_expires_at: Option<Option<DateTime<Utc>>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserChanges {
    /// Applique les changements sur un enregistrement déjà chargé,
    /// avec la même sémantique que l'UPDATE SQL.
    pub fn apply_to(&self, user: &mut User) {
        fn fill<T: Clone>(target: &mut Option<T>, value: Option<&T>) {
            if let Some(v) = value {
                *target = Some(v.clone());
            }
        }

        fn replace<T: Clone>(target: &mut T, value: Option<&T>) {
            if let Some(v) = value {
                target.clone_from(v);
            }
        }

        fill(&mut user.password_hash, self.password_hash.as_ref());
        fill(&mut user.google_profile_id, self.google_profile_id.as_ref());
        fill(&mut user.google_access_token, self.google_access_token.as_ref());
        fill(&mut user.facebook_profile_id, self.facebook_profile_id.as_ref());
        fill(
            &mut user.facebook_access_token,
            self.facebook_access_token.as_ref(),
        );
        fill(&mut user.avatar_url, self.avatar_url.as_ref());
        replace(&mut user.reset_token, self.reset_token.as_ref());
        replace(
            &mut user.reset_token_expires_at,
            self.reset_token_expires_at.as_ref(),
        );
        replace(&mut user.updated_at, self.updated_at.as_ref());
    }
}
