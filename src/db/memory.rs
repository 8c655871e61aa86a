// Store en mémoire: HashMap indexée par email derrière un Mutex.
// Même contrat que le dépôt PostgreSQL (unicité de l'email comprise);
// les données sont perdues à l'arrêt du processus.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::error::RepositoryError;
use crate::db::models::user::{NewUser, User, UserChanges};
use crate::db::store::UserStore;

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> Result<MutexGuard<'_, HashMap<String, User>>, RepositoryError> {
        self.users
            .lock()
            .map_err(|_| RepositoryError::PoolError("in-memory store lock poisoned".to_string()))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.users().map(|users| users.len()).unwrap_or(0)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.users()?.get(email).cloned())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.users()?.values().find(|u| u.id == id).cloned())
    }

    fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users()?
            .values()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    fn insert(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let mut users = self.users()?;
        if users.contains_key(&new_user.email) {
            return Err(RepositoryError::UniqueViolation(format!(
                "duplicate key value violates unique constraint \"users_email_key\" ({})",
                new_user.email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            username: new_user.username.clone(),
            password_hash: new_user.password_hash.clone(),
            google_profile_id: new_user.google_profile_id.clone(),
            google_access_token: new_user.google_access_token.clone(),
            facebook_profile_id: new_user.facebook_profile_id.clone(),
            facebook_access_token: new_user.facebook_access_token.clone(),
            avatar_url: new_user.avatar_url.clone(),
            reset_token: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    fn update(&self, email: &str, changes: &UserChanges) -> Result<User, RepositoryError> {
        let mut users = self.users()?;
        let user = users
            .get_mut(email)
            .ok_or_else(|| RepositoryError::NotFound("Record not found".to_string()))?;
        changes.apply_to(user);
        Ok(user.clone())
    }

    fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
        changes: &UserChanges,
    ) -> Result<Option<User>, RepositoryError> {
        let mut users = self.users()?;
        let Some(user) = users.values_mut().find(|u| {
            u.reset_token.as_deref() == Some(token)
                && u.reset_token_expires_at.is_some_and(|expires| expires > now)
        }) else {
            return Ok(None);
        };
        changes.apply_to(user);
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: "alice".to_string(),
            password_hash: Some("h1".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn insert_then_find_by_email_and_id() {
        let store = InMemoryUserStore::new();
        let created = store.insert(&new_user("a@x.com")).unwrap();

        assert_eq!(store.find_by_email("a@x.com").unwrap(), Some(created.clone()));
        assert_eq!(store.find_by_id(created.id).unwrap(), Some(created));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn insert_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        store.insert(&new_user("a@x.com")).unwrap();

        let result = store.insert(&new_user("a@x.com"));
        assert!(matches!(result, Err(RepositoryError::UniqueViolation(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_unknown_email_is_not_found() {
        let store = InMemoryUserStore::new();
        let result = store.update("missing@x.com", &UserChanges::default());
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[test]
    fn find_by_reset_token_matches_only_that_token() {
        let store = InMemoryUserStore::new();
        store.insert(&new_user("a@x.com")).unwrap();
        store
            .update(
                "a@x.com",
                &UserChanges {
                    reset_token: Some(Some("tok-1".to_string())),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(store.find_by_reset_token("tok-1").unwrap().is_some());
        assert!(store.find_by_reset_token("tok-2").unwrap().is_none());
    }

    #[test]
    fn reset_token_is_consumed_only_once() {
        let store = InMemoryUserStore::new();
        store.insert(&new_user("a@x.com")).unwrap();
        let now = Utc::now();
        store
            .update(
                "a@x.com",
                &UserChanges {
                    reset_token: Some(Some("tok-1".to_string())),
                    reset_token_expires_at: Some(Some(now + chrono::Duration::minutes(6))),
                    ..Default::default()
                },
            )
            .unwrap();
        let clear = UserChanges {
            password_hash: Some("h2".to_string()),
            reset_token: Some(None),
            reset_token_expires_at: Some(None),
            ..Default::default()
        };

        let first = store.consume_reset_token("tok-1", now, &clear).unwrap();
        let second = store.consume_reset_token("tok-1", now, &clear).unwrap();

        assert_eq!(first.unwrap().password_hash.as_deref(), Some("h2"));
        assert!(second.is_none());
    }

    #[test]
    fn expired_reset_token_is_not_consumed() {
        let store = InMemoryUserStore::new();
        store.insert(&new_user("a@x.com")).unwrap();
        let now = Utc::now();
        store
            .update(
                "a@x.com",
                &UserChanges {
                    reset_token: Some(Some("tok-1".to_string())),
                    reset_token_expires_at: Some(Some(now)),
                    ..Default::default()
                },
            )
            .unwrap();

        let result = store
            .consume_reset_token("tok-1", now, &UserChanges::default())
            .unwrap();
        assert!(result.is_none());
        assert_eq!(
            store.find_by_email("a@x.com").unwrap().unwrap().password_hash.as_deref(),
            Some("h1")
        );
    }
}
