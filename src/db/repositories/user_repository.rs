use crate::db::error::RepositoryError;
use crate::db::models::user::{NewUser, User, UserChanges};
use crate::db::schema::users;
use crate::db::store::UserStore;
use crate::db::{DbConnection, DbPool};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// `UserStore` adossé à PostgreSQL via diesel.
/// L'unicité de l'email est portée par l'index unique `users_email_key`.
#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn connection(&self) -> Result<DbConnection, RepositoryError> {
        self.pool.get().map_err(Into::into)
    }

    /// Supprimer un utilisateur (nettoyage des tests d'intégration)
    #[cfg(test)]
    pub fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut conn = self.connection()?;
        diesel::delete(users::table.filter(users::id.eq(id))).execute(&mut conn)?;
        Ok(())
    }
}

impl UserStore for UserRepository {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.connection()?;

        users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(&mut conn)
            .optional()
            .map_err(Into::into)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.connection()?;

        users::table
            .filter(users::id.eq(id))
            .select(User::as_select())
            .first(&mut conn)
            .optional()
            .map_err(Into::into)
    }

    fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.connection()?;

        users::table
            .filter(users::reset_token.eq(token))
            .select(User::as_select())
            .first(&mut conn)
            .optional()
            .map_err(Into::into)
    }

    fn insert(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let mut conn = self.connection()?;

        diesel::insert_into(users::table)
            .values(new_user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .map_err(Into::into)
    }

    fn update(&self, email: &str, changes: &UserChanges) -> Result<User, RepositoryError> {
        let mut conn = self.connection()?;

        diesel::update(users::table.filter(users::email.eq(email)))
            .set(changes)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .map_err(Into::into)
    }

    fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
        changes: &UserChanges,
    ) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.connection()?;

        // Un seul UPDATE ... WHERE: PostgreSQL sérialise les écritures concurrentes
        diesel::update(
            users::table
                .filter(users::reset_token.eq(token))
                .filter(users::reset_token_expires_at.gt(now)),
        )
        .set(changes)
        .returning(User::as_returning())
        .get_result(&mut conn)
        .optional()
        .map_err(Into::into)
    }
}
