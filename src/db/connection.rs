use super::DbPool;
use anyhow::{Result, anyhow};
use diesel::PgConnection;
use diesel::r2d2::ConnectionManager;

pub const POOL_MAX_SIZE: u32 = 5;

/// Construit le pool de connexions PostgreSQL
pub fn create_pool(database_url: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);

    diesel::r2d2::Pool::builder()
        .max_size(POOL_MAX_SIZE)
        .build(manager)
        .map_err(|e| anyhow!("Failed to create database pool: {e}"))
}

#[cfg(test)]
pub fn test_pool() -> DbPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    create_pool(&database_url).expect("Failed to create test pool")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "requires a running PostgreSQL reachable through DATABASE_URL"]
    fn create_pool_uses_configured_max_size() {
        let pool = test_pool();
        assert_eq!(pool.max_size(), POOL_MAX_SIZE);
    }
}
