pub mod database;
pub mod kol_repository;
pub mod seed;

use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct Repository {
    pub pool: Arc<SqlitePool>,
    pub kols: kol_repository::KolRepository,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        let pool = Arc::new(pool);
        Self {
            kols: kol_repository::KolRepository::new(pool.clone()),
            pool,
        }
    }
}
