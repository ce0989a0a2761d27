//! Helpers for integration tests.

#![allow(dead_code)]

use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use pushkind_common::db::{DbPool, establish_connection_pool};
use pushkind_inventory::domain::product::{NewProduct, Product};
use pushkind_inventory::domain::store::{NewStore, Store};
use pushkind_inventory::domain::user::{NewUser, User};
use pushkind_inventory::repository::{DieselRepository, ProductWriter, StoreWriter, UserWriter};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!(); // assumes migrations/ exists

pub const HUB_ID: i32 = 1;

/// Temporary database used in integration tests.
pub struct TestDb {
    filename: String,
    pool: DbPool,
}

impl TestDb {
    pub fn new(filename: &str) -> Self {
        std::fs::remove_file(filename).ok(); // Clean up old DB

        let pool =
            establish_connection_pool(filename).expect("Failed to establish SQLite connection.");
        let mut conn = pool
            .get()
            .expect("Failed to get SQLite connection from pool.");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Migrations failed");
        TestDb {
            filename: filename.to_string(),
            pool,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        std::fs::remove_file(&self.filename).ok();
        std::fs::remove_file(format!("{}-shm", &self.filename)).ok();
        std::fs::remove_file(format!("{}-wal", &self.filename)).ok();
    }
}

pub fn store(repo: &DieselRepository, name: &str) -> Store {
    repo.create_store(&NewStore::new(HUB_ID, name))
        .expect("create store")
}

/// Product counted in bottles, twelve to a case.
pub fn product(repo: &DieselRepository, name: &str) -> Product {
    repo.create_product(
        &NewProduct::new(HUB_ID, name, "case")
            .with_split("bottle", 12)
            .with_min_stock_level(10),
    )
    .expect("create product")
}

pub fn user(repo: &DieselRepository, name: &str, role_level: i32, stores: Vec<i32>) -> User {
    repo.create_user(
        &NewUser::new(HUB_ID, name, format!("{name}@example.com"))
            .with_role_level(role_level)
            .with_allowed_stores(stores),
    )
    .expect("create user")
}
