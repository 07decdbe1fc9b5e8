use sqlx::PgPool;

pub mod coupons;
pub mod discord_users;
pub mod plan_features;

/// Shared sqlx-backed persistence. Repo traits from the use-case layer
/// are all implemented on this one struct.
#[derive(Clone)]
pub struct PostgresPersistence {
    pub pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
