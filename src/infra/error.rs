use thiserror::Error;

/// Startup-time infrastructure failures. Anything here aborts boot with a
/// hint pointing at the misconfigured dependency.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database connection failed. Check DATABASE_URL and ensure the database is running.")]
    DatabaseConnection(#[source] sqlx::Error),

    #[error("Redis connection failed. Check REDIS_URL and credentials.")]
    RedisConnection(#[source] redis::RedisError),

    #[error("TCP bind failed")]
    TcpBind(#[source] std::io::Error),
}

impl From<sqlx::Error> for InfraError {
    fn from(value: sqlx::Error) -> Self {
        InfraError::DatabaseConnection(value)
    }
}

impl From<redis::RedisError> for InfraError {
    fn from(value: redis::RedisError) -> Self {
        InfraError::RedisConnection(value)
    }
}
