use async_trait::async_trait;
use sqlx::Row;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::auth::{DiscordUserProfile, DiscordUserRepo},
};

const USER_COLS: &str = "discord_id, username, global_name, avatar, email, created_at, updated_at";

fn row_to_profile(row: sqlx::postgres::PgRow) -> DiscordUserProfile {
    DiscordUserProfile {
        discord_id: row.get("discord_id"),
        username: row.get("username"),
        global_name: row.get("global_name"),
        avatar: row.get("avatar"),
        email: row.get("email"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl DiscordUserRepo for PostgresPersistence {
    async fn upsert(&self, profile: &DiscordUserProfile) -> AppResult<DiscordUserProfile> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO discord_users (discord_id, username, global_name, avatar, email)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (discord_id) DO UPDATE SET
                username = EXCLUDED.username,
                global_name = EXCLUDED.global_name,
                avatar = EXCLUDED.avatar,
                email = COALESCE(EXCLUDED.email, discord_users.email),
                updated_at = CURRENT_TIMESTAMP
            RETURNING {USER_COLS}
            "#
        ))
        .bind(&profile.discord_id)
        .bind(&profile.username)
        .bind(&profile.global_name)
        .bind(&profile.avatar)
        .bind(&profile.email)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_profile(row))
    }

    async fn get(&self, discord_id: &str) -> AppResult<Option<DiscordUserProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLS} FROM discord_users WHERE discord_id = $1"
        ))
        .bind(discord_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_profile))
    }

    async fn has_dev_permission(&self, discord_id: &str) -> AppResult<bool> {
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM dev_permission WHERE discord_id = $1")
                .bind(discord_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(AppError::from)?;

        Ok(exists.is_some())
    }
}
