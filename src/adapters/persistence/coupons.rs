use async_trait::async_trait;
use sqlx::Row;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::coupons::CouponRepoTrait,
    domain::entities::coupon::{CouponRule, CouponSource, DiscountKind},
};

const GENERAL_COLS: &str = "code, kind, value_cents, starts_at, ends_at, plan, billing, \
     min_order_cents, max_uses, uses";

const GIFT_COLS: &str = "code, kind, value_cents, starts_at, ends_at, plan, billing, \
     min_order_cents, max_uses, uses, discord_id";

fn row_to_rule(
    row: &sqlx::postgres::PgRow,
    source: CouponSource,
    owner_discord_id: Option<String>,
) -> AppResult<CouponRule> {
    let code: String = row.get("code");
    let kind: String = row.get("kind");
    let value_cents: i64 = row.get("value_cents");

    let discount = DiscountKind::from_parts(&kind, value_cents)
        .map_err(|e| AppError::Database(format!("Coupon {code}: {e}")))?;

    // Restriction columns are free text; unknown values disable the
    // restriction rather than breaking every lookup.
    let plan = row
        .get::<Option<String>, _>("plan")
        .and_then(|p| match p.parse() {
            Ok(plan) => Some(plan),
            Err(_) => {
                tracing::warn!(code = %code, plan = %p, "Ignoring unknown plan restriction");
                None
            }
        });
    let billing = row
        .get::<Option<String>, _>("billing")
        .and_then(|b| match b.parse() {
            Ok(billing) => Some(billing),
            Err(_) => {
                tracing::warn!(code = %code, billing = %b, "Ignoring unknown billing restriction");
                None
            }
        });

    let max_uses: Option<i64> = row.get("max_uses");
    let uses: i64 = row.get("uses");

    Ok(CouponRule {
        code,
        source,
        discount,
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        plan,
        billing,
        min_order_cents: row.get("min_order_cents"),
        remaining_uses: max_uses.map(|max| max - uses),
        owner_discord_id,
    })
}

#[async_trait]
impl CouponRepoTrait for PostgresPersistence {
    async fn find_general(&self, code: &str) -> AppResult<Option<CouponRule>> {
        let row = sqlx::query(&format!(
            "SELECT {GENERAL_COLS} FROM coupons WHERE LOWER(code) = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        row.map(|r| row_to_rule(&r, CouponSource::General, None))
            .transpose()
    }

    async fn find_gift(&self, code: &str) -> AppResult<Option<CouponRule>> {
        let row = sqlx::query(&format!(
            "SELECT {GIFT_COLS} FROM gift_coupons WHERE LOWER(code) = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        row.map(|r| {
            let owner: String = r.get("discord_id");
            row_to_rule(&r, CouponSource::Gift, Some(owner))
        })
        .transpose()
    }

    async fn claim_general(&self, code: &str) -> AppResult<bool> {
        // Usage-cap atomicity is enforced server-side by the SQL function.
        let claimed: bool = sqlx::query_scalar("SELECT claim_coupon($1)")
            .bind(code)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(claimed)
    }

    async fn claim_gift(&self, code: &str, discord_id: &str) -> AppResult<bool> {
        let claimed: bool = sqlx::query_scalar("SELECT claim_gift_coupon($1, $2)")
            .bind(code)
            .bind(discord_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(claimed)
    }
}
