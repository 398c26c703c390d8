//! Fixed-window rate-limit counters.
//!
//! Each function is one conditional statement. A caller walks them in order
//! (reset, increment, insert) and stops at the first that reports a change;
//! if none does, the identity is over its limit.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{RateLimitRecord, RateLimitScope};

/// Start a fresh window if the current one began before `cutoff_ms`.
pub async fn reset_if_expired(
    pool: &SqlitePool,
    scope: RateLimitScope,
    identity: &str,
    now_ms: i64,
    cutoff_ms: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE rate_limits
        SET window_start = ?, count = 1
        WHERE scope = ? AND identity = ? AND window_start < ?
        "#,
    )
    .bind(now_ms)
    .bind(scope.as_str())
    .bind(identity)
    .bind(cutoff_ms)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Count one more request in a live window that is still under `limit`.
pub async fn increment_if_under_limit(
    pool: &SqlitePool,
    scope: RateLimitScope,
    identity: &str,
    cutoff_ms: i64,
    limit: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE rate_limits
        SET count = count + 1
        WHERE scope = ? AND identity = ? AND window_start >= ? AND count < ?
        "#,
    )
    .bind(scope.as_str())
    .bind(identity)
    .bind(cutoff_ms)
    .bind(limit)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Create the first record for an identity. False if one already exists.
pub async fn insert_if_absent(
    pool: &SqlitePool,
    scope: RateLimitScope,
    identity: &str,
    now_ms: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO rate_limits (scope, identity, window_start, count)
        VALUES (?, ?, ?, 1)
        ON CONFLICT (scope, identity) DO NOTHING
        "#,
    )
    .bind(scope.as_str())
    .bind(identity)
    .bind(now_ms)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Get the counter for an identity, if any.
pub async fn get_record(
    pool: &SqlitePool,
    scope: RateLimitScope,
    identity: &str,
) -> Result<Option<RateLimitRecord>> {
    let record = sqlx::query_as::<_, RateLimitRecord>(
        r#"
        SELECT scope, identity, window_start, count
        FROM rate_limits
        WHERE scope = ? AND identity = ?
        "#,
    )
    .bind(scope.as_str())
    .bind(identity)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Delete records whose window started before `before_ms`.
pub async fn prune_older_than(pool: &SqlitePool, before_ms: i64) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM rate_limits
        WHERE window_start < ?
        "#,
    )
    .bind(before_ms)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_insert_then_increment() {
        let db = test_db().await;
        let pool = db.pool();

        assert!(insert_if_absent(pool, RateLimitScope::Ip, "1.2.3.4", 100).await.unwrap());
        assert!(!insert_if_absent(pool, RateLimitScope::Ip, "1.2.3.4", 200).await.unwrap());

        assert!(increment_if_under_limit(pool, RateLimitScope::Ip, "1.2.3.4", 0, 2).await.unwrap());
        // count is now 2, limit 2
        assert!(!increment_if_under_limit(pool, RateLimitScope::Ip, "1.2.3.4", 0, 2).await.unwrap());

        let record = get_record(pool, RateLimitScope::Ip, "1.2.3.4").await.unwrap().unwrap();
        assert_eq!(record.count, 2);
        assert_eq!(record.window_start, 100);
    }

    #[tokio::test]
    async fn test_scopes_are_separate() {
        let db = test_db().await;
        let pool = db.pool();

        insert_if_absent(pool, RateLimitScope::Ip, "same", 100).await.unwrap();
        assert!(get_record(pool, RateLimitScope::User, "same").await.unwrap().is_none());
        assert!(insert_if_absent(pool, RateLimitScope::User, "same", 100).await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_only_when_expired() {
        let db = test_db().await;
        let pool = db.pool();

        insert_if_absent(pool, RateLimitScope::User, "u1", 1_000).await.unwrap();
        assert!(!reset_if_expired(pool, RateLimitScope::User, "u1", 1_500, 1_000).await.unwrap());
        assert!(reset_if_expired(pool, RateLimitScope::User, "u1", 70_000, 10_000).await.unwrap());

        let record = get_record(pool, RateLimitScope::User, "u1").await.unwrap().unwrap();
        assert_eq!(record.window_start, 70_000);
        assert_eq!(record.count, 1);
    }

    #[tokio::test]
    async fn test_prune_older_than() {
        let db = test_db().await;
        let pool = db.pool();

        insert_if_absent(pool, RateLimitScope::Ip, "old", 10).await.unwrap();
        insert_if_absent(pool, RateLimitScope::Ip, "new", 5_000).await.unwrap();

        assert_eq!(prune_older_than(pool, 1_000).await.unwrap(), 1);
        assert!(get_record(pool, RateLimitScope::Ip, "old").await.unwrap().is_none());
        assert!(get_record(pool, RateLimitScope::Ip, "new").await.unwrap().is_some());
    }
}
