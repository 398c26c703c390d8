//! Account operations.
//!
//! Balance mutations are single statements with `RETURNING`, so callers get
//! the post-update row without a second read that could interleave with
//! another request.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Account, NewAccount, DEFAULT_CREDITS};

const ACCOUNT_COLUMNS: &str = "id, fullname, email, avatar, plan, role, credits, \
     credit_refill_date, enable_ai_analysis, created_at, updated_at";

fn not_found(id: &str) -> DatabaseError {
    DatabaseError::NotFound {
        entity: "Account",
        id: id.to_string(),
    }
}

/// Create a new account with the default credit balance.
pub async fn create_account(
    pool: &SqlitePool,
    account: &NewAccount,
    credit_refill_date: i64,
) -> Result<Account> {
    let sql = format!(
        r#"
        INSERT INTO accounts (id, fullname, email, avatar, plan, role, credits, credit_refill_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {ACCOUNT_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Account>(&sql)
        .bind(&account.id)
        .bind(&account.fullname)
        .bind(&account.email)
        .bind(&account.avatar)
        .bind(&account.plan)
        .bind(&account.role)
        .bind(DEFAULT_CREDITS)
        .bind(credit_refill_date)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return DatabaseError::AlreadyExists {
                        entity: "Account",
                        id: account.email.clone(),
                    };
                }
            }
            DatabaseError::Sqlx(e)
        })
}

/// Get an account by ID.
pub async fn get_account(pool: &SqlitePool, id: &str) -> Result<Account> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?");

    sqlx::query_as::<_, Account>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Check whether an account exists.
pub async fn account_exists(pool: &SqlitePool, id: &str) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM accounts WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Reset the balance when the refill date has passed.
///
/// The update only applies while the stored refill date is still before
/// `now_ms`, so of two concurrent callers exactly one refills. Returns
/// `None` when nothing was due (or another caller got there first).
pub async fn refill_credits_if_due(
    pool: &SqlitePool,
    id: &str,
    now_ms: i64,
    next_refill_ms: i64,
    amount: i64,
) -> Result<Option<Account>> {
    let sql = format!(
        r#"
        UPDATE accounts
        SET credits = ?,
            credit_refill_date = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND credit_refill_date < ?
        RETURNING {ACCOUNT_COLUMNS}
        "#
    );

    let account = sqlx::query_as::<_, Account>(&sql)
        .bind(amount)
        .bind(next_refill_ms)
        .bind(id)
        .bind(now_ms)
        .fetch_optional(pool)
        .await?;

    Ok(account)
}

/// Decrement the balance by one. No balance check is performed.
pub async fn charge_one(pool: &SqlitePool, id: &str) -> Result<Account> {
    let sql = format!(
        r#"
        UPDATE accounts
        SET credits = credits - 1,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        RETURNING {ACCOUNT_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Account>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Flip the AI analysis switch.
pub async fn toggle_ai_analysis(pool: &SqlitePool, id: &str) -> Result<Account> {
    let sql = format!(
        r#"
        UPDATE accounts
        SET enable_ai_analysis = NOT enable_ai_analysis,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        RETURNING {ACCOUNT_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Account>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Replace the display name and avatar.
pub async fn update_profile(
    pool: &SqlitePool,
    id: &str,
    fullname: &str,
    avatar: &str,
) -> Result<Account> {
    let sql = format!(
        r#"
        UPDATE accounts
        SET fullname = ?,
            avatar = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        RETURNING {ACCOUNT_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Account>(&sql)
        .bind(fullname)
        .bind(avatar)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Delete an account by ID. Saved analyses go with it.
pub async fn delete_account(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }

    Ok(())
}
