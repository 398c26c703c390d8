//! Credit balance: periodic refill and post-success charging.

use std::sync::Arc;

use cache_store::CacheStore;
use database::{account, Account, Database, NewAccount};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::Result;
use crate::profile::write_snapshot;

/// Credits granted on every refill.
pub const REFILL_AMOUNT: i64 = database::models::DEFAULT_CREDITS;

/// Time between refills.
pub const REFILL_PERIOD_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Owns `credits` and `credit_refill_date` for every account.
///
/// Each mutation is one conditional SQL statement, followed by a profile
/// snapshot write built from the row that statement returned.
#[derive(Clone)]
pub struct CreditLedger {
    db: Database,
    cache: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
}

impl CreditLedger {
    pub fn new(db: Database, cache: Arc<dyn CacheStore>, clock: Arc<dyn Clock>) -> Self {
        Self { db, cache, clock }
    }

    /// Create an account with a full balance, due for refill one period from now.
    pub async fn open_account(&self, new: &NewAccount) -> Result<Account> {
        let refill_at = self.clock.now_ms() + REFILL_PERIOD_MS;
        let created = account::create_account(self.db.pool(), new, refill_at).await?;
        info!(account_id = %created.id, "Account opened");
        write_snapshot(self.cache.as_ref(), &created).await?;
        Ok(created)
    }

    /// Load the current account row.
    pub async fn load(&self, account_id: &str) -> Result<Account> {
        Ok(account::get_account(self.db.pool(), account_id).await?)
    }

    /// Reset the balance if the refill date has passed.
    ///
    /// Returns the account unchanged when nothing is due. When another
    /// request refilled first, returns the row it left behind.
    pub async fn refill_if_due(&self, account: Account) -> Result<Account> {
        let now = self.clock.now_ms();
        if now <= account.credit_refill_date {
            return Ok(account);
        }

        let refilled = account::refill_credits_if_due(
            self.db.pool(),
            &account.id,
            now,
            now + REFILL_PERIOD_MS,
            REFILL_AMOUNT,
        )
        .await?;

        match refilled {
            Some(refilled) => {
                info!(
                    account_id = %refilled.id,
                    credits = refilled.credits,
                    next_refill = refilled.credit_refill_date,
                    "Credits refilled"
                );
                write_snapshot(self.cache.as_ref(), &refilled).await?;
                Ok(refilled)
            }
            None => {
                debug!(account_id = %account.id, "Refill already applied");
                self.load(&account.id).await
            }
        }
    }

    /// Take one credit. No balance check; callers charge only after success.
    pub async fn charge_one(&self, account_id: &str) -> Result<Account> {
        let charged = account::charge_one(self.db.pool(), account_id).await?;
        info!(account_id, credits = charged.credits, "Charged one credit");
        write_snapshot(self.cache.as_ref(), &charged).await?;
        Ok(charged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::profile::ProfileSnapshot;
    use cache_store::{keys, CacheStoreExt, EntryKind, InMemoryCacheStore};

    const NOW: i64 = 1_700_000_000_000;

    async fn setup() -> (CreditLedger, Arc<InMemoryCacheStore>, Arc<ManualClock>, Database) {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let cache = Arc::new(InMemoryCacheStore::new());
        let clock = Arc::new(ManualClock::new(NOW));
        let ledger = CreditLedger::new(db.clone(), cache.clone(), clock.clone());
        (ledger, cache, clock, db)
    }

    async fn cached(cache: &InMemoryCacheStore, id: &str) -> ProfileSnapshot {
        cache
            .read_as(&keys::profile(id), EntryKind::Profile)
            .await
            .unwrap()
            .expect("snapshot cached")
    }

    #[tokio::test]
    async fn test_open_account_caches_snapshot() {
        let (ledger, cache, _clock, _db) = setup().await;

        let created = ledger
            .open_account(&NewAccount::new("a1", "Ada Lovelace", "ada@example.com"))
            .await
            .unwrap();
        assert_eq!(created.credits, 50);
        assert_eq!(created.credit_refill_date, NOW + REFILL_PERIOD_MS);
        assert_eq!(cached(&cache, "a1").await.credits, 50);
    }

    #[tokio::test]
    async fn test_refill_not_due_is_unchanged() {
        let (ledger, _cache, _clock, _db) = setup().await;
        let account = ledger
            .open_account(&NewAccount::new("a1", "Ada Lovelace", "ada@example.com"))
            .await
            .unwrap();

        let same = ledger.refill_if_due(account.clone()).await.unwrap();
        assert_eq!(same, account);
    }

    #[tokio::test]
    async fn test_refill_is_idempotent() {
        let (ledger, cache, clock, db) = setup().await;
        ledger
            .open_account(&NewAccount::new("a1", "Ada Lovelace", "ada@example.com"))
            .await
            .unwrap();
        sqlx_set_credits(&db, "a1", 2).await;

        clock.advance(REFILL_PERIOD_MS + 1);
        let account = ledger.load("a1").await.unwrap();

        let first = ledger.refill_if_due(account).await.unwrap();
        assert_eq!(first.credits, 50);
        assert_eq!(first.credit_refill_date, clock.now_ms() + REFILL_PERIOD_MS);
        assert_eq!(cached(&cache, "a1").await.credits, 50);

        // Spend one, then refill again without time passing: no-op.
        ledger.charge_one("a1").await.unwrap();
        let reloaded = ledger.load("a1").await.unwrap();
        let second = ledger.refill_if_due(reloaded.clone()).await.unwrap();
        assert_eq!(second, reloaded);
        assert_eq!(second.credits, 49);
    }

    #[tokio::test]
    async fn test_stale_copy_does_not_refill_twice() {
        let (ledger, _cache, clock, _db) = setup().await;
        ledger
            .open_account(&NewAccount::new("a1", "Ada Lovelace", "ada@example.com"))
            .await
            .unwrap();
        clock.advance(REFILL_PERIOD_MS + 1);

        // Two requests loaded the account before either refilled.
        let copy_a = ledger.load("a1").await.unwrap();
        let copy_b = copy_a.clone();

        ledger.refill_if_due(copy_a).await.unwrap();
        ledger.charge_one("a1").await.unwrap();

        let after_b = ledger.refill_if_due(copy_b).await.unwrap();
        assert_eq!(after_b.credits, 49);
    }

    #[tokio::test]
    async fn test_charge_updates_snapshot() {
        let (ledger, cache, _clock, _db) = setup().await;
        ledger
            .open_account(&NewAccount::new("a1", "Ada Lovelace", "ada@example.com"))
            .await
            .unwrap();

        let charged = ledger.charge_one("a1").await.unwrap();
        assert_eq!(charged.credits, 49);
        assert_eq!(cached(&cache, "a1").await.credits, 49);
    }

    #[tokio::test]
    async fn test_charge_unknown_account() {
        let (ledger, _cache, _clock, _db) = setup().await;
        let err = ledger.charge_one("ghost").await.unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::NotFound);
    }

    async fn sqlx_set_credits(db: &Database, id: &str, credits: i64) {
        sqlx::query("UPDATE accounts SET credits = ? WHERE id = ?")
            .bind(credits)
            .bind(id)
            .execute(db.pool())
            .await
            .unwrap();
    }
}
