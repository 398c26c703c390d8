//! Fixed-window rate limiting over persistent counters.
//!
//! A request is allowed when one of these conditional statements changes a
//! row, tried in order:
//!
//! 1. reset a window that started before `now - window`
//! 2. increment a live window whose count is under the limit
//! 3. insert a first record
//! 4. increment again, for a record another request inserted after step 2
//!
//! When none applies the identity has used up its window. No step reads a
//! count and writes it back, so concurrent requests cannot push the count
//! past the limit.

use std::net::{IpAddr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

use database::{rate_limit, Database, RateLimitScope};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::error::Result;

/// Limit and window for one class of routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub scope: RateLimitScope,
    pub limit: i64,
    pub window_ms: i64,
}

impl Policy {
    pub const fn per_ip(limit: i64, window_ms: i64) -> Self {
        Self {
            scope: RateLimitScope::Ip,
            limit,
            window_ms,
        }
    }

    pub const fn per_user(limit: i64, window_ms: i64) -> Self {
        Self {
            scope: RateLimitScope::User,
            limit,
            window_ms,
        }
    }

    /// Signup and login, per IP.
    pub const AUTH_IP: Policy = Policy::per_ip(5, 60_000);

    /// OAuth entry points, per IP.
    pub const OAUTH_IP: Policy = Policy::per_ip(20, 60_000);

    /// Analysis, save, get, delete, toggle and profile edit, per user.
    pub const USER_ACTION: Policy = Policy::per_user(30, 60_000);

    /// Logout, per user.
    pub const USER_LOGOUT: Policy = Policy::per_user(20, 60_000);
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// Collapse IPv4-mapped IPv6 (`::ffff:a.b.c.d`) to `a.b.c.d`.
///
/// Anything that does not parse as an IP address is returned trimmed.
pub fn normalize_ip(raw: &str) -> String {
    let raw = raw.trim();
    match raw.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        Ok(IpAddr::V4(v4)) => v4.to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Whether `raw` is an IPv4-mapped IPv6 address.
pub fn is_ipv4_mapped(raw: &str) -> bool {
    raw.trim()
        .parse::<Ipv6Addr>()
        .map(|v6| v6.to_ipv4_mapped().is_some())
        .unwrap_or(false)
}

/// Answers allow/deny per identity and policy.
#[derive(Clone)]
pub struct RateLimiter {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Count one request from `identity` against `policy`.
    ///
    /// Persistence failures are returned as errors, never as a decision.
    pub async fn allow(&self, identity: &str, policy: &Policy) -> Result<Decision> {
        let pool = self.db.pool();
        let now = self.clock.now_ms();
        let cutoff = now - policy.window_ms;
        let scope = policy.scope;

        let allowed = rate_limit::reset_if_expired(pool, scope, identity, now, cutoff).await?
            || rate_limit::increment_if_under_limit(pool, scope, identity, cutoff, policy.limit).await?
            || rate_limit::insert_if_absent(pool, scope, identity, now).await?
            || rate_limit::increment_if_under_limit(pool, scope, identity, cutoff, policy.limit).await?;

        if allowed {
            Ok(Decision::Allowed)
        } else {
            debug!(scope = %scope, identity, limit = policy.limit, "Rate limit exceeded");
            Ok(Decision::Denied)
        }
    }

    /// Delete counters whose window started more than `retention` ago.
    pub async fn sweep(&self, retention: Duration) -> Result<u64> {
        let retention_ms = i64::try_from(retention.as_millis()).unwrap_or(i64::MAX);
        let before = self.clock.now_ms().saturating_sub(retention_ms);
        let removed = rate_limit::prune_older_than(self.db.pool(), before).await?;
        if removed > 0 {
            info!(removed, "Pruned stale rate-limit records");
        }
        Ok(removed)
    }

    /// Run [`sweep`](Self::sweep) every `every` until the task is aborted.
    pub fn spawn_sweeper(&self, retention: Duration, every: Duration) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            info!(?retention, ?every, "Starting rate-limit sweeper");
            loop {
                ticker.tick().await;
                if let Err(e) = limiter.sweep(retention).await {
                    error!("Rate-limit sweep failed: {}", e);
                }
            }
        })
    }
}
